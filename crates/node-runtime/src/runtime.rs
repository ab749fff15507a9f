//! # Indexer Runtime
//!
//! Starts the workers over one [`ServiceContext`] and stops them together.
//!
//! | Worker | Task kind | Present when |
//! |--------|-----------|--------------|
//! | Scan loop | `spawn_blocking` (file I/O, hashing) | always |
//! | Feed worker | async task | `mempool.enabled` and a feed is supplied |
//! | Retrieval API | async task (`axum::serve`) | `api.enabled` |
//!
//! All workers watch the same shutdown channel. The API port is bound before
//! any worker starts, so a bind failure leaves nothing running.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ix_02_block_scanner::BlockScanner;
use ix_03_mempool_cache::{
    FeedSubscriber, FeedWorker, HealthProbe, SafeModeGate, SafeModePolicy, SystemTimeSource,
    TimeSource,
};
use ix_04_retrieval_api::{
    build_router, AppState, AuthConfig, FsObjectReader, RetrievalService, TransactionRelay,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::container::{ServiceContext, StartupError};

/// External collaborators, injected so tests can replace the node.
pub struct Collaborators {
    pub health: Arc<dyn HealthProbe>,
    pub relay: Option<Arc<dyn TransactionRelay>>,
    pub feed: Option<Box<dyn FeedSubscriber>>,
    pub clock: Arc<dyn TimeSource>,
}

impl Collaborators {
    pub fn new(health: Arc<dyn HealthProbe>) -> Self {
        Self {
            health,
            relay: None,
            feed: None,
            clock: Arc::new(SystemTimeSource),
        }
    }

    pub fn with_relay(mut self, relay: Arc<dyn TransactionRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_feed(mut self, feed: Box<dyn FeedSubscriber>) -> Self {
        self.feed = Some(feed);
        self
    }
}

/// Startup health check. An unreachable node is fatal.
pub async fn check_node(probe: &dyn HealthProbe) -> Result<bool, StartupError> {
    let safe_mode = probe
        .safe_mode()
        .await
        .map_err(|e| StartupError::HealthCheck(e.to_string()))?;
    info!("[runtime] Node reachable (safe mode: {})", safe_mode);
    Ok(safe_mode)
}

/// The running indexer.
pub struct IndexerRuntime {
    context: Arc<ServiceContext>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    workers: Vec<(&'static str, JoinHandle<()>)>,
    api_addr: Option<SocketAddr>,
}

impl IndexerRuntime {
    pub fn new(context: ServiceContext) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            context: Arc::new(context),
            shutdown_tx,
            shutdown_rx,
            workers: Vec::new(),
            api_addr: None,
        }
    }

    pub fn context(&self) -> Arc<ServiceContext> {
        Arc::clone(&self.context)
    }

    /// Address the retrieval API is bound to, once started.
    pub fn api_addr(&self) -> Option<SocketAddr> {
        self.api_addr
    }

    /// Start every configured worker.
    pub async fn start(&mut self, collaborators: Collaborators) -> Result<(), StartupError> {
        let Collaborators {
            health,
            relay,
            feed,
            clock,
        } = collaborators;

        let listener = if self.context.config.api.enabled {
            Some(self.bind_api().await?)
        } else {
            None
        };

        self.start_scanner()?;

        match feed {
            Some(feed) if self.context.config.mempool.enabled => {
                self.start_feed_worker(feed, health, clock);
            }
            Some(_) => info!("[runtime] Mempool ingestion disabled, feed ignored"),
            None if self.context.config.mempool.enabled => {
                info!("[runtime] Mempool ingestion enabled but no feed configured")
            }
            None => {}
        }

        if let Some((listener, addr)) = listener {
            self.start_api(listener, addr, relay);
        }

        info!("[runtime] Indexer started ({} workers)", self.workers.len());
        Ok(())
    }

    fn start_scanner(&mut self) -> Result<(), StartupError> {
        let context = &self.context;
        let mut scanner = BlockScanner::new(
            context.files.clone(),
            context.magic,
            context.store.clone(),
            Arc::clone(&context.decoder),
            context.checkpoint_store(),
            context.config.scanner.clone(),
        )?
        .with_pending_source(context.pending.clone());

        let shutdown = self.shutdown_rx.clone();
        let handle = tokio::task::spawn_blocking(move || scanner.run(&shutdown));
        self.workers.push(("scanner", handle));
        Ok(())
    }

    fn start_feed_worker(
        &mut self,
        feed: Box<dyn FeedSubscriber>,
        health: Arc<dyn HealthProbe>,
        clock: Arc<dyn TimeSource>,
    ) {
        let config = &self.context.config.mempool;
        let policy = if config.fail_closed {
            SafeModePolicy::FailClosed
        } else {
            SafeModePolicy::FailOpen
        };
        let gate = Arc::new(SafeModeGate::new(
            Duration::from_millis(config.safe_mode_poll_interval_ms),
            policy,
        ));

        let worker = FeedWorker::new(
            feed,
            gate,
            health,
            Arc::clone(&self.context.decoder),
            self.context.pending.clone(),
            clock,
        );
        let handle = tokio::spawn(worker.run(self.shutdown_rx.clone()));
        self.workers.push(("feed", handle));
    }

    async fn bind_api(&self) -> Result<(TcpListener, SocketAddr), StartupError> {
        let bind = &self.context.config.api.bind_address;
        let listener = TcpListener::bind(bind)
            .await
            .map_err(|e| StartupError::Bind(bind.clone(), e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| StartupError::Bind(bind.clone(), e))?;
        Ok((listener, addr))
    }

    fn start_api(
        &mut self,
        listener: TcpListener,
        addr: SocketAddr,
        relay: Option<Arc<dyn TransactionRelay>>,
    ) {
        let context = &self.context;
        let service = RetrievalService::new(
            context.store.clone(),
            Arc::new(FsObjectReader::new(context.files.clone())),
        );
        let auth = AuthConfig {
            username: context.config.rpc.username.clone(),
            password: context.config.rpc.password.clone(),
        };
        let router = build_router(AppState { service, relay }, auth);
        info!("[runtime] Retrieval API listening on {}", addr);

        let mut shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.wait_for(|stop| *stop).await;
                })
                .await;
            if let Err(e) = served {
                error!("[runtime] Retrieval API failed: {}", e);
            }
        });
        self.api_addr = Some(addr);
        self.workers.push(("api", handle));
    }

    /// Signal shutdown and wait for every worker to finish.
    pub async fn shutdown(mut self) {
        info!("[runtime] Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("[runtime] Failed to send shutdown signal: {}", e);
        }

        for (name, handle) in self.workers.drain(..) {
            if let Err(e) = handle.await {
                error!("[runtime] {} worker ended abnormally: {}", name, e);
            }
        }
        info!("[runtime] Shutdown complete");
    }
}

impl Drop for IndexerRuntime {
    /// Workers left running by an early return still see the stop signal.
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
