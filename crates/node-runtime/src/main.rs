//! # Block Indexer
//!
//! Indexes the block files of a local full node and serves chunked reads of
//! blocks and transactions over HTTP.
//!
//! ```text
//!  blkNNNNN.dat ──► scan loop ──► index store ◄── retrieval API ◄── clients
//!                                     ▲
//!  node ZMQ ──► mempool feed ──► pending queue
//! ```
//!
//! Configuration comes from `IX_*` environment variables; see
//! [`node_runtime::container::config::load_config_from`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ix_03_mempool_cache::FeedSubscriber;
use node_runtime::adapters::{NodeRpcClient, RpcMempoolFeed, ZmqRawTxFeed};
use node_runtime::container::FeedSource;
use node_runtime::{check_node, load_config, Collaborators, IndexerConfig, IndexerRuntime, ServiceContext};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!("Starting block indexer with {:?}", config);

    let rpc = Arc::new(NodeRpcClient::new(&config.rpc).context("Failed to build RPC client")?);
    check_node(rpc.as_ref())
        .await
        .with_context(|| format!("Node RPC at {} is not usable", rpc.url()))?;

    let mut collaborators = Collaborators::new(rpc.clone()).with_relay(rpc.clone());
    if config.mempool.enabled {
        collaborators = collaborators.with_feed(open_feed(&config, rpc.clone()).await);
    }

    let context = ServiceContext::open(config).context("Failed to open index")?;
    let mut runtime = IndexerRuntime::new(context);
    runtime.start(collaborators).await?;

    info!("Indexer is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}

/// The configured mempool feed. A ZMQ endpoint that cannot be set up falls
/// back to polling over RPC.
async fn open_feed(config: &IndexerConfig, rpc: Arc<NodeRpcClient>) -> Box<dyn FeedSubscriber> {
    let poller = |rpc: Arc<NodeRpcClient>| -> Box<dyn FeedSubscriber> {
        Box::new(RpcMempoolFeed::new(
            rpc,
            Duration::from_millis(config.mempool.feed_poll_interval_ms),
        ))
    };
    match config.feed.source {
        FeedSource::RpcPoll => poller(rpc),
        FeedSource::Zmq => match ZmqRawTxFeed::connect(&config.feed.zmq_endpoints).await {
            Ok(feed) => Box::new(feed),
            Err(e) => {
                warn!(
                    "ZMQ feed unavailable at {:?} ({}), polling mempool over RPC instead",
                    config.feed.zmq_endpoints, e
                );
                poller(rpc)
            }
        },
    }
}
