//! # ZMQ Mempool Feed
//!
//! Subscribes to the node's `rawtx` publisher. Every multipart message is
//! `[topic, payload, sequence]`; the payload is the serialized transaction.
//! Other topics are filtered out by the subscription itself.

use std::time::Duration;

use async_trait::async_trait;
use ix_03_mempool_cache::{FeedMessage, FeedSubscriber};
use tokio::sync::Mutex;
use tracing::{info, warn};
use zeromq::{Socket, SocketRecv, SubSocket, ZmqError};

/// Pause after a receive error before trying again.
const RECV_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Topic the node publishes raw mempool transactions under.
pub const RAWTX_TOPIC: &str = "rawtx";

pub struct ZmqRawTxFeed {
    socket: Mutex<SubSocket>,
    endpoints: Vec<String>,
}

impl ZmqRawTxFeed {
    /// Connect to every endpoint and subscribe to `rawtx`.
    pub async fn connect(endpoints: &[String]) -> Result<Self, ZmqError> {
        let mut socket = SubSocket::new();
        for endpoint in endpoints {
            socket.connect(endpoint).await?;
            info!("[runtime] ZMQ feed connected to {}", endpoint);
        }
        socket.subscribe(RAWTX_TOPIC).await?;
        Ok(Self {
            socket: Mutex::new(socket),
            endpoints: endpoints.to_vec(),
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

#[async_trait]
impl FeedSubscriber for ZmqRawTxFeed {
    async fn next_message(&mut self) -> Option<FeedMessage> {
        let socket = self.socket.get_mut();
        loop {
            let message = match socket.recv().await {
                Ok(message) => message,
                Err(e) => {
                    warn!("[runtime] ZMQ receive failed: {}", e);
                    tokio::time::sleep(RECV_RETRY_DELAY).await;
                    continue;
                }
            };
            let (Some(topic), Some(payload)) = (message.get(0), message.get(1)) else {
                warn!("[runtime] Ignoring ZMQ message with {} frames", message.len());
                continue;
            };
            // Prefix subscription also lets through e.g. `rawtxlock`.
            if &topic[..] != RAWTX_TOPIC.as_bytes() {
                continue;
            }
            return Some(FeedMessage::rawtx(payload.to_vec()));
        }
    }
}
