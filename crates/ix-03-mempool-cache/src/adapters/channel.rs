//! In-process feed. Anything holding a [`FeedSender`] can publish messages.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::value_objects::FeedMessage;
use crate::ports::outbound::FeedSubscriber;

/// Publishing half of a [`ChannelFeed`].
#[derive(Debug, Clone)]
pub struct FeedSender {
    tx: mpsc::Sender<FeedMessage>,
}

impl FeedSender {
    /// Publish a message. Returns `false` once the subscriber is gone.
    pub async fn publish(&self, message: FeedMessage) -> bool {
        self.tx.send(message).await.is_ok()
    }
}

/// Subscribing half, filtered to one topic.
#[derive(Debug)]
pub struct ChannelFeed {
    rx: mpsc::Receiver<FeedMessage>,
    topic: String,
}

/// A bounded in-process feed delivering only messages on `topic`.
pub fn channel_feed(topic: impl Into<String>, capacity: usize) -> (FeedSender, ChannelFeed) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        FeedSender { tx },
        ChannelFeed {
            rx,
            topic: topic.into(),
        },
    )
}

#[async_trait]
impl FeedSubscriber for ChannelFeed {
    async fn next_message(&mut self) -> Option<FeedMessage> {
        while let Some(message) = self.rx.recv().await {
            if message.topic == self.topic {
                return Some(message);
            }
        }
        None
    }
}
