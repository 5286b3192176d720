pub mod frame;
pub mod stomp;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::models::location::LocationEvent;
use crate::pubsub::frame::FrameError;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("pub/sub connection failed: {0}")]
    Connection(#[from] tungstenite::Error),

    #[error("invalid pub/sub url: {0}")]
    InvalidUrl(String),

    #[error("broker error: {message} ({body})")]
    Broker { message: String, body: String },

    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("malformed location payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("connection closed before the broker accepted it")]
    Closed,
}

/// Location events for one order. Item errors are per-message; the stream
/// ends when the underlying connection does.
pub type LocationStream = Pin<Box<dyn Stream<Item = Result<LocationEvent, FeedError>> + Send>>;

#[async_trait]
pub trait LocationFeed: Send + Sync {
    async fn subscribe(&self, order_id: u64) -> Result<LocationStream, FeedError>;
}

pub fn order_topic(order_id: u64) -> String {
    format!("/topic/order/{order_id}")
}
