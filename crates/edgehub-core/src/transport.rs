use std::sync::Arc;

use async_trait::async_trait;

use crate::message::Message;

/// Abstract bidirectional message channel to the cloud hub (§6). WebSocket is the
/// reference implementation (`edgehub-ws`); any other durable transport can plug in by
/// implementing this trait.
///
/// `send` takes `&self` because the outbound pump and the heartbeat pump invoke it
/// concurrently (§5); implementations must serialize writes internally (e.g. behind a
/// `tokio::sync::Mutex`) rather than relying on the caller.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Establishes the session. Called once per connection attempt.
    async fn init(&self) -> Result<(), TransportError>;

    /// Releases the session. Idempotent.
    async fn uninit(&self);

    /// Delivers a message. Safe under concurrent invocation.
    async fn send(&self, msg: &Message) -> Result<(), TransportError>;

    /// Blocking read of the next inbound message.
    async fn receive(&self) -> Result<Message, TransportError>;
}

/// Selects a concrete [`TransportAdapter`] by configured transport type. Returning
/// `None` is a fatal configuration error (§4.1 step 2, §7).
pub trait TransportFactory: Send + Sync {
    fn create(&self, transport_type: &str, url: url::Url) -> Option<Arc<dyn TransportAdapter>>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[source] anyhow::Error),
    #[error("transport is not connected")]
    NotConnected,
}
