use async_trait::async_trait;

use crate::message::Message;

/// The in-process publish/subscribe bus that fans messages out to local functional
/// modules (§6). Treated as an external collaborator: the core only ever talks to it
/// through this trait. `edgehub-bus` provides the reference implementation.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Fire-and-forget publish to a named module group.
    fn send_to_group(&self, group: &str, msg: Message);

    /// Blocking read of the next message addressed to `module_name`.
    async fn receive(&self, module_name: &str) -> Result<Message, BusError>;

    /// Delivers a correlated reply back to the originator of the message whose `id`
    /// equals `msg.parent_id`.
    fn send_resp(&self, msg: Message);

    /// Releases `module_name`'s subscriptions.
    fn cleanup(&self, module_name: &str);
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("module '{0}' is not registered with the bus")]
    UnknownModule(String),
    #[error("bus channel for module '{0}' was closed")]
    Closed(String),
}
