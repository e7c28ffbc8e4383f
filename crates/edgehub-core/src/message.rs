use serde::{Deserialize, Serialize};

/// Unique identifier assigned to a [`Message`] when it is created.
pub type MessageId = String;

/// A control-plane message flowing between the cloud hub and the local module groups.
///
/// The core never interprets `body`; it is opaque payload owned by the sender and the
/// eventual receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Empty for originals; set to the originating `id` on replies.
    #[serde(default)]
    pub parent_id: MessageId,
    pub source: String,
    pub group: String,
    pub resource: String,
    pub operation: String,
    pub body: serde_json::Value,
    /// True when the sender awaits a correlated reply.
    #[serde(default)]
    pub is_sync: bool,
}

pub const EDGEHUB_MODULE: &str = "edgehub";

pub const CONNECTION_SOURCE: &str = "node-connection-source";
pub const CONNECTION_RESOURCE: &str = "node-connection-resource";
pub const CONNECTION_OPERATION: &str = "node-connection-operation";
pub const CLOUD_CONNECTED: &str = "cloud-connected";
pub const CLOUD_DISCONNECTED: &str = "cloud-disconnected";

impl Message {
    /// Assigns a fresh, unique id to a newly constructed outbound message.
    pub fn new(
        source: impl Into<String>,
        group: impl Into<String>,
        resource: impl Into<String>,
        operation: impl Into<String>,
        body: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: String::new(),
            source: source.into(),
            group: group.into(),
            resource: resource.into(),
            operation: operation.into(),
            body,
            is_sync: false,
        }
    }

    /// Builds a reply to `self`, stamping `parent_id` so the dispatcher routes it back
    /// through the correlation table instead of a module group.
    pub fn reply_to(&self, body: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: self.id.clone(),
            source: self.source.clone(),
            group: self.group.clone(),
            resource: self.resource.clone(),
            operation: self.operation.clone(),
            body,
            is_sync: false,
        }
    }

    /// The fixed-shape keepalive sent on every `heartbeat_period` tick.
    pub fn keepalive() -> Self {
        Self::new(EDGEHUB_MODULE, "resource", "node", "keepalive", "ping".into())
    }

    /// A connection-state notification bracketing every session, per §6.
    pub fn connection_event(target_group: &str, body: &'static str) -> Self {
        Self::new(
            CONNECTION_SOURCE,
            target_group,
            CONNECTION_RESOURCE,
            CONNECTION_OPERATION,
            body.into(),
        )
    }
}
