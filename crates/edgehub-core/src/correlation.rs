use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::oneshot;

use crate::message::{Message, MessageId};

/// Outstanding sync-message IDs mapped to a single-shot slot for their reply.
///
/// Every entry has exactly one owner — the sync-keeper that inserted it — responsible
/// for removing it on either reply or timeout (§3, §4.7). Lookups take the shared read
/// lock; insert and remove take the exclusive write lock.
#[derive(Default)]
pub struct CorrelationTable {
    slots: RwLock<HashMap<MessageId, oneshot::Sender<Message>>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new slot under `id` and returns the receiving half. Single-writer
    /// semantics for a given `id` are the caller's responsibility.
    pub fn add(&self, id: MessageId) -> oneshot::Receiver<Message> {
        let (tx, rx) = oneshot::channel();
        self.slots.write().insert(id, tx);
        rx
    }

    /// Idempotent with respect to absence.
    pub fn remove(&self, id: &str) {
        self.slots.write().remove(id);
    }

    /// Shared-lock read used by the dispatcher to decide whether an inbound message is
    /// a sync reply.
    pub fn has(&self, id: &str) -> bool {
        self.slots.read().contains_key(id)
    }

    /// Takes the slot under `id` out of the table and offers `msg` into it.
    ///
    /// This is the table's only mutating send path: taking the sender out of the map is
    /// what makes the subsequent `send` non-blocking, and it doubles as removal so a
    /// delivered reply never outlives its slot. Returns `false` if the slot had already
    /// vanished (timed out) or its receiver was dropped — the caller must log and drop
    /// the message in that case.
    pub fn deliver(&self, id: &str, msg: Message) -> bool {
        let Some(tx) = self.slots.write().remove(id) else {
            return false;
        };

        tx.send(msg).is_ok()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(parent_id: &str) -> Message {
        Message {
            id: "reply-1".into(),
            parent_id: parent_id.into(),
            source: "cloud".into(),
            group: "resource".into(),
            resource: "r".into(),
            operation: "update".into(),
            body: serde_json::Value::Null,
            is_sync: false,
        }
    }

    #[tokio::test]
    async fn add_then_deliver_wakes_the_receiver() {
        let table = CorrelationTable::new();
        let rx = table.add("A".into());

        assert!(table.has("A"));
        assert!(table.deliver("A", reply("A")));
        assert!(!table.has("A"));

        let delivered = rx.await.unwrap();
        assert_eq!(delivered.parent_id, "A");
    }

    #[test]
    fn deliver_to_absent_id_reports_failure() {
        let table = CorrelationTable::new();

        assert!(!table.deliver("missing", reply("missing")));
    }

    #[test]
    fn remove_is_idempotent() {
        let table = CorrelationTable::new();
        table.remove("never-inserted");
        let _rx = table.add("A".into());
        table.remove("A");
        table.remove("A");

        assert!(!table.has("A"));
    }
}
