//! Reference implementation of the in-process local message bus the EdgeHub
//! controller treats as an external collaborator: named module inboxes, module-group
//! fan-out, and the synchronous reply primitive, all backed by `tokio::sync::mpsc`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use edgehub_core::{BusError, Message, MessageBus, ModuleRegistry};
use parking_lot::RwLock;
use tokio::sync::mpsc;

struct ModuleInbox {
    tx: mpsc::UnboundedSender<Message>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Message>>,
}

/// A pub/sub bus with named module inboxes and group-keyed fan-out.
///
/// `register` is idempotent per `(module_group, module_name)` pair. A module may belong
/// to more than one group; a group may contain any number of modules.
pub struct InProcessBus {
    modules: RwLock<HashMap<String, Arc<ModuleInbox>>>,
    groups: RwLock<HashMap<String, HashSet<String>>>,
}

impl InProcessBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            modules: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
        })
    }

    fn inbox_of(&self, module_name: &str) -> Option<Arc<ModuleInbox>> {
        self.modules.read().get(module_name).cloned()
    }

    fn ensure_inbox(&self, module_name: &str) {
        let mut modules = self.modules.write();
        modules.entry(module_name.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            Arc::new(ModuleInbox {
                tx,
                rx: tokio::sync::Mutex::new(rx),
            })
        });
    }

    /// Delivers directly to one module's inbox, bypassing group fan-out. This is how a
    /// local module hands an outbound message to the `edgehub` module itself; it is not
    /// part of the core-facing [`MessageBus`] trait because the core never calls it on
    /// itself.
    pub fn send_to_module(&self, module_name: &str, msg: Message) {
        match self.inbox_of(module_name) {
            Some(inbox) => {
                if inbox.tx.send(msg).is_err() {
                    tracing::debug!(module = module_name, "module inbox closed, dropping");
                }
            }
            None => {
                tracing::warn!(module = module_name, "send to unregistered module dropped");
            }
        }
    }
}

impl ModuleRegistry for InProcessBus {
    fn register(&self, module_group: &str, module_name: &str) {
        self.ensure_inbox(module_name);
        self.groups
            .write()
            .entry(module_group.to_string())
            .or_default()
            .insert(module_name.to_string());
    }
}

#[async_trait]
impl MessageBus for InProcessBus {
    fn send_to_group(&self, group: &str, msg: Message) {
        let Some(members) = self.groups.read().get(group).cloned() else {
            tracing::debug!(group, "no modules registered in group, dropping");
            return;
        };

        for module_name in &members {
            if let Some(inbox) = self.inbox_of(module_name) {
                let _ = inbox.tx.send(msg.clone());
            }
        }
    }

    async fn receive(&self, module_name: &str) -> Result<Message, BusError> {
        let Some(inbox) = self.inbox_of(module_name) else {
            return Err(BusError::UnknownModule(module_name.to_string()));
        };

        inbox
            .rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| BusError::Closed(module_name.to_string()))
    }

    fn send_resp(&self, msg: Message) {
        // `Message::reply_to` copies `source` from the original request, so the
        // original sender's module name travels with the reply without the bus having
        // to track per-request originators itself.
        let target = msg.source.clone();
        self.send_to_module(&target, msg);
    }

    fn cleanup(&self, module_name: &str) {
        self.modules.write().remove(module_name);
        for members in self.groups.write().values_mut() {
            members.remove(module_name);
        }
    }
}
