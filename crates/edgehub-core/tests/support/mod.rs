use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use edgehub_core::{
    BusError, ControllerConfig, GroupMap, Message, ModuleRegistry, PlacementError,
    PlacementResolver, TransportAdapter, TransportError, TransportFactory,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A bus stand-in: one inbound queue feeding `receive()`, and recorded `Vec`s for
/// everything the controller publishes back out.
pub struct FakeBus {
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<Message>>,
    pub published: Mutex<Vec<(String, Message)>>,
    pub replies: Mutex<Vec<Message>>,
    pub cleaned_up: Mutex<Vec<String>>,
}

impl FakeBus {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedSender<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                inbox: tokio::sync::Mutex::new(rx),
                published: Mutex::new(Vec::new()),
                replies: Mutex::new(Vec::new()),
                cleaned_up: Mutex::new(Vec::new()),
            }),
            tx,
        )
    }
}

#[async_trait]
impl edgehub_core::MessageBus for FakeBus {
    fn send_to_group(&self, group: &str, msg: Message) {
        self.published.lock().push((group.to_string(), msg));
    }

    async fn receive(&self, _module_name: &str) -> Result<Message, BusError> {
        // tokio's Mutex guard is Send, unlike parking_lot's, so it is safe to hold
        // across the `.await` that actually suspends here.
        self.inbox
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| BusError::Closed("edgehub".into()))
    }

    fn send_resp(&self, msg: Message) {
        self.replies.lock().push(msg);
    }

    fn cleanup(&self, module_name: &str) {
        self.cleaned_up.lock().push(module_name.to_string());
    }
}

/// A transport stand-in. `receive()` pulls from a queue the test feeds; when the queue
/// is told to yield an error, the *next* call returns it once and then the queue
/// reverts to pending-forever, mirroring "one bad read tears the session down".
pub struct FakeTransport {
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<Message, String>>>,
    pub sent: Mutex<Vec<Message>>,
    pub init_calls: AtomicUsize,
    pub uninit_calls: AtomicUsize,
    pub fail_send: Mutex<bool>,
}

impl FakeTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedSender<Result<Message, String>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                inbound: tokio::sync::Mutex::new(rx),
                sent: Mutex::new(Vec::new()),
                init_calls: AtomicUsize::new(0),
                uninit_calls: AtomicUsize::new(0),
                fail_send: Mutex::new(false),
            }),
            tx,
        )
    }
}

#[async_trait]
impl TransportAdapter for FakeTransport {
    async fn init(&self) -> Result<(), TransportError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn uninit(&self) {
        self.uninit_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn send(&self, msg: &Message) -> Result<(), TransportError> {
        if *self.fail_send.lock() {
            return Err(TransportError::Io(anyhow::anyhow!("send failed")));
        }
        self.sent.lock().push(msg.clone());
        Ok(())
    }

    async fn receive(&self) -> Result<Message, TransportError> {
        let next = self.inbound.lock().await.recv().await;

        match next {
            Some(Ok(msg)) => Ok(msg),
            Some(Err(e)) => Err(TransportError::Io(anyhow::anyhow!(e))),
            None => std::future::pending().await,
        }
    }
}

pub struct FakeTransportFactory {
    pub transport: Arc<FakeTransport>,
    pub create_calls: AtomicUsize,
}

impl FakeTransportFactory {
    pub fn new(transport: Arc<FakeTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            create_calls: AtomicUsize::new(0),
        })
    }
}

impl TransportFactory for FakeTransportFactory {
    fn create(&self, _transport_type: &str, _url: url::Url) -> Option<Arc<dyn TransportAdapter>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Some(self.transport.clone())
    }
}

#[derive(Default)]
pub struct FakeRegistry {
    pub registered: Mutex<Vec<(String, String)>>,
}

impl ModuleRegistry for FakeRegistry {
    fn register(&self, module_group: &str, module_name: &str) {
        self.registered
            .lock()
            .push((module_group.to_string(), module_name.to_string()));
    }
}

/// Always fails, simulating a placement service that rejects every request (S5), or
/// simply unused when the config carries empty identity (test mode).
pub struct AlwaysErrPlacement {
    pub calls: AtomicUsize,
}

impl AlwaysErrPlacement {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PlacementResolver for AlwaysErrPlacement {
    async fn resolve(&self, _config: &ControllerConfig) -> Result<url::Url, PlacementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PlacementError(anyhow::anyhow!(
            "placement service rejected request (400 Bad Request)"
        )))
    }
}

pub fn test_config(heartbeat_period: std::time::Duration) -> ControllerConfig {
    ControllerConfig {
        project_id: String::new(),
        node_id: String::new(),
        placement_url: None,
        ws_url: url::Url::parse("wss://hub.example.test/events").unwrap(),
        cert_file: "/dev/null".into(),
        key_file: "/dev/null".into(),
        transport_type: "websocket".into(),
        heartbeat_period,
    }
}

pub fn default_group_map() -> GroupMap {
    GroupMap::default()
}
