use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::bus::MessageBus;
use crate::config::{ControllerConfig, GroupMap};
use crate::correlation::CorrelationTable;
use crate::dispatcher::dispatch;
use crate::message::{CLOUD_CONNECTED, CLOUD_DISCONNECTED, EDGEHUB_MODULE, Message};
use crate::placement::PlacementResolver;
use crate::registry::ModuleRegistry;
use crate::transport::{TransportAdapter, TransportFactory};

/// How long the controller waits before retrying a failed transport `init()` or a
/// failed placement resolution (§4.1 step 2, §4.6).
const WAIT_CONNECTION_PERIOD: Duration = Duration::from_secs(60);

/// Fatal, unreachable-configuration errors. `start()` only returns on one of these.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("transport factory returned no adapter for type '{0}'")]
    NoTransportAdapter(String),
}

/// The reconnect-aware session manager that owns the cloud transport (§4.1).
///
/// `Start()` runs the outer `RESOLVING -> CONNECTING -> CONNECTED -> DRAINING ->
/// COOLDOWN` loop for the life of the process. Each iteration creates a fresh
/// [`CancellationToken`] rather than reusing a long-lived stop channel with ad-hoc
/// draining, per the REDESIGN FLAGS in §9: any pump collapsing the session cancels the
/// token exactly once and the other two observe it and exit on their own.
pub struct SessionController {
    config: ControllerConfig,
    bus: Arc<dyn MessageBus>,
    registry: Arc<dyn ModuleRegistry>,
    placement: Arc<dyn PlacementResolver>,
    transport_factory: Arc<dyn TransportFactory>,
    group_map: GroupMap,
    correlation: Arc<CorrelationTable>,
}

impl SessionController {
    pub fn new(
        config: ControllerConfig,
        bus: Arc<dyn MessageBus>,
        registry: Arc<dyn ModuleRegistry>,
        placement: Arc<dyn PlacementResolver>,
        transport_factory: Arc<dyn TransportFactory>,
        group_map: GroupMap,
    ) -> Self {
        Self {
            config,
            bus,
            registry,
            placement,
            transport_factory,
            group_map,
            correlation: Arc::new(CorrelationTable::new()),
        }
    }

    /// Blocks for the life of the process. Never returns except on fatal
    /// initialization error.
    pub async fn start(&self) -> Result<(), FatalError> {
        self.registry.register(EDGEHUB_MODULE, EDGEHUB_MODULE);

        loop {
            let url = self.resolve_url().await;

            let transport = match self.transport_factory.create(&self.config.transport_type, url)
            {
                Some(transport) => transport,
                None => {
                    return Err(FatalError::NoTransportAdapter(
                        self.config.transport_type.clone(),
                    ));
                }
            };

            if let Err(e) = transport.init().await {
                tracing::warn!(
                    error = %e,
                    wait = ?WAIT_CONNECTION_PERIOD,
                    "failed to initialize transport, retrying"
                );
                tokio::time::sleep(WAIT_CONNECTION_PERIOD).await;
                continue;
            }

            self.publish_connection_event(CLOUD_CONNECTED);

            let token = CancellationToken::new();

            let inbound = tokio::spawn(Self::inbound_pump(
                transport.clone(),
                self.bus.clone(),
                self.correlation.clone(),
                self.group_map.clone(),
                token.clone(),
            ));
            let outbound = tokio::spawn(Self::outbound_pump(
                transport.clone(),
                self.bus.clone(),
                self.correlation.clone(),
                self.config.heartbeat_period,
                token.clone(),
            ));
            let heartbeat = tokio::spawn(Self::heartbeat_pump(
                transport.clone(),
                self.config.heartbeat_period,
                token.clone(),
            ));

            token.cancelled().await;

            let _ = tokio::join!(inbound, outbound, heartbeat);

            transport.uninit().await;
            self.publish_connection_event(CLOUD_DISCONNECTED);

            tokio::time::sleep(self.config.heartbeat_period * 2).await;
        }
    }

    /// Releases the EdgeHub module's bus subscription.
    pub fn cleanup(&self) {
        self.bus.cleanup(EDGEHUB_MODULE);
    }

    async fn resolve_url(&self) -> Url {
        if !self.config.has_identity() {
            return self.config.ws_url.clone();
        }

        loop {
            match self.placement.resolve(&self.config).await {
                Ok(url) => return url,
                Err(e) => {
                    tracing::warn!(
                        error = %e.0,
                        wait = ?WAIT_CONNECTION_PERIOD,
                        "placement resolution failed, retrying"
                    );
                    tokio::time::sleep(WAIT_CONNECTION_PERIOD).await;
                }
            }
        }
    }

    fn publish_connection_event(&self, body: &'static str) {
        for target in self.group_map.distinct_targets() {
            self.bus
                .send_to_group(target, Message::connection_event(target, body));
        }
    }

    async fn inbound_pump(
        transport: Arc<dyn TransportAdapter>,
        bus: Arc<dyn MessageBus>,
        correlation: Arc<CorrelationTable>,
        group_map: GroupMap,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                result = transport.receive() => match result {
                    Ok(msg) => {
                        if let Err(e) = dispatch(msg, &correlation, bus.as_ref(), &group_map) {
                            tracing::warn!(error = %e, "dropping malformed or unroutable inbound message");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "inbound transport error, tearing down session");
                        token.cancel();
                        return;
                    }
                },
            }
        }
    }

    async fn outbound_pump(
        transport: Arc<dyn TransportAdapter>,
        bus: Arc<dyn MessageBus>,
        correlation: Arc<CorrelationTable>,
        heartbeat_period: Duration,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                result = bus.receive(EDGEHUB_MODULE) => match result {
                    Ok(msg) => {
                        if let Err(e) = transport.send(&msg).await {
                            tracing::warn!(error = %e, "outbound transport error, tearing down session");
                            token.cancel();
                            return;
                        }

                        if msg.is_sync {
                            let rx = correlation.add(msg.id.clone());
                            tokio::spawn(Self::sync_keeper(
                                bus.clone(),
                                correlation.clone(),
                                msg.id,
                                rx,
                                heartbeat_period,
                            ));
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "local bus read failed, retrying in 1s");

                        tokio::select! {
                            () = token.cancelled() => return,
                            () = tokio::time::sleep(Duration::from_secs(1)) => {}
                        }
                    }
                },
            }
        }
    }

    /// One task per outstanding synchronous outbound message (§4.3, §9). Runs
    /// independently of the outbound pump so a slow or missing reply never blocks
    /// further sends.
    async fn sync_keeper(
        bus: Arc<dyn MessageBus>,
        correlation: Arc<CorrelationTable>,
        id: String,
        rx: tokio::sync::oneshot::Receiver<Message>,
        deadline: Duration,
    ) {
        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(reply)) => {
                let parent_id = reply.parent_id.clone();
                bus.send_resp(reply);
                correlation.remove(&parent_id);
            }
            Ok(Err(_)) => {
                // Sender dropped without sending; nothing to clean up but our own slot.
                correlation.remove(&id);
            }
            Err(_elapsed) => {
                tracing::warn!(message_id = %id, ?deadline, "sync reply timed out, reclaiming slot");
                correlation.remove(&id);
            }
        }
    }

    async fn heartbeat_pump(
        transport: Arc<dyn TransportAdapter>,
        period: Duration,
        token: CancellationToken,
    ) {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                _ = interval.tick() => {
                    if let Err(e) = transport.send(&Message::keepalive()).await {
                        tracing::warn!(error = %e, "heartbeat send failed, tearing down session");
                        token.cancel();
                        return;
                    }
                }
            }
        }
    }
}
