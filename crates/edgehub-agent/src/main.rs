mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cli::Cli;
use edgehub_bus::InProcessBus;
use edgehub_core::{ControllerConfig, GroupMap, ModuleRegistry, SessionController};
use edgehub_placement::HttpsPlacementClient;
use edgehub_ws::WebSocketTransportFactory;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    edgehub_logging::init(cli.log_json);

    let group_map = GroupMap::default();

    let config = ControllerConfig {
        project_id: cli.project_id,
        node_id: cli.node_id,
        placement_url: cli.placement_url,
        ws_url: cli.ws_url,
        cert_file: cli.cert_file,
        key_file: cli.key_file,
        transport_type: cli.transport,
        heartbeat_period: Duration::from(cli.heartbeat_period),
    };

    let bus = InProcessBus::new();

    // Give every built-in target group at least one registered member so connection
    // events have somewhere to land before the real functional modules attach.
    for group in group_map.distinct_targets() {
        bus.register(group, &format!("{group}-placeholder"));
    }

    let controller = Arc::new(SessionController::new(
        config,
        bus.clone(),
        bus.clone(),
        HttpsPlacementClient::new(),
        WebSocketTransportFactory::new(),
        group_map,
    ));

    let shutdown = {
        let controller = controller.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received shutdown signal");
                controller.cleanup();
            }
        }
    };

    tokio::select! {
        result = controller.start() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "fatal error, exiting");
                eprintln!("edgehub-agent: fatal: {e}");
                std::process::exit(1);
            }
        }
        () = shutdown => {}
    }
}
