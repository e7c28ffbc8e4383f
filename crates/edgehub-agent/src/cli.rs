use std::path::PathBuf;

use url::Url;

/// Command-line and environment configuration for the EdgeHub agent.
///
/// Every field has an `EDGEHUB_*` environment fallback and a default suitable for
/// running in test mode against a loopback hub with no placement lookup.
#[derive(clap::Parser, Debug)]
#[command(name = "edgehub-agent", about = "Edge-side cloud hub session agent")]
pub struct Cli {
    /// Identity used for placement lookup. Leave both empty to bypass placement and
    /// connect directly to `--ws-url` ("test mode", §4.1 step 1).
    #[arg(long, env = "EDGEHUB_PROJECT_ID", default_value = "")]
    pub project_id: String,

    #[arg(long, env = "EDGEHUB_NODE_ID", default_value = "")]
    pub node_id: String,

    /// Placement service endpoint; only consulted when both identity fields are set.
    #[arg(long, env = "EDGEHUB_PLACEMENT_URL")]
    pub placement_url: Option<Url>,

    /// Direct cloud-hub URL, used verbatim in test mode and as the fallback target for
    /// the WebSocket transport otherwise.
    #[arg(
        long,
        env = "EDGEHUB_WS_URL",
        default_value = "ws://127.0.0.1:8080/events"
    )]
    pub ws_url: Url,

    #[arg(long, env = "EDGEHUB_CERT_FILE", default_value = "/etc/edgehub/cert.pem")]
    pub cert_file: PathBuf,

    #[arg(long, env = "EDGEHUB_KEY_FILE", default_value = "/etc/edgehub/key.pem")]
    pub key_file: PathBuf,

    /// Transport adapter to use. Only `"websocket"` is bound by this binary.
    #[arg(long, env = "EDGEHUB_TRANSPORT", default_value = "websocket")]
    pub transport: String,

    /// Keepalive interval; also governs the sync-reply deadline and the
    /// post-disconnect cooldown (`2 ×` this value).
    #[arg(long, env = "EDGEHUB_HEARTBEAT_PERIOD", default_value = "30s")]
    pub heartbeat_period: humantime::Duration,

    /// Emit logs as JSON instead of human-readable text.
    #[arg(long, env = "EDGEHUB_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}
