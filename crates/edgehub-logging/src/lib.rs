//! Structured logging setup shared by the `edgehub-agent` binary.
//!
//! A lighter cousin of the teacher's logging crate: one global subscriber, an
//! `EnvFilter` defaulting to `info`, and a switch between human-readable and
//! JSON output. No telemetry export, no reload handles, no platform event logs —
//! those are out of scope here (§1 Non-goals).

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the global `tracing` subscriber. Safe to call more than once in the same
/// process; every call after the first is a logged no-op rather than a panic, since
/// test binaries may build more than one composition root in-process.
pub fn init(json: bool) {
    if INIT.get().is_some() {
        tracing::debug!("logging already initialized, skipping");
        return;
    }

    let filter = EnvFilter::try_from_env("EDGEHUB_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let _ = INIT.set(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(false);
        init(false);
        init(true);
    }
}
