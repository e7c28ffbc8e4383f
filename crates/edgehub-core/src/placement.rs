use async_trait::async_trait;
use url::Url;

use crate::config::ControllerConfig;

/// Resolves the cloud-hub session URL from identity, per §4.6. `edgehub-placement`
/// provides the HTTPS/mTLS reference implementation.
///
/// Implementations are expected to retry transient failures internally and only return
/// an error for the cases the outer resolve loop (§4.1 step 1, §7) should itself
/// back off and retry: client construction failure, or a terminal `400` from the
/// placement service.
#[async_trait]
pub trait PlacementResolver: Send + Sync {
    async fn resolve(&self, config: &ControllerConfig) -> Result<Url, PlacementError>;
}

#[derive(Debug, thiserror::Error)]
#[error("{0:#}")]
pub struct PlacementError(#[from] pub anyhow::Error);
