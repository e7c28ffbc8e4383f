//! Reference `PlacementResolver` binding: an HTTPS GET against the placement service,
//! authenticated with a client certificate, per §4.6.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use edgehub_core::{ControllerConfig, PlacementError, PlacementResolver};
use reqwest::{Client, StatusCode};
use url::Url;

/// Backoff applied between a transient placement failure and the next attempt, and
/// between "unexpected status" responses (§4.6 step 3).
const RETRY_PERIOD: Duration = Duration::from_secs(60);

pub struct HttpsPlacementClient;

impl HttpsPlacementClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl PlacementResolver for HttpsPlacementClient {
    async fn resolve(&self, config: &ControllerConfig) -> Result<Url, PlacementError> {
        let placement_url = config
            .placement_url
            .clone()
            .ok_or_else(|| PlacementError(anyhow::anyhow!("no placement_url configured")))?;

        let client = build_client(&config.cert_file, &config.key_file)
            .await
            .map_err(PlacementError)?;

        loop {
            let response = match client.get(placement_url.clone()).send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(error = %e, wait = ?RETRY_PERIOD, "placement request failed, retrying");
                    tokio::time::sleep(RETRY_PERIOD).await;
                    continue;
                }
            };

            match response.status() {
                StatusCode::OK => {
                    let body = response
                        .text()
                        .await
                        .map_err(|e| PlacementError(anyhow::anyhow!(e)))?;
                    return build_session_url(body.trim(), &config.project_id, &config.node_id)
                        .map_err(PlacementError);
                }
                StatusCode::BAD_REQUEST => {
                    return Err(PlacementError(anyhow::anyhow!(
                        "placement service rejected request (400 Bad Request)"
                    )));
                }
                other => {
                    tracing::warn!(status = %other, wait = ?RETRY_PERIOD, "placement service returned an unexpected status, retrying");
                    tokio::time::sleep(RETRY_PERIOD).await;
                }
            }
        }
    }
}

fn build_session_url(base: &str, project_id: &str, node_id: &str) -> anyhow::Result<Url> {
    let joined = format!("{base}/{project_id}/{node_id}/events");
    Url::parse(&joined).with_context(|| format!("placement service returned an invalid URL: {joined}"))
}

async fn build_client(cert_file: &Path, key_file: &Path) -> anyhow::Result<Client> {
    let mut pem = tokio::fs::read(cert_file)
        .await
        .with_context(|| format!("reading client certificate {}", cert_file.display()))?;
    let mut key_pem = tokio::fs::read(key_file)
        .await
        .with_context(|| format!("reading client key {}", key_file.display()))?;

    pem.push(b'\n');
    pem.append(&mut key_pem);

    let identity = reqwest::Identity::from_pem(&pem)
        .context("building client identity from certificate and key PEM")?;

    Client::builder()
        .identity(identity)
        .use_rustls_tls()
        .build()
        .context("building placement HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_url_is_joined_in_the_expected_shape() {
        let url = build_session_url("https://hub.example.test", "proj-1", "node-1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://hub.example.test/proj-1/node-1/events"
        );
    }

    #[test]
    fn session_url_rejects_a_malformed_base() {
        assert!(build_session_url("not a url at all", "proj", "node").is_err());
    }

    #[tokio::test]
    async fn client_construction_fails_loudly_on_missing_cert_files() {
        let err = build_client(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reading client certificate"));
    }
}
