//! HTTP record source for a fleet management REST API.
//!
//! This module provides:
//! - Connection pooling shared by all region fetches of a computation
//! - Optional API key authentication (HTTP basic)
//! - Automatic retry with exponential backoff on 429 and transport errors
//! - A blocking wrapper that runs the whole pipeline on its own runtime

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{HotspotError, Result};
use crate::source::{compute_hotspots, RecordSource, SourceRecord};
use crate::{HotspotCluster, HotspotConfig};

const MAX_IDLE_PER_HOST: usize = 16;

/// Configuration for [`HttpRecordSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSourceConfig {
    /// API root, e.g. `https://fleet.example.com/api/v1`
    pub base_url: String,
    /// Sent as basic auth (`API_KEY:<key>`) when present
    pub api_key: Option<String>,
    /// Per-request timeout. Default: 30 seconds
    pub timeout_secs: u64,
    /// Retries after a 429 or transport error. Default: 3
    pub max_retries: u32,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Record source that reads `GET {base_url}/regions/{id}/records`.
///
/// The endpoint returns a JSON array of [`SourceRecord`].
pub struct HttpRecordSource {
    client: Client,
    base_url: String,
    auth_header: Option<String>,
    max_retries: u32,
}

impl HttpRecordSource {
    /// Create a new source with a pooled HTTP client.
    pub fn new(config: &HttpSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                HotspotError::InvalidConfig(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header: config.api_key.as_deref().map(basic_auth_header),
            max_retries: config.max_retries,
        })
    }

    fn region_url(&self, region_id: &str) -> String {
        format!("{}/regions/{}/records", self.base_url, region_id)
    }

    fn fetch_error(region_id: &str, message: impl Into<String>) -> HotspotError {
        HotspotError::Fetch {
            region_id: region_id.to_string(),
            message: message.into(),
        }
    }
}

fn basic_auth_header(api_key: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("API_KEY:{}", api_key));
    format!("Basic {}", encoded)
}

/// Backoff after the n-th consecutive 429: 1s, 2s, then 4s max.
fn rate_limit_backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * (1 << attempt.min(3)))
}

/// Backoff after the n-th consecutive transport error: 400ms, 800ms, 1.6s, ...
fn transport_backoff(attempt: u32) -> Duration {
    Duration::from_millis(200 * (1 << attempt.min(5)))
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn records_for_region(&self, region_id: &str) -> Result<Vec<SourceRecord>> {
        let url = self.region_url(region_id);
        let mut retries = 0;
        let req_start = Instant::now();

        loop {
            let mut request = self.client.get(&url);
            if let Some(auth) = &self.auth_header {
                request = request.header("Authorization", auth);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    retries += 1;
                    if retries > self.max_retries {
                        return Err(Self::fetch_error(region_id, format!("Request error: {}", e)));
                    }
                    let wait = transport_backoff(retries);
                    warn!(
                        "[HttpRecordSource] Region {}: {}, retry {} after {:?}",
                        region_id, e, retries, wait
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > self.max_retries {
                    return Err(Self::fetch_error(region_id, "Max retries exceeded (429)"));
                }
                let wait = rate_limit_backoff(retries);
                warn!(
                    "[HttpRecordSource] Region {}: 429 Too Many Requests, retry {} with {:?} backoff",
                    region_id, retries, wait
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                return Err(Self::fetch_error(region_id, format!("HTTP {}", status)));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| Self::fetch_error(region_id, format!("Body download error: {}", e)))?;

            let records: Vec<SourceRecord> = serde_json::from_slice(&bytes)
                .map_err(|e| Self::fetch_error(region_id, format!("JSON parse error: {}", e)))?;

            debug!(
                "[HttpRecordSource] Region {}: {} records ({:.1}KB) in {:?}",
                region_id,
                records.len(),
                bytes.len() as f64 / 1024.0,
                req_start.elapsed()
            );

            return Ok(records);
        }
    }
}

/// Synchronous wrapper: fetch over HTTP and compute hotspots on a private
/// tokio runtime.
pub fn compute_hotspots_blocking(
    source_config: &HttpSourceConfig,
    region_ids: &[String],
    config: &HotspotConfig,
) -> Result<Vec<HotspotCluster>> {
    use tokio::runtime::Builder;

    info!(
        "[HttpRecordSource] compute_hotspots_blocking called for {} regions",
        region_ids.len()
    );

    let rt = Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|e| HotspotError::InvalidConfig(format!("failed to create tokio runtime: {}", e)))?;

    let source = HttpRecordSource::new(source_config)?;
    rt.block_on(compute_hotspots(&source, region_ids, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> HttpSourceConfig {
        HttpSourceConfig {
            // Port 9 (discard) is closed on test machines: connections are refused
            base_url: "http://127.0.0.1:9/api/".to_string(),
            api_key: None,
            timeout_secs: 2,
            max_retries: 0,
        }
    }

    #[test]
    fn test_region_url() {
        let source = HttpRecordSource::new(&unreachable_config()).unwrap();
        assert_eq!(
            source.region_url("ra"),
            "http://127.0.0.1:9/api/regions/ra/records"
        );
    }

    #[test]
    fn test_basic_auth_header() {
        // base64("API_KEY:secret")
        assert_eq!(basic_auth_header("secret"), "Basic QVBJX0tFWTpzZWNyZXQ=");

        let config = HttpSourceConfig {
            api_key: Some("secret".to_string()),
            ..unreachable_config()
        };
        let source = HttpRecordSource::new(&config).unwrap();
        assert_eq!(source.auth_header.as_deref(), Some("Basic QVBJX0tFWTpzZWNyZXQ="));
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(rate_limit_backoff(1), Duration::from_millis(1000));
        assert_eq!(rate_limit_backoff(2), Duration::from_millis(2000));
        assert_eq!(rate_limit_backoff(3), Duration::from_millis(4000));
        assert_eq!(rate_limit_backoff(10), Duration::from_millis(4000));

        assert_eq!(transport_backoff(1), Duration::from_millis(400));
        assert_eq!(transport_backoff(2), Duration::from_millis(800));
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: HttpSourceConfig =
            serde_json::from_str(r#"{"base_url": "https://fleet.example.com/api"}"#).unwrap();
        assert_eq!(config.base_url, "https://fleet.example.com/api");
        assert_eq!(config.api_key, None);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
    }

    #[tokio::test]
    async fn test_connection_failure_is_fetch_error() {
        let source = HttpRecordSource::new(&unreachable_config()).unwrap();
        let result = source.records_for_region("ra").await;
        assert!(matches!(result, Err(HotspotError::Fetch { ref region_id, .. }) if region_id == "ra"));
    }

    #[test]
    fn test_blocking_validates_before_fetching() {
        let result = compute_hotspots_blocking(&unreachable_config(), &[], &HotspotConfig::default());
        assert_eq!(result, Err(HotspotError::NoRegions));
    }

    #[test]
    fn test_blocking_propagates_fetch_error() {
        let regions = vec!["ra".to_string()];
        let result =
            compute_hotspots_blocking(&unreachable_config(), &regions, &HotspotConfig::default());
        assert!(matches!(result, Err(HotspotError::Fetch { .. })));
    }
}
