//! Elasticsearch client
//!
//! Thin reqwest wrapper covering the two calls the shipper needs: the
//! reachability probe and the `_bulk` write.

use es_log_core::prelude::*;
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Elasticsearch client configuration
#[derive(Debug, Clone)]
pub struct EsClientConfig {
    pub hosts: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for EsClientConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["http://localhost:9200".to_string()],
            username: None,
            password: None,
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EsClientConfig {
    /// Derive client settings from the shipper configuration
    pub fn from_config(config: &ShipperConfig) -> Self {
        let hosts = config
            .url
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            hosts,
            username: config.username.clone(),
            password: config.password.clone(),
            api_key: config.api_key.clone(),
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
        }
    }
}

/// Elasticsearch client
pub struct EsClient {
    client: Client,
    config: EsClientConfig,
    host_index: AtomicUsize,
}

impl EsClient {
    /// Create new ES client
    pub fn new(config: EsClientConfig) -> Result<Self> {
        if config.hosts.is_empty() {
            return Err(ShipperError::connectivity("no Elasticsearch host configured"));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ShipperError::connectivity_with_source("Failed to create client", e))?;

        Ok(Self {
            client,
            config,
            host_index: AtomicUsize::new(0),
        })
    }

    /// Get the current host (round-robin for load balancing)
    fn get_host(&self) -> &str {
        let idx = self.host_index.fetch_add(1, Ordering::Relaxed) % self.config.hosts.len();
        &self.config.hosts[idx]
    }

    /// Build request with authentication
    fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.get_host(), path);
        let mut req = self.client.request(method, &url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("ApiKey {}", api_key));
        } else if let (Some(ref user), Some(ref pass)) =
            (&self.config.username, &self.config.password)
        {
            req = req.basic_auth(user, Some(pass));
        }

        req
    }
}

#[async_trait::async_trait]
impl BulkTransport for EsClient {
    /// Ping the cluster
    async fn ping(&self) -> Result<()> {
        let resp = self
            .build_request(reqwest::Method::GET, "/")
            .send()
            .await
            .map_err(|e| ShipperError::connectivity_with_source("Ping failed", e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ShipperError::connectivity(format!(
                "Ping returned {}",
                resp.status()
            )))
        }
    }

    /// Submit the batch through the `_bulk` API
    ///
    /// Per-document rejections are reported in the summary; only a failed
    /// request (transport error or non-success status) is an `Err`.
    async fn bulk(&self, batch: &ActionBatch) -> Result<BulkSummary> {
        if batch.is_empty() {
            return Ok(BulkSummary::success(0, 0));
        }

        let start = Instant::now();
        let body = batch.to_bulk_body();

        let resp = self
            .build_request(reqwest::Method::POST, "/_bulk")
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| ShipperError::transmission_with_source("Bulk request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ShipperError::transmission(format!(
                "Bulk write returned {}",
                status
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ShipperError::transmission_with_source("Failed to parse response", e))?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let has_errors = body["errors"].as_bool().unwrap_or(false);

        if !has_errors {
            debug!(count = batch.len(), duration_ms, "Bulk write completed");
            return Ok(BulkSummary::success(batch.len(), duration_ms));
        }

        // Collect per-document rejection reasons
        let mut failures = Vec::new();
        if let Some(items) = body["items"].as_array() {
            for item in items {
                let op = item.as_object().and_then(|o| o.values().next());
                if let Some(error) = op.and_then(|op| op.get("error")) {
                    let reason = error["reason"].as_str().unwrap_or("unknown").to_string();
                    failures.push(reason);
                }
            }
        }

        debug!(
            count = batch.len(),
            failed = failures.len(),
            duration_ms,
            "Bulk write completed with rejections"
        );

        Ok(BulkSummary {
            success_count: batch.len() - failures.len(),
            failure_count: failures.len(),
            failures,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EsClient {
        EsClient::new(EsClientConfig {
            hosts: vec![server.uri()],
            ..Default::default()
        })
        .unwrap()
    }

    fn sample_batch() -> ActionBatch {
        ["one", "two"]
            .iter()
            .map(|msg| Action::build(&LogEvent::new(Level::Info, *msg), "test-logs", None))
            .collect()
    }

    #[tokio::test]
    async fn ping_succeeds_against_healthy_cluster() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tagline": "You Know, for Search"})))
            .mount(&server)
            .await;

        client_for(&server).ping().await.unwrap();
    }

    #[tokio::test]
    async fn ping_reports_connectivity_error_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).ping().await.unwrap_err();
        assert!(matches!(err, ShipperError::Connectivity { .. }));
    }

    #[tokio::test]
    async fn bulk_posts_ndjson_and_counts_successes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .and(header("Content-Type", "application/x-ndjson"))
            .and(body_string_contains(r#""_index":"test-logs""#))
            .and(body_string_contains(r#""level":"INFO""#))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"took": 3, "errors": false, "items": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let summary = client_for(&server).bulk(&sample_batch()).await.unwrap();
        assert_eq!(summary.success_count, 2);
        assert!(summary.is_complete_success());
    }

    #[tokio::test]
    async fn bulk_reports_partial_rejections_without_erroring() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "took": 5,
                "errors": true,
                "items": [
                    {"index": {"_index": "test-logs", "status": 201}},
                    {"index": {"_index": "test-logs", "status": 400,
                               "error": {"type": "mapper_parsing_exception", "reason": "bad field"}}}
                ]
            })))
            .mount(&server)
            .await;

        let summary = client_for(&server).bulk(&sample_batch()).await.unwrap();
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.failures, vec!["bad field".to_string()]);
    }

    #[tokio::test]
    async fn bulk_reports_transmission_error_on_server_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).bulk(&sample_batch()).await.unwrap_err();
        assert!(matches!(err, ShipperError::Transmission { .. }));
    }
}
