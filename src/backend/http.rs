//! HTTP/JSON client for the probing and inventory service.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST /api/network/ping-range`
//! - `POST /api/network/discover`
//! - `GET  /api/printers`
//! - `POST /api/printers`

use crate::backend::{DiscoverRequest, DiscoveryBackend, InventoryBackend};
use crate::error::{BackendError, BackendResult};
use crate::types::{DiscoveredDevice, NewPrinterRecord, Printer};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Extra time granted on top of the probe timeout before the HTTP request
/// itself is abandoned. The backend needs room to finish and reply.
const REQUEST_GRACE: Duration = Duration::from_secs(30);

/// Timeout for plain inventory calls.
const INVENTORY_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP timeout for a call whose backend-side work is bounded by
/// `timeout_secs`.
fn request_timeout(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs).saturating_add(REQUEST_GRACE)
}

#[derive(Serialize)]
struct PingRangeBody<'a> {
    range: &'a str,
    timeout: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PingRangeResponse {
    #[serde(default)]
    responsive_ips: Vec<IpAddr>,
}

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the service at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>) -> BackendResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BackendError::InvalidUrl(base_url));
        }

        let client = Client::builder()
            .user_agent(concat!("printsweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Request {
                endpoint: base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { client, base_url })
    }

    /// The configured base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a JSON body, mapping every failure mode.
    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> BackendResult<T> {
        debug!(endpoint, "backend request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                BackendError::Request {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json::<T>().await.map_err(|e| BackendError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DiscoveryBackend for HttpBackend {
    async fn ping_range(&self, range: &str, timeout_secs: u64) -> BackendResult<Vec<IpAddr>> {
        let endpoint = "/api/network/ping-range";
        let request = self
            .client
            .post(self.url(endpoint))
            .timeout(request_timeout(timeout_secs))
            .json(&PingRangeBody {
                range,
                timeout: timeout_secs,
            });

        let response: PingRangeResponse = self.send_json(endpoint, request).await?;
        Ok(response.responsive_ips)
    }

    async fn discover(&self, request: &DiscoverRequest) -> BackendResult<Vec<DiscoveredDevice>> {
        let endpoint = "/api/network/discover";
        let builder = self
            .client
            .post(self.url(endpoint))
            .timeout(request_timeout(request.timeout))
            .json(request);

        self.send_json(endpoint, builder).await
    }
}

#[async_trait]
impl InventoryBackend for HttpBackend {
    async fn list_printers(&self) -> BackendResult<Vec<Printer>> {
        let endpoint = "/api/printers";
        let request = self
            .client
            .get(self.url(endpoint))
            .timeout(INVENTORY_TIMEOUT);

        self.send_json(endpoint, request).await
    }

    async fn create_printer_record(&self, record: &NewPrinterRecord) -> BackendResult<Printer> {
        let endpoint = "/api/printers";
        let request = self
            .client
            .post(self.url(endpoint))
            .timeout(INVENTORY_TIMEOUT)
            .json(record);

        self.send_json(endpoint, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let backend = HttpBackend::new("http://printers.local:8000/").unwrap();
        assert_eq!(backend.base_url(), "http://printers.local:8000");
        assert_eq!(
            backend.url("/api/printers"),
            "http://printers.local:8000/api/printers"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(matches!(
            HttpBackend::new("printers.local:8000"),
            Err(BackendError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_discover_request_body() {
        let request = DiscoverRequest {
            ip_list: vec!["10.0.0.1".parse().unwrap()],
            timeout: 2,
            max_workers: 50,
            include_medical_probe: true,
            medical_port: 104,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["ipList"][0], "10.0.0.1");
        assert_eq!(json["maxWorkers"], 50);
        assert_eq!(json["includeMedicalProbe"], true);
        assert_eq!(json["medicalPort"], 104);
    }

    #[test]
    fn test_request_timeout_saturates() {
        assert_eq!(request_timeout(2), Duration::from_secs(32));
        assert_eq!(request_timeout(u64::MAX), Duration::MAX);
    }

    #[test]
    fn test_ping_response_defaults_to_empty() {
        let response: PingRangeResponse = serde_json::from_str("{}").unwrap();
        assert!(response.responsive_ips.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_request_error() {
        // Port 9 (discard) on localhost is almost certainly closed.
        let backend = HttpBackend::new("http://127.0.0.1:9").unwrap();
        let result = backend.list_printers().await;
        assert!(matches!(
            result,
            Err(BackendError::Request { .. }) | Err(BackendError::Timeout { .. })
        ));
    }
}
