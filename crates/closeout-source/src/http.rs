//! HTTP strategy: a configured client handle for a JSON issue endpoint.
//!
//! `GET {base_url}{issues_path}?project=P&status=S&limit=N` answering with the
//! same payload shape the other strategies produce.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use closeout_core::{ConnectionUnavailable, FetchError, IssueRecord, ProjectQuery};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;

use crate::accessor::{Accessor, ConnectionProvider};
use crate::decode::decode_issues;

pub struct HttpProvider {
    base_url: String,
    health_path: String,
    issues_path: String,
    headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl HttpProvider {
    pub fn new(
        base_url: impl Into<String>,
        health_path: impl Into<String>,
        issues_path: impl Into<String>,
        headers: BTreeMap<String, String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_path: health_path.into(),
            issues_path: issues_path.into(),
            headers,
            timeout,
        }
    }

    fn build_client(&self) -> Result<Client, String> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| format!("invalid header name {name:?}: {e}"))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| format!("invalid header value: {e}"))?;
            headers.insert(name, value);
        }
        Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| format!("client setup failed: {e}"))
    }
}

#[async_trait]
impl ConnectionProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn connect(&self) -> Result<Box<dyn Accessor>, ConnectionUnavailable> {
        let label = format!("http:{}", self.base_url);
        if self.base_url.is_empty() {
            return Err(ConnectionUnavailable::new(label, "no base_url configured"));
        }
        let client = self
            .build_client()
            .map_err(|reason| ConnectionUnavailable::new(label.as_str(), reason))?;

        if !self.health_path.is_empty() {
            let url = format!("{}{}", self.base_url, self.health_path);
            debug!(%url, "probing http source");
            let resp = client
                .get(&url)
                .send()
                .await
                .map_err(|e| ConnectionUnavailable::new(label.as_str(), e.to_string()))?;
            if !resp.status().is_success() {
                return Err(ConnectionUnavailable::new(
                    label,
                    format!("health check returned HTTP {}", resp.status()),
                ));
            }
        }

        Ok(Box::new(HttpAccessor {
            label,
            url: format!("{}{}", self.base_url, self.issues_path),
            client,
            timeout: self.timeout,
        }))
    }
}

pub struct HttpAccessor {
    label: String,
    url: String,
    client: Client,
    timeout: Duration,
}

#[async_trait]
impl Accessor for HttpAccessor {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, query: &ProjectQuery) -> Result<Vec<IssueRecord>, FetchError> {
        let limit = query.limit.to_string();
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("project", query.project_key.as_str()),
                ("status", query.status_code.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConnectionUnavailable::new(
                self.label.as_str(),
                format!("HTTP {status}: {}", body.trim()),
            )
            .into());
        }

        let payload: serde_json::Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                FetchError::Malformed(format!("body is not JSON: {e}"))
            }
        })?;
        decode_issues(payload, query, &self.label)
    }
}

impl HttpAccessor {
    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            ConnectionUnavailable::new(self.label.as_str(), e.to_string()).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> HttpProvider {
        HttpProvider::new(
            base_url,
            "/health",
            "/issues",
            BTreeMap::new(),
            Duration::from_secs(5),
        )
    }

    async fn healthy_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn fetch_passes_query_params() {
        let server = healthy_server().await;
        Mock::given(method("GET"))
            .and(path("/issues"))
            .and(query_param("project", "CCITJEN"))
            .and(query_param("status", "6"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issues": [
                    {"key": "CCITJEN-2095", "summary": "Add ArgoCD permissions", "priority": "10300",
                     "resolution_date": "1750937389.564000000 1440"}
                ]
            })))
            .mount(&server)
            .await;

        let accessor = provider(&server.uri()).connect().await.unwrap();
        let records = accessor
            .fetch(&ProjectQuery::new("CCITJEN", "6", 100))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary, "Add ArgoCD permissions");
    }

    #[tokio::test]
    async fn failing_health_check_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).connect().await.err().unwrap();
        assert!(err.reason.contains("503"), "got: {}", err.reason);
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let err = provider("http://127.0.0.1:9").connect().await.err().unwrap();
        assert!(err.provider.starts_with("http:"));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = healthy_server().await;
        Mock::given(method("GET"))
            .and(path("/issues"))
            .respond_with(ResponseTemplate::new(500).set_body_string("warehouse down"))
            .mount(&server)
            .await;

        let accessor = provider(&server.uri()).connect().await.unwrap();
        let err = accessor
            .fetch(&ProjectQuery::new("QEHS", "6", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unavailable(ref u) if u.reason.contains("warehouse down")));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = healthy_server().await;
        Mock::given(method("GET"))
            .and(path("/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let accessor = provider(&server.uri()).connect().await.unwrap();
        let err = accessor
            .fetch(&ProjectQuery::new("QEHS", "6", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn configured_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/issues"))
            .and(header("x-tenant", "qe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = BTreeMap::new();
        headers.insert("x-tenant".to_string(), "qe".to_string());
        let provider = HttpProvider::new(
            server.uri(),
            "",
            "/issues",
            headers,
            Duration::from_secs(5),
        );
        let accessor = provider.connect().await.unwrap();
        let records = accessor
            .fetch(&ProjectQuery::new("QEHS", "6", 10))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = healthy_server().await;
        Mock::given(method("GET"))
            .and(path("/issues"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let provider = HttpProvider::new(
            server.uri(),
            "/health",
            "/issues",
            BTreeMap::new(),
            Duration::from_secs(1),
        );
        let accessor = provider.connect().await.unwrap();
        let err = accessor
            .fetch(&ProjectQuery::new("QEHS", "6", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { secs: 1 }));
    }
}
