use super::transport::{ConnectionFactory, OutboundRequest, Payload, TransportError};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use url::Url;

const EVENT_ID_HEADER: &str = "x-log-event-id";
const VERSION_HEADER: &str = "x-remote-logger-version";

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_idle_connections: usize,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(5),
            max_idle_connections: 8,
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: format!("rask-remote-logger/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: Duration,
}

#[derive(Debug, Default)]
struct ClientStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_response_time_ms: AtomicU64,
}

impl ClientStats {
    fn record_request(&self, success: bool, response_time: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_ms
            .fetch_add(response_time.as_millis() as u64, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Connection factory backed by a pooled `reqwest` client.
///
/// Every request created by this factory shares the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpConnectionFactory {
    client: Client,
    config: HttpClientConfig,
    stats: Arc<ClientStats>,
}

impl HttpConnectionFactory {
    pub fn new(config: HttpClientConfig) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            stats: Arc::new(ClientStats::default()),
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        let total_requests = self.stats.total_requests.load(Ordering::Relaxed);
        let total_response_time = self.stats.total_response_time_ms.load(Ordering::Relaxed);

        let average_response_time = if total_requests > 0 {
            Duration::from_millis(total_response_time / total_requests)
        } else {
            Duration::ZERO
        };

        ConnectionStats {
            total_requests,
            successful_requests: self.stats.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.stats.failed_requests.load(Ordering::Relaxed),
            average_response_time,
        }
    }
}

impl ConnectionFactory for HttpConnectionFactory {
    type Request = HttpRequest;

    fn create(&self, endpoint: &Url) -> Result<HttpRequest, TransportError> {
        match endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "unsupported scheme '{other}' in {endpoint}"
                )));
            }
        }

        Ok(HttpRequest {
            client: self.client.clone(),
            url: endpoint.clone(),
            timeout: self.config.timeout,
            stats: self.stats.clone(),
        })
    }
}

/// A single POST to the collector.
#[derive(Debug)]
pub struct HttpRequest {
    client: Client,
    url: Url,
    timeout: Duration,
    stats: Arc<ClientStats>,
}

impl HttpRequest {
    fn build_headers(payload: &Payload) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(payload.content_type));

        if let Some(encoding) = payload.content_encoding {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding));
        }

        headers.insert(
            HeaderName::from_static(EVENT_ID_HEADER),
            HeaderValue::from_str(&payload.event_id.to_string()).map_err(|e| {
                TransportError::InvalidHeaderValue(format!("Invalid event ID: {}", e))
            })?,
        );
        headers.insert(
            HeaderName::from_static(VERSION_HEADER),
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );

        Ok(headers)
    }
}

impl OutboundRequest for HttpRequest {
    async fn send(self, payload: Payload) -> Result<u16, TransportError> {
        let headers = Self::build_headers(&payload)?;
        let start = Instant::now();

        let result = self
            .client
            .post(self.url)
            .headers(headers)
            .timeout(self.timeout)
            .body(payload.body)
            .send()
            .await;
        let latency = start.elapsed();

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                self.stats
                    .record_request(super::transport::is_accepted(status), latency);
                Ok(status)
            }
            Err(e) => {
                self.stats.record_request(false, latency);
                if e.is_timeout() {
                    Err(TransportError::Timeout(self.timeout))
                } else if e.is_connect() {
                    Err(TransportError::ConnectionFailed(e.to_string()))
                } else {
                    Err(TransportError::Network(e))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_endpoint() {
        let factory = HttpConnectionFactory::new(HttpClientConfig::default()).unwrap();
        let url = Url::parse("ftp://collector.local/logs").unwrap();
        assert!(matches!(
            factory.create(&url),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_default_user_agent_carries_version() {
        let config = HttpClientConfig::default();
        assert!(config.user_agent.starts_with("rask-remote-logger/"));
    }

    #[test]
    fn test_stats_start_empty() {
        let factory = HttpConnectionFactory::new(HttpClientConfig::default()).unwrap();
        assert_eq!(factory.connection_stats(), ConnectionStats::default());
    }
}
