use bytes::Bytes;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Status codes the collector uses to acknowledge an event.
pub const ACCEPTED_STATUSES: [u16; 2] = [200, 202];

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Bad Request! status code {status}")]
    Rejected { status: u16 },
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(String),
}

/// Whether a response status counts as a successful delivery.
pub fn is_accepted(status: u16) -> bool {
    ACCEPTED_STATUSES.contains(&status)
}

/// One encoded event, ready to be written to a request body.
#[derive(Debug, Clone)]
pub struct Payload {
    pub event_id: Uuid,
    pub content_type: &'static str,
    pub content_encoding: Option<&'static str>,
    pub body: Bytes,
}

/// An outbound request already bound to the destination address.
///
/// `send` writes the payload as a POST body and resolves to the response
/// status code. Interpreting the status is left to the caller.
pub trait OutboundRequest: Send {
    fn send(self, payload: Payload) -> impl Future<Output = Result<u16, TransportError>> + Send;
}

/// Produces one [`OutboundRequest`] per delivery attempt.
pub trait ConnectionFactory: Send + Sync + 'static {
    type Request: OutboundRequest;

    fn create(&self, endpoint: &Url) -> Result<Self::Request, TransportError>;
}
