pub mod http;
pub mod payload;
pub mod transport;

pub use http::{ConnectionStats, HttpClientConfig, HttpConnectionFactory, HttpRequest};
pub use payload::{GelfMessage, PayloadEncoder};
pub use transport::{
    ACCEPTED_STATUSES, ConnectionFactory, JSON_CONTENT_TYPE, OutboundRequest, Payload,
    TransportError, is_accepted,
};
