//! Transport seam between the single-flight client and the network.
//!
//! # Design
//! `Transport` is a blocking, one-method trait: given a parsed URL, perform a
//! GET and report either the raw response or a connection-level failure. The
//! client runs it on the tokio blocking pool, so implementations are free to
//! block. Status interpretation belongs to the client, not the transport:
//! `UreqTransport` turns off ureq's status-as-error behavior so 4xx/5xx
//! responses come back as data.

use std::sync::Arc;

use thiserror::Error;
use url::Url;

/// A raw HTTP response as seen by the client.
///
/// `body` is `None` when the transport had no body to hand over at all, which
/// is distinct from an empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<Vec<u8>>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: Some(body.into()),
        }
    }

    /// A response with a status line and nothing else.
    pub fn without_body(status: u16) -> Self {
        Self { status, body: None }
    }
}

/// The transport could not complete the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct TransportError {
    pub description: String,
}

impl TransportError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Executes a single GET request.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        (**self).get(url)
    }
}

/// `Transport` backed by a ureq agent with default timeouts.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let mut response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::new(e.to_string()))?;

        Ok(TransportResponse {
            status,
            body: Some(body),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_response_carries_body() {
        let response = TransportResponse::new(200, b"[]".to_vec());
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_deref(), Some(&b"[]"[..]));
    }

    #[test]
    fn without_body_has_no_body() {
        let response = TransportResponse::without_body(204);
        assert!(response.body.is_none());
    }

    #[test]
    fn transport_error_displays_description() {
        assert_eq!(TransportError::new("timeout").to_string(), "timeout");
    }

    #[test]
    fn ureq_transport_reports_refused_connection() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/api/staff2")).unwrap();
        let err = UreqTransport::new().get(&url).unwrap_err();
        assert!(!err.description.is_empty());
    }
}
