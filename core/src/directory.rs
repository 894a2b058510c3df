//! Staff directory service on top of the single-flight client.
//!
//! # Design
//! `StaffDirectory` builds the staff list URL from its config, hands it to
//! the client and turns the outcome into either decoded records or a
//! user-facing `LoadError`. A call that loses the single-flight race is
//! answered according to `SupersededPolicy`; by default it is never
//! answered at all.
//!
//! `settle` and `decode_staff_list` hold the mapping and are public so the
//! mapping can be checked without a transport.

use std::future::Future;

use tracing::{debug, warn};

use crate::client::SingleFlightClient;
use crate::config::{DirectoryConfig, SupersededPolicy};
use crate::error::{FetchError, LoadError};
use crate::types::StaffRecord;

pub type LoadResult = Result<Vec<StaffRecord>, LoadError>;

#[derive(Debug)]
pub struct StaffDirectory {
    client: SingleFlightClient,
    config: DirectoryConfig,
}

impl StaffDirectory {
    pub fn new(client: SingleFlightClient, config: DirectoryConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &SingleFlightClient {
        &self.client
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Fetch and decode the staff list.
    ///
    /// Resolves to `None` when the call was superseded and the policy is
    /// `SupersededPolicy::Drop`.
    pub fn staff_list(&self) -> impl Future<Output = Option<LoadResult>> + Send + 'static {
        let started = self.client.start(&self.config.staff_list_url());
        let policy = self.config.superseded;
        async move {
            let outcome = match started {
                Ok(pending) => pending.settled().await,
                Err(err) => Some(Err(err)),
            };
            settle(outcome, policy)
        }
    }

    /// Load the staff list and hand the result to `on_complete`.
    ///
    /// Returns immediately. `on_complete` runs on the client's runtime, at
    /// most once, and not at all for a dropped superseded call.
    pub fn load_staff_list<F>(&self, on_complete: F)
    where
        F: FnOnce(LoadResult) + Send + 'static,
    {
        let load = self.staff_list();
        self.client.runtime().spawn(async move {
            match load.await {
                Some(result) => on_complete(result),
                None => debug!("superseded staff list load dropped"),
            }
        });
    }
}

/// Turn a fetch outcome into what the caller receives.
///
/// `None` as input means the request finished with neither a payload nor an
/// error. `None` as output means the caller is not answered.
pub fn settle(
    outcome: Option<Result<Vec<u8>, FetchError>>,
    policy: SupersededPolicy,
) -> Option<LoadResult> {
    match outcome {
        Some(Ok(payload)) => Some(decode_staff_list(&payload)),
        Some(Err(FetchError::RequestAlreadyInFlight)) => match policy {
            SupersededPolicy::Drop => None,
            SupersededPolicy::Notify => Some(Err(LoadError::Superseded)),
        },
        Some(Err(err)) => Some(Err(err.into())),
        None => {
            warn!("staff list request ended without payload or error");
            Some(Err(LoadError::Unknown))
        }
    }
}

/// Decode a JSON array of staff records.
pub fn decode_staff_list(payload: &[u8]) -> LoadResult {
    serde_json::from_slice(payload).map_err(|err| {
        warn!(error = %err, "staff list payload did not decode");
        LoadError::InvalidData
    })
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::http::testing::{CannedTransport, GatedTransport, PanickingTransport};
    use crate::http::{Transport, TransportError, TransportResponse};

    const ADA: &str = r#"[{"id":1,"name":"Ada","mobile":"555-1234","email":"a@x.com","image":"","department":"Eng","title":"Dev","bio":"","twitter":""}]"#;

    fn directory(transport: impl Transport) -> StaffDirectory {
        let client = SingleFlightClient::new(transport).unwrap();
        StaffDirectory::new(client, DirectoryConfig::new("http://staff.test/api"))
    }

    #[test]
    fn decode_accepts_staff_array() {
        let staff = decode_staff_list(ADA.as_bytes()).unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].id, 1);
        assert_eq!(staff[0].name, "Ada");
    }

    #[test]
    fn decode_rejects_object() {
        let err = decode_staff_list(br#"{"not":"an array"}"#).unwrap_err();
        assert_eq!(err, LoadError::InvalidData);
        assert!(err.to_string().contains("Invalid remote data."));
    }

    #[test]
    fn decode_rejects_empty_body() {
        assert_eq!(decode_staff_list(b""), Err(LoadError::InvalidData));
    }

    #[test]
    fn settle_drops_superseded_by_default() {
        let outcome = Some(Err(FetchError::RequestAlreadyInFlight));
        assert_eq!(settle(outcome, SupersededPolicy::Drop), None);
    }

    #[test]
    fn settle_notifies_superseded_when_asked() {
        let outcome = Some(Err(FetchError::RequestAlreadyInFlight));
        assert_eq!(
            settle(outcome, SupersededPolicy::Notify),
            Some(Err(LoadError::Superseded))
        );
    }

    #[test]
    fn settle_without_payload_or_error_is_generic() {
        let result = settle(None, SupersededPolicy::Drop).unwrap();
        let err = result.unwrap_err();
        assert_eq!(err, LoadError::Unknown);
        assert_eq!(err.to_string(), crate::error::GENERIC_ERROR);
    }

    #[test]
    fn settle_invalid_url_names_remote_address() {
        let result = settle(Some(Err(FetchError::InvalidUrl)), SupersededPolicy::Drop).unwrap();
        assert!(result
            .unwrap_err()
            .to_string()
            .ends_with("(Invalid remote address.)"));
    }

    #[tokio::test]
    async fn staff_list_decodes_success() {
        let transport = CannedTransport::new(Ok(TransportResponse::new(200, ADA)));
        let staff = directory(transport).staff_list().await.unwrap().unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].name, "Ada");
    }

    #[tokio::test]
    async fn staff_list_reports_connection_description() {
        let transport = CannedTransport::new(Err(TransportError::new("timeout")));
        let err = directory(transport).staff_list().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn invalid_host_reports_remote_address() {
        let transport = CannedTransport::new(Ok(TransportResponse::new(200, ADA)));
        let client = SingleFlightClient::new(Arc::clone(&transport)).unwrap();
        let directory = StaffDirectory::new(client, DirectoryConfig::new("not a host"));

        let err = directory.staff_list().await.unwrap().unwrap_err();
        assert_eq!(err, LoadError::InvalidAddress);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn panicking_transport_yields_generic_error() {
        let err = directory(PanickingTransport)
            .staff_list()
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(err, LoadError::Unknown);
    }

    #[tokio::test]
    async fn load_staff_list_calls_back_once() {
        let transport = CannedTransport::new(Ok(TransportResponse::new(200, ADA)));
        let directory = directory(transport);
        let (tx, rx) = mpsc::channel();

        directory.load_staff_list(move |result| tx.send(result).unwrap());

        let result = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.unwrap()[0].id, 1);
    }

    #[tokio::test]
    async fn superseded_load_is_never_answered() {
        let (transport, gate) = GatedTransport::new();
        let directory = directory(Arc::clone(&transport));
        let (first_tx, first_rx) = mpsc::channel();
        let (second_tx, second_rx) = mpsc::channel::<LoadResult>();

        directory.load_staff_list(move |result| first_tx.send(result).unwrap());
        directory.load_staff_list(move |result| second_tx.send(result).unwrap());

        gate.send(Ok(TransportResponse::new(200, ADA))).unwrap();

        let (first, second) = tokio::task::spawn_blocking(move || {
            let first = first_rx.recv_timeout(Duration::from_secs(5));
            let second = second_rx.recv_timeout(Duration::from_millis(200));
            (first, second)
        })
        .await
        .unwrap();

        assert_eq!(first.unwrap().unwrap()[0].name, "Ada");
        // The second callback was dropped unused, closing its channel.
        assert_eq!(second, Err(mpsc::RecvTimeoutError::Disconnected));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn superseded_load_is_notified_under_notify_policy() {
        let (transport, gate) = GatedTransport::new();
        let client = SingleFlightClient::new(transport).unwrap();
        let config =
            DirectoryConfig::new("http://staff.test/api").with_superseded(SupersededPolicy::Notify);
        let directory = StaffDirectory::new(client, config);

        let first = directory.staff_list();
        let second = directory.staff_list().await;
        assert_eq!(second, Some(Err(LoadError::Superseded)));

        gate.send(Ok(TransportResponse::new(200, ADA))).unwrap();
        assert!(first.await.unwrap().is_ok());
    }
}
