//! HTTP client that allows a single outstanding request at a time.
//!
//! # Design
//! `SingleFlightClient` owns one piece of shared mutable state: the handle of
//! the request currently in flight, behind a `Mutex`. `start` checks and
//! registers that handle in one lock acquisition, so a new caller and a
//! completing request can never both observe an idle client. The transport
//! call then runs on the tokio blocking pool and reports back through a
//! oneshot channel.
//!
//! Completion clears the handle before the outcome is sent, so anyone who
//! has seen a result can immediately start the next request. The clear also
//! runs on drop, which covers a panicking transport and a runtime that
//! discards the task.
//!
//! Nothing under the lock does I/O or runs caller code.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, FetchError};
use crate::http::{Transport, TransportError, TransportResponse};

/// Description used when a request ends without a usable answer.
pub const UNKNOWN_ERROR: &str = "Unknown Error";

type Outcome = Result<Vec<u8>, FetchError>;

#[derive(Debug)]
struct InFlight {
    id: u64,
    url: Url,
}

type RequestState = Arc<Mutex<Option<InFlight>>>;

fn lock(state: &Mutex<Option<InFlight>>) -> MutexGuard<'_, Option<InFlight>> {
    // The guarded value is a plain Option and is valid even after a panic.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Delivers the outcome of one accepted request.
///
/// The in-flight handle is cleared before the outcome is sent, and also on
/// drop, so an abandoned or panicking request still frees the client.
struct Completion {
    state: RequestState,
    id: u64,
    tx: Option<oneshot::Sender<Outcome>>,
}

impl Completion {
    fn release(&self) {
        let mut state = lock(&self.state);
        // A later request may already own the slot.
        if state.as_ref().is_some_and(|current| current.id == self.id) {
            *state = None;
        }
    }

    fn finish(mut self, outcome: Outcome) {
        self.release();
        if let Some(tx) = self.tx.take() {
            if tx.send(outcome).is_err() {
                debug!(request_id = self.id, "caller went away before completion");
            }
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.release();
    }
}

/// Single-flight HTTP GET client.
///
/// URL-agnostic: the caller supplies the full URL on every `fetch`.
pub struct SingleFlightClient {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    state: RequestState,
    next_id: AtomicU64,
}

impl SingleFlightClient {
    /// Build a client that dispatches onto the current tokio runtime.
    pub fn new(transport: impl Transport) -> Result<Self, ClientError> {
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        Ok(Self::with_runtime(transport, runtime))
    }

    pub fn with_runtime(transport: impl Transport, runtime: Handle) -> Self {
        Self {
            transport: Arc::new(transport),
            runtime,
            state: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Runtime the client dispatches requests onto.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Whether a request is currently outstanding.
    pub fn is_busy(&self) -> bool {
        lock(&self.state).is_some()
    }

    /// Fetch `url`, resolving to the response body.
    ///
    /// Admission happens before this returns: if another request is in
    /// flight, or `url` does not parse, the returned future is already
    /// resolved with the error and nothing is sent.
    pub fn fetch(&self, url: &str) -> impl Future<Output = Outcome> + Send + 'static {
        let started = self.start(url);
        async move { started?.await }
    }

    /// Admit and dispatch a request, returning a handle to its completion.
    ///
    /// Fails synchronously with `RequestAlreadyInFlight` or `InvalidUrl`;
    /// neither failure touches the in-flight state.
    pub fn start(&self, url: &str) -> Result<PendingFetch, FetchError> {
        let (id, parsed) = {
            let mut state = lock(&self.state);
            if let Some(current) = state.as_ref() {
                debug!(in_flight = current.id, url = %current.url, "rejecting request, another is in flight");
                return Err(FetchError::RequestAlreadyInFlight);
            }
            let parsed = Url::parse(url).map_err(|err| {
                debug!(url, error = %err, "rejecting request with invalid url");
                FetchError::InvalidUrl
            })?;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            *state = Some(InFlight {
                id,
                url: parsed.clone(),
            });
            (id, parsed)
        };

        debug!(request_id = id, url = %parsed, "request accepted");

        let (tx, rx) = oneshot::channel();
        let completion = Completion {
            state: Arc::clone(&self.state),
            id,
            tx: Some(tx),
        };
        let transport = Arc::clone(&self.transport);

        // Dropping the JoinHandle detaches the task; it runs to completion.
        self.runtime.spawn_blocking(move || {
            let response = transport.get(&parsed);
            completion.finish(classify(id, response));
        });

        Ok(PendingFetch { id, rx })
    }
}

impl fmt::Debug for SingleFlightClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlightClient")
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

/// Map a transport result onto the client's outcome.
fn classify(id: u64, response: Result<TransportResponse, TransportError>) -> Outcome {
    match response {
        Err(err) => {
            warn!(request_id = id, error = %err, "request failed");
            Err(FetchError::Connection(err.description))
        }
        Ok(TransportResponse {
            status: 200,
            body: Some(body),
        }) => {
            debug!(request_id = id, bytes = body.len(), "request completed");
            Ok(body)
        }
        Ok(TransportResponse { status, body }) => {
            warn!(
                request_id = id,
                status,
                has_body = body.is_some(),
                "request completed without a usable response"
            );
            Err(FetchError::Connection(UNKNOWN_ERROR.to_string()))
        }
    }
}

/// Completion of an accepted request.
///
/// Awaiting it yields the outcome; dropping it does not cancel the request.
#[derive(Debug)]
pub struct PendingFetch {
    id: u64,
    rx: oneshot::Receiver<Outcome>,
}

impl PendingFetch {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the outcome, or `None` if the request ended without
    /// reporting one (the worker panicked or was discarded).
    pub async fn settled(self) -> Option<Outcome> {
        self.rx.await.ok()
    }
}

/// Awaiting directly folds "ended without an outcome" into
/// `Connection(UNKNOWN_ERROR)`, the same answer as any other response the
/// client cannot use, because the outcome type has no variant for it. Use
/// `settled` to tell the two apart, as `StaffDirectory` does to report
/// `LoadError::Unknown`.
impl Future for PendingFetch {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(FetchError::Connection(UNKNOWN_ERROR.to_string())))
        })
    }
}
