//! Error types for the staff directory core.
//!
//! # Design
//! Two layers. `FetchError` is what the single-flight client reports and
//! knows nothing about staff data. `LoadError` is the directory service's
//! translation of it, and its `Display` output is the message shown to the
//! user, so every variant starts with the same generic sentence.

use thiserror::Error;

/// Leading sentence of every user-facing load failure.
pub const GENERIC_ERROR: &str =
    "There was an issue loading data. Please contact your app support.";

/// Errors reported by `SingleFlightClient::fetch`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The URL handed to `fetch` could not be parsed. No request was made.
    #[error("invalid url")]
    InvalidUrl,

    /// The transport failed, or answered with something other than a 200
    /// carrying a body.
    #[error("connection error: {0}")]
    Connection(String),

    /// Another request on the same client has not completed yet.
    #[error("another request is already in flight")]
    RequestAlreadyInFlight,
}

/// Errors delivered to `StaffDirectory` callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{} (Invalid remote address.)", GENERIC_ERROR)]
    InvalidAddress,

    /// Carries the transport's description verbatim.
    #[error("{} ({})", GENERIC_ERROR, .0)]
    Connection(String),

    /// The payload arrived but is not a JSON array of staff records.
    #[error("{} (Invalid remote data.)", GENERIC_ERROR)]
    InvalidData,

    /// Only produced under `SupersededPolicy::Notify`.
    #[error("{} (Another request is already running.)", GENERIC_ERROR)]
    Superseded,

    /// The request finished without reporting either a payload or an error.
    #[error("{}", GENERIC_ERROR)]
    Unknown,
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl => LoadError::InvalidAddress,
            FetchError::Connection(description) => LoadError::Connection(description),
            FetchError::RequestAlreadyInFlight => LoadError::Superseded,
        }
    }
}

/// Errors building a `SingleFlightClient`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no tokio runtime is running; use SingleFlightClient::with_runtime")]
    NoRuntime,
}

/// Errors validating a `DirectoryConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API host {0}: {1}")]
    InvalidUrl(String, String),
}
