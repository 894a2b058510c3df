//! Staff directory client core.
//!
//! # Overview
//! Loads the staff list from the directory API for a host application that
//! renders it. Two layers:
//!
//! - `SingleFlightClient` performs HTTP GETs through a `Transport`, allowing
//!   at most one outstanding request per client and rejecting the rest.
//! - `StaffDirectory` builds the staff list URL, decodes the JSON array into
//!   `StaffRecord`s and turns failures into user-facing messages.
//!
//! # Design
//! - The transport is blocking and runs on the tokio blocking pool; results
//!   come back through futures, or a callback for `load_staff_list`.
//! - The client is URL-agnostic; the API host lives in `DirectoryConfig`.
//! - No retries, no caller-side cancellation, no persistence.

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod types;

pub use client::{PendingFetch, SingleFlightClient};
pub use config::{DirectoryConfig, SupersededPolicy};
pub use directory::{LoadResult, StaffDirectory};
pub use error::{ClientError, ConfigError, FetchError, LoadError};
pub use http::{Transport, TransportError, TransportResponse, UreqTransport};
pub use types::StaffRecord;
