//! C-ABI wrapper around `deskbook-core`.
//!
//! # Overview
//! Lets a mobile host load the staff directory through plain C calls. The
//! host creates a directory handle, asks for the staff list and receives the
//! outcome through a callback on a worker thread.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Each `FfiDirectory` owns a small tokio runtime; the single-flight
//!   client dispatches onto it, and callbacks run on its worker threads.
//! - A load that loses the single-flight race is never answered, unless the
//!   directory was created with `FfiSupersededPolicy::Notify`.
//! - The host owns every result handed to its callback and must release it
//!   with `deskbook_free_result`; strings from `deskbook_staff_mobile_digits`
//!   are released with `deskbook_free_string`.

pub mod types;

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use deskbook_core::types::digits_only;
use deskbook_core::{DirectoryConfig, SingleFlightClient, StaffDirectory, UreqTransport};
use tracing_subscriber::EnvFilter;

use types::*;

const DEFAULT_LOG_FILTER: &str = "deskbook_core=info";

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a `tracing` subscriber writing to stderr.
///
/// `filter` is an `EnvFilter` directive such as `"deskbook_core=debug"`;
/// null selects `deskbook_core=info`. Returns false if a subscriber was
/// already installed or the directive does not parse.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_init_logging(filter: *const c_char) -> bool {
    catch_unwind(|| {
        let directive = if filter.is_null() {
            DEFAULT_LOG_FILTER
        } else {
            match unsafe { CStr::from_ptr(filter) }.to_str() {
                Ok(s) => s,
                Err(_) => return false,
            }
        };
        let Ok(env_filter) = EnvFilter::try_new(directive) else {
            return false;
        };
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Directory lifecycle
// ---------------------------------------------------------------------------

/// Create a staff directory for `api_host`, e.g. `http://localhost:3000/api`.
///
/// Returns null if `api_host` is null, not UTF-8 or not an absolute URL, or
/// if the worker runtime cannot be started.
/// The caller must free the returned pointer with `deskbook_directory_free`.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_directory_new(api_host: *const c_char) -> *mut FfiDirectory {
    deskbook_directory_new_with_policy(api_host, FfiSupersededPolicy::Drop)
}

/// Like `deskbook_directory_new`, choosing how a load that overlaps a running
/// one is answered.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_directory_new_with_policy(
    api_host: *const c_char,
    superseded: FfiSupersededPolicy,
) -> *mut FfiDirectory {
    catch_unwind(|| {
        if api_host.is_null() {
            return std::ptr::null_mut();
        }
        let Ok(host) = unsafe { CStr::from_ptr(api_host) }.to_str() else {
            return std::ptr::null_mut();
        };
        let config = match DirectoryConfig::parse(host) {
            Ok(config) => config.with_superseded(superseded.into()),
            Err(err) => {
                tracing::warn!(error = %err, "refusing directory handle");
                return std::ptr::null_mut();
            }
        };
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("deskbook-worker")
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::warn!(error = %err, "cannot start directory runtime");
                return std::ptr::null_mut();
            }
        };

        let client =
            SingleFlightClient::with_runtime(UreqTransport::new(), runtime.handle().clone());
        let directory = FfiDirectory {
            inner: StaffDirectory::new(client, config),
            runtime,
        };
        Box::into_raw(Box::new(directory))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a directory created by `deskbook_directory_new`. Safe to call with
/// null.
///
/// Blocks for up to five seconds while an outstanding request finishes. Must
/// not be called from inside a load callback.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_directory_free(dir: *mut FfiDirectory) {
    if !dir.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            unsafe { Box::from_raw(dir) }.shutdown();
        }));
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Start loading the staff list.
///
/// Returns `NullArg` if `dir` or `callback` is null, otherwise `Ok`. The
/// callback later receives the result and `user_data` on a worker thread.
/// If another load on the same directory is still running, the callback is
/// never called, or receives `Superseded` under
/// `FfiSupersededPolicy::Notify`.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_load_staff_list(
    dir: *const FfiDirectory,
    callback: Option<FfiStaffCallback>,
    user_data: *mut c_void,
) -> FfiErrorCode {
    catch_unwind(AssertUnwindSafe(|| {
        if dir.is_null() {
            return FfiErrorCode::NullArg;
        }
        let Some(callback) = callback else {
            return FfiErrorCode::NullArg;
        };
        let dir = unsafe { &*dir };
        let user_data = UserData::new(user_data);

        dir.inner.load_staff_list(move |result| {
            let ffi_result = match result {
                Ok(staff) => FfiStaffResult::ok(staff),
                Err(err) => FfiStaffResult::from_error(&err),
            };
            callback(ffi_result, user_data.into_raw());
        });
        FfiErrorCode::Ok
    }))
    .unwrap_or(FfiErrorCode::Panic)
}

/// Whether a load is currently outstanding on `dir`. False for null.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_directory_is_busy(dir: *const FfiDirectory) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if dir.is_null() {
            return false;
        }
        unsafe { &*dir }.inner.client().is_busy()
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Staff helpers
// ---------------------------------------------------------------------------

/// Digits of the staff member's mobile number, for building a `tel:` URI.
///
/// Returns null if `staff` or its `mobile` field is null.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_staff_mobile_digits(staff: *const FfiStaff) -> *mut c_char {
    catch_unwind(|| {
        if staff.is_null() {
            return std::ptr::null_mut();
        }
        let staff = unsafe { &*staff };
        if staff.mobile.is_null() {
            return std::ptr::null_mut();
        }
        let mobile = unsafe { CStr::from_ptr(staff.mobile) }.to_string_lossy();
        to_c_string(digits_only(&mobile))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a result handed to a `FfiStaffCallback`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_free_result(result: *mut FfiStaffResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiStaffResult::free(result) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn deskbook_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| unsafe { free_c_string(s) });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
