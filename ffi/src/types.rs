//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, boxed slices behind a pointer and a
//! length instead of `Vec`, and enums with explicit discriminants.
//! Conversion and release helpers live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::time::Duration;

use deskbook_core::{LoadError, StaffDirectory, StaffRecord, SupersededPolicy};

/// How long `deskbook_directory_free` waits for an outstanding request.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Opaque handle to a `StaffDirectory` and the runtime it dispatches onto.
pub struct FfiDirectory {
    pub(crate) inner: StaffDirectory,
    pub(crate) runtime: tokio::runtime::Runtime,
}

impl FfiDirectory {
    /// Drop the directory, then stop the runtime. A request still in flight
    /// gets `SHUTDOWN_TIMEOUT` to finish; its callback may not run.
    pub(crate) fn shutdown(self) {
        let FfiDirectory { inner, runtime } = self;
        drop(inner);
        runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    }
}

/// Called once per answered `deskbook_load_staff_list`, on a worker thread.
///
/// The callee owns `result` and must release it with `deskbook_free_result`.
pub type FfiStaffCallback = extern "C" fn(result: *mut FfiStaffResult, user_data: *mut c_void);

/// Caller context handed back to the callback untouched.
pub(crate) struct UserData(*mut c_void);

// The pointer is never dereferenced on the Rust side; thread-safety of
// whatever it points at is the host's contract.
unsafe impl Send for UserData {}

impl UserData {
    pub(crate) fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub(crate) fn into_raw(self) -> *mut c_void {
        self.0
    }
}

/// What happens to a load started while another is still running.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiSupersededPolicy {
    /// The callback is never invoked.
    Drop = 0,
    /// The callback receives a `Superseded` result.
    Notify = 1,
}

impl From<FfiSupersededPolicy> for SupersededPolicy {
    fn from(policy: FfiSupersededPolicy) -> Self {
        match policy {
            FfiSupersededPolicy::Drop => SupersededPolicy::Drop,
            FfiSupersededPolicy::Notify => SupersededPolicy::Notify,
        }
    }
}

/// Status codes for FFI calls and load results.
///
/// `Superseded` only reaches a callback on a directory created with
/// `FfiSupersededPolicy::Notify`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidAddress = 1,
    Connection = 2,
    InvalidData = 3,
    Superseded = 4,
    Unknown = 5,
    Panic = 6,
    NullArg = 7,
}

impl From<&LoadError> for FfiErrorCode {
    fn from(err: &LoadError) -> Self {
        match err {
            LoadError::InvalidAddress => FfiErrorCode::InvalidAddress,
            LoadError::Connection(_) => FfiErrorCode::Connection,
            LoadError::InvalidData => FfiErrorCode::InvalidData,
            LoadError::Superseded => FfiErrorCode::Superseded,
            LoadError::Unknown => FfiErrorCode::Unknown,
        }
    }
}

/// A staff member exposed to C. Every string is NUL-terminated UTF-8.
#[repr(C)]
pub struct FfiStaff {
    pub id: i64,
    pub name: *mut c_char,
    pub mobile: *mut c_char,
    pub email: *mut c_char,
    pub image: *mut c_char,
    pub department: *mut c_char,
    pub title: *mut c_char,
    pub bio: *mut c_char,
    pub twitter_handle: *mut c_char,
}

impl FfiStaff {
    fn from_core(record: StaffRecord) -> Self {
        FfiStaff {
            id: record.id,
            name: to_c_string(record.name),
            mobile: to_c_string(record.mobile),
            email: to_c_string(record.email),
            image: to_c_string(record.image),
            department: to_c_string(record.department),
            title: to_c_string(record.title),
            bio: to_c_string(record.bio),
            twitter_handle: to_c_string(record.twitter_handle),
        }
    }

    /// Free the C-string fields (but not the struct itself).
    ///
    /// # Safety
    /// Every non-null field must have come from `to_c_string`.
    unsafe fn free_fields(&self) {
        for field in [
            self.name,
            self.mobile,
            self.email,
            self.image,
            self.department,
            self.title,
            self.bio,
            self.twitter_handle,
        ] {
            free_c_string(field);
        }
    }
}

/// A list of staff members exposed to C. `len` is a `size_t`.
#[repr(C)]
pub struct FfiStaffList {
    pub items: *mut FfiStaff,
    pub len: usize,
}

/// Result envelope delivered to `FfiStaffCallback`.
///
/// On success `error_code` is `Ok`, `error_message` is null and `staff`
/// points at the list. On failure `error_message` is the user-facing message
/// and `staff` is null.
#[repr(C)]
pub struct FfiStaffResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub staff: *mut FfiStaffList,
}

impl FfiStaffResult {
    pub(crate) fn ok(staff: Vec<StaffRecord>) -> *mut Self {
        let items: Box<[FfiStaff]> = staff.into_iter().map(FfiStaff::from_core).collect();
        let len = items.len();
        let items = if items.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(items) as *mut FfiStaff
        };

        let list = Box::new(FfiStaffList { items, len });
        Box::into_raw(Box::new(FfiStaffResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            staff: Box::into_raw(list),
        }))
    }

    pub(crate) fn from_error(err: &LoadError) -> *mut Self {
        Box::into_raw(Box::new(FfiStaffResult {
            error_code: err.into(),
            error_message: to_c_string(err.to_string()),
            staff: std::ptr::null_mut(),
        }))
    }

    /// Release a result built by `ok` or `from_error`.
    ///
    /// # Safety
    /// `result` must be non-null, come from this module and not be freed yet.
    pub(crate) unsafe fn free(result: *mut Self) {
        let result = Box::from_raw(result);
        free_c_string(result.error_message);
        if result.staff.is_null() {
            return;
        }
        let list = Box::from_raw(result.staff);
        if list.items.is_null() || list.len == 0 {
            return;
        }
        let items = Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            list.items,
            list.len,
        ));
        for item in items.iter() {
            item.free_fields();
        }
    }
}

/// Convert to a C string, dropping interior NUL bytes.
pub(crate) fn to_c_string(value: String) -> *mut c_char {
    let value = if value.contains('\0') {
        value.replace('\0', "")
    } else {
        value
    };
    CString::new(value).unwrap_or_default().into_raw()
}

/// Free a string from `to_c_string`. Null is ignored.
///
/// # Safety
/// `ptr` must be null or come from `to_c_string` and not be freed yet.
pub(crate) unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}
