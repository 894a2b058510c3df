//! Staff record as served by the directory API.
//!
//! # Design
//! This type mirrors the mock-server's schema but is defined independently;
//! integration tests catch any drift between the two crates. Every field is
//! required, so a missing or mistyped field fails the whole decode.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single staff member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffRecord {
    pub id: i64,
    pub name: String,
    pub mobile: String,
    pub email: String,
    /// Image URI or asset reference.
    pub image: String,
    pub department: String,
    pub title: String,
    /// Raw markup fragment, rendered by the host.
    pub bio: String,
    #[serde(rename = "twitter")]
    pub twitter_handle: String,
}

impl StaffRecord {
    /// The mobile number with everything but its digits removed, suitable
    /// for a `tel:` URI.
    pub fn mobile_digits(&self) -> String {
        digits_only(&self.mobile)
    }
}

impl fmt::Display for StaffRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name: {} email: {}", self.name, self.email)
    }
}

/// Keep only the ASCII digits of `s`.
///
/// Digits from other scripts (Arabic-Indic, fullwidth and so on) are dropped
/// along with the punctuation: a `tel:` URI only carries ASCII digits, so
/// keeping them would produce a number the dialer cannot use.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}
