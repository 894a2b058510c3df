//! Directory service configuration.
//!
//! The API host is owned here rather than by the HTTP client, which stays
//! URL-agnostic. `DirectoryConfig::new` accepts any string so that a bad
//! host surfaces as a load failure; `DirectoryConfig::parse` validates up
//! front for callers that would rather fail at construction.

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_HOST: &str = "http://localhost:3000/api";

/// Path of the staff list, relative to the API host.
pub const STAFF_LIST_PATH: &str = "staff2";

/// What happens to a `load_staff_list` call made while another is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupersededPolicy {
    /// The callback is dropped without being invoked.
    #[default]
    Drop,
    /// The callback receives `LoadError::Superseded`.
    Notify,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    api_host: String,
    pub superseded: SupersededPolicy,
}

impl DirectoryConfig {
    pub fn new(api_host: &str) -> Self {
        Self {
            api_host: api_host.trim_end_matches('/').to_string(),
            superseded: SupersededPolicy::default(),
        }
    }

    /// Like `new`, but rejects hosts that are not absolute URLs.
    pub fn parse(api_host: &str) -> Result<Self, ConfigError> {
        Url::parse(api_host)
            .map_err(|e| ConfigError::InvalidUrl(api_host.to_string(), e.to_string()))?;
        Ok(Self::new(api_host))
    }

    pub fn with_superseded(mut self, policy: SupersededPolicy) -> Self {
        self.superseded = policy;
        self
    }

    pub fn api_host(&self) -> &str {
        &self.api_host
    }

    pub fn staff_list_url(&self) -> String {
        format!("{}/{STAFF_LIST_PATH}", self.api_host)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_HOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_api() {
        let config = DirectoryConfig::default();
        assert_eq!(config.staff_list_url(), "http://localhost:3000/api/staff2");
        assert_eq!(config.superseded, SupersededPolicy::Drop);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = DirectoryConfig::new("http://staff.test/api/");
        assert_eq!(config.api_host(), "http://staff.test/api");
        assert_eq!(config.staff_list_url(), "http://staff.test/api/staff2");
    }

    #[test]
    fn parse_rejects_relative_host() {
        let err = DirectoryConfig::parse("not a host").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(ref host, _) if host == "not a host"));
    }

    #[test]
    fn parse_accepts_absolute_host() {
        let config = DirectoryConfig::parse("https://staff.test/api").unwrap();
        assert_eq!(config.staff_list_url(), "https://staff.test/api/staff2");
    }

    #[test]
    fn new_keeps_unparsable_host() {
        let config = DirectoryConfig::new("not a host");
        assert_eq!(config.staff_list_url(), "not a host/staff2");
    }

    #[test]
    fn with_superseded_overrides_policy() {
        let config = DirectoryConfig::default().with_superseded(SupersededPolicy::Notify);
        assert_eq!(config.superseded, SupersededPolicy::Notify);
    }
}
