//! Registry settings section.
//!
//! Loaded leniently: a missing section means defaults, an invalid one is an
//! error. The group here is the discovery fallback for descriptors that
//! carry no group of their own.

use serde::Deserialize;
use std::time::Duration;

/// Process-level defaults for a [`ServiceRegistry`](crate::ServiceRegistry).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Discovery group used when a descriptor has none.
    pub group: String,
    /// Default invocation timeout for declaratively wired references.
    pub default_timeout_ms: u64,
    /// Initial state of the proxy cache flag.
    pub cache_proxies: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            group: String::new(),
            default_timeout_ms: 5_000,
            cache_proxies: true,
        }
    }
}

impl RegistrySettings {
    /// Lenient loader over a raw config section: absent section means
    /// defaults, present-but-invalid is an error.
    ///
    /// # Errors
    /// Returns the deserialization error when the section cannot be parsed.
    pub fn from_section(section: Option<&serde_json::Value>) -> Result<Self, serde_json::Error> {
        match section {
            None => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone()),
        }
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
