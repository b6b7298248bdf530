//! Secret values for credentials.
//!
//! Credential material is wrapped in [`Secret`] so it never leaks through `Debug`,
//! `Display` or request traces. Only the auth header strategy reads the plain value.

use reqwest::header::HeaderMap;
use std::fmt;

/// Placeholder printed wherever a secret would otherwise appear.
pub const REDACTED: &str = "[REDACTED]";

/// Header names whose values are replaced by [`REDACTED`] in debug traces.
const SENSITIVE_HEADERS: [&str; 9] = [
    "authorization",
    "x-api-key",
    "x-api-secret",
    "x-server-uuid",
    "x-server-secret",
    "server-uuid",
    "server-secret",
    "x-monitoring-key",
    "x-registration-key",
];

/// A credential value that is redacted in all formatted output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Plain value, for building auth headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when the value is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Returns `None` for absent or blank values so they count as "not configured".
pub(crate) fn non_blank(value: Option<&Secret>) -> Option<&Secret> {
    value.filter(|s| !s.is_blank())
}

/// Render headers for a debug trace with credential values replaced.
pub fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name = name.as_str().to_string();
            let shown = if value.is_sensitive() || SENSITIVE_HEADERS.contains(&name.as_str()) {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name, shown)
        })
        .collect()
}
