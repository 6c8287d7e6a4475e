//! Error types for the ddns6 system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for ddns6 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ddns6 system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (always fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listing the host's interfaces or addresses failed
    #[error("Interface enumeration failed: {0}")]
    InterfaceEnumeration(String),

    /// Subscribing to network change notifications failed
    #[error("Network change subscription failed: {0}")]
    Subscription(String),

    /// Transport-level HTTP failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a non-success status
    #[error("Provider rejected update ({status}): {body}")]
    Provider {
        /// HTTP status code
        status: u16,
        /// Response body text, kept verbatim for diagnostics
        body: String,
    },

    /// JSON serialization errors (request bodies)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an interface enumeration error
    pub fn enumeration(msg: impl Into<String>) -> Self {
        Self::InterfaceEnumeration(msg.into())
    }

    /// Create a subscription error
    pub fn subscription(msg: impl Into<String>) -> Self {
        Self::Subscription(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider rejection error
    pub fn provider(status: u16, body: impl Into<String>) -> Self {
        Self::Provider {
            status,
            body: body.into(),
        }
    }

    /// Whether this error is a startup configuration problem
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_keeps_body_in_message() {
        let err = Error::provider(400, r#"{"error":"invalid"}"#);
        let text = err.to_string();
        assert!(text.contains("400"));
        assert!(text.contains("invalid"));
    }

    #[test]
    fn config_errors_are_flagged() {
        assert!(Error::config("missing api key").is_config());
        assert!(!Error::http("timeout").is_config());
    }
}
