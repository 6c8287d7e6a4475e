//! Configuration types for the ddns6 system
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is loaded once at startup and validated before any network
//! I/O happens; a validation failure is fatal.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default bounded timeout for a single provider request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// TTL value Cloudflare interprets as "automatic"
pub const AUTOMATIC_TTL: u32 = 1;

/// Main ddns6 configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Account email sent as `X-Auth-Email`
    pub email: String,

    /// API key sent as a bearer token
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// DNS records to keep pointed at this host
    pub targets: Vec<RecordTarget>,

    /// Override for the provider's zones endpoint
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TTL to send with each update (omitted from the request when unset)
    #[serde(default)]
    pub ttl: Option<u32>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

// Custom Debug implementation that hides the API key
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .field("targets", &self.targets)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("ttl", &self.ttl)
            .field("engine", &self.engine)
            .finish()
    }
}

impl DdnsConfig {
    /// Create a new configuration with defaults for everything optional
    pub fn new(
        email: impl Into<String>,
        api_key: impl Into<String>,
        targets: Vec<RecordTarget>,
    ) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
            targets,
            api_base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            ttl: None,
            engine: EngineConfig::default(),
        }
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid config JSON: {}", e)))
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// The credential pair attached to every provider request
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.api_key.clone())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.credentials().validate()?;

        if self.targets.is_empty() {
            return Err(Error::config("No record targets configured"));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            target.validate()?;
            if !seen.insert((target.zone_id.as_str(), target.record_id.as_str())) {
                return Err(Error::config(format!(
                    "Duplicate record target: {}/{}",
                    target.zone_id, target.record_id
                )));
            }
        }

        if let Some(ref url) = self.api_base_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            return Err(Error::config(format!(
                "API base URL must use HTTP or HTTPS scheme. Got: {}",
                url
            )));
        }

        if !(1..=300).contains(&self.request_timeout_secs) {
            return Err(Error::config(format!(
                "Request timeout must be between 1 and 300 seconds. Got: {}",
                self.request_timeout_secs
            )));
        }

        if let Some(ttl) = self.ttl
            && ttl != AUTOMATIC_TTL
            && !(60..=86400).contains(&ttl)
        {
            return Err(Error::config(format!(
                "TTL must be 1 (automatic) or between 60 and 86400 seconds. Got: {}",
                ttl
            )));
        }

        if self.engine.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Long-lived credential pair for the provider API
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
        }
    }

    /// Reject empty or blank values
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("API key cannot be empty"));
        }
        if self.email.trim().is_empty() {
            return Err(Error::config("Account email cannot be empty"));
        }
        Ok(())
    }
}

/// One DNS record to keep updated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordTarget {
    /// Provider zone identifier
    pub zone_id: String,

    /// Provider record identifier within the zone
    pub record_id: String,

    /// Record name, used for logging and sent as `name` when present
    #[serde(default)]
    pub domain: Option<String>,
}

impl RecordTarget {
    /// Create a new record target
    pub fn new(zone_id: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            record_id: record_id.into(),
            domain: None,
        }
    }

    /// Attach the record's domain name
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Validate identifiers and the optional domain name
    pub fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            return Err(Error::config("Zone ID cannot be empty"));
        }
        if self.record_id.trim().is_empty() {
            return Err(Error::config(format!(
                "Record ID cannot be empty (zone {})",
                self.zone_id
            )));
        }
        for id in [&self.zone_id, &self.record_id] {
            validate_identifier(id)?;
        }
        if let Some(ref domain) = self.domain {
            validate_domain_name(domain)?;
        }
        Ok(())
    }
}

impl fmt::Display for RecordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone_id, self.record_id)?;
        if let Some(ref domain) = self.domain {
            write!(f, " ({})", domain)?;
        }
        Ok(())
    }
}

/// Parses `zone_id/record_id` or `zone_id/record_id=domain`
impl FromStr for RecordTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (ids, domain) = match s.split_once('=') {
            Some((ids, domain)) => (ids, Some(domain.trim())),
            None => (s, None),
        };

        let (zone_id, record_id) = ids.split_once('/').ok_or_else(|| {
            Error::config(format!(
                "Record target must look like zone_id/record_id[=domain]. Got: '{}'",
                s
            ))
        })?;

        let mut target = RecordTarget::new(zone_id.trim(), record_id.trim());
        if let Some(domain) = domain.filter(|d| !d.is_empty()) {
            target = target.with_domain(domain);
        }
        Ok(target)
    }
}

/// Zone and record ids become URL path segments, so only `[A-Za-z0-9_-]` is allowed
fn validate_identifier(id: &str) -> Result<()> {
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::config(format!(
            "Identifier may only contain letters, digits, '-' and '_'. Got: '{}'",
            id
        )));
    }
    Ok(())
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks. Not comprehensive but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for (i, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        // Wildcard records are allowed as the leftmost label only
        if i == 0 && label == "*" {
            continue;
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the engine event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    /// Dropping an event never affects reconciliation itself.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}
