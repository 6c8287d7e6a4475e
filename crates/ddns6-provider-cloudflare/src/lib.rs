// # Cloudflare AAAA Record Updater
//
// This crate provides the Cloudflare implementation of `RecordUpdater` for ddns6.
//
// ## Behavior
//
// - One PATCH request per target per pass, nothing else
// - Errors are returned to the reconciler, which records them and moves on
// - Bounded HTTP timeout (10 seconds by default)
// - Non-2xx responses carry the status and response body
// - Dry-run mode logs the request instead of sending it
// - No retries, no caching, no background tasks
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Credentials are validated once, when the updater is built
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns6_core::config::{Credentials, DdnsConfig, RecordTarget};
use ddns6_core::traits::RecordUpdater;
use ddns6_core::{Error, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use std::net::Ipv6Addr;
use std::time::Duration;

/// Cloudflare zones endpoint
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4/zones";

/// Default HTTP timeout for API requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the account email
const AUTH_EMAIL_HEADER: &str = "X-Auth-Email";

/// Tunables for [`CloudflareUpdater`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudflareOptions {
    /// Zones endpoint; record URLs are `{base_url}/{zone}/dns_records/{record}`
    pub base_url: String,

    /// Bound on each request, connect through body
    pub timeout: Duration,

    /// TTL sent with every update; omitted (record keeps its TTL) when `None`
    pub ttl: Option<u32>,

    /// Log the request instead of sending it
    pub dry_run: bool,
}

impl Default for CloudflareOptions {
    fn default() -> Self {
        Self {
            base_url: CLOUDFLARE_API_BASE.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
            ttl: None,
            dry_run: false,
        }
    }
}

impl CloudflareOptions {
    /// Options taken from a validated daemon configuration
    pub fn from_config(config: &DdnsConfig) -> Self {
        Self {
            base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string()),
            timeout: Duration::from_secs(config.request_timeout_secs),
            ttl: config.ttl,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// PATCH body
#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
}

/// Cloudflare record updater
///
/// Stateless apart from its HTTP client; safe to share across passes.
///
/// # Dry-Run Mode
///
/// When `dry_run` is set, the updater logs the URL and body it would PATCH
/// and reports success without touching the network.
pub struct CloudflareUpdater {
    /// Client with auth headers and timeout baked in
    client: reqwest::Client,

    /// Zones endpoint, without trailing slash
    base_url: String,

    ttl: Option<u32>,

    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudflareUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareUpdater")
            .field("credentials", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("ttl", &self.ttl)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareUpdater {
    /// Create a new Cloudflare updater
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the email or API key is blank, or contains
    ///   characters that cannot go into an HTTP header
    /// - `Error::Http` if the HTTP client cannot be built
    pub fn new(credentials: &Credentials, options: CloudflareOptions) -> Result<Self> {
        credentials.validate()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", credentials.api_key))
            .map_err(|_| Error::config("API key contains characters not allowed in a header"))?;
        auth.set_sensitive(true);

        let email = HeaderValue::from_str(&credentials.email)
            .map_err(|_| Error::config("Email contains characters not allowed in a header"))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(AUTH_EMAIL_HEADER, email);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        if options.dry_run {
            tracing::warn!("Cloudflare updater running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            ttl: options.ttl,
            dry_run: options.dry_run,
        })
    }

    /// Create an updater straight from the daemon configuration
    pub fn from_config(config: &DdnsConfig, dry_run: bool) -> Result<Self> {
        Self::new(
            &config.credentials(),
            CloudflareOptions::from_config(config).dry_run(dry_run),
        )
    }

    fn record_url(&self, target: &RecordTarget) -> String {
        format!(
            "{}/{}/dns_records/{}",
            self.base_url, target.zone_id, target.record_id
        )
    }

    fn request_body<'a>(&self, target: &'a RecordTarget, address: Ipv6Addr) -> UpdateRequest<'a> {
        UpdateRequest {
            record_type: "AAAA",
            content: address.to_string(),
            name: target.domain.as_deref(),
            ttl: self.ttl,
        }
    }
}

/// Human hint for a rejected update, used only in logs
fn status_hint(status: u16) -> &'static str {
    match status {
        401 | 403 => "authentication failed: invalid API key or insufficient permissions",
        404 => "zone or record not found",
        409 => "conflict: record is being updated by another process",
        429 => "rate limit exceeded",
        500..=599 => "Cloudflare server error (transient)",
        _ => "update rejected",
    }
}

#[async_trait]
impl RecordUpdater for CloudflareUpdater {
    /// PATCH the record's content to `address`
    ///
    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <key>
    /// X-Auth-Email: <email>
    /// Content-Type: application/json
    ///
    /// {"type":"AAAA","content":"2001:db8::1"}
    /// ```
    async fn update_record(&self, target: &RecordTarget, address: Ipv6Addr) -> Result<()> {
        // Ids must be single path segments
        target.validate()?;

        let url = self.record_url(target);
        let body = self.request_body(target, address);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH request to {} with payload: {}",
                url,
                serde_json::to_string(&body)?
            );
            return Ok(());
        }

        tracing::debug!(
            zone_id = %target.zone_id,
            record_id = %target.record_id,
            "Sending PATCH -> {}",
            address
        );

        let response = self
            .client
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            tracing::warn!(
                zone_id = %target.zone_id,
                record_id = %target.record_id,
                "Cloudflare returned {}: {}",
                status,
                status_hint(status.as_u16())
            );
            return Err(Error::provider(status.as_u16(), body));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
