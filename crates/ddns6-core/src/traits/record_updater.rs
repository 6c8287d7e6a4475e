// # Record Updater Trait
//
// Defines the interface for pushing a new AAAA value to one existing DNS
// record via a provider API.
//
// ## Implementations
//
// - Cloudflare: `ddns6-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns6_core::{RecordTarget, RecordUpdater};
//
// let updater = /* RecordUpdater implementation */;
// let target = RecordTarget::new("zone-id", "record-id");
// updater.update_record(&target, "2001:db8::1".parse()?).await?;
// ```

use crate::config::RecordTarget;
use async_trait::async_trait;
use std::net::Ipv6Addr;

/// Trait for record updater implementations
///
/// # Trust Level: Untrusted
///
/// Updaters are isolated, stateless and single-shot:
/// - One request per call
/// - No retries or backoff (the next network change is the retry)
/// - No task spawning
/// - Credentials are validated at construction, never per call
///
/// # Idempotency
///
/// An update sets the record's content; it is not additive. Calling it twice
/// with the same address must send the same request twice.
#[async_trait]
pub trait RecordUpdater: Send + Sync {
    /// Point `target` at `address`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the update (2xx)
    /// - `Err(Error::Provider)`: Non-success status, with the response body
    /// - `Err(Error::Http)`: Transport failure or timeout
    async fn update_record(
        &self,
        target: &RecordTarget,
        address: Ipv6Addr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
