//! Selection against a live interface source

use crate::address::{CandidateAddress, select_public_stable_address};
use crate::error::Result;
use crate::traits::InterfaceSource;
use tracing::debug;

/// Takes a fresh snapshot from an [`InterfaceSource`] and applies
/// [`select_public_stable_address`] to it
pub struct Selector {
    source: Box<dyn InterfaceSource>,
}

impl Selector {
    pub fn new(source: Box<dyn InterfaceSource>) -> Self {
        Self { source }
    }

    /// Select the address to publish right now
    ///
    /// # Returns
    ///
    /// - `Ok(Some(_))`: An address qualifies
    /// - `Ok(None)`: Nothing qualifies (absence)
    /// - `Err(_)`: Enumeration failed
    pub async fn select(&self) -> Result<Option<CandidateAddress>> {
        let interfaces = self.source.interfaces().await?;
        debug!(
            "Selecting from {} interface(s), {} up",
            interfaces.len(),
            interfaces.iter().filter(|i| i.state.is_up()).count()
        );
        Ok(select_public_stable_address(&interfaces))
    }
}
