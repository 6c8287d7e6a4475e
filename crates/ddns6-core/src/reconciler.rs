//! Record reconciliation
//!
//! Pushes one selected address to every configured record target.
//!
//! Each target is its own error boundary: a transport failure or provider
//! rejection on one target is recorded in that target's [`UpdateOutcome`]
//! and the loop moves on. No retries happen within a pass.

use crate::address::CandidateAddress;
use crate::config::RecordTarget;
use crate::traits::RecordUpdater;
use tracing::{error, info};

/// Result of pushing the address to one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The target that was attempted
    pub target: RecordTarget,
    /// Whether the provider accepted the update
    pub succeeded: bool,
    /// Failure detail (provider response body or transport error); empty on success
    pub detail: String,
}

impl UpdateOutcome {
    fn success(target: &RecordTarget) -> Self {
        Self {
            target: target.clone(),
            succeeded: true,
            detail: String::new(),
        }
    }

    fn failure(target: &RecordTarget, detail: String) -> Self {
        Self {
            target: target.clone(),
            succeeded: false,
            detail,
        }
    }
}

/// Drives per-target updates through a [`RecordUpdater`]
pub struct Reconciler {
    updater: Box<dyn RecordUpdater>,
}

impl Reconciler {
    pub fn new(updater: Box<dyn RecordUpdater>) -> Self {
        Self { updater }
    }

    /// Name of the provider behind this reconciler
    pub fn provider_name(&self) -> &'static str {
        self.updater.provider_name()
    }

    /// Attempt every target exactly once, in order
    ///
    /// Always returns one outcome per target, in the same order as `targets`.
    pub async fn reconcile(
        &self,
        address: &CandidateAddress,
        targets: &[RecordTarget],
    ) -> Vec<UpdateOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());

        for target in targets {
            let outcome = match self.updater.update_record(target, address.address).await {
                Ok(()) => {
                    info!(
                        zone_id = %target.zone_id,
                        record_id = %target.record_id,
                        domain = target.domain.as_deref().unwrap_or("-"),
                        address = %address.address,
                        "Record updated"
                    );
                    UpdateOutcome::success(target)
                }
                Err(e) => {
                    error!(
                        zone_id = %target.zone_id,
                        record_id = %target.record_id,
                        domain = target.domain.as_deref().unwrap_or("-"),
                        address = %address.address,
                        provider = self.updater.provider_name(),
                        "Failed to update record: {}",
                        e
                    );
                    UpdateOutcome::failure(target, e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressScope, OperationalState};
    use crate::error::Error;
    use async_trait::async_trait;
    use std::net::Ipv6Addr;
    use std::sync::Mutex;

    /// Fails for record ids listed in `failing`, records every call
    struct ScriptedUpdater {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<(String, Ipv6Addr)>>,
    }

    #[async_trait]
    impl RecordUpdater for ScriptedUpdater {
        async fn update_record(&self, target: &RecordTarget, address: Ipv6Addr) -> crate::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((target.record_id.clone(), address));
            if self.failing.contains(&target.record_id.as_str()) {
                Err(Error::provider(400, r#"{"error":"invalid"}"#))
            } else {
                Ok(())
            }
        }

        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn candidate() -> CandidateAddress {
        CandidateAddress {
            interface: "eth0".to_string(),
            interface_state: OperationalState::Up,
            scope: AddressScope::Global,
            address: "2001:db8::1".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn empty_target_list_yields_no_outcomes() {
        let reconciler = Reconciler::new(Box::new(ScriptedUpdater {
            failing: vec![],
            calls: Mutex::new(Vec::new()),
        }));

        assert!(reconciler.reconcile(&candidate(), &[]).await.is_empty());
        assert_eq!(reconciler.provider_name(), "scripted");
    }

    #[tokio::test]
    async fn every_failure_is_reported_without_stopping() {
        let reconciler = Reconciler::new(Box::new(ScriptedUpdater {
            failing: vec!["r1", "r2"],
            calls: Mutex::new(Vec::new()),
        }));
        let targets = vec![RecordTarget::new("z", "r1"), RecordTarget::new("z", "r2")];

        let outcomes = reconciler.reconcile(&candidate(), &targets).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| !o.succeeded));
        assert!(outcomes.iter().all(|o| o.detail.contains("invalid")));
        assert_eq!(outcomes[1].target, targets[1]);
    }
}
