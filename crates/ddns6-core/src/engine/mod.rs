//! Core ddns6 engine
//!
//! The DdnsEngine is responsible for:
//! - Subscribing to network change notifications via NetworkMonitor
//! - Selecting the address to publish via InterfaceSource
//! - Pushing it to every record target via the Reconciler
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ NetworkMonitor │─── NetworkChange ───┐
//! └────────────────┘                     │
//!                                        ▼
//!                               ┌──────────────┐
//!                               │  DdnsEngine  │
//!                               └──────────────┘
//!                                        │
//!         ┌──────────────────────────────┼──────────────────────────┐
//!         │                              │                          │
//!         ▼                              ▼                          ▼
//! ┌─────────────────┐           ┌──────────────┐           ┌─────────────┐
//! │ InterfaceSource │           │  Reconciler  │           │   Events    │
//! │ (select)        │           │  (update)    │           │  (notify)   │
//! └─────────────────┘           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Startup, or a network change notification
//! 2. Enumerate interfaces; on failure log an error and end the pass
//! 3. Select the public address; if none, log a warning and end the pass
//! 4. Reconcile every target, each in its own error boundary
//! 5. Emit events for monitoring/logging
//!
//! Passes never overlap: notifications are consumed on the engine's own task
//! and each pass runs to completion before the next notification is taken.
//! Notifications that arrive mid-pass wait in the monitor's queue.

use crate::address::CandidateAddress;
use crate::config::{DdnsConfig, RecordTarget};
use crate::error::{Error, Result};
use crate::reconciler::{Reconciler, UpdateOutcome};
use crate::selector::Selector;
use crate::traits::{InterfaceSource, NetworkMonitor, RecordUpdater};
use std::net::Ipv6Addr;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Why a pass was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTrigger {
    /// The one pass run when the engine starts
    Startup,
    /// A network change notification
    NetworkChange,
}

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine subscribed and about to run the startup pass
    Started {
        targets_count: usize,
    },

    /// A reconciliation pass began
    PassStarted {
        trigger: PassTrigger,
    },

    /// An address was selected for publication
    AddressSelected {
        address: Ipv6Addr,
        interface: String,
    },

    /// No qualifying address; pass ended without updates
    NoAddress,

    /// Interface enumeration failed; pass ended without updates
    SelectionFailed {
        error: String,
    },

    /// One target accepted the update
    TargetUpdated {
        target: RecordTarget,
        address: Ipv6Addr,
    },

    /// One target failed
    TargetFailed {
        target: RecordTarget,
        address: Ipv6Addr,
        detail: String,
    },

    /// A reconciliation pass finished
    PassCompleted {
        succeeded: usize,
        failed: usize,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// What a single pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassReport {
    /// Enumeration failed; no target was attempted
    SelectionFailed(String),
    /// No qualifying address; no target was attempted
    NoAddress,
    /// Every target was attempted
    Reconciled {
        address: CandidateAddress,
        outcomes: Vec<UpdateOutcome>,
    },
}

/// Core ddns6 engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`]
/// 3. Engine subscribes, runs the startup pass, then one pass per notification
/// 4. On shutdown signal the subscription is dropped (deregistered)
pub struct DdnsEngine {
    /// Interface snapshot + selection rule
    selector: Selector,

    /// Source of change notifications
    monitor: Box<dyn NetworkMonitor>,

    /// Per-target update driver
    reconciler: Reconciler,

    /// DNS records to manage
    targets: Vec<RecordTarget>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// The configuration is validated here; an invalid configuration is a
    /// fatal startup error and nothing has touched the network yet.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        interfaces: Box<dyn InterfaceSource>,
        monitor: Box<dyn NetworkMonitor>,
        updater: Box<dyn RecordUpdater>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            selector: Selector::new(interfaces),
            monitor,
            reconciler: Reconciler::new(updater),
            targets: config.targets,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run until SIGINT
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Subscription failed, or the notification source went away
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run until the given oneshot fires (or its sender is dropped)
    ///
    /// Used by embedders that own signal handling, and by tests.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let mut changes = self.monitor.subscribe().await?;
        debug!("Subscribed to network changes");

        self.emit_event(EngineEvent::Started {
            targets_count: self.targets.len(),
        });
        info!(
            "Managing {} record(s) via {}",
            self.targets.len(),
            self.reconciler.provider_name()
        );

        self.run_pass(PassTrigger::Startup).await;

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                change = changes.next() => match change {
                    Some(_) => {
                        debug!("Network change notification received");
                        self.run_pass(PassTrigger::NetworkChange).await;
                    }
                    None => {
                        error!("Network change source closed unexpectedly");
                        break Err(Error::subscription("notification source closed"));
                    }
                },

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
            }
        };

        drop(changes);
        debug!("Unsubscribed from network changes");

        let reason = match &result {
            Ok(()) => "Shutdown signal".to_string(),
            Err(e) => e.to_string(),
        };
        self.emit_event(EngineEvent::Stopped { reason });
        info!("Engine stopped");

        result
    }

    /// Run one complete reconciliation pass
    ///
    /// Never fails: every problem is logged and reflected in the report.
    pub async fn run_pass(&self, trigger: PassTrigger) -> PassReport {
        self.emit_event(EngineEvent::PassStarted { trigger });
        debug!("Starting pass ({:?})", trigger);

        let address = match self.selector.select().await {
            Ok(Some(address)) => address,
            Ok(None) => {
                warn!("No public IPv6 address found; skipping update");
                self.emit_event(EngineEvent::NoAddress);
                return PassReport::NoAddress;
            }
            Err(e) => {
                error!("Failed to enumerate network interfaces: {}", e);
                let error = e.to_string();
                self.emit_event(EngineEvent::SelectionFailed {
                    error: error.clone(),
                });
                return PassReport::SelectionFailed(error);
            }
        };

        info!("Selected address {}", address);
        self.emit_event(EngineEvent::AddressSelected {
            address: address.address,
            interface: address.interface.clone(),
        });

        let outcomes = self.reconciler.reconcile(&address, &self.targets).await;

        for outcome in &outcomes {
            let event = if outcome.succeeded {
                EngineEvent::TargetUpdated {
                    target: outcome.target.clone(),
                    address: address.address,
                }
            } else {
                EngineEvent::TargetFailed {
                    target: outcome.target.clone(),
                    address: address.address,
                    detail: outcome.detail.clone(),
                }
            };
            self.emit_event(event);
        }

        let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
        let failed = outcomes.len() - succeeded;
        if failed > 0 {
            warn!("Pass finished: {} updated, {} failed", succeeded, failed);
        } else {
            info!("Pass finished: {} updated", succeeded);
        }
        self.emit_event(EngineEvent::PassCompleted { succeeded, failed });

        PassReport::Reconciled { address, outcomes }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Nobody is keeping up; drop rather than block a pass
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // No listener is fine
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
