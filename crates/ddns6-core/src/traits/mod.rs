//! Core traits for the ddns6 system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`InterfaceSource`]: Enumerate host interfaces and addresses
//! - [`NetworkMonitor`]: Notify about network configuration changes
//! - [`RecordUpdater`]: Update one DNS record via a provider API

pub mod interface_source;
pub mod network_monitor;
pub mod record_updater;

pub use interface_source::InterfaceSource;
pub use network_monitor::{NetworkChange, NetworkChanges, NetworkMonitor};
pub use record_updater::RecordUpdater;
