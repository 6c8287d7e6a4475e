// # ddns6-core
//
// Core library for the IPv6 dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping AAAA records
// pointed at this host:
// - **address / Selector**: Picks the one public IPv6 address to publish
// - **Reconciler**: Pushes that address to every record target, isolating failures
// - **DdnsEngine**: Runs selection + reconciliation at startup and on every network change
// - **InterfaceSource / NetworkMonitor / RecordUpdater**: Seams for OS and provider integrations
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from OS and provider code
// 2. **Event-Driven**: Passes are triggered by network change notifications, never by polling
// 3. **Failure Isolation**: One record failing never stops the others
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Fail Fast at Startup**: Bad configuration is rejected before any network I/O

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod reconciler;
pub mod selector;
pub mod traits;

// Re-export core types for convenience
pub use address::{
    AddressScope, CandidateAddress, NetworkInterface, OperationalState,
    select_public_stable_address,
};
pub use config::{Credentials, DdnsConfig, EngineConfig, RecordTarget};
pub use engine::{DdnsEngine, EngineEvent, PassReport, PassTrigger};
pub use error::{Error, Result};
pub use reconciler::{Reconciler, UpdateOutcome};
pub use selector::Selector;
pub use traits::{InterfaceSource, NetworkChange, NetworkChanges, NetworkMonitor, RecordUpdater};
