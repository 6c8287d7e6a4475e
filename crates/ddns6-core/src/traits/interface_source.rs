// # Interface Source Trait
//
// Defines the interface for enumerating the host's network interfaces and
// their assigned addresses.
//
// ## Implementations
//
// - rtnetlink (Linux): `ddns6-ip-netlink` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns6_core::{InterfaceSource, select_public_stable_address};
//
// let source = /* InterfaceSource implementation */;
// let interfaces = source.interfaces().await?;
// match select_public_stable_address(&interfaces) {
//     Some(candidate) => println!("publish {}", candidate.address),
//     None => println!("nothing to publish"),
// }
// ```

use crate::address::NetworkInterface;
use async_trait::async_trait;

/// Trait for interface enumeration
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Ordering
///
/// Interfaces, and the addresses within each interface, must be returned in
/// the order the OS reports them. Address selection is first-match, so this
/// order decides which address gets published.
///
/// # Errors
///
/// An `Err` means enumeration itself failed. The engine logs it and skips
/// the pass without touching any record. An empty list is not an error.
#[async_trait]
pub trait InterfaceSource: Send + Sync {
    /// Take a fresh snapshot of all interfaces and their addresses
    async fn interfaces(&self) -> Result<Vec<NetworkInterface>, crate::Error>;
}
