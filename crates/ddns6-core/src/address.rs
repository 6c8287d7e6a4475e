//! Address selection
//!
//! Picks the single IPv6 address that should be published from a snapshot of
//! the host's interfaces.
//!
//! ## Algorithm
//!
//! 1. Walk interfaces in the order the OS reported them
//! 2. Skip interfaces that are not operationally up
//! 3. Walk each interface's addresses in reported order
//! 4. Skip anything that is not IPv6
//! 5. Skip loopback, link-local, site-local and unique-local addresses
//! 6. The first survivor wins
//!
//! Interface and address order is the OS's preference order.
//!
//! ## Known limitation
//!
//! Temporary (privacy extension, RFC 8981) addresses are not told apart from
//! stable ones. If the OS lists a temporary address first it will be
//! published.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

/// Operational state of a network interface (RFC 2863 ifOperStatus)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalState {
    Up,
    Down,
    LowerLayerDown,
    Dormant,
    Testing,
    NotPresent,
    Unknown,
}

impl OperationalState {
    pub fn is_up(self) -> bool {
        self == OperationalState::Up
    }
}

/// Routing scope of an IPv6 address, derived from its prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressScope {
    /// `::1`
    Loopback,
    /// `fe80::/10`
    LinkLocal,
    /// `fec0::/10` (deprecated by RFC 3879 but still seen in the wild)
    SiteLocal,
    /// `fc00::/7`
    UniqueLocal,
    /// `::`, IPv4-mapped `::ffff:0:0/96` and multicast; never published
    Reserved,
    /// Anything else
    Global,
}

impl AddressScope {
    /// Classify an address by prefix
    pub fn classify(address: &Ipv6Addr) -> Self {
        let first = address.segments()[0];

        if address.is_loopback() {
            AddressScope::Loopback
        } else if address.is_unspecified()
            || address.is_multicast()
            || address.to_ipv4_mapped().is_some()
        {
            AddressScope::Reserved
        } else if first & 0xffc0 == 0xfe80 {
            AddressScope::LinkLocal
        } else if first & 0xffc0 == 0xfec0 {
            AddressScope::SiteLocal
        } else if first & 0xfe00 == 0xfc00 {
            AddressScope::UniqueLocal
        } else {
            AddressScope::Global
        }
    }

    pub fn is_global(self) -> bool {
        self == AddressScope::Global
    }
}

impl fmt::Display for AddressScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressScope::Loopback => "loopback",
            AddressScope::LinkLocal => "link-local",
            AddressScope::SiteLocal => "site-local",
            AddressScope::UniqueLocal => "unique-local",
            AddressScope::Reserved => "reserved",
            AddressScope::Global => "global",
        };
        f.write_str(name)
    }
}

/// Snapshot of one network interface as reported by the OS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Kernel interface index
    pub index: u32,
    /// Interface name (e.g. "eth0")
    pub name: String,
    /// Operational state at enumeration time
    pub state: OperationalState,
    /// Assigned addresses, in the order the OS reported them
    pub addresses: Vec<IpAddr>,
}

impl NetworkInterface {
    pub fn new(index: u32, name: impl Into<String>, state: OperationalState) -> Self {
        Self {
            index,
            name: name.into(),
            state,
            addresses: Vec::new(),
        }
    }

    /// Append an address (builder style)
    pub fn with_address(mut self, address: impl Into<IpAddr>) -> Self {
        self.addresses.push(address.into());
        self
    }
}

/// The address chosen for publication
///
/// Recomputed on every pass and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAddress {
    /// Name of the interface the address was found on
    pub interface: String,
    /// Operational state of that interface when it was selected
    pub interface_state: OperationalState,
    /// Scope of the address (always [`AddressScope::Global`] once selected)
    pub scope: AddressScope,
    /// The address itself
    pub address: Ipv6Addr,
}

impl fmt::Display for CandidateAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (on {})", self.address, self.interface)
    }
}

/// Select the address to publish, or `None` if nothing qualifies
///
/// Absence is not an error: the caller logs it and skips the pass.
pub fn select_public_stable_address(interfaces: &[NetworkInterface]) -> Option<CandidateAddress> {
    interfaces
        .iter()
        .filter(|iface| iface.state.is_up())
        .find_map(|iface| {
            iface.addresses.iter().find_map(|addr| {
                let IpAddr::V6(v6) = addr else {
                    return None;
                };

                let scope = AddressScope::classify(v6);
                scope.is_global().then(|| CandidateAddress {
                    interface: iface.name.clone(),
                    interface_state: iface.state,
                    scope,
                    address: *v6,
                })
            })
        })
}
