// # Netlink Interface Source
//
// This crate provides the Linux implementations of `InterfaceSource` and
// `NetworkMonitor` for ddns6, both backed by rtnetlink.
//
// ## Enumeration
//
// Each call opens a fresh route netlink connection, dumps links and then
// addresses, and groups the addresses under their link in kernel order.
//
// ## Monitoring
//
// The monitor binds a route netlink socket to the link and IPv6 address
// multicast groups. Every link or address add/remove message becomes one
// `NetworkChange`. Dropping the returned `NetworkChanges` stops the
// connection task and closes the socket.
//
// ## Platform Support
//
// Netlink is Linux-only. On other targets both types exist but fail with a
// clear error, so the daemon exits with a startup error instead of running
// without notifications.

use async_trait::async_trait;
use ddns6_core::traits::{InterfaceSource, NetworkChanges, NetworkMonitor};
use ddns6_core::{NetworkInterface, Result};

#[cfg(target_os = "linux")]
mod linux;

/// Interface enumeration via `RTM_GETLINK` / `RTM_GETADDR` dumps
#[derive(Debug, Default, Clone, Copy)]
pub struct NetlinkInterfaces;

impl NetlinkInterfaces {
    pub fn new() -> Self {
        Self
    }
}

/// Change notifications via route netlink multicast groups
#[derive(Debug, Default, Clone, Copy)]
pub struct NetlinkMonitor;

impl NetlinkMonitor {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "linux")]
#[async_trait]
impl InterfaceSource for NetlinkInterfaces {
    async fn interfaces(&self) -> Result<Vec<NetworkInterface>> {
        linux::enumerate().await
    }
}

#[cfg(target_os = "linux")]
#[async_trait]
impl NetworkMonitor for NetlinkMonitor {
    async fn subscribe(&self) -> Result<NetworkChanges> {
        linux::subscribe().await
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait]
impl InterfaceSource for NetlinkInterfaces {
    async fn interfaces(&self) -> Result<Vec<NetworkInterface>> {
        Err(ddns6_core::Error::enumeration(
            "Netlink interface enumeration is only supported on Linux",
        ))
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait]
impl NetworkMonitor for NetlinkMonitor {
    async fn subscribe(&self) -> Result<NetworkChanges> {
        Err(ddns6_core::Error::subscription(
            "Netlink change monitoring is only supported on Linux",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[cfg(not(target_os = "linux"))]
    async fn test_unsupported_platform_fails() {
        assert!(NetlinkInterfaces::new().interfaces().await.is_err());
        assert!(NetlinkMonitor::new().subscribe().await.is_err());
    }

    #[test]
    fn test_constructors() {
        let _ = NetlinkInterfaces::new();
        let _ = NetlinkMonitor::default();
    }
}
