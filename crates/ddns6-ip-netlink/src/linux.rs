//! rtnetlink-backed enumeration and monitoring

use ddns6_core::traits::{NetworkChange, NetworkChanges};
use ddns6_core::{Error, NetworkInterface, OperationalState, Result};
use futures_util::{StreamExt, TryStreamExt, future};
use rtnetlink::constants::{RTMGRP_IPV6_IFADDR, RTMGRP_LINK};
use rtnetlink::packet_core::{NetlinkMessage, NetlinkPayload};
use rtnetlink::packet_route::RouteNetlinkMessage;
use rtnetlink::packet_route::address::{AddressAttribute, AddressMessage};
use rtnetlink::packet_route::link::{LinkAttribute, LinkMessage, State};
use rtnetlink::new_connection;
use rtnetlink::sys::{AsyncSocket, SocketAddr};
use std::net::IpAddr;
use tracing::{debug, trace};

/// Dump links and addresses into interface snapshots
pub(crate) async fn enumerate() -> Result<Vec<NetworkInterface>> {
    let (connection, handle, _) = new_connection()
        .map_err(|e| Error::enumeration(format!("Failed to open netlink socket: {}", e)))?;
    let connection = tokio::spawn(connection);

    let result = async {
        let links: Vec<LinkMessage> = handle
            .link()
            .get()
            .execute()
            .try_collect()
            .await
            .map_err(|e| Error::enumeration(format!("Link dump failed: {}", e)))?;

        let addresses: Vec<AddressMessage> = handle
            .address()
            .get()
            .execute()
            .try_collect()
            .await
            .map_err(|e| Error::enumeration(format!("Address dump failed: {}", e)))?;

        Ok(assemble(&links, &addresses))
    }
    .await;

    connection.abort();

    if let Ok(ref interfaces) = result {
        debug!("Enumerated {} interface(s)", interfaces.len());
    }
    result
}

/// Bind to the link and IPv6 address groups and stream change notifications
pub(crate) async fn subscribe() -> Result<NetworkChanges> {
    let (mut connection, handle, messages) = new_connection()
        .map_err(|e| Error::subscription(format!("Failed to open netlink socket: {}", e)))?;

    let groups = RTMGRP_LINK | RTMGRP_IPV6_IFADDR;
    connection
        .socket_mut()
        .socket_mut()
        .bind(&SocketAddr::new(0, groups))
        .map_err(|e| Error::subscription(format!("Failed to join netlink groups: {}", e)))?;

    let connection = tokio::spawn(connection);
    debug!("Joined netlink groups RTMGRP_LINK | RTMGRP_IPV6_IFADDR");

    let changes = messages.filter_map(|(message, _)| {
        future::ready(change_kind(&message).map(|kind| {
            trace!("Netlink notification: {}", kind);
            NetworkChange
        }))
    });

    Ok(NetworkChanges::new(changes).on_drop(move || {
        // The connection task owns the socket; the handle keeps it running
        connection.abort();
        drop(handle);
        debug!("Left netlink groups");
    }))
}

/// Name the kind of change a multicast message reports, if it is one we act on
fn change_kind(message: &NetlinkMessage<RouteNetlinkMessage>) -> Option<&'static str> {
    match &message.payload {
        NetlinkPayload::InnerMessage(inner) => match inner {
            RouteNetlinkMessage::NewLink(_) => Some("link changed"),
            RouteNetlinkMessage::DelLink(_) => Some("link removed"),
            RouteNetlinkMessage::NewAddress(_) => Some("address added"),
            RouteNetlinkMessage::DelAddress(_) => Some("address removed"),
            _ => None,
        },
        _ => None,
    }
}

fn map_state(state: &State) -> OperationalState {
    match state {
        State::Up => OperationalState::Up,
        State::Down => OperationalState::Down,
        State::LowerLayerDown => OperationalState::LowerLayerDown,
        State::Dormant => OperationalState::Dormant,
        State::Testing => OperationalState::Testing,
        State::NotPresent => OperationalState::NotPresent,
        _ => OperationalState::Unknown,
    }
}

fn link_to_interface(link: &LinkMessage) -> NetworkInterface {
    let mut name = None;
    let mut state = OperationalState::Unknown;

    for attr in &link.attributes {
        match attr {
            LinkAttribute::IfName(n) => name = Some(n.clone()),
            LinkAttribute::OperState(s) => state = map_state(s),
            _ => {}
        }
    }

    let index = link.header.index;
    NetworkInterface::new(
        index,
        name.unwrap_or_else(|| format!("if{}", index)),
        state,
    )
}

/// The host's own address: `IFA_LOCAL` when present (it differs from
/// `IFA_ADDRESS` on point-to-point links, where the latter is the peer)
fn address_of(message: &AddressMessage) -> Option<IpAddr> {
    let local = message.attributes.iter().find_map(|attr| match attr {
        AddressAttribute::Local(addr) => Some(*addr),
        _ => None,
    });
    local.or_else(|| {
        message.attributes.iter().find_map(|attr| match attr {
            AddressAttribute::Address(addr) => Some(*addr),
            _ => None,
        })
    })
}

/// Attach each address to its link, keeping kernel order for both
fn assemble(links: &[LinkMessage], addresses: &[AddressMessage]) -> Vec<NetworkInterface> {
    let mut interfaces: Vec<NetworkInterface> = links.iter().map(link_to_interface).collect();

    for message in addresses {
        let Some(addr) = address_of(message) else {
            continue;
        };
        if let Some(iface) = interfaces
            .iter_mut()
            .find(|iface| iface.index == message.header.index)
        {
            iface.addresses.push(addr);
        }
    }

    interfaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtnetlink::packet_core::NetlinkHeader;

    fn link(index: u32, name: &str, state: State) -> LinkMessage {
        let mut msg = LinkMessage::default();
        msg.header.index = index;
        msg.attributes.push(LinkAttribute::IfName(name.to_string()));
        msg.attributes.push(LinkAttribute::OperState(state));
        msg
    }

    fn address(index: u32, addr: &str) -> AddressMessage {
        let mut msg = AddressMessage::default();
        msg.header.index = index;
        msg.attributes
            .push(AddressAttribute::Address(addr.parse().unwrap()));
        msg
    }

    #[test]
    fn test_map_state() {
        assert_eq!(map_state(&State::Up), OperationalState::Up);
        assert_eq!(map_state(&State::Down), OperationalState::Down);
        assert_eq!(map_state(&State::Dormant), OperationalState::Dormant);
        assert_eq!(map_state(&State::Unknown), OperationalState::Unknown);
    }

    #[test]
    fn test_link_without_name_or_state() {
        let mut msg = LinkMessage::default();
        msg.header.index = 7;

        let iface = link_to_interface(&msg);

        assert_eq!(iface.name, "if7");
        assert_eq!(iface.state, OperationalState::Unknown);
        assert!(iface.addresses.is_empty());
    }

    #[test]
    fn test_assemble_groups_addresses_in_order() {
        let links = vec![link(1, "lo", State::Unknown), link(2, "eth0", State::Up)];
        let addresses = vec![
            address(2, "2001:db8::1"),
            address(1, "::1"),
            address(2, "fe80::1"),
            address(9, "2001:db8::9"),
        ];

        let interfaces = assemble(&links, &addresses);

        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].name, "lo");
        assert_eq!(interfaces[0].addresses, vec!["::1".parse::<IpAddr>().unwrap()]);
        assert_eq!(interfaces[1].state, OperationalState::Up);
        assert_eq!(
            interfaces[1].addresses,
            vec![
                "2001:db8::1".parse::<IpAddr>().unwrap(),
                "fe80::1".parse::<IpAddr>().unwrap(),
            ]
        );
    }

    #[test]
    fn test_point_to_point_uses_local_address() {
        let mut msg = address(3, "2001:db8:ffff::1");
        msg.attributes
            .push(AddressAttribute::Local("2001:db8::42".parse().unwrap()));

        assert_eq!(address_of(&msg), Some("2001:db8::42".parse().unwrap()));
        assert_eq!(
            address_of(&address(3, "2001:db8::7")),
            Some("2001:db8::7".parse().unwrap())
        );
    }

    #[test]
    fn test_change_kind() {
        let wrap = |payload| NetlinkMessage::new(NetlinkHeader::default(), payload);
        let new_addr = wrap(NetlinkPayload::InnerMessage(RouteNetlinkMessage::NewAddress(
            AddressMessage::default(),
        )));
        let del_link = wrap(NetlinkPayload::InnerMessage(RouteNetlinkMessage::DelLink(
            LinkMessage::default(),
        )));
        let noop = wrap(NetlinkPayload::Noop);

        assert_eq!(change_kind(&new_addr), Some("address added"));
        assert_eq!(change_kind(&del_link), Some("link removed"));
        assert_eq!(change_kind(&noop), None);
    }
}
