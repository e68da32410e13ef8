//! Host network bind addresses.
//!
//! Ports are walked in the order given and, for each port, the enabled
//! families in the order IPv4 then IPv6. The first pair becomes the primary
//! address and the rest become additional addresses, so adding a family or
//! appending a port never moves the primary address of a running listener.

use envoy_types::pb::envoy::config::core::v3::{
    address::Address as AddressType,
    socket_address::{PortSpecifier, Protocol},
    Address, SocketAddress,
};
use envoy_types::pb::envoy::config::listener::v3::AdditionalAddress;

pub const IPV4_WILDCARD: &str = "0.0.0.0";
pub const IPV6_WILDCARD: &str = "::";

/// IP address family of a bind address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Families in bind preference order
    pub const PREFERENCE: [AddressFamily; 2] = [AddressFamily::Ipv4, AddressFamily::Ipv6];

    /// Wildcard host for the family
    pub fn wildcard(self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => IPV4_WILDCARD,
            AddressFamily::Ipv6 => IPV6_WILDCARD,
        }
    }
}

/// TCP socket address on the family's wildcard host
pub fn wildcard_address(family: AddressFamily, port: u32) -> Address {
    Address {
        address: Some(AddressType::SocketAddress(SocketAddress {
            protocol: Protocol::Tcp as i32,
            address: family.wildcard().to_string(),
            port_specifier: Some(PortSpecifier::PortValue(port)),
            ..Default::default()
        })),
    }
}

/// Compute the primary and additional bind addresses for a host network listener.
///
/// Returns `(None, [])` when there are no ports or no family is enabled.
pub fn host_network_addresses(
    ports: &[u32],
    ipv4_enabled: bool,
    ipv6_enabled: bool,
) -> (Option<Address>, Vec<AdditionalAddress>) {
    let families: Vec<AddressFamily> = AddressFamily::PREFERENCE
        .into_iter()
        .filter(|family| match family {
            AddressFamily::Ipv4 => ipv4_enabled,
            AddressFamily::Ipv6 => ipv6_enabled,
        })
        .collect();

    let mut addresses = ports
        .iter()
        .flat_map(|port| families.iter().map(move |family| wildcard_address(*family, *port)));

    let Some(primary) = addresses.next() else {
        return (None, Vec::new());
    };

    let additional = addresses
        .map(|address| AdditionalAddress { address: Some(address), ..Default::default() })
        .collect();

    (Some(primary), additional)
}
