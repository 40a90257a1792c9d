//! Ordered registry of configured networks.
//!
//! Lookup in both directions is first-match in configuration order. This is
//! deliberate: operators read the file top to bottom, and overlapping
//! networks resolve the way the file reads, not by prefix length.

use std::net::Ipv6Addr;

use hickory_proto::rr::Name;

use crate::config::NetworkConfig;

/// The configured networks, in configuration order. Built once at startup
/// and shared read-only across request tasks.
#[derive(Debug)]
pub struct Registry {
    networks: Vec<NetworkConfig>,
}

impl Registry {
    /// Build a registry from the parsed configuration.
    pub fn new(networks: Vec<NetworkConfig>) -> Self {
        Self { networks }
    }

    /// First network whose prefix contains `addr`.
    pub fn find_by_addr(&self, addr: Ipv6Addr) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.network.contains(&addr))
    }

    /// First network whose template matches `qname`, along with the
    /// extracted host digits.
    pub fn find_by_name(&self, qname: &Name) -> Option<(&NetworkConfig, String)> {
        self.networks
            .iter()
            .find_map(|n| n.template.matches(qname).map(|digits| (n, digits)))
    }

    /// Number of configured networks.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// True when no networks are configured.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
