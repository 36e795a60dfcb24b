//! Node records as stored in etcd

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use tracing::warn;

/// Desired nodes keyed by their URL-safe base64 public key
pub type NodeSet = BTreeMap<String, NodeInfo>;

/// Configuration of one node
///
/// Every field is optional. A missing field on a node falls back to the
/// default record where the consumer supports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: Option<u64>,
    pub mtu: Option<u16>,
    pub address4: Option<String>,
    pub range4: Option<String>,
    pub address6: Option<String>,
    pub range6: Option<String>,
    /// Persistent keepalive in seconds
    pub wg_keepalive: Option<u16>,
    /// Raw JSON list of concentrators handed out to the node
    pub concentrators: Option<String>,
}

impl NodeInfo {
    /// Explicit keepalive of this record, if set
    #[must_use]
    pub fn keepalive(&self) -> Option<Duration> {
        self.wg_keepalive.map(|secs| Duration::from_secs(u64::from(secs)))
    }

    /// Ranges the node may route traffic for
    ///
    /// Addresses become host routes. Every entry is truncated to its network
    /// address and duplicates are dropped. Records loaded from the store
    /// carry validated addresses; a hand-built record with an unparseable
    /// value has it logged and skipped.
    #[must_use]
    pub fn ip_nets(&self) -> Vec<IpNet> {
        let candidates = [
            ("address4", self.address4.as_deref().map(parse_address4)),
            ("range4", self.range4.as_deref().map(parse_range)),
            ("address6", self.address6.as_deref().map(parse_address6)),
            ("range6", self.range6.as_deref().map(parse_range)),
        ];

        let mut nets: Vec<IpNet> = Vec::with_capacity(candidates.len());
        for (field, parsed) in candidates {
            match parsed {
                None => {}
                Some(Ok(net)) => {
                    let net = net.trunc();
                    if !nets.contains(&net) {
                        nets.push(net);
                    }
                }
                Some(Err(value)) => warn!("Ignoring unparseable {} '{}'", field, value),
            }
        }
        nets
    }
}

fn parse_address4(value: &str) -> Result<IpNet, String> {
    value
        .trim()
        .parse::<Ipv4Addr>()
        .map(|addr| IpNet::V4(Ipv4Net::from(addr)))
        .map_err(|_| value.to_string())
}

fn parse_address6(value: &str) -> Result<IpNet, String> {
    value
        .trim()
        .parse::<Ipv6Addr>()
        .map(|addr| IpNet::V6(Ipv6Net::from(addr)))
        .map_err(|_| value.to_string())
}

fn parse_range(value: &str) -> Result<IpNet, String> {
    value.trim().parse::<IpNet>().map_err(|_| value.to_string())
}
