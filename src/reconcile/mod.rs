//! Peer reconciliation
//!
//! [`compute`] is a pure function: given the desired node records, the
//! interface's current peers and the default record, it returns the peer
//! operations that make the interface match the store. It has no side
//! effects and either returns the full batch or an error.
//!
//! # Ordering
//!
//! Operations for peers already on the interface come first, in interface
//! order. Operations adding new peers follow, sorted by raw public key.
//!
//! # Example
//!
//! ```
//! use concentrator_config::reconcile::compute;
//! use concentrator_config::store::{NodeInfo, NodeSet};
//!
//! let ops = compute(&NodeSet::new(), &[], &NodeInfo::default()).unwrap();
//! assert!(ops.is_empty());
//! ```

use std::cmp::Ordering;
use std::time::Duration;

use ipnet::IpNet;
use tracing::trace;

use crate::error::ReconcileError;
use crate::store::{NodeInfo, NodeSet};
use crate::wireguard::{Peer, PeerOperation, PublicKey};

/// Compute the operations turning `current` into `desired`
///
/// # Errors
///
/// Returns `ReconcileError` if a store key of a node missing from the
/// interface is not a valid public key. No operations are returned then.
pub fn compute(
    desired: &NodeSet,
    current: &[Peer],
    defaults: &NodeInfo,
) -> Result<Vec<PeerOperation>, ReconcileError> {
    let mut remaining: NodeSet = desired.clone();
    let mut operations = Vec::new();

    for peer in current {
        let store_key = peer.public_key.to_store_key();
        let Some(node) = remaining.remove(&store_key) else {
            trace!("Peer {} vanished from the store", peer.public_key);
            operations.push(PeerOperation::Remove {
                public_key: peer.public_key,
            });
            continue;
        };

        let mut wanted = node.ip_nets();
        sort_canonical(&mut wanted);
        let mut actual = peer.allowed_ips.clone();
        sort_canonical(&mut actual);

        let keepalive = resolve_keepalive(&node, defaults);

        if !nets_equal(&wanted, &actual) || keepalive != peer.persistent_keepalive {
            trace!("Peer {} needs an update", peer.public_key);
            operations.push(PeerOperation::Replace {
                public_key: peer.public_key,
                allowed_ips: wanted,
                persistent_keepalive: keepalive,
            });
        }
    }

    let mut added = remaining
        .iter()
        .map(|(store_key, node)| PublicKey::from_store_key(store_key).map(|k| (k, node)))
        .collect::<Result<Vec<_>, _>>()?;
    added.sort_by(|(a, _), (b, _)| a.cmp(b));

    operations.extend(added.into_iter().map(|(public_key, node)| {
        trace!("Peer {} is new", public_key);
        PeerOperation::Replace {
            public_key,
            allowed_ips: node.ip_nets(),
            persistent_keepalive: resolve_keepalive(node, defaults),
        }
    }));

    Ok(operations)
}

/// Keepalive for a node: its own value, else the default record's, else off
#[must_use]
pub fn resolve_keepalive(node: &NodeInfo, defaults: &NodeInfo) -> Duration {
    node.keepalive()
        .or_else(|| defaults.keepalive())
        .unwrap_or(Duration::ZERO)
}

/// Sort ranges by address bytes, then mask bytes, both descending
pub fn sort_canonical(nets: &mut [IpNet]) {
    nets.sort_by(|a, b| canonical_cmp(b, a));
}

fn canonical_cmp(a: &IpNet, b: &IpNet) -> Ordering {
    addr_octets(a)
        .cmp(&addr_octets(b))
        .then_with(|| mask_octets(a).cmp(&mask_octets(b)))
}

/// Equality of two canonically sorted range lists
fn nets_equal(a: &[IpNet], b: &[IpNet]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            addr_octets(x) == addr_octets(y) && mask_octets(x) == mask_octets(y)
        })
}

fn addr_octets(net: &IpNet) -> Vec<u8> {
    match net {
        IpNet::V4(n) => n.addr().octets().to_vec(),
        IpNet::V6(n) => n.addr().octets().to_vec(),
    }
}

fn mask_octets(net: &IpNet) -> Vec<u8> {
    match net {
        IpNet::V4(n) => n.netmask().octets().to_vec(),
        IpNet::V6(n) => n.netmask().octets().to_vec(),
    }
}
