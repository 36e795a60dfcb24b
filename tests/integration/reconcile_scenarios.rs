//! Diff scenarios over store snapshots assembled from etcd key/value pairs

use std::time::Duration;

use concentrator_config::reconcile::compute;
use concentrator_config::store::build_snapshot;
use concentrator_config::wireguard::{Peer, PeerOperation};

use super::mocks::{key, net};

const PREFIX: &str = "/config/";

fn kv(node: &str, field: &str, value: &str) -> (String, String) {
    (format!("{PREFIX}{node}/{field}"), value.to_string())
}

#[test]
fn test_mixed_cycle_from_etcd_layout() {
    let kept = key(1).to_store_key();
    let added = key(2).to_store_key();
    let pairs = vec![
        kv(&kept, "address4", "10.0.0.1"),
        kv(&kept, "range4", "10.100.0.0/24"),
        kv(&kept, "address6", "fd00::1"),
        kv(&added, "address4", "10.0.0.2"),
        kv(&added, "wg_keepalive", "30"),
        kv("default", "wg_keepalive", "15"),
        kv(&kept, "hostname", "ignored"),
    ];

    let snapshot =
        build_snapshot(PREFIX, pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))).unwrap();

    let current = vec![
        Peer::new(key(9), vec![net("10.0.0.9/32")]),
        // same ranges in a different order, keepalive from default
        Peer::new(
            key(1),
            vec![net("fd00::1/128"), net("10.0.0.1/32"), net("10.100.0.0/24")],
        )
        .with_keepalive(Duration::from_secs(15)),
    ];

    let ops = compute(&snapshot.nodes, &current, &snapshot.defaults).unwrap();

    assert_eq!(
        ops,
        vec![
            PeerOperation::Remove { public_key: key(9) },
            PeerOperation::Replace {
                public_key: key(2),
                allowed_ips: vec![net("10.0.0.2/32")],
                persistent_keepalive: Duration::from_secs(30),
            },
        ]
    );
}

#[test]
fn test_removed_default_disables_keepalive() {
    let node = key(3).to_store_key();
    let pairs = [(format!("{PREFIX}{node}/address4"), "10.0.0.3".to_string())];
    let snapshot =
        build_snapshot(PREFIX, pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))).unwrap();

    let current = vec![
        Peer::new(key(3), vec![net("10.0.0.3/32")]).with_keepalive(Duration::from_secs(15)),
    ];

    let ops = compute(&snapshot.nodes, &current, &snapshot.defaults).unwrap();
    assert_eq!(
        ops,
        vec![PeerOperation::Replace {
            public_key: key(3),
            allowed_ips: vec![net("10.0.0.3/32")],
            persistent_keepalive: Duration::ZERO,
        }]
    );
}

#[test]
fn test_one_operation_per_peer() {
    let desired = (10..20u8)
        .map(|b| {
            let node = concentrator_config::store::NodeInfo {
                address4: Some(format!("10.0.0.{b}")),
                ..Default::default()
            };
            (key(b).to_store_key(), node)
        })
        .collect();
    let current: Vec<Peer> = (0..15u8)
        .map(|b| Peer::new(key(b), vec![net(&format!("10.0.1.{b}/32"))]))
        .collect();

    let ops = compute(&desired, &current, &Default::default()).unwrap();

    // 0..10 removed, 10..15 updated, 15..20 added
    assert_eq!(ops.len(), 20);
    assert_eq!(ops.iter().filter(|op| op.is_remove()).count(), 10);

    let mut keys: Vec<_> = ops.iter().map(|op| *op.public_key()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 20);
}
