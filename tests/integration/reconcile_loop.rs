//! Reconciliation loop tests against in-memory store and interface

use std::time::Duration;

use concentrator_config::error::ConcentratorError;
use concentrator_config::scheduler::{CycleOutcome, LoopPhase, LoopSettings, ReconcileLoop};
use concentrator_config::store::StoreSnapshot;
use concentrator_config::wireguard::{Peer, PeerOperation};

use super::mocks::{key, net, node_v4, MockController, MockKvStore, MockStore};

fn reconciler(
    store: MockStore,
    controller: MockController,
) -> ReconcileLoop<MockStore, MockController> {
    ReconcileLoop::new(store, controller, LoopSettings::default())
}

#[tokio::test]
async fn test_cycle_applies_and_converges() {
    let store = MockStore::default();
    store.insert(key(1), node_v4("10.0.0.1", Some(25)));
    store.insert(key(2), node_v4("10.0.0.2", None));
    let controller = MockController::new(vec![Peer::new(key(3), vec![net("10.0.0.3/32")])]);
    let reconciler = reconciler(store, controller);

    let outcome = reconciler.run_cycle(false).await;
    assert!(matches!(outcome, CycleOutcome::Applied(3)));
    assert_eq!(reconciler.controller().applied().len(), 1);

    let peers = reconciler.controller().peers();
    assert_eq!(peers.len(), 2);
    assert!(peers.iter().all(|p| p.public_key != key(3)));

    // applying the diff leaves nothing to do
    let outcome = reconciler.run_cycle(false).await;
    assert!(matches!(outcome, CycleOutcome::NoChanges));
    assert_eq!(reconciler.controller().applied().len(), 1);
}

#[tokio::test]
async fn test_snapshot_failure_skips_store_and_apply() {
    let store = MockStore::default();
    store.insert(key(1), node_v4("10.0.0.1", None));
    let controller = MockController::default();
    controller.set_snapshot_failing(true);
    let reconciler = reconciler(store, controller);

    let outcome = reconciler.run_cycle(false).await;
    match outcome {
        CycleOutcome::Failed { phase, error } => {
            assert_eq!(phase, LoopPhase::Fetching);
            assert!(matches!(error, ConcentratorError::Wireguard(_)));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(reconciler.store().fetches(), 0);
    assert!(reconciler.controller().applied().is_empty());
}

#[tokio::test]
async fn test_store_failure_skips_apply() {
    let store = MockStore::default();
    store.set_failing(true);
    let controller = MockController::new(vec![Peer::new(key(1), vec![])]);
    let reconciler = reconciler(store, controller);

    let outcome = reconciler.run_cycle(false).await;
    assert!(matches!(
        outcome,
        CycleOutcome::Failed {
            phase: LoopPhase::Fetching,
            error: ConcentratorError::Store(_)
        }
    ));
    assert!(reconciler.controller().applied().is_empty());
    assert_eq!(reconciler.controller().peers().len(), 1);
}

#[tokio::test]
async fn test_malformed_key_fails_closed() {
    let store = MockStore::default();
    store.insert(key(1), node_v4("10.0.0.1", None));
    store.insert_raw("not a key", node_v4("10.0.0.2", None));
    let controller = MockController::new(vec![Peer::new(key(5), vec![])]);
    let reconciler = reconciler(store, controller);

    let outcome = reconciler.run_cycle(false).await;
    assert!(matches!(
        outcome,
        CycleOutcome::Failed {
            phase: LoopPhase::Diffing,
            error: ConcentratorError::Reconcile(_)
        }
    ));
    // the stale peer is not removed either
    assert_eq!(reconciler.controller().peers()[0].public_key, key(5));
    assert!(reconciler.controller().applied().is_empty());
}

#[tokio::test]
async fn test_mistyped_address_fails_closed() {
    let k1 = key(1).to_store_key();
    let k2 = key(2).to_store_key();
    let store = MockKvStore::new("/config/");
    store.put(&format!("/config/{k1}/address4"), "10.0.0.1");
    store.put(&format!("/config/{k2}/address4"), "10.0.0.2");
    let controller = MockController::new(vec![Peer::new(key(2), vec![net("10.0.0.2/32")])]);
    let reconciler = ReconcileLoop::new(store, controller, LoopSettings::default());

    assert!(matches!(
        reconciler.run_cycle(false).await,
        CycleOutcome::Applied(1)
    ));

    // a typo must not strip the peer of its addresses
    reconciler
        .store()
        .put(&format!("/config/{k2}/address4"), "10.0.0.300");
    let outcome = reconciler.run_cycle(false).await;
    assert!(matches!(
        outcome,
        CycleOutcome::Failed {
            phase: LoopPhase::Fetching,
            error: ConcentratorError::Store(_)
        }
    ));
    assert_eq!(reconciler.controller().applied().len(), 1);
    let peer = reconciler
        .controller()
        .peers()
        .into_iter()
        .find(|p| p.public_key == key(2))
        .unwrap();
    assert_eq!(peer.allowed_ips, vec![net("10.0.0.2/32")]);
}

#[tokio::test]
async fn test_apply_failure_is_reported() {
    let store = MockStore::default();
    store.insert(key(1), node_v4("10.0.0.1", None));
    let controller = MockController::default();
    controller.set_apply_failing(true);
    let reconciler = reconciler(store, controller);

    let outcome = reconciler.run_cycle(false).await;
    assert!(matches!(
        outcome,
        CycleOutcome::Failed {
            phase: LoopPhase::Applying,
            ..
        }
    ));
    assert!(outcome.is_failed());
    assert!(reconciler.controller().peers().is_empty());
}

#[tokio::test]
async fn test_simulate_prints_without_applying() {
    let store = MockStore::default();
    store.insert(key(1), node_v4("10.0.0.1", Some(25)));
    let controller = MockController::new(vec![Peer::new(key(2), vec![])]);
    let reconciler = reconciler(store, controller);

    let mut out = Vec::new();
    let ops = reconciler.simulate(&mut out).await.unwrap();

    assert_eq!(ops.len(), 2);
    assert!(matches!(ops[0], PeerOperation::Remove { .. }));
    assert!(reconciler.controller().applied().is_empty());
    assert_eq!(reconciler.controller().peers().len(), 1);

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Peer updates: 2\n"));
    assert!(text.contains("remove "));
    assert!(text.contains("allowed-ips [10.0.0.1/32] keepalive 25s"));
}

#[tokio::test]
async fn test_simulate_prints_empty_batch() {
    let reconciler = reconciler(MockStore::default(), MockController::default());

    let mut out = Vec::new();
    let ops = reconciler.simulate(&mut out).await.unwrap();

    assert!(ops.is_empty());
    assert_eq!(String::from_utf8(out).unwrap(), "Peer updates: 0\n");
}

#[tokio::test]
async fn test_simulate_failure_prints_nothing() {
    let store = MockStore::default();
    store.set_failing(true);
    let reconciler = reconciler(store, MockController::default());

    let mut out = Vec::new();
    let result = reconciler.simulate(&mut out).await;

    assert!(matches!(result, Err(ConcentratorError::Store(_))));
    assert!(out.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_sleeps_interval_between_cycles() {
    let store = MockStore::new(StoreSnapshot::default());
    store.set_failing(true);
    let settings = LoopSettings {
        device_name: "wg-test".into(),
        interval: Duration::from_secs(60),
    };
    let reconciler = ReconcileLoop::new(store, MockController::default(), settings);

    // cycles at 0s, 60s and 120s; failures do not stop the loop
    let result = tokio::time::timeout(Duration::from_secs(150), reconciler.run()).await;

    assert!(result.is_err());
    assert_eq!(reconciler.controller().snapshots(), 3);
    assert_eq!(reconciler.store().fetches(), 3);
}
