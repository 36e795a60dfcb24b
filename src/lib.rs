//! concentrator-config: `WireGuard` concentrator peer reconciler
//!
//! This crate keeps the peer list of a `WireGuard` concentrator interface in
//! sync with the node configuration held in etcd.
//!
//! # Features
//!
//! - **Reconciliation**: Minimal add/update/remove diff between store and interface
//! - **Fail-closed batches**: A cycle applies everything or nothing
//! - **Keepalive defaults**: Per-node keepalive with a store-wide fallback
//! - **Simulate mode**: Print the pending changes without applying them
//!
//! # Architecture
//!
//! ```text
//! etcd ──fetch_all──┐
//!                   ├─→ reconcile::compute ─→ wg set (one batch)
//! wg show dump ─────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use concentrator_config::config::load_config;
//! use concentrator_config::scheduler::{LoopSettings, ReconcileLoop};
//! use concentrator_config::store::EtcdStore;
//! use concentrator_config::wireguard::WgCli;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("/etc/etcd-client.json")?;
//! let store = EtcdStore::connect(&config).await?;
//! let controller = WgCli::connect("wg").await?;
//!
//! let reconciler = ReconcileLoop::new(store, controller, LoopSettings::default());
//! reconciler.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: etcd connection descriptor and duration parsing
//! - [`error`]: Error types
//! - [`reconcile`]: Peer diff computation
//! - [`scheduler`]: Periodic reconciliation loop
//! - [`store`]: Node records from etcd
//! - [`wireguard`]: Interface snapshot and configuration

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod reconcile;
pub mod scheduler;
pub mod store;
pub mod wireguard;

// Re-export commonly used types at the crate root
pub use config::{load_config, load_config_with_env, EtcdClientConfig};
pub use error::{ConcentratorError, ConfigError, ReconcileError, StoreError, WgError};
pub use scheduler::{CycleOutcome, LoopPhase, LoopSettings, ReconcileLoop};
pub use store::{ConfigStore, EtcdStore, NodeInfo, NodeSet, StoreSnapshot};
pub use wireguard::{InterfaceController, Peer, PeerOperation, PublicKey, WgCli};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
