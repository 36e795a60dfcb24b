//! Desired state from the config store
//!
//! [`ConfigStore`] hands out the full set of node records plus the default
//! record in one call. [`EtcdStore`] implements it over etcd.

mod etcd;
mod mapping;
mod node;
mod overrides;

use async_trait::async_trait;

use crate::error::StoreError;

pub use etcd::{build_snapshot, EtcdStore, DEFAULT_NODE_KEY};
pub use mapping::{find_field, NodeField, NODE_FIELDS};
pub use node::{NodeInfo, NodeSet};
pub use overrides::{compute_overrides, Override, OverrideReport};

/// All node records read in one fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Nodes keyed by store key
    pub nodes: NodeSet,
    /// Record supplying fallback values
    pub defaults: NodeInfo,
}

/// Source of the desired node configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read every node record and the default record
    async fn fetch_all(&self) -> Result<StoreSnapshot, StoreError>;
}
