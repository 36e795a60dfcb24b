//! Peer state and peer operations
//!
//! [`Peer`] is what the interface currently holds. [`PeerOperation`] is one
//! change the reconciler wants applied. [`PeerConfig`] is the flattened wire
//! shape of an operation as a `WireGuard` configuration call consumes it.

use std::fmt;
use std::time::Duration;

use ipnet::IpNet;

use super::key::PublicKey;

/// A peer as currently configured on the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Peer identity
    pub public_key: PublicKey,
    /// Ranges the peer may route traffic for, in interface order
    pub allowed_ips: Vec<IpNet>,
    /// Keepalive interval, zero when disabled
    pub persistent_keepalive: Duration,
}

impl Peer {
    /// Create a peer with keepalive disabled
    #[must_use]
    pub fn new(public_key: PublicKey, allowed_ips: Vec<IpNet>) -> Self {
        Self {
            public_key,
            allowed_ips,
            persistent_keepalive: Duration::ZERO,
        }
    }

    /// Set the keepalive interval
    #[must_use]
    pub fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.persistent_keepalive = keepalive;
        self
    }
}

/// A single change to the interface's peer list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerOperation {
    /// Drop the peer from the interface
    Remove { public_key: PublicKey },

    /// Add the peer or update it in place, replacing its whole allowed-IP list
    Replace {
        public_key: PublicKey,
        allowed_ips: Vec<IpNet>,
        persistent_keepalive: Duration,
    },
}

impl PeerOperation {
    /// Key of the peer this operation targets
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        match self {
            Self::Remove { public_key } | Self::Replace { public_key, .. } => public_key,
        }
    }

    /// Whether this operation removes a peer
    #[must_use]
    pub const fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }
}

impl fmt::Display for PeerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove { public_key } => write!(f, "remove {public_key}"),
            Self::Replace {
                public_key,
                allowed_ips,
                persistent_keepalive,
            } => {
                write!(f, "replace {public_key} allowed-ips [")?;
                for (i, net) in allowed_ips.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{net}")?;
                }
                write!(f, "] keepalive {}s", persistent_keepalive.as_secs())
            }
        }
    }
}

/// Flattened peer configuration as handed to the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    pub public_key: PublicKey,
    pub remove: bool,
    pub replace_allowed_ips: bool,
    pub allowed_ips: Vec<IpNet>,
    /// `None` leaves the interval untouched
    pub persistent_keepalive_interval: Option<Duration>,
}

impl From<&PeerOperation> for PeerConfig {
    fn from(op: &PeerOperation) -> Self {
        match op {
            PeerOperation::Remove { public_key } => Self {
                public_key: *public_key,
                remove: true,
                replace_allowed_ips: false,
                allowed_ips: Vec::new(),
                persistent_keepalive_interval: None,
            },
            PeerOperation::Replace {
                public_key,
                allowed_ips,
                persistent_keepalive,
            } => Self {
                public_key: *public_key,
                remove: false,
                replace_allowed_ips: true,
                allowed_ips: allowed_ips.clone(),
                persistent_keepalive_interval: Some(*persistent_keepalive),
            },
        }
    }
}
