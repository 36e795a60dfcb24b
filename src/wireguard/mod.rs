//! `WireGuard` interface access
//!
//! The reconciler talks to the interface through [`InterfaceController`]:
//! one call to read the current peers, one call to apply a batch of peer
//! operations. [`WgCli`] implements it on top of the `wg` tool.

mod cli;
mod key;
mod peer;

use async_trait::async_trait;

use crate::error::WgError;

pub use cli::{build_set_args, parse_dump, WgCli};
pub use key::{PublicKey, WG_KEY_LENGTH};
pub use peer::{Peer, PeerConfig, PeerOperation};

/// Reads and configures the peer list of a `WireGuard` device
#[async_trait]
pub trait InterfaceController: Send + Sync {
    /// Current peers of the device, in interface order
    async fn snapshot(&self, device: &str) -> Result<Vec<Peer>, WgError>;

    /// Apply all operations as one configuration change
    async fn apply(&self, device: &str, operations: &[PeerOperation]) -> Result<(), WgError>;
}
