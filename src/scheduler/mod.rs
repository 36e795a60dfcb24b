//! Periodic reconciliation loop
//!
//! Every cycle reads the interface, reads the store, computes the peer
//! operations and applies them as one batch. A failing cycle is logged and
//! abandoned; the loop sleeps the configured interval and tries again.
//!
//! # Cycle phases
//!
//! ```text
//! Fetching → Diffing → Applying → Sleeping
//!     └──────────┴──────────┴────────┘  (on error)
//! ```

use std::fmt;
use std::io::Write;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_DEVICE_NAME, DEFAULT_INTERVAL};
use crate::error::{self, ConcentratorError};
use crate::reconcile::compute;
use crate::store::ConfigStore;
use crate::wireguard::{InterfaceController, PeerOperation};

/// Settings of the reconciliation loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    /// `WireGuard` device to reconcile
    pub device_name: String,
    /// Pause between two cycles
    pub interval: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.into(),
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Phase of a cycle, reported with failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Reading the interface and the store
    Fetching,
    /// Computing peer operations
    Diffing,
    /// Handing the batch to the interface
    Applying,
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching => write!(f, "fetching"),
            Self::Diffing => write!(f, "diffing"),
            Self::Applying => write!(f, "applying"),
        }
    }
}

/// Result of one cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// Interface already matches the store
    NoChanges,
    /// This many operations were applied
    Applied(usize),
    /// Operations computed in simulate mode, not applied
    Simulated(Vec<PeerOperation>),
    /// The cycle was abandoned
    Failed {
        phase: LoopPhase,
        error: ConcentratorError,
    },
}

impl CycleOutcome {
    /// Whether the cycle was abandoned
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Whether the next cycle can be expected to succeed without operator
    /// intervention
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Failed { error, .. } => error.is_recoverable(),
            _ => true,
        }
    }
}

/// Drives reconciliation between a config store and an interface
pub struct ReconcileLoop<S, C> {
    store: S,
    controller: C,
    settings: LoopSettings,
}

impl<S, C> ReconcileLoop<S, C>
where
    S: ConfigStore,
    C: InterfaceController,
{
    /// Create a new loop
    pub fn new(store: S, controller: C, settings: LoopSettings) -> Self {
        Self {
            store,
            controller,
            settings,
        }
    }

    /// Loop settings
    #[must_use]
    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// The config store
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The interface controller
    #[must_use]
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Fetch both sides and compute the operations
    async fn plan(&self) -> Result<Vec<PeerOperation>, (LoopPhase, ConcentratorError)> {
        let device = &self.settings.device_name;

        let current = self
            .controller
            .snapshot(device)
            .await
            .map_err(|e| (LoopPhase::Fetching, ConcentratorError::from(e)))?;

        let snapshot = self
            .store
            .fetch_all()
            .await
            .map_err(|e| (LoopPhase::Fetching, ConcentratorError::from(e)))?;

        debug!(
            "Device {} has {} peers, store has {} nodes",
            device,
            current.len(),
            snapshot.nodes.len()
        );

        compute(&snapshot.nodes, &current, &snapshot.defaults)
            .map_err(|e| (LoopPhase::Diffing, ConcentratorError::from(e)))
    }

    /// Run a single cycle
    ///
    /// With `simulate` set the operations are returned instead of applied.
    pub async fn run_cycle(&self, simulate: bool) -> CycleOutcome {
        let operations = match self.plan().await {
            Ok(ops) => ops,
            Err((phase, error)) => return CycleOutcome::Failed { phase, error },
        };

        if simulate {
            return CycleOutcome::Simulated(operations);
        }

        if operations.is_empty() {
            return CycleOutcome::NoChanges;
        }

        match self
            .controller
            .apply(&self.settings.device_name, &operations)
            .await
        {
            Ok(()) => CycleOutcome::Applied(operations.len()),
            Err(e) => CycleOutcome::Failed {
                phase: LoopPhase::Applying,
                error: e.into(),
            },
        }
    }

    /// Compute the operations once and print them to `out`
    ///
    /// Never applies anything.
    ///
    /// # Errors
    ///
    /// Returns the error of the failed phase, or an I/O error from `out`.
    pub async fn simulate<W: Write>(&self, out: &mut W) -> error::Result<Vec<PeerOperation>> {
        let operations = self.plan().await.map_err(|(phase, error)| {
            error!("Error while {}: {}", phase, error);
            error
        })?;
        write_operations(out, &operations)?;
        Ok(operations)
    }

    /// Reconcile forever, sleeping the interval after every cycle
    pub async fn run(&self) {
        info!(
            "Reconciling device {} every {:?}",
            self.settings.device_name, self.settings.interval
        );

        loop {
            log_outcome(&self.run_cycle(false).await);
            tokio::time::sleep(self.settings.interval).await;
        }
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::NoChanges => debug!("Peers up to date"),
        CycleOutcome::Applied(count) => info!("Updated {} peers", count),
        CycleOutcome::Simulated(ops) => debug!("Simulated {} peer updates", ops.len()),
        CycleOutcome::Failed { phase, error } if outcome.is_recoverable() => {
            warn!("Error while {}: {}", phase, error);
        }
        CycleOutcome::Failed { phase, error } => {
            error!("Error while {}, needs attention: {}", phase, error);
        }
    }
}

/// Print an operation batch, one operation per line
///
/// # Errors
///
/// Returns any error from `out`.
pub fn write_operations<W: Write>(
    out: &mut W,
    operations: &[PeerOperation],
) -> std::io::Result<()> {
    writeln!(out, "Peer updates: {}", operations.len())?;
    for op in operations {
        writeln!(out, "  {op}")?;
    }
    out.flush()
}
