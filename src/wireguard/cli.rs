//! `wg` command line backend
//!
//! Reads peers with `wg show <dev> dump` and applies a whole batch of
//! operations with a single `wg set` invocation, so the kernel either takes
//! the full batch or rejects it.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use ipnet::IpNet;
use tokio::process::Command;
use tracing::{debug, trace};

use super::key::PublicKey;
use super::peer::{Peer, PeerConfig, PeerOperation};
use super::InterfaceController;
use crate::error::WgError;

/// Number of tab separated columns in a peer line of `wg show dump`
const DUMP_PEER_COLUMNS: usize = 8;

/// Interface controller backed by the `wg` tool
#[derive(Debug, Clone)]
pub struct WgCli {
    binary: PathBuf,
}

impl WgCli {
    /// Create a controller without probing the binary
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Create a controller and check that the binary runs
    ///
    /// # Errors
    ///
    /// Returns `WgError::Spawn` if the binary cannot be started, or
    /// `WgError::CommandFailed` if `wg --version` exits unsuccessfully.
    pub async fn connect(binary: impl Into<PathBuf>) -> Result<Self, WgError> {
        let cli = Self::new(binary);
        let version = cli.run(&["--version".to_string()]).await?;
        debug!("Using {}", version.trim());
        Ok(cli)
    }

    /// Path of the `wg` binary
    #[must_use]
    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    async fn run(&self, args: &[String]) -> Result<String, WgError> {
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        trace!("Running {}", command);

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| WgError::spawn(self.binary.display().to_string(), e.to_string()))?;

        if !output.status.success() {
            return Err(WgError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl InterfaceController for WgCli {
    async fn snapshot(&self, device: &str) -> Result<Vec<Peer>, WgError> {
        let args = ["show".to_string(), device.to_string(), "dump".to_string()];
        let output = self.run(&args).await?;
        parse_dump(&output)
    }

    async fn apply(&self, device: &str, operations: &[PeerOperation]) -> Result<(), WgError> {
        if operations.is_empty() {
            return Ok(());
        }
        let configs: Vec<PeerConfig> = operations.iter().map(PeerConfig::from).collect();
        self.run(&build_set_args(device, &configs)).await?;
        Ok(())
    }
}

/// Parse the output of `wg show <dev> dump`
///
/// The first line describes the interface and is skipped. Each following
/// line is one peer.
///
/// # Errors
///
/// Returns `WgError` on a malformed peer line.
pub fn parse_dump(output: &str) -> Result<Vec<Peer>, WgError> {
    output
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(parse_peer_line)
        .collect()
}

fn parse_peer_line(line: &str) -> Result<Peer, WgError> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != DUMP_PEER_COLUMNS {
        return Err(WgError::parse(format!(
            "expected {DUMP_PEER_COLUMNS} columns, got {}: {line:?}",
            columns.len()
        )));
    }

    let public_key = PublicKey::from_base64(columns[0])?;

    let allowed_ips = match columns[3] {
        "(none)" | "" => Vec::new(),
        list => list
            .split(',')
            .map(|net| {
                net.trim()
                    .parse::<IpNet>()
                    .map_err(|e| WgError::parse(format!("allowed ip '{net}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    let persistent_keepalive = match columns[7] {
        "off" => Duration::ZERO,
        secs => Duration::from_secs(
            secs.parse::<u64>()
                .map_err(|e| WgError::parse(format!("keepalive '{secs}': {e}")))?,
        ),
    };

    Ok(Peer {
        public_key,
        allowed_ips,
        persistent_keepalive,
    })
}

/// Build the arguments of one `wg set` call carrying every peer change
#[must_use]
pub fn build_set_args(device: &str, configs: &[PeerConfig]) -> Vec<String> {
    let mut args = vec!["set".to_string(), device.to_string()];

    for config in configs {
        args.push("peer".into());
        args.push(config.public_key.to_base64());

        if config.remove {
            args.push("remove".into());
            continue;
        }

        if let Some(keepalive) = config.persistent_keepalive_interval {
            args.push("persistent-keepalive".into());
            if keepalive.is_zero() {
                args.push("off".into());
            } else {
                args.push(keepalive.as_secs().to_string());
            }
        }

        if config.replace_allowed_ips {
            args.push("allowed-ips".into());
            args.push(
                config
                    .allowed_ips
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
    }

    args
}
