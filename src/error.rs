//! Error types for concentrator-config
//!
//! This module defines the error hierarchy for the peer reconciler.
//! Errors are categorized by subsystem and carry a recovery hint: a
//! recoverable error abandons the current cycle, the loop keeps running.

use std::io;

use thiserror::Error;

/// Top-level error type for concentrator-config
#[derive(Debug, Error)]
pub enum ConcentratorError {
    /// Configuration errors (file parsing, validation)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Config store (etcd) errors
    #[error("Config store error: {0}")]
    Store(#[from] StoreError),

    /// `WireGuard` interface errors
    #[error("WireGuard error: {0}")]
    Wireguard(#[from] WgError),

    /// Reconciliation errors (malformed desired state)
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// I/O errors not covered by other categories
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ConcentratorError {
    /// Check if this error only affects the current cycle
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(e) => e.is_recoverable(),
            Self::Store(e) => e.is_recoverable(),
            Self::Wireguard(e) => e.is_recoverable(),
            Self::Reconcile(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::ConnectionReset
            ),
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found or inaccessible
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Validation error (invalid values, missing required fields)
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Environment variable error
    #[error("Environment variable error: {name}: {reason}")]
    EnvError { name: String, reason: String },

    /// Duration string could not be parsed
    #[error("Invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// I/O error while reading config
    #[error("I/O error reading configuration: {0}")]
    IoError(#[from] io::Error),
}

impl ConfigError {
    /// Config errors are not recoverable without user intervention
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }

    /// Create an invalid duration error
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Config store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not establish a client connection
    #[error("Failed to connect to etcd at {endpoints}: {reason}")]
    Connect { endpoints: String, reason: String },

    /// A request against the store failed
    #[error("etcd request failed: {0}")]
    Request(String),

    /// A key or value was not valid UTF-8
    #[error("Non UTF-8 data under key {key}")]
    Encoding { key: String },

    /// A known field held a value that could not be parsed
    #[error("Invalid value for field '{field}' of node {node}: {reason}")]
    InvalidValue {
        node: String,
        field: String,
        reason: String,
    },

    /// TLS material could not be loaded
    #[error("Failed to load TLS file {path}: {reason}")]
    Tls { path: String, reason: String },
}

impl StoreError {
    /// Check if this error is recoverable
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Connect { .. } => false,
            Self::Request(_) => true,
            Self::Encoding { .. } => true,
            Self::InvalidValue { .. } => true,
            Self::Tls { .. } => false,
        }
    }

    /// Create a request error
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(
        node: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            node: node.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// `WireGuard` interface errors
#[derive(Debug, Error)]
pub enum WgError {
    /// The `wg` tool could not be started
    #[error("Failed to run {binary}: {reason}")]
    Spawn { binary: String, reason: String },

    /// The `wg` tool exited with an error
    #[error("'{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Output of `wg show dump` could not be parsed
    #[error("Failed to parse wg output: {0}")]
    ParseError(String),

    /// A public key was not valid base64 or not 32 bytes
    #[error("Invalid WireGuard key: {0}")]
    InvalidKey(String),
}

impl WgError {
    /// Check if this error is recoverable
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Spawn { .. } => false,
            Self::CommandFailed { .. } => true,
            Self::ParseError(_) => true,
            Self::InvalidKey(_) => true,
        }
    }

    /// Create a spawn error
    pub fn spawn(binary: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Spawn {
            binary: binary.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

/// Errors raised while computing peer operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// Store key is not valid URL-safe base64
    #[error("couldn't base64 decode pubkey '{key}'")]
    InvalidKeyEncoding { key: String },

    /// Store key decodes to the wrong number of bytes
    #[error("pubkey '{key}' decodes to {length} bytes, expected 32")]
    InvalidKeyLength { key: String, length: usize },
}

/// Type alias for Result with `ConcentratorError`
pub type Result<T> = std::result::Result<T, ConcentratorError>;
