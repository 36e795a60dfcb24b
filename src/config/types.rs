//! Configuration types for concentrator-config
//!
//! The etcd connection descriptor is loaded from a JSON file (by default
//! `/etc/etcd-client.json`). Durations use Go syntax (`5s`, `1m30s`,
//! `250ms`) so existing descriptors keep working.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default path of the etcd connection descriptor
pub const DEFAULT_ETCD_CONFIG_PATH: &str = "/etc/etcd-client.json";

/// Default `WireGuard` device to reconcile
pub const DEFAULT_DEVICE_NAME: &str = "wg-nodes";

/// Default reconciliation interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Default key prefix holding the node records
pub const DEFAULT_PREFIX: &str = "/config/";

/// etcd client connection descriptor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EtcdClientConfig {
    /// Client endpoints (e.g., "https://etcd1:2379")
    pub endpoints: Vec<String>,

    /// Username for authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Connection establishment timeout
    #[serde(default = "default_dial_timeout", with = "go_duration")]
    pub dial_timeout: Duration,

    /// Timeout for a single request
    #[serde(default = "default_request_timeout", with = "go_duration")]
    pub request_timeout: Duration,

    /// CA certificate (PEM) used to verify the servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cacert: Option<PathBuf>,

    /// Client certificate (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<PathBuf>,

    /// Client private key (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PathBuf>,

    /// Key prefix under which node records live
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl EtcdClientConfig {
    /// Create a descriptor for plain-text endpoints with defaults
    #[must_use]
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            username: None,
            password: None,
            dial_timeout: default_dial_timeout(),
            request_timeout: default_request_timeout(),
            cacert: None,
            cert: None,
            key: None,
            prefix: default_prefix(),
        }
    }

    /// Validate the descriptor
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one etcd endpoint must be configured".into(),
            ));
        }

        if self.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "etcd endpoints cannot be empty strings".into(),
            ));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::ValidationError(
                "username and password must be given together".into(),
            ));
        }

        if self.cert.is_some() != self.key.is_some() {
            return Err(ConfigError::ValidationError(
                "cert and key must be given together".into(),
            ));
        }

        if self.dial_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "dial-timeout must be greater than 0".into(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request-timeout must be greater than 0".into(),
            ));
        }

        if !self.prefix.starts_with('/') || !self.prefix.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "prefix must start and end with '/': {}",
                self.prefix
            )));
        }

        Ok(())
    }

    /// Whether TLS material is configured
    #[must_use]
    pub fn uses_tls(&self) -> bool {
        self.cacert.is_some() || self.cert.is_some()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Include target (module path)
    #[serde(default)]
    pub target: bool,
}

impl LogConfig {
    /// Validate the logging configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for unknown levels or formats.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown log level: {other}"
                )))
            }
        }

        match self.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown log format: {other}"
            ))),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: false,
        }
    }
}

fn default_dial_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

/// Parse a Go-style duration string
///
/// Accepts a sequence of decimal numbers with unit suffixes
/// (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`), e.g. `60s`, `1m30s`, `1.5h`.
/// A bare `0` is accepted as zero. Negative durations are rejected.
///
/// # Errors
///
/// Returns `ConfigError::InvalidDuration` if the string cannot be parsed.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ConfigError::invalid_duration(input, "empty duration"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.starts_with('-') {
        return Err(ConfigError::invalid_duration(input, "negative duration"));
    }

    let mut rest = s.strip_prefix('+').unwrap_or(s);
    let mut total = Duration::ZERO;

    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return Err(ConfigError::invalid_duration(input, "expected a number"));
        }
        let (number, tail) = rest.split_at(num_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(ConfigError::invalid_duration(input, "missing unit")),
            other => {
                return Err(ConfigError::invalid_duration(
                    input,
                    format!("unknown unit '{other}'"),
                ))
            }
        };

        let value: f64 = number
            .parse()
            .map_err(|_| ConfigError::invalid_duration(input, format!("bad number '{number}'")))?;

        let nanos = (value * nanos_per_unit).round();
        #[allow(clippy::cast_precision_loss)]
        let limit = u64::MAX as f64;
        if !(nanos < limit) {
            return Err(ConfigError::invalid_duration(input, "duration out of range"));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let component = Duration::from_nanos(nanos as u64);
        total = total
            .checked_add(component)
            .filter(|d| d.as_nanos() <= u128::from(u64::MAX))
            .ok_or_else(|| ConfigError::invalid_duration(input, "duration out of range"))?;
        rest = tail;
    }

    Ok(total)
}

/// Render a duration in a form `parse_duration` accepts
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else if duration.subsec_nanos() % 1_000_000 == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{}ns", duration.as_nanos())
    }
}

mod go_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
