//! Configuration module for concentrator-config
//!
//! This module provides the etcd connection descriptor, logging settings
//! and Go-style duration parsing.
//!
//! # Example
//!
//! ```no_run
//! use concentrator_config::config::load_config;
//!
//! let config = load_config("/etc/etcd-client.json").unwrap();
//! println!("etcd endpoints: {:?}", config.endpoints);
//! ```

mod loader;
mod types;

pub use loader::{load_config, load_config_str, load_config_with_env};
pub use types::{
    format_duration, parse_duration, EtcdClientConfig, LogConfig, DEFAULT_DEVICE_NAME,
    DEFAULT_ETCD_CONFIG_PATH, DEFAULT_INTERVAL, DEFAULT_PREFIX,
};
