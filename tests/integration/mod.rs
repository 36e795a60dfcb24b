//! Integration tests for concentrator-config
//!
//! # Test Organization
//!
//! - `mocks`: In-memory config store and interface controller
//! - `reconcile_scenarios`: End to end diff scenarios over store snapshots
//! - `reconcile_loop`: Cycle outcomes, simulate mode and interval sleeping
//! - `cli`: Binary argument handling and exit codes
//!
//! # Test Requirements
//!
//! None of these tests need etcd, a `WireGuard` device or root.

pub mod cli;
pub mod reconcile_loop;
pub mod reconcile_scenarios;
