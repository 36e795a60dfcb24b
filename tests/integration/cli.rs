//! Binary argument handling and exit codes
//!
//! These tests stop before any network or `wg` access: either argument
//! parsing fails or the etcd descriptor cannot be loaded.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn concentratorconfig() -> Command {
    Command::cargo_bin("concentratorconfig").unwrap()
}

#[test]
fn test_help_exits_zero() {
    concentratorconfig()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--etcdconfig"))
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--devicename"))
        .stdout(predicate::str::contains("simulate"));
}

#[test]
fn test_version_exits_zero() {
    concentratorconfig()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_flag_exits_one() {
    concentratorconfig()
        .arg("--no-such-flag")
        .assert()
        .code(1);
}

#[test]
fn test_invalid_interval_exits_one() {
    concentratorconfig()
        .args(["-i", "soon", "simulate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("soon"));
}

#[test]
fn test_zero_interval_exits_one() {
    concentratorconfig()
        .args(["--interval", "0s"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("greater than 0"));
}

#[test]
fn test_missing_etcd_config_exits_one() {
    concentratorconfig()
        .args(["-e", "/nonexistent/etcd-client.json", "simulate"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Couldn't load etcd configuration"));
}

#[test]
fn test_invalid_etcd_config_exits_one() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{ "endpoints": [] }"#).unwrap();

    concentratorconfig()
        .arg("-e")
        .arg(file.path())
        .arg("show-overrides")
        .env_remove("CONCENTRATOR_ETCD_ENDPOINTS")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("endpoint"));
}

#[test]
fn test_invalid_log_format_exits_one() {
    concentratorconfig()
        .args(["--log-format", "xml", "simulate"])
        .assert()
        .code(1);
}

#[test]
fn test_log_target_flag() {
    let run = |extra: &[&str]| {
        concentratorconfig()
            .args(["--log-format", "json", "-e", "/nonexistent/etcd-client.json"])
            .args(extra)
            .arg("simulate")
            .assert()
            .code(1)
    };

    run(&["--log-target"]).stderr(predicate::str::contains(r#""target":"concentratorconfig""#));
    run(&[]).stderr(predicate::str::contains(r#""target""#).not());
}
