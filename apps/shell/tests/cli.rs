use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn kvo() -> Command {
    let mut cmd = Command::cargo_bin("kvo").expect("kvo binary should be built");
    cmd.env_remove("RUST_LOG").env_remove("KVO__DISPATCH").env_remove("KVO__PRUNE_ON_NOTIFY");
    cmd
}

#[test]
fn demo_prints_the_recorded_change() {
    kvo()
        .args(["demo", "--name", "Alice", "--previous", "Bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name: Bob -> Alice"))
        .stdout(predicate::str::contains("dispatch: invoked=1 failed=0 pruned=0"))
        .stdout(predicate::str::contains("after unsubscribe: invoked=0"));
}

#[test]
fn stress_reports_totals() {
    kvo()
        .args(["stress", "--threads", "3", "--iterations", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("threads=3 iterations=50 notifications=150"));
}

#[test]
fn config_file_is_loaded() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("registry.toml");
    fs::write(&path, "dispatch = \"isolate\"\nprune_on_notify = false\n")?;

    kvo().arg("--config").arg(&path).arg("demo").assert().success();
    Ok(())
}

#[test]
fn missing_config_file_fails() {
    kvo()
        .args(["--config", "does/not/exist.toml", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load registry configuration"));
}

#[test]
fn invalid_log_level_fails() {
    kvo()
        .args(["--log-level", "verbose", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log level"));
}

#[test]
fn zero_threads_is_rejected() {
    kvo().args(["stress", "--threads", "0"]).assert().failure();
}

#[test]
fn no_arguments_prints_help() {
    kvo().assert().failure().stderr(predicate::str::contains("Usage"));
}
