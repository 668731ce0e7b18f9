use assert_cmd::prelude::*;
use predicates::prelude::*;

use std::process::Command;

#[test]
fn test_cli() {
    let mut cmd = Command::cargo_bin("schedsim").expect("Calling binary failed");
    cmd.assert().failure();
}

#[test]
fn test_version() {
    let expected_version = "schedsim 0.1.0\n";
    let mut cmd = Command::cargo_bin("schedsim").expect("Calling binary failed");
    cmd.arg("--version").assert().stdout(expected_version);
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("schedsim").expect("Calling binary failed");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("config")));
}

#[test]
fn test_unknown_policy_is_rejected() {
    let mut cmd = Command::cargo_bin("schedsim").expect("Calling binary failed");
    cmd.args(&["run", "--policy", "SJF"]).assert().failure();
}
