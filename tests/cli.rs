use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn cli_auto_mode_runs_to_completion() {
    let mut cmd = Command::cargo_bin("gto-trainer").expect("binary exists");
    cmd.arg("--hands")
        .arg("1")
        .arg("--mc")
        .arg("50")
        .arg("--no-color")
        .arg("--auto");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Summary"));
}

#[test]
fn cli_benchmark_subcommand_reports_a_combined_line() {
    let mut cmd = Command::cargo_bin("gto-trainer").expect("binary exists");
    cmd.arg("benchmark")
        .arg("--hands")
        .arg("2")
        .arg("--seed")
        .arg("7")
        .arg("--mc")
        .arg("40");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("combined"));
}
