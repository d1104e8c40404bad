//! CLI surface of the server binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_server_flags() {
    Command::cargo_bin("gig_api_server")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--database-url"))
        .stdout(predicate::str::contains("--logout-policy"));
}

#[test]
fn unknown_logout_policy_is_rejected() {
    Command::cargo_bin("gig_api_server")
        .unwrap()
        .args(["--logout-policy", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown logout policy"));
}

#[test]
fn bcrypt_cost_outside_supported_range_is_rejected() {
    for cost in ["3", "32"] {
        Command::cargo_bin("gig_api_server")
            .unwrap()
            .arg(format!("--bcrypt-cost={cost}"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("--bcrypt-cost"));
    }
}

#[test]
fn token_ttl_must_be_positive_and_bounded() {
    for ttl in ["0", "-5", "9000000000000"] {
        Command::cargo_bin("gig_api_server")
            .unwrap()
            .arg(format!("--token-ttl-secs={ttl}"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("--token-ttl-secs"));
    }
}

#[test]
fn zero_sweep_interval_is_rejected() {
    Command::cargo_bin("gig_api_server")
        .unwrap()
        .args(["--sweep-interval-secs", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--sweep-interval-secs"));
}
