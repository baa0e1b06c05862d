use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn confkit() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_confkit"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn prints_defaults_and_ignores_other_prefixes() {
    confkit()
        .env("CONFKIT_CLI_TEST__PORT", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 8080\n"))
        .stdout(predicate::str::contains("address = \"127.0.0.1\"\n"));
}

#[test]
fn layers_files_environment_and_overrides() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("base.yml");
    let prod = dir.path().join("prod.toml");
    fs::write(&base, "port: 9000\naddress: 0.0.0.0\nallowed_origins: https://a.example\n")
        .unwrap();
    fs::write(&prod, "timeout = 5\n[labels]\nregion = \"eu\"\n").unwrap();

    confkit()
        .arg(&base)
        .arg(&prod)
        .args(["--env-prefix", "CONFKIT_CLI_TEST", "--set", "tls=true", "--format", "json"])
        .env("CONFKIT_CLI_TEST__PORT", "9443")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"port\": 9443"))
        .stdout(predicate::str::contains("\"address\": \"0.0.0.0\""))
        .stdout(predicate::str::contains("\"timeout\": 5.0"))
        .stdout(predicate::str::contains("\"tls\": true"))
        .stdout(predicate::str::contains("\"region\": \"eu\""))
        .stdout(predicate::str::contains("https://a.example"));
}

#[test]
fn lock_after_load_is_reported() {
    confkit()
        .arg("--lock-after-load")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# locked\n"));
}

#[test]
fn invalid_values_fail_with_the_parameter_name() {
    confkit()
        .args(["--set", "port=70000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--set port"))
        .stderr(predicate::str::contains("port"));
}

#[test]
fn missing_files_fail_with_the_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.yml");

    confkit()
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.yml"));
}

#[test]
fn malformed_overrides_are_usage_errors() {
    confkit()
        .args(["--set", "port"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn self_including_files_fail_cleanly() {
    let dir = TempDir::new().unwrap();
    let looped = dir.path().join("loop.yml");
    fs::write(&looped, format!("options_source: {}\n", looped.display())).unwrap();

    confkit()
        .arg(&looped)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("includes itself"));
}
