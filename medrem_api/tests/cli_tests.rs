//! Integration tests for the medremd binary.
//!
//! Server behavior is covered by in-process router tests; these
//! exercise argument handling and the bootstrap path.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("medremd"))
}

#[test]
fn help_describes_the_service() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Medication reminder API server"));
}

#[test]
fn write_example_config_bootstraps_a_schedule() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("reminder.toml");

    cli()
        .arg("--write-example-config")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote example schedule"));

    let contents = std::fs::read_to_string(&config_path).expect("Failed to read schedule");
    assert!(contents.contains("[settings]"));
    assert!(contents.contains("timezone"));
    assert!(contents.contains("[[medications]]"));
}

#[test]
fn write_example_config_refuses_to_overwrite() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("reminder.toml");

    cli()
        .arg("--write-example-config")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();

    cli()
        .arg("--write-example-config")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));
}

#[test]
fn startup_fails_fast_without_a_schedule() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    cli()
        .arg("--config")
        .arg(temp_dir.path().join("absent.toml"))
        .arg("--bind")
        .arg("127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("write-example-config"));
}

#[test]
fn startup_fails_fast_on_an_invalid_schedule() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("reminder.toml");
    std::fs::write(
        &config_path,
        r#"
        [[medications]]
        name = "VitD"
        times = ["25:00"]

        [settings]
        timezone = "Europe/Berlin"
    "#,
    )
    .expect("Failed to write schedule");

    cli()
        .arg("--config")
        .arg(&config_path)
        .arg("--bind")
        .arg("127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid time"));
}
