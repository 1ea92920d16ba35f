use assert_cmd::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn cli_run_prints_summary() {
    let mut cmd = Command::cargo_bin("tube-draw").expect("binary exists");
    cmd.arg("--rounds")
        .arg("50")
        .arg("--players")
        .arg("2")
        .arg("--seed")
        .arg("7")
        .arg("--no-color");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Summary"));
}

#[test]
fn cli_reads_config_file_and_emits_json() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{ "roundsPerRun": 40, "playerCount": 3, "keepHistory": false }}"#
    )
    .expect("write config");

    let output = Command::cargo_bin("tube-draw")
        .expect("binary exists")
        .arg("run")
        .arg("--config")
        .arg(file.path())
        .arg("--seed")
        .arg("11")
        .arg("--json")
        .output()
        .expect("run binary");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["rounds_completed"], 40);
    assert_eq!(report["player_count"], 3);
    assert_eq!(report["tubes"].as_array().map(Vec::len), Some(5));
}

#[test]
fn cli_rejects_too_many_players() {
    let mut cmd = Command::cargo_bin("tube-draw").expect("binary exists");
    cmd.arg("--rounds").arg("5").arg("--players").arg("6");

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("playerCount"));
}
