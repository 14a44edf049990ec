//! Binary-level checks: exit codes, stdout report, JSON output.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

const INPUT: &str = r#"{
  "districts": [
    { "id": "1", "label": "Circunscripción Senatorial 1", "seats": 3,
      "pacts": [
        { "code": "A", "name": "Alianza", "votes": 1000,
          "candidates": [ { "number": 1, "name": "Ana", "votes": 1000 } ] },
        { "code": "B", "name": "Bloque", "votes": 800,
          "candidates": [ { "number": 2, "name": "Beto", "votes": 800 } ] },
        { "code": "C", "name": "Centro", "votes": 1000,
          "candidates": [ { "number": 3, "name": "Carla", "votes": 1000 } ] },
        { "code": "D", "name": "Derecha", "votes": 850,
          "candidates": [ { "number": 4, "name": "Dario", "votes": 850 } ] }
      ] },
    { "id": "2", "label": "Circunscripción Senatorial 2", "seats": 2,
      "pacts": [
        { "code": "C", "name": "Centro", "votes": 500 },
        { "code": "D", "name": "Derecha", "votes": 400 }
      ] }
  ]
}"#;

fn fixture() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("senado.json");
    fs::write(&path, INPUT).unwrap();
    (dir, path)
}

fn dh() -> Command {
    Command::cargo_bin("dh").unwrap()
}

#[test]
fn text_report_on_stdout() {
    let (_dir, path) = fixture();
    dh().arg("--inputs")
        .arg(&path)
        .args(["--pact-a", "a", "--pact-b", "b"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stdout(predicate::str::contains("> Scenario merging A + B:"))
        .stdout(predicate::str::contains("Merged seats: 1 -> 2 (+1)"))
        .stdout(predicate::str::contains("Scenario not applicable"))
        .stdout(predicate::str::contains("=== Consolidated summary ==="))
        .stderr(predicate::str::contains("scenario skipped"));
}

#[test]
fn json_report_parses() {
    let (_dir, path) = fixture();
    let out = dh()
        .arg("--inputs")
        .arg(&path)
        .args(["--pact-a", "A", "--pact-b", "B", "--format", "json", "--quiet"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["pact_codes"], serde_json::json!(["A", "B"]));
    assert_eq!(v["districts"][0]["scenario"]["merged_code"], "A + B");
    assert_eq!(v["summary"]["districts_skipped"], 1);
    assert_eq!(v["inputs"][0]["sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn district_filter_limits_output() {
    let (_dir, path) = fixture();
    dh().arg("--inputs")
        .arg(&path)
        .args(["--pact-a", "A", "--pact-b", "B", "--circ", "1", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Circunscripción Senatorial 1"))
        .stdout(predicate::str::contains("Circunscripción Senatorial 2").not());
}

#[test]
fn unknown_district_filter_is_a_usage_error() {
    let (_dir, path) = fixture();
    dh().arg("--inputs")
        .arg(&path)
        .args(["--pact-a", "A", "--pact-b", "B", "--district", "99", "--quiet"])
        .assert()
        .code(2);
}

#[test]
fn missing_inputs_exit_with_io_code() {
    let dir = tempfile::tempdir().unwrap();
    dh().arg("--inputs")
        .arg(dir.path().join("nope"))
        .args(["--pact-a", "A", "--pact-b", "B"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("dh: error:"));
}

#[test]
fn missing_pact_flag_fails() {
    dh().args(["--pact-a", "A"]).assert().failure().code(2);
}

#[test]
fn identical_pacts_are_rejected() {
    dh().args(["--pact-a", "A", "--pact-b", "a"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("both A"));
}
