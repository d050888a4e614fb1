// Integration tests for `gridedit replay`, `snapshot` and `classify`.
// Run with: cargo test -p gridedit-cli --test replay_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn gridedit() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gridedit"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("GRIDEDIT_CONFIG");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

/// A temp dir holding a sheet, a script and default settings.
fn fixture(sheet: &str, script: &str) -> (TempDir, PathBuf, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let sheet = write(dir.path(), "sheet.json", sheet);
    let script = write(dir.path(), "script.json", script);
    let config = write(dir.path(), "settings.json", "{}");
    (dir, sheet, script, config)
}

fn replay(sheet: &Path, script: &Path, config: &Path) -> Output {
    gridedit()
        .args(["replay", "--sheet"])
        .arg(sheet)
        .arg("--script")
        .arg(script)
        .arg("--config")
        .arg(config)
        .output()
        .expect("gridedit replay")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("valid JSON on stdout")
}

fn cell<'a>(report: &'a serde_json::Value, r: u64, c: u64) -> Option<&'a serde_json::Value> {
    report["sheet"]["cells"]
        .as_array()?
        .iter()
        .find(|e| e["r"] == r && e["c"] == c)
}

const EMPTY_SHEET: &str = r#"{"rows": 10, "cols": 10}"#;

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

#[test]
fn replay_type_and_tab_commits_number() {
    let (_dir, sheet, script, config) = fixture(
        EMPTY_SHEET,
        r#"[
            {"op": "select", "cell": "D3"},
            {"op": "begin_edit"},
            {"op": "type", "text": "42"},
            {"op": "key", "key": "Tab"}
        ]"#,
    );

    let output = replay(&sheet, &script, &config);
    assert!(output.status.success(), "exit code was {:?}", output.status);

    let report = stdout_json(&output);
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[1]["session"]["cell"], "D3");
    assert_eq!(steps[2]["outcomes"][0]["outcome"], "pass_through");
    assert_eq!(steps[2]["outcomes"][0]["classification"]["kind"], "content_key");
    assert_eq!(steps[3]["outcomes"][0]["outcome"], "committed");
    assert_eq!(steps[3]["outcomes"][0]["cell"], "D3");
    assert_eq!(steps[3]["active_cell"], "E3");
    assert!(steps[3]["session"].is_null());

    let stored = cell(&report, 2, 3).expect("D3 stored");
    assert_eq!(stored["v"].as_f64(), Some(42.0));
}

#[test]
fn replay_autocomplete_and_reference_pointing() {
    let (_dir, sheet, script, config) = fixture(
        EMPTY_SHEET,
        r#"[
            {"op": "select", "cell": "D4"},
            {"op": "begin_edit"},
            {"op": "type", "text": "=av"},
            {"op": "key", "key": "Tab"},
            {"op": "key", "key": "ArrowUp"},
            {"op": "key", "key": "ArrowLeft", "shift": true},
            {"op": "type", "text": ")"},
            {"op": "key", "key": "Enter"}
        ]"#,
    );

    let output = replay(&sheet, &script, &config);
    assert!(output.status.success());

    let report = stdout_json(&output);
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps[3]["outcomes"][0]["outcome"], "formula_handled");
    assert_eq!(steps[3]["session"]["buffer"], "=AVERAGE(");
    assert_eq!(steps[4]["session"]["buffer"], "=AVERAGE(D3");
    assert_eq!(steps[5]["session"]["buffer"], "=AVERAGE(C3:D3");
    assert_eq!(steps[7]["outcomes"][0]["outcome"], "committed");
    assert_eq!(steps[7]["active_cell"], "D5");

    let stored = cell(&report, 3, 3).expect("D4 stored");
    assert_eq!(stored["f"], "=AVERAGE(C3:D3)");
}

#[test]
fn replay_escape_leaves_existing_formula() {
    let (_dir, sheet, script, config) = fixture(
        r#"{"rows": 5, "cols": 5, "cells": [{"r": 0, "c": 0, "v": 5, "f": "=SUM(1,4)"}]}"#,
        r#"[
            {"op": "select", "cell": "A1"},
            {"op": "begin_edit"},
            {"op": "type", "text": "+1"},
            {"op": "key", "key": "Escape"}
        ]"#,
    );

    let output = replay(&sheet, &script, &config);
    assert!(output.status.success());

    let report = stdout_json(&output);
    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps[1]["session"]["origin"], "formula");
    assert_eq!(steps[1]["session"]["formula"], true);
    assert_eq!(steps[2]["session"]["buffer"], "=SUM(1,4)+1");
    assert_eq!(steps[3]["outcomes"][0]["outcome"], "cancelled");

    let stored = cell(&report, 0, 0).expect("A1 kept");
    assert_eq!(stored["f"], "=SUM(1,4)");
}

#[test]
fn replay_output_writes_final_sheet() {
    let (dir, sheet, script, config) = fixture(
        EMPTY_SHEET,
        r#"[
            {"op": "select", "cell": "B2"},
            {"op": "begin_edit"},
            {"op": "type", "text": "hi"},
            {"op": "key", "key": "Enter"}
        ]"#,
    );
    let out = dir.path().join("after.json");

    let output = gridedit()
        .args(["replay", "--sheet"])
        .arg(&sheet)
        .arg("--script")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&out)
        .output()
        .expect("gridedit replay --output");
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert!(report.get("sheet").is_none());

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["rows"], 10);
    assert_eq!(written["cells"][0]["r"], 1);
    assert_eq!(written["cells"][0]["c"], 1);
    assert_eq!(written["cells"][0]["v"], "hi");
}

#[test]
fn replay_respects_enter_setting() {
    let (dir, sheet, script, _config) = fixture(
        EMPTY_SHEET,
        r#"[
            {"op": "begin_edit"},
            {"op": "type", "text": "x"},
            {"op": "key", "key": "Enter"}
        ]"#,
    );
    let config = write(dir.path(), "no-enter.json", r#"{"editor.enterCommits": false}"#);

    let output = replay(&sheet, &script, &config);
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["steps"][2]["outcomes"][0]["outcome"], "ignored");
    assert_eq!(report["steps"][2]["session"]["buffer"], "x");
    assert!(cell(&report, 0, 0).is_none());
}

#[test]
fn replay_missing_sheet_is_io_error() {
    let (dir, _sheet, script, config) = fixture(EMPTY_SHEET, "[]");
    let output = replay(&dir.path().join("nope.json"), &script, &config);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: cannot read"));
}

#[test]
fn replay_bad_script_is_parse_error_with_hint() {
    let (_dir, sheet, script, config) = fixture(EMPTY_SHEET, r#"[{"op": "jump"}]"#);
    let output = replay(&sheet, &script, &config);
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid script"));
    assert!(stderr.contains("hint:"));
}

#[test]
fn replay_cell_outside_sheet_is_usage_error() {
    let (_dir, sheet, script, config) = fixture(EMPTY_SHEET, r#"[{"op": "select", "cell": "K1"}]"#);
    let output = replay(&sheet, &script, &config);
    assert_eq!(output.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// snapshot
// ---------------------------------------------------------------------------

#[test]
fn snapshot_neutralizes_script_markup() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write(
        dir.path(),
        "sheet.json",
        r#"{"rows": 3, "cols": 3, "cells": [{"r": 1, "c": 1, "v": "<script>x()</script>"}]}"#,
    );

    let output = gridedit()
        .args(["snapshot", "--sheet"])
        .arg(&sheet)
        .args(["--cell", "b2", "--json"])
        .output()
        .expect("gridedit snapshot");
    assert!(output.status.success());

    let value = stdout_json(&output);
    assert_eq!(value["cell"], "B2");
    assert_eq!(value["kind"], "plain_value");
    assert_eq!(value["content"], "&lt;script&gt;x()&lt;/script&gt;");
}

#[test]
fn snapshot_plain_prints_content_only() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write(
        dir.path(),
        "sheet.json",
        r#"{"rows": 3, "cols": 3, "cells": [{"r": 0, "c": 0, "v": 3, "f": "=1+2"}]}"#,
    );

    let output = gridedit().args(["snapshot", "--sheet"]).arg(&sheet).args(["--cell", "A1"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim_end(), "=1+2");
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

fn classify(args: &[&str]) -> serde_json::Value {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "settings.json", "{}");
    let output = gridedit().arg("classify").args(args).arg("--config").arg(&config).output().unwrap();
    assert!(output.status.success(), "classify {:?} failed", args);
    stdout_json(&output)["classification"].clone()
}

#[test]
fn classify_reports_each_kind() {
    assert_eq!(classify(&["Escape"])["kind"], "cancel");
    assert_eq!(classify(&["Enter"])["kind"], "confirm_and_move_down");
    assert_eq!(classify(&["Tab"])["kind"], "confirm_and_move_right");
    assert_eq!(classify(&["Tab", "--candidate"])["kind"], "autocomplete_candidate_key");
    assert_eq!(classify(&["x"])["kind"], "content_key");
    assert_eq!(classify(&["v", "--ctrl"])["kind"], "content_key");
    assert_eq!(classify(&["b", "--ctrl"])["kind"], "ignored");
    assert_eq!(classify(&["F4"])["kind"], "ignored");

    let arrow = classify(&["ArrowLeft", "--shift"]);
    assert_eq!(arrow["kind"], "navigate_direction");
    assert_eq!(arrow["direction"], "left");
    assert_eq!(arrow["extend"], true);
}

#[test]
fn no_subcommand_is_usage_error() {
    let output = gridedit().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
