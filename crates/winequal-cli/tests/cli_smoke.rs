//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `winequal` binary to verify that
//! argument parsing, help text, exit status and the stage outputs work
//! end-to-end.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("winequal").unwrap()
}

fn write_raw_tables(dir: &Path) {
    let header = "\"a\";\"free sulfur dioxide\";\"total sulfur dioxide\";\"quality\"\n";
    let mut red = header.to_string();
    let mut white = header.to_string();
    for i in 0..6 {
        red.push_str(&format!("{:.1};{};40;5\n", 0.1 * i as f64, 10 + i));
        white.push_str(&format!("{:.1};{};120;6\n", 5.0 + 0.1 * i as f64, 30 + i));
    }
    std::fs::write(dir.join("red.csv"), red).unwrap();
    std::fs::write(dir.join("white.csv"), white).unwrap();
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let config = serde_json::json!({
        "red_wine_data": dir.join("red.csv"),
        "white_wine_data": dir.join("white.csv"),
        "processed_data": dir.join("data").join("processed_data.csv"),
        "artifacts_dir": dir.join("models"),
        "reports_dir": dir.join("reports"),
        "model": {
            "svm": { "kernel": "linear" },
            "network": { "epochs": 50, "batch_size": 4, "learning_rate": 0.01 }
        }
    });
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("preprocess"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("evaluate"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("winequal"));
}

// ---------------------------------------------------------------------------
// Stage errors
// ---------------------------------------------------------------------------

#[test]
fn train_nonexistent_config_errors() {
    cmd()
        .args(["train", "/nonexistent/config.json"])
        .assert()
        .failure();
}

#[test]
fn train_missing_data_errors() {
    cmd()
        .args(["train", "-d", "/nonexistent/processed.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File does not exist"));
}

#[test]
fn train_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    std::fs::write(&data, "a,quality\n1,5\n").unwrap();
    cmd()
        .args(["train", "-d", data.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains(".tsv or .csv"));
}

#[test]
fn evaluate_before_train_fails_but_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    write_raw_tables(dir.path());
    let config = write_config(dir.path());

    cmd().args(["preprocess", config.to_str().unwrap()]).assert().success();
    cmd()
        .args(["evaluate", config.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("SVM failed"));
    assert!(dir.path().join("reports").join("final_report.md").is_file());
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[test]
fn preprocess_train_evaluate() {
    let dir = tempfile::tempdir().unwrap();
    write_raw_tables(dir.path());
    let config = write_config(dir.path());
    let config = config.to_str().unwrap();

    cmd()
        .args(["preprocess", config])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 12 rows"));

    cmd()
        .args(["train", config])
        .assert()
        .success()
        .stdout(predicate::str::contains("svm\tok"))
        .stdout(predicate::str::contains("nb\tok"))
        .stdout(predicate::str::contains("dnn\tok"));
    assert!(dir.path().join("models").join("dnn_model.safetensors").is_file());

    let reports = dir.path().join("out");
    cmd()
        .args(["evaluate", config, "-r", reports.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("SVM Accuracy: 1.0000"));

    let md = std::fs::read_to_string(reports.join("final_report.md")).unwrap();
    assert!(md.contains("| SVM | 1.00 | 1.00 |"));
    assert!(reports.join("final_report.pdf").is_file());
}

#[test]
fn evaluate_with_metrics_file_skips_scoring() {
    let dir = tempfile::tempdir().unwrap();
    write_raw_tables(dir.path());
    let config = write_config(dir.path());
    let metrics = dir.path().join("metrics.json");
    std::fs::write(
        &metrics,
        r#"[{"model_name":"DNN","accuracy":0.82,"f1_score":0.8},{"model_name":"SVM","accuracy":0.78,"f1_score":0.75}]"#,
    )
    .unwrap();

    cmd().args(["preprocess", config.to_str().unwrap()]).assert().success();
    cmd()
        .args([
            "evaluate",
            config.to_str().unwrap(),
            "--metrics",
            metrics.to_str().unwrap(),
        ])
        .assert()
        .success();

    let md = std::fs::read_to_string(dir.path().join("reports").join("final_report.md")).unwrap();
    let svm = md.find("| SVM | 0.78 | 0.75 |").unwrap();
    let dnn = md.find("| DNN | 0.82 | 0.80 |").unwrap();
    assert!(svm < dnn);
}
