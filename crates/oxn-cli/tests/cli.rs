//! End-to-end tests of the `oxn` binary for commands that need no backend.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = "experiment:\n  name: baseline\n  responses: []\n  treatments: []\n";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn file(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, body).expect("Failed to write fixture file");
        path
    }

    /// `oxn` running inside the fixture directory, pinned to UTC and an unused backend.
    fn oxn(&self) -> Command {
        let mut cmd = Command::cargo_bin("oxn").expect("Failed to find oxn binary");
        cmd.current_dir(self.dir.path())
            .env("OXN_TIMEZONE", "utc")
            .env("OXN_BACKEND_URL", "http://127.0.0.1:9")
            .env_remove("OXN_ACCEPTED_EXTENSIONS")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn test_results_over_sample() {
    let fx = Fixture::new();
    fx.oxn()
        .arg("results")
        .assert()
        .success()
        .stdout(predicate::str::contains("All Experiment Results"))
        .stdout(predicate::str::contains("Treatment Names"))
        .stdout(predicate::str::contains("2024-11-17 15:10:56"));
}

#[test]
fn test_results_sorted_by_runs() {
    let fx = Fixture::new();
    let output = fx
        .oxn()
        .args(["results", "--sort", "number_of_runs", "--desc"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let first_002 = stdout.find("002").unwrap();
    let first_001 = stdout.find("001").unwrap();
    assert!(first_002 < first_001);
}

#[test]
fn test_result_detail_with_run_filter() {
    let fx = Fixture::new();
    fx.oxn()
        .args(["result", "002", "--run", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Details for #002"))
        .stdout(predicate::str::contains("52904"))
        .stdout(predicate::str::contains("41210").not());
}

#[test]
fn test_result_unknown_id_is_empty() {
    let fx = Fixture::new();
    fx.oxn()
        .args(["result", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found for experiment 'nope'"));
}

#[test]
fn test_results_from_yaml_snapshot() {
    let fx = Fixture::new();
    let snapshot = fx.file(
        "results.yaml",
        r#"
- experiment_id: "900"
  date: "2024-05-01T08:00:00Z"
  runs:
    run_1:
      id: "1"
      date: "2024-05-01T08:00:00Z"
      interactions:
        interaction_0:
          treatment_name: kill_treatment
          treatment_type: KillTreatment
          treatment_start: "2024-05-01T08:01:00Z"
          treatment_end: "2024-05-01T08:02:00Z"
          response_name: system_cpu
          response_start: "2024-05-01T08:00:00Z"
          response_end: "2024-05-01T08:05:00Z"
          response_type: MetricResponseVariable
          store_key: /tmp/900/system_cpu
      loadgen:
        loadgen_start_time: "2024-05-01T08:00:00Z"
        loadgen_end_time: "2024-05-01T08:05:00Z"
        loadgen_total_requests: 100
        loadgen_total_failures: 3
"#,
    );
    fx.oxn()
        .args(["results", "--results"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("kill_treatment"))
        .stdout(predicate::str::contains("sample_treatment").not());
}

#[test]
fn test_upload_dry_run_previews() {
    let fx = Fixture::new();
    let config = fx.file("baseline.yaml", CONFIG);
    fx.oxn()
        .arg("upload")
        .arg(&config)
        .args(["--name", "baseline", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Parsed baseline.yaml"))
        .stdout(predicate::str::contains("\"treatments\": []"))
        .stdout(predicate::str::contains("Dry run"));
}

#[test]
fn test_upload_rejects_txt() {
    let fx = Fixture::new();
    let notes = fx.file("notes.txt", CONFIG);
    fx.oxn()
        .arg("upload")
        .arg(&notes)
        .args(["--name", "baseline", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Only files of type: .yaml are allowed"))
        .stderr(predicate::str::contains("Something went wrong").not());
}

#[test]
fn test_upload_accepts_configured_extensions() {
    let fx = Fixture::new();
    let config = fx.file("baseline.yml", CONFIG);
    fx.oxn()
        .env("OXN_ACCEPTED_EXTENSIONS", ".yaml,.yml")
        .arg("upload")
        .arg(&config)
        .args(["--name", "baseline", "--dry-run"])
        .assert()
        .success();
}

#[test]
fn test_unknown_sort_column_shows_error_view() {
    let fx = Fixture::new();
    fx.oxn()
        .args(["results", "--sort", "colour", "--retries", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Something went wrong"))
        .stderr(predicate::str::contains("Unknown column 'colour'"))
        .stderr(predicate::str::contains("Trying again (1/1)"));
}

#[test]
fn test_dashboard_home() {
    let fx = Fixture::new();
    fx.oxn()
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Failure Rate"))
        .stdout(predicate::str::contains("http://127.0.0.1:9"));
}

#[test]
fn test_upload_is_not_retried() {
    let fx = Fixture::new();
    let config = fx.file("baseline.yaml", CONFIG);
    fx.oxn()
        .args(["--retries", "2", "--timezone", "mars"])
        .arg("upload")
        .arg(&config)
        .args(["--name", "baseline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Something went wrong"))
        .stderr(predicate::str::contains("unrecognized timezone 'mars'"))
        .stderr(predicate::str::contains("Trying again").not());
}
