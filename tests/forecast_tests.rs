use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

const PROJECTS_YAML: &str = r#"
- id: web
  name: Website relaunch
  deadline: 2026-09-01
  status: active
  created_at: 2026-02-10
  progress: 40
- id: app
  deadline: 2026-03-20
  status: in_progress
  created_at: 2026-01-01
  tasks:
    done: 1
    total: 10
"#;

fn write_projects(temp: &assert_fs::TempDir) -> String {
    let input = temp.child("projects.yaml");
    input.write_str(PROJECTS_YAML).unwrap();
    input.path().to_str().unwrap().to_string()
}

fn forecast_json(input: &str, scenario_dir: &str, extra: &[&str]) -> Vec<Value> {
    let mut cmd = assert_cmd::cargo_bin_cmd!("completion-forecast");
    cmd.args([
        "--scenario-dir",
        scenario_dir,
        "forecast",
        "-i",
        input,
        "--now",
        "2026-03-02",
        "--seed",
        "42",
        "-f",
        "json",
    ]);
    cmd.args(extra);
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn forecast_reports_every_project_as_json() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_projects(&temp);
    let scenarios = temp.child("scenarios");

    let results = forecast_json(&input, scenarios.path().to_str().unwrap(), &[]);

    assert_eq!(results.len(), 2);
    let web = &results[0];
    assert_eq!(web["project_id"], "web");
    assert_eq!(web["progress_percent"], 40.0);
    assert_eq!(web["iterations"], 1000);
    assert_eq!(web["velocity"]["current_velocity"], 2.0);
    assert!(web["optimistic_date"].as_str().unwrap() <= web["realistic_date"].as_str().unwrap());
    assert!(web["realistic_date"].as_str().unwrap() <= web["pessimistic_date"].as_str().unwrap());

    let app = &results[1];
    assert_eq!(app["project_id"], "app");
    assert_eq!(app["progress_percent"], 10.0);
    assert_eq!(app["on_track"], false);
    assert_eq!(app["risk_level"], "high");
}

#[test]
fn forecast_with_same_seed_is_reproducible() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_projects(&temp);
    let scenarios = temp.child("scenarios");
    let scenario_dir = scenarios.path().to_str().unwrap();

    let first = forecast_json(&input, scenario_dir, &["-p", "web"]);
    let second = forecast_json(&input, scenario_dir, &["-p", "web"]);

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

#[test]
fn forecast_applies_saved_scenario() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_projects(&temp);
    let scenarios = temp.child("scenarios");
    let scenario_dir = scenarios.path().to_str().unwrap();

    let baseline = forecast_json(&input, scenario_dir, &["-p", "web"]);

    let mut save = assert_cmd::cargo_bin_cmd!("completion-forecast");
    save.args([
        "--scenario-dir",
        scenario_dir,
        "scenario",
        "save",
        "-p",
        "web",
        "--scope-change",
        "-10",
    ]);
    save.assert().success();

    let adjusted = forecast_json(&input, scenario_dir, &["-p", "web"]);

    assert_eq!(adjusted[0]["adjusted_progress_percent"], 50.0);
    let baseline_days = baseline[0]["realistic_days"].as_f64().unwrap();
    let adjusted_days = adjusted[0]["realistic_days"].as_f64().unwrap();
    assert!(adjusted_days < baseline_days);
}

#[test]
fn forecast_text_report_with_histogram_option() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_projects(&temp);
    let histogram = temp.child("web.png");
    let scenarios = temp.child("scenarios");

    let mut cmd = assert_cmd::cargo_bin_cmd!("completion-forecast");
    cmd.args([
        "--scenario-dir",
        scenarios.path().to_str().unwrap(),
        "forecast",
        "-i",
        &input,
        "-p",
        "web",
        "--now",
        "2026-03-02",
        "-n",
        "200",
        "--histogram",
        histogram.path().to_str().unwrap(),
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Forecast Report: web"))
        .stdout(predicate::str::contains("Iterations: 200"))
        .stdout(predicate::str::contains("P50 |"));

    histogram.assert(predicate::path::is_file());
}

#[test]
fn forecast_fails_when_histogram_cannot_be_written() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_projects(&temp);
    let histogram = temp.child("missing-dir").child("web.png");
    let scenarios = temp.child("scenarios");

    let mut cmd = assert_cmd::cargo_bin_cmd!("completion-forecast");
    cmd.args([
        "--scenario-dir",
        scenarios.path().to_str().unwrap(),
        "forecast",
        "-i",
        &input,
        "-p",
        "web",
        "--now",
        "2026-03-02",
        "--histogram",
        histogram.path().to_str().unwrap(),
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to write forecast histogram"));
}

#[test]
fn forecast_writes_yaml_report_to_output_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_projects(&temp);
    let output = temp.child("forecast.yaml");
    let scenarios = temp.child("scenarios");
    let output_arg = output.path().to_str().unwrap();

    let mut cmd = assert_cmd::cargo_bin_cmd!("completion-forecast");
    cmd.args([
        "--scenario-dir",
        scenarios.path().to_str().unwrap(),
        "forecast",
        "-i",
        &input,
        "--now",
        "2026-03-02",
        "-f",
        "yaml",
        "-o",
        output_arg,
    ]);

    cmd.assert().success().stdout(predicate::str::contains(format!(
        "Forecast for 2 projects written to {output_arg}"
    )));
    output.assert(predicate::str::contains("project_id: web"));
    output.assert(predicate::str::contains("risk_level:"));
}

#[test]
fn forecast_rejects_out_of_range_progress() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("projects.yaml");
    input
        .write_str("- id: bad\n  deadline: 2026-09-01\n  progress: 120\n")
        .unwrap();
    let scenarios = temp.child("scenarios");

    let mut cmd = assert_cmd::cargo_bin_cmd!("completion-forecast");
    cmd.args([
        "--scenario-dir",
        scenarios.path().to_str().unwrap(),
        "forecast",
        "-i",
        input.path().to_str().unwrap(),
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to forecast bad"))
        .stderr(predicate::str::contains("progress must be within [0, 100]"));
}

#[test]
fn forecast_reports_unknown_project() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = write_projects(&temp);

    let mut cmd = assert_cmd::cargo_bin_cmd!("completion-forecast");
    cmd.args(["forecast", "-i", &input, "-p", "missing"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Project missing not found"));
}
