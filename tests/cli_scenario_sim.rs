use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "cloudsim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const SIMPLE_SCENARIO: &str = r#"
{
    "schema_version": 1,
    "meta": { "name": "simple" },
    "hosts": [ { "pes": 8, "pe_mips": 1000, "ram": 8192, "bw": 10000, "storage": 1000000 } ],
    "vms": [ { "count": 2, "pes": 2, "mips": 1000, "ram": 1024, "bw": 1000, "size": 10000 } ],
    "cloudlets": [ { "count": 10, "length": 10000, "length_step": 1000, "pes": 2, "file_size": 300, "output_size": 300 } ]
}
"#;

fn summary_line(stdout: &str) -> &str {
    stdout
        .lines()
        .find(|line| line.starts_with("clock_s="))
        .expect("summary line")
}

#[test]
fn scenario_sim_writes_report_and_timeline() {
    let dir = unique_temp_dir("scenario-sim-report");
    let scenario = write_file(&dir, "scenario.json", SIMPLE_SCENARIO);
    let report_json = dir.join("report.json");
    let viz_json = dir.join("viz.json");

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--report-json",
            report_json.to_str().unwrap(),
            "--viz-json",
            viz_json.to_str().unwrap(),
        ])
        .output()
        .expect("run scenario_sim");
    assert!(
        output.status.success(),
        "scenario_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SIMULATION RESULTS"));
    assert_eq!(
        summary_line(&stdout),
        "clock_s=75.000000 completed=true finished=10 rejected=0"
    );

    let raw = fs::read_to_string(&report_json).expect("read report.json");
    let v: Value = serde_json::from_str(&raw).expect("parse report.json");
    assert_eq!(v["completed"], Value::Bool(true));
    assert_eq!(v["cloudlets"].as_array().map(Vec::len), Some(10));

    let raw = fs::read_to_string(&viz_json).expect("read viz.json");
    let v: Value = serde_json::from_str(&raw).expect("parse viz.json");
    let arr = v.as_array().expect("viz.json must be a JSON array");
    assert_eq!(
        arr[0].get("kind").and_then(|k| k.as_str()),
        Some("meta"),
        "expected first viz event to be meta"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scenario_sim_until_stops_before_completion() {
    let dir = unique_temp_dir("scenario-sim-until");
    let scenario = write_file(&dir, "scenario.json", SIMPLE_SCENARIO);

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--until-s",
            "60",
            "--no-table",
        ])
        .output()
        .expect("run scenario_sim");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("SIMULATION RESULTS"));
    assert_eq!(
        summary_line(&stdout),
        "clock_s=60.000000 completed=false finished=3 rejected=0"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scenario_sim_policy_flags_override_the_file() {
    let dir = unique_temp_dir("scenario-sim-policies");
    let scenario = write_file(
        &dir,
        "scenario.json",
        r#"
{
    "schema_version": 1,
    "hosts": [ { "count": 2, "pes": 2, "pe_mips": 1000, "ram": 4096, "bw": 1000, "storage": 100000 } ],
    "vms": [ { "count": 2, "pes": 2, "mips": 1000, "ram": 1024, "bw": 100, "size": 1000 } ],
    "cloudlets": [ { "count": 2, "length": 10000, "pes": 2 } ]
}
        "#,
    );
    let report_json = dir.join("report.json");

    // worst_fit 把两个 VM 分到两台主机上，各自独占 2000 MIPS
    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--placement",
            "worst_fit",
            "--report-json",
            report_json.to_str().unwrap(),
            "--no-table",
        ])
        .output()
        .expect("run scenario_sim");
    assert!(output.status.success());

    let raw = fs::read_to_string(&report_json).expect("read report.json");
    let v: Value = serde_json::from_str(&raw).expect("parse report.json");
    let hosts: Vec<u64> = v["vms"]
        .as_array()
        .expect("vms")
        .iter()
        .filter_map(|vm| vm["host"].as_u64())
        .collect();
    assert_eq!(hosts, vec![0, 1]);
    assert_eq!(
        summary_line(&String::from_utf8_lossy(&output.stdout)),
        "clock_s=10.000000 completed=true finished=2 rejected=0"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn scenario_sim_rejects_bad_config() {
    let dir = unique_temp_dir("scenario-sim-bad");
    let scenario = write_file(
        &dir,
        "scenario.json",
        r#"{ "schema_version": 9, "hosts": [], "vms": [] }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args(["--scenario", scenario.to_str().unwrap()])
        .output()
        .expect("run scenario_sim");
    assert_eq!(output.status.code(), Some(2));

    let output = Command::new(env!("CARGO_BIN_EXE_scenario_sim"))
        .args([
            "--scenario",
            write_file(&dir, "ok.json", SIMPLE_SCENARIO).to_str().unwrap(),
            "--assignment",
            "random",
        ])
        .output()
        .expect("run scenario_sim");
    assert_eq!(output.status.code(), Some(2));

    let _ = fs::remove_dir_all(&dir);
}
