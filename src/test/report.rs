use crate::cloud::CloudletStatus;
use crate::runner::{RunOpts, run_scenario};
use crate::sim::ScenarioSpec;
use serde_json::Value;

#[test]
fn result_table_lists_every_cloudlet() {
    let report = run_scenario(&ScenarioSpec::default(), &RunOpts::default())
        .expect("run")
        .report;
    let table = report.render_table();
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines[0], "SIMULATION RESULTS");
    assert!(lines[1].starts_with('+') && lines[1].ends_with('+'));
    assert!(lines[2].contains("Cloudlet") && lines[2].contains("Finish(s)"));
    // 标题、3 条分隔线、表头、10 行
    assert_eq!(lines.len(), 15);
    assert_eq!(table.matches("SUCCESS").count(), 10);

    let widths: Vec<usize> = lines[1..].iter().map(|l| l.len()).collect();
    assert!(widths.iter().all(|&w| w == widths[0]), "rows are aligned");
    assert!(lines.iter().any(|l| l.contains("75.00")));
}

#[test]
fn report_serializes_to_json() {
    let report = run_scenario(&ScenarioSpec::default(), &RunOpts::default())
        .expect("run")
        .report;
    assert!(report.cloudlets.iter().all(|c| c.status == CloudletStatus::Finished));

    let v: Value = serde_json::to_value(&report).expect("serialize report");
    assert_eq!(v["completed"], Value::Bool(true));
    assert_eq!(v["cloudlets"].as_array().map(Vec::len), Some(10));
    assert_eq!(v["cloudlets"][0]["status"], "finished");
    assert!(v["cloudlets"][0].get("failure").is_none());
    assert_eq!(v["vms"].as_array().map(Vec::len), Some(2));
    assert_eq!(v["vms"][0]["state"], "destroyed");
    assert_eq!(v["rejections"].as_array().map(Vec::len), Some(0));
}
