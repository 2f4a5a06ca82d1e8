use std::process::Command;

fn run_simple_cloud(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_simple_cloud"))
        .args(args)
        .output()
        .expect("run simple_cloud")
}

#[test]
fn simple_cloud_default_run_prints_results_and_final_clock() {
    let output = run_simple_cloud(&[]);
    assert!(
        output.status.success(),
        "simple_cloud failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SIMULATION RESULTS"));
    assert_eq!(stdout.matches("SUCCESS").count(), 10);
    assert!(
        stdout.contains("simulation done clock data -> : 75.00 seconds"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn simple_cloud_single_cloudlet_finishes_in_ten_seconds() {
    let output = run_simple_cloud(&["--vms", "1", "--cloudlets", "1"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("SUCCESS").count(), 1);
    assert!(stdout.contains("simulation done clock data -> : 10.00 seconds"));
}

#[test]
fn simple_cloud_reports_cloudlets_that_fit_no_vm() {
    let output = run_simple_cloud(&["--cloudlet-pes", "4", "--cloudlets", "2"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout
            .lines()
            .filter(|line| line.starts_with("rejected cloudlet "))
            .count(),
        2
    );
    assert!(stdout.contains("simulation done clock data -> : 0.00 seconds"));
}

#[test]
fn simple_cloud_rejects_invalid_parameters() {
    let output = run_simple_cloud(&["--vm-pes", "0"]);
    assert_eq!(output.status.code(), Some(2));
}
