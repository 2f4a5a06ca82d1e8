use crate::runner::{RunOpts, cloudlet_specs, host_specs, run_scenario, vm_specs};
use crate::sim::{ScenarioSpec, SimTime};

#[test]
fn scenario_groups_expand_in_order() {
    let spec = ScenarioSpec::default();
    assert_eq!(host_specs(&spec).len(), 1);
    assert_eq!(vm_specs(&spec).len(), 2);

    let lengths: Vec<u64> = cloudlet_specs(&spec).iter().map(|c| c.length).collect();
    assert_eq!(lengths.first(), Some(&10_000));
    assert_eq!(lengths.last(), Some(&19_000));
    assert!(lengths.windows(2).all(|w| w[1] - w[0] == 1000));
}

#[test]
fn vm_lifetime_and_cloudlet_delay_are_converted_to_sim_time() {
    let mut spec = ScenarioSpec::default();
    spec.vms[0].lifetime_s = Some(1.5);
    spec.cloudlets[0].submission_delay_s = 0.25;

    assert!(
        vm_specs(&spec)
            .iter()
            .all(|v| v.lifetime == Some(SimTime::from_millis(1500)))
    );
    assert!(
        cloudlet_specs(&spec)
            .iter()
            .all(|c| c.submission_delay == SimTime::from_millis(250))
    );
}

#[test]
fn stopping_early_leaves_the_run_incomplete() {
    let opts = RunOpts {
        until: Some(SimTime::from_secs(60)),
        record_viz: false,
    };
    let outcome = run_scenario(&ScenarioSpec::default(), &opts).expect("run");
    let report = outcome.report;

    assert!(!report.completed);
    assert_eq!(report.clock_s, 60.0);
    // VM0: 50s、58s；VM1: 55s
    assert_eq!(report.finished_count(), 3);
    assert!(outcome.viz.is_none());
}

#[test]
fn generous_until_behaves_like_a_full_run() {
    let opts = RunOpts {
        until: Some(SimTime::from_secs(1_000)),
        record_viz: false,
    };
    let report = run_scenario(&ScenarioSpec::default(), &opts)
        .expect("run")
        .report;
    assert!(report.completed);
    assert!((report.clock_s - 75.0).abs() < 1e-6);
    assert_eq!(report.finished_count(), 10);
}
