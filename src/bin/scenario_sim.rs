use clap::Parser;
use cloudsim_rs::runner::{RunOpts, run_scenario};
use cloudsim_rs::sim::{AssignmentKind, PlacementKind, ScenarioSpec, SimTime};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(
    name = "scenario-sim",
    about = "Run scenario.json on the cloudsim-rs datacenter simulator"
)]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// Run until this time (seconds); defaults to running until completion
    #[arg(long)]
    until_s: Option<f64>,

    /// Write the simulation report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Write the VM/cloudlet timeline as JSON
    #[arg(long)]
    viz_json: Option<PathBuf>,

    /// Override VM placement: first_fit or worst_fit
    #[arg(long)]
    placement: Option<String>,

    /// Override cloudlet assignment: round_robin or first_available
    #[arg(long)]
    assignment: Option<String>,

    /// Do not print the result table
    #[arg(long)]
    no_table: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let mut scenario = match ScenarioSpec::load(&args.scenario) {
        Ok(scenario) => scenario,
        Err(err) => {
            error!(%err, "cannot load scenario");
            return ExitCode::from(2);
        }
    };

    if let Some(raw) = args.placement.as_deref() {
        match PlacementKind::parse(raw) {
            Ok(kind) => scenario.policies.placement = kind,
            Err(err) => {
                error!(%err, "bad --placement");
                return ExitCode::from(2);
            }
        }
    }
    if let Some(raw) = args.assignment.as_deref() {
        match AssignmentKind::parse(raw) {
            Ok(kind) => scenario.policies.assignment = kind,
            Err(err) => {
                error!(%err, "bad --assignment");
                return ExitCode::from(2);
            }
        }
    }

    let opts = RunOpts {
        until: args.until_s.map(SimTime::from_secs_f64),
        record_viz: args.viz_json.is_some(),
    };
    let outcome = match run_scenario(&scenario, &opts) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(%err, "simulation aborted");
            return ExitCode::FAILURE;
        }
    };

    if !args.no_table {
        print!("{}", outcome.report.render_table());
    }
    println!(
        "clock_s={:.6} completed={} finished={} rejected={}",
        outcome.report.clock_s,
        outcome.report.completed,
        outcome.report.finished_count(),
        outcome.report.rejections.len()
    );

    if let Some(path) = args.report_json.as_ref() {
        let written = serde_json::to_string_pretty(&outcome.report)
            .map_err(|e| e.to_string())
            .and_then(|raw| fs::write(path, raw).map_err(|e| e.to_string()));
        if let Err(err) = written {
            error!(%err, path = %path.display(), "cannot write report");
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), "report written");
    }

    if let (Some(path), Some(viz)) = (args.viz_json.as_ref(), outcome.viz.as_ref()) {
        let written = viz
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|raw| fs::write(path, raw).map_err(|e| e.to_string()));
        if let Err(err) = written {
            error!(%err, path = %path.display(), "cannot write timeline");
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), events = viz.events.len(), "timeline written");
    }

    ExitCode::SUCCESS
}
