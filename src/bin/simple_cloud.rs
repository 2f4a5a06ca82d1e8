//! 单主机数据中心仿真
//!
//! 1 台主机、若干 VM、若干 cloudlet，VM 与 cloudlet 都使用分时调度；
//! 打印 cloudlet 结果表和最终仿真时钟。

use clap::Parser;
use cloudsim_rs::runner::{RunOpts, run_scenario};
use cloudsim_rs::sim::{
    AssignmentKind, CloudletGroupSpec, HostGroupSpec, PlacementKind, PolicySpec, ScenarioMeta,
    ScenarioSpec, VmGroupSpec,
};
use std::process::ExitCode;
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "simple-cloud", about = "单主机数据中心仿真：分时 VM / cloudlet 调度")]
struct Args {
    #[arg(long, default_value_t = 1)]
    hosts: usize,
    /// 每台主机的 PE（核）数
    #[arg(long, default_value_t = 8)]
    host_cores: u32,
    /// 每个 PE 的 MIPS
    #[arg(long, default_value_t = 1000.0)]
    host_mips: f64,
    /// 主机内存（MB）
    #[arg(long, default_value_t = 8192)]
    host_ram: u64,
    /// 主机带宽（MB/s）
    #[arg(long, default_value_t = 10_000)]
    host_bw: u64,
    /// 主机存储（MB）
    #[arg(long, default_value_t = 1_000_000)]
    host_storage: u64,

    #[arg(long, default_value_t = 2)]
    vms: usize,
    #[arg(long, default_value_t = 2)]
    vm_pes: u32,
    /// VM 每个 PE 请求的 MIPS
    #[arg(long, default_value_t = 1000.0)]
    vm_mips: f64,
    #[arg(long, default_value_t = 1024)]
    vm_ram: u64,
    #[arg(long, default_value_t = 1000)]
    vm_bw: u64,
    /// VM 镜像大小（MB）
    #[arg(long, default_value_t = 10_000)]
    vm_size: u64,

    #[arg(long, default_value_t = 10)]
    cloudlets: usize,
    #[arg(long, default_value_t = 2)]
    cloudlet_pes: u32,
    /// 第 i 个 cloudlet 的长度为 length + i * length_step（MI）
    #[arg(long, default_value_t = 10_000)]
    cloudlet_length: u64,
    #[arg(long, default_value_t = 1000)]
    cloudlet_length_step: u64,
    /// 输入文件大小（MB）
    #[arg(long, default_value_t = 300)]
    cloudlet_file_size: u64,
    /// 输出文件大小（MB）
    #[arg(long, default_value_t = 300)]
    cloudlet_output_size: u64,
}

impl Args {
    fn scenario(&self) -> ScenarioSpec {
        ScenarioSpec {
            schema_version: 1,
            meta: Some(ScenarioMeta {
                name: Some("simple-cloud".to_string()),
                description: None,
            }),
            hosts: vec![HostGroupSpec {
                count: self.hosts,
                pes: self.host_cores,
                pe_mips: self.host_mips,
                ram: self.host_ram,
                bw: self.host_bw,
                storage: self.host_storage,
            }],
            vms: vec![VmGroupSpec {
                count: self.vms,
                pes: self.vm_pes,
                mips: self.vm_mips,
                ram: self.vm_ram,
                bw: self.vm_bw,
                size: self.vm_size,
                lifetime_s: None,
            }],
            cloudlets: vec![CloudletGroupSpec {
                count: self.cloudlets,
                length: self.cloudlet_length,
                length_step: self.cloudlet_length_step,
                pes: self.cloudlet_pes,
                file_size: self.cloudlet_file_size,
                output_size: self.cloudlet_output_size,
                submission_delay_s: 0.0,
            }],
            policies: PolicySpec {
                placement: PlacementKind::FirstFit,
                assignment: AssignmentKind::RoundRobin,
            },
        }
    }
}

fn main() -> ExitCode {
    // 初始化 tracing
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
    let scenario = args.scenario();
    if let Err(err) = scenario.validate() {
        error!(%err, "invalid parameters");
        return ExitCode::from(2);
    }

    let outcome = match run_scenario(&scenario, &RunOpts::default()) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(%err, "simulation aborted");
            return ExitCode::FAILURE;
        }
    };

    print!("{}", outcome.report.render_table());
    for r in &outcome.report.rejections {
        println!("rejected {} {}: {}", r.kind, r.id, r.reason);
    }
    println!(
        "\nsimulation done clock data -> : {:.2} seconds",
        outcome.report.clock_s
    );
    ExitCode::SUCCESS
}
