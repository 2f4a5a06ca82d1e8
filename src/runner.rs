//! 场景构建与运行
//!
//! 把 `ScenarioSpec` 展开成主机/VM/cloudlet 列表，提交给经纪人并驱动仿真。
//! 两个命令行程序都通过这里运行。

use crate::cloud::{
    Broker, CloudWorld, CloudletSpec, HostSpec, SimulationReport, VmSpec, cloudlet_assignment,
    placement_policy,
};
use crate::error::SimError;
use crate::sim::{ScenarioSpec, SimTime, Simulator};
use crate::viz::VizLogger;
use tracing::info;

/// 运行选项
#[derive(Debug, Clone, Default)]
pub struct RunOpts {
    /// 只运行到该时刻；None 表示运行到完成
    pub until: Option<SimTime>,
    /// 是否记录时间线事件
    pub record_viz: bool,
}

/// 运行结果
#[derive(Debug)]
pub struct RunOutcome {
    pub report: SimulationReport,
    pub viz: Option<VizLogger>,
}

/// 展开主机组
pub fn host_specs(spec: &ScenarioSpec) -> Vec<HostSpec> {
    spec.hosts
        .iter()
        .flat_map(|g| {
            std::iter::repeat_n(
                HostSpec {
                    pes: g.pes,
                    pe_mips: g.pe_mips,
                    ram: g.ram,
                    bw: g.bw,
                    storage: g.storage,
                },
                g.count,
            )
        })
        .collect()
}

/// 展开 VM 组
pub fn vm_specs(spec: &ScenarioSpec) -> Vec<VmSpec> {
    spec.vms
        .iter()
        .flat_map(|g| {
            std::iter::repeat_n(
                VmSpec {
                    pes: g.pes,
                    mips: g.mips,
                    ram: g.ram,
                    bw: g.bw,
                    size: g.size,
                    lifetime: g.lifetime_s.map(SimTime::from_secs_f64),
                },
                g.count,
            )
        })
        .collect()
}

/// 展开 cloudlet 组：组内第 i 个的长度为 `length + i * length_step`
pub fn cloudlet_specs(spec: &ScenarioSpec) -> Vec<CloudletSpec> {
    spec.cloudlets
        .iter()
        .flat_map(|g| {
            (0..g.count).map(move |i| CloudletSpec {
                length: g.length.saturating_add((i as u64).saturating_mul(g.length_step)),
                pes: g.pes,
                file_size: g.file_size,
                output_size: g.output_size,
                submission_delay: SimTime::from_secs_f64(g.submission_delay_s),
            })
        })
        .collect()
}

/// 构建世界并提交全部 VM 和 cloudlet（尚未开始仿真）
pub fn build_world(spec: &ScenarioSpec) -> Result<CloudWorld, SimError> {
    let broker = Broker::new(
        placement_policy(spec.policies.placement),
        cloudlet_assignment(spec.policies.assignment),
    );
    let mut world = CloudWorld::new(&host_specs(spec), broker);
    world.broker.submit_vm_list(vm_specs(spec))?;
    world.broker.submit_cloudlet_list(cloudlet_specs(spec))?;
    Ok(world)
}

/// 构建并运行一个场景
#[tracing::instrument(skip(spec, opts), fields(
    hosts = spec.host_count(),
    vms = spec.vm_count(),
    cloudlets = spec.cloudlet_count(),
))]
pub fn run_scenario(spec: &ScenarioSpec, opts: &RunOpts) -> Result<RunOutcome, SimError> {
    let mut sim = Simulator::default();
    let mut world = build_world(spec)?;
    if opts.record_viz {
        world.viz = Some(VizLogger::default());
    }

    world.start(&mut sim)?;
    match opts.until {
        Some(until) => {
            sim.advance_through(until, &mut world)?;
            if sim.is_done(&world) {
                // 在 `until` 之前已经跑完：补发完成信号，时钟停在最后一个事件
                sim.run(&mut world)?;
            } else {
                sim.run_until(until, &mut world)?;
            }
        }
        None => sim.run(&mut world)?,
    }

    let report = SimulationReport::snapshot(&world, &sim);
    info!(
        completed = report.completed,
        clock_s = report.clock_s,
        finished = report.finished_count(),
        rejected = report.rejections.len(),
        "📊 场景运行结束"
    );
    Ok(RunOutcome {
        report,
        viz: world.viz.take(),
    })
}
