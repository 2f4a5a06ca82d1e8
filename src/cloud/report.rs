//! 仿真结果
//!
//! 仿真完成后，从经纪人和数据中心收集终止状态的 cloudlet、VM 概况与
//! 放置失败记录，可渲染为表格或序列化为 JSON。

use super::cloud_world::CloudWorld;
use super::cloudlet::{Cloudlet, CloudletStatus};
use super::vm::VmState;
use crate::error::{Entity, SimError};
use crate::sim::{SimTime, Simulator};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
pub struct CloudletRecord {
    pub id: usize,
    pub status: CloudletStatus,
    pub host: Option<usize>,
    pub host_pes: Option<u32>,
    pub vm: Option<usize>,
    pub vm_pes: Option<u32>,
    /// 每个 PE 的长度（MI）
    pub length: u64,
    /// 每个 PE 实际执行的 MI
    pub finished_length: f64,
    pub pes: u32,
    pub start_time_s: Option<f64>,
    pub finish_time_s: Option<f64>,
    pub exec_time_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VmRecord {
    pub id: usize,
    pub state: VmState,
    pub host: Option<usize>,
    pub pes: u32,
    pub mips: f64,
    pub created_at_s: Option<f64>,
    pub destroyed_at_s: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectionRecord {
    pub kind: &'static str,
    pub id: usize,
    pub at_s: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// 仿真是否已发出完成信号
    pub completed: bool,
    pub clock_s: f64,
    pub events: u64,
    pub cloudlets: Vec<CloudletRecord>,
    pub vms: Vec<VmRecord>,
    pub rejections: Vec<RejectionRecord>,
}

fn secs(t: Option<SimTime>) -> Option<f64> {
    t.map(SimTime::as_secs_f64)
}

impl SimulationReport {
    /// 仿真尚未发出完成信号时返回 `SimulationNotFinished`
    pub fn collect(world: &CloudWorld, sim: &Simulator) -> Result<Self, SimError> {
        world.broker.finished_cloudlets()?;
        Ok(Self::snapshot(world, sim))
    }

    /// 当前为止的结果（仿真可能尚未完成，例如 `run_until` 提前停止）
    pub fn snapshot(world: &CloudWorld, sim: &Simulator) -> Self {
        let finished = world.broker.terminal_so_far();
        let dc = &world.datacenter;

        let cloudlets = finished
            .iter()
            .map(|c| {
                let host = c.host().and_then(|h| dc.host(h).ok());
                let vm = c.vm().and_then(|v| dc.vm(v).ok());
                record_of(c, host.map(|h| h.pe_count()), vm.map(|v| v.spec().pes))
            })
            .collect();

        let vms = dc
            .vms()
            .map(|vm| VmRecord {
                id: vm.id().0,
                state: vm.state(),
                host: vm.host().map(|h| h.0),
                pes: vm.spec().pes,
                mips: vm.spec().mips,
                created_at_s: secs(vm.created_at()),
                destroyed_at_s: secs(vm.destroyed_at()),
            })
            .collect();

        let rejections = world
            .broker
            .rejections()
            .iter()
            .map(|r| {
                let (kind, id) = match r.entity {
                    Entity::Vm(v) => ("vm", v.0),
                    Entity::Cloudlet(c) => ("cloudlet", c.0),
                };
                RejectionRecord {
                    kind,
                    id,
                    at_s: r.at.as_secs_f64(),
                    reason: r.error.to_string(),
                }
            })
            .collect();

        Self {
            completed: world.broker.is_completed(),
            clock_s: sim.now().as_secs_f64(),
            events: sim.processed_events(),
            cloudlets,
            vms,
            rejections,
        }
    }

    pub fn finished_count(&self) -> usize {
        self.cloudlets
            .iter()
            .filter(|c| c.status == CloudletStatus::Finished)
            .count()
    }

    /// CloudSim 风格的结果表
    pub fn render_table(&self) -> String {
        let header = [
            "Cloudlet", "Status", "Host", "HostPEs", "VM", "VmPEs", "Length(MI)", "FinishedLen",
            "PEs", "Start(s)", "Finish(s)", "Exec(s)",
        ];
        let rows: Vec<[String; 12]> = self
            .cloudlets
            .iter()
            .map(|c| {
                let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
                [
                    c.id.to_string(),
                    c.status.as_str().to_string(),
                    opt(c.host.map(|v| v.to_string())),
                    opt(c.host_pes.map(|v| v.to_string())),
                    opt(c.vm.map(|v| v.to_string())),
                    opt(c.vm_pes.map(|v| v.to_string())),
                    c.length.to_string(),
                    format!("{:.0}", c.finished_length),
                    c.pes.to_string(),
                    opt(c.start_time_s.map(|v| format!("{v:.2}"))),
                    opt(c.finish_time_s.map(|v| format!("{v:.2}"))),
                    opt(c.exec_time_s.map(|v| format!("{v:.2}"))),
                ]
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row.iter()) {
                *w = (*w).max(cell.len());
            }
        }

        let rule: String = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("+");

        let mut out = String::new();
        let _ = writeln!(out, "SIMULATION RESULTS");
        let _ = writeln!(out, "+{rule}+");
        write_row(&mut out, &header, &widths);
        let _ = writeln!(out, "+{rule}+");
        for row in &rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            write_row(&mut out, &cells, &widths);
        }
        let _ = writeln!(out, "+{rule}+");
        out
    }
}

fn write_row(out: &mut String, cells: &[&str], widths: &[usize]) {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:>w$}", w = *w))
        .collect();
    let _ = writeln!(out, "|{}|", parts.join("|"));
}

fn record_of(c: &Cloudlet, host_pes: Option<u32>, vm_pes: Option<u32>) -> CloudletRecord {
    let start = secs(c.start_time());
    let finish = secs(c.finish_time());
    CloudletRecord {
        id: c.id().0,
        status: c.status(),
        host: c.host().map(|h| h.0),
        host_pes,
        vm: c.vm().map(|v| v.0),
        vm_pes,
        length: c.spec().length,
        finished_length: c.executed_mi(),
        pes: c.spec().pes,
        start_time_s: start,
        finish_time_s: finish,
        exec_time_s: start.zip(finish).map(|(s, f)| f - s),
        failure: c.failure().map(|e| e.to_string()),
    }
}
