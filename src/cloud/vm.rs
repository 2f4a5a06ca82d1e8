//! 虚拟机
//!
//! VM 在整个生命周期内只驻留在一台主机上，并拥有自己的 cloudlet 调度器。

use super::cloudlet_scheduler::CloudletSchedulerTimeShared;
use super::id::{HostId, VmId};
use crate::sim::SimTime;
use serde::Serialize;

/// VM 的资源请求
#[derive(Debug, Clone)]
pub struct VmSpec {
    pub pes: u32,
    /// 每个 PE 请求的 MIPS
    pub mips: f64,
    pub ram: u64,
    pub bw: u64,
    /// 镜像大小（MB）
    pub size: u64,
    /// 创建后多久自动销毁
    pub lifetime: Option<SimTime>,
}

impl VmSpec {
    pub fn new(pes: u32, mips: f64) -> Self {
        Self {
            pes,
            mips,
            ram: 0,
            bw: 0,
            size: 0,
            lifetime: None,
        }
    }

    /// 请求的 MIPS 总和
    pub fn total_mips(&self) -> f64 {
        self.pes as f64 * self.mips
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    /// 已提交，尚未放置
    Submitted,
    Running,
    /// 没有主机能容纳
    Rejected,
    Destroyed,
}

#[derive(Debug)]
pub struct Vm {
    id: VmId,
    pub(crate) spec: VmSpec,
    pub(crate) state: VmState,
    pub(crate) host: Option<HostId>,
    pub(crate) created_at: Option<SimTime>,
    pub(crate) destroyed_at: Option<SimTime>,
    pub(crate) scheduler: CloudletSchedulerTimeShared,
}

impl Vm {
    pub fn new(id: VmId, spec: VmSpec) -> Self {
        Self {
            id,
            spec,
            state: VmState::Submitted,
            host: None,
            created_at: None,
            destroyed_at: None,
            scheduler: CloudletSchedulerTimeShared::default(),
        }
    }

    pub fn id(&self) -> VmId {
        self.id
    }

    pub fn spec(&self) -> &VmSpec {
        &self.spec
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn host(&self) -> Option<HostId> {
        self.host
    }

    pub fn created_at(&self) -> Option<SimTime> {
        self.created_at
    }

    pub fn destroyed_at(&self) -> Option<SimTime> {
        self.destroyed_at
    }

    pub fn scheduler(&self) -> &CloudletSchedulerTimeShared {
        &self.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.state == VmState::Running
    }
}
