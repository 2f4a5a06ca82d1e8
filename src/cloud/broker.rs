//! 数据中心经纪人
//!
//! 一次性接收 VM 和 cloudlet 列表，持有放置/分配策略，并收集进入
//! 终止状态的 cloudlet。仿真开始后不再接受提交。

use super::cloudlet::{Cloudlet, CloudletSpec};
use super::id::{CloudletId, VmId};
use super::placement::{CloudletAssignment, FirstFit, PlacementPolicy, RoundRobin};
use super::vm::{Vm, VmSpec};
use crate::error::{Entity, SimError};
use crate::sim::SimTime;
use tracing::{info, warn};

/// 从未被放置的实体
#[derive(Debug, Clone)]
pub struct Rejection {
    pub entity: Entity,
    pub error: SimError,
    pub at: SimTime,
}

#[derive(Debug)]
pub struct Broker {
    started: bool,
    completed: bool,
    next_vm: usize,
    next_cloudlet: usize,
    pending_vms: Vec<Vm>,
    pending_cloudlets: Vec<Cloudlet>,
    pub(crate) placement: Box<dyn PlacementPolicy>,
    pub(crate) assignment: Box<dyn CloudletAssignment>,
    finished: Vec<Cloudlet>,
    rejections: Vec<Rejection>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(Box::new(FirstFit), Box::new(RoundRobin::default()))
    }
}

impl Broker {
    pub fn new(placement: Box<dyn PlacementPolicy>, assignment: Box<dyn CloudletAssignment>) -> Self {
        Self {
            started: false,
            completed: false,
            next_vm: 0,
            next_cloudlet: 0,
            pending_vms: Vec::new(),
            pending_cloudlets: Vec::new(),
            placement,
            assignment,
            finished: Vec::new(),
            rejections: Vec::new(),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// 提交 VM 列表，返回分配的 ID
    pub fn submit_vm_list(&mut self, specs: Vec<VmSpec>) -> Result<Vec<VmId>, SimError> {
        if self.started {
            warn!(count = specs.len(), "仿真已开始，拒绝提交 VM");
            return Err(SimError::LateSubmission { what: "vm list" });
        }
        let ids: Vec<VmId> = specs
            .into_iter()
            .map(|spec| {
                let id = VmId(self.next_vm);
                self.next_vm += 1;
                self.pending_vms.push(Vm::new(id, spec));
                id
            })
            .collect();
        info!(count = ids.len(), "📥 提交 VM 列表");
        Ok(ids)
    }

    /// 提交 cloudlet 列表，返回分配的 ID
    pub fn submit_cloudlet_list(&mut self, specs: Vec<CloudletSpec>) -> Result<Vec<CloudletId>, SimError> {
        if self.started {
            warn!(count = specs.len(), "仿真已开始，拒绝提交 cloudlet");
            return Err(SimError::LateSubmission {
                what: "cloudlet list",
            });
        }
        let ids: Vec<CloudletId> = specs
            .into_iter()
            .map(|spec| {
                let id = CloudletId(self.next_cloudlet);
                self.next_cloudlet += 1;
                self.pending_cloudlets.push(Cloudlet::new(id, spec));
                id
            })
            .collect();
        info!(count = ids.len(), "📥 提交 cloudlet 列表");
        Ok(ids)
    }

    pub fn has_pending_submissions(&self) -> bool {
        !self.pending_vms.is_empty() || !self.pending_cloudlets.is_empty()
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = true;
    }

    pub(crate) fn take_pending_vms(&mut self) -> Vec<Vm> {
        std::mem::take(&mut self.pending_vms)
    }

    pub(crate) fn take_pending_cloudlets(&mut self) -> Vec<Cloudlet> {
        std::mem::take(&mut self.pending_cloudlets)
    }

    /// 记录一个进入终止状态的 cloudlet
    pub(crate) fn record_terminal(&mut self, cloudlet: Cloudlet) {
        debug_assert!(cloudlet.status().is_terminal());
        self.finished.push(cloudlet);
    }

    pub(crate) fn reject(&mut self, entity: Entity, error: SimError, at: SimTime) {
        warn!(%entity, %error, "❌ 放置失败");
        self.rejections.push(Rejection { entity, error, at });
    }

    pub(crate) fn signal_complete(&mut self) {
        self.completed = true;
    }

    /// 终止状态的 cloudlet（按进入终止状态的顺序）；仿真完成前返回错误
    pub fn finished_cloudlets(&self) -> Result<&[Cloudlet], SimError> {
        if !self.completed {
            return Err(SimError::SimulationNotFinished);
        }
        Ok(&self.finished)
    }

    /// 仿真过程中已进入终止状态的 cloudlet（不要求仿真完成）
    pub fn terminal_so_far(&self) -> &[Cloudlet] {
        &self.finished
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }
}
