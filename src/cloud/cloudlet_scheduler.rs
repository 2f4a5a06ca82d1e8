//! 分时 cloudlet 调度器
//!
//! 在一个 VM 内，把 VM 当前获得的 MIPS 分给正在执行的 cloudlet。
//! 调度器拥有分配给该 VM 的所有未终止 cloudlet。

use super::allocation::AllocationPolicy;
use super::cloudlet::{Cloudlet, CloudletStatus};
use super::id::CloudletId;
use super::vm::VmSpec;
use crate::sim::SimTime;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct CloudletSchedulerTimeShared {
    waiting: Vec<Cloudlet>,
    executing: Vec<Cloudlet>,
    last_update: SimTime,
}

impl CloudletSchedulerTimeShared {
    pub fn waiting(&self) -> &[Cloudlet] {
        &self.waiting
    }

    pub fn executing(&self) -> &[Cloudlet] {
        &self.executing
    }

    pub(crate) fn executing_mut(&mut self) -> &mut [Cloudlet] {
        &mut self.executing
    }

    pub fn has_work(&self) -> bool {
        !self.waiting.is_empty() || !self.executing.is_empty()
    }

    pub fn get(&self, id: CloudletId) -> Option<&Cloudlet> {
        self.executing
            .iter()
            .chain(self.waiting.iter())
            .find(|c| c.id() == id)
    }

    /// 正在执行的 cloudlet 的份额之和
    pub fn total_rate(&self) -> f64 {
        self.executing.iter().map(|c| c.rate_mips).sum()
    }

    /// 单个 cloudlet 的需求：min(所需 PE, VM PE) × VM 每 PE MIPS
    pub fn demand_of(cloudlet: &Cloudlet, vm: &VmSpec) -> f64 {
        cloudlet.spec().pes.min(vm.pes) as f64 * vm.mips
    }

    /// 所有正在执行的 cloudlet 的需求之和
    pub fn demand(&self, vm: &VmSpec) -> f64 {
        self.executing.iter().map(|c| Self::demand_of(c, vm)).sum()
    }

    /// 接收一个 cloudlet，进入等待队列
    pub(crate) fn submit(&mut self, mut cloudlet: Cloudlet) {
        cloudlet.transition(CloudletStatus::Waiting);
        trace!(cloudlet = cloudlet.id().0, "cloudlet 进入等待队列");
        self.waiting.push(cloudlet);
    }

    /// 把等待中的 cloudlet 转为执行中；此后它参与份额分配
    pub(crate) fn start(&mut self, id: CloudletId, now: SimTime) -> bool {
        let Some(pos) = self.waiting.iter().position(|c| c.id() == id) else {
            return false;
        };
        self.update_progress(now);
        let mut cloudlet = self.waiting.remove(pos);
        cloudlet.transition(CloudletStatus::Executing);
        cloudlet.start_time = Some(now);
        debug!(cloudlet = id.0, now = ?now, "▶️  cloudlet 开始执行");
        self.executing.push(cloudlet);
        true
    }

    /// 用旧份额把执行进度推进到 `now`
    pub(crate) fn update_progress(&mut self, now: SimTime) {
        let dt = now.secs_since(self.last_update);
        if dt > 0.0 {
            for c in &mut self.executing {
                c.progress(dt);
            }
        }
        self.last_update = self.last_update.max(now);
    }

    /// 按策略把 VM 的份额 `vm_grant` 分给正在执行的 cloudlet
    pub(crate) fn reallocate(&mut self, vm_grant: f64, vm: &VmSpec, policy: &dyn AllocationPolicy) {
        let demands: Vec<f64> = self
            .executing
            .iter()
            .map(|c| Self::demand_of(c, vm))
            .collect();
        let grants = policy.allocate(vm_grant, &demands);
        for (c, rate) in self.executing.iter_mut().zip(grants) {
            c.rate_mips = rate;
        }
        trace!(
            vm_grant,
            cloudlets = self.executing.len(),
            total_rate = self.total_rate(),
            "重新分配 VM CPU"
        );
    }

    /// 取出所有已执行完的 cloudlet，标记为 Finished
    pub(crate) fn take_completed(&mut self, now: SimTime) -> Vec<Cloudlet> {
        let mut done = Vec::new();
        let mut i = 0;
        while i < self.executing.len() {
            if self.executing[i].is_complete() {
                let mut c = self.executing.remove(i);
                c.executed_mi = c.spec().length as f64;
                c.transition(CloudletStatus::Finished);
                c.finish_time = Some(now);
                done.push(c);
            } else {
                i += 1;
            }
        }
        done
    }

    /// 从等待或执行队列中移除一个 cloudlet
    pub(crate) fn remove(&mut self, id: CloudletId) -> Option<Cloudlet> {
        if let Some(pos) = self.executing.iter().position(|c| c.id() == id) {
            return Some(self.executing.remove(pos));
        }
        self.waiting
            .iter()
            .position(|c| c.id() == id)
            .map(|pos| self.waiting.remove(pos))
    }

    /// 移除全部 cloudlet（VM 销毁时）
    pub(crate) fn drain(&mut self) -> Vec<Cloudlet> {
        let mut all: Vec<Cloudlet> = self.executing.drain(..).collect();
        all.append(&mut self.waiting);
        all
    }
}
