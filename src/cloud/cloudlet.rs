//! Cloudlet（工作单元）
//!
//! 一个待执行的任务：每个 PE 需要执行 `length` MI，共需要 `pes` 个 PE。

use super::id::{CloudletId, HostId, VmId};
use crate::error::SimError;
use crate::sim::{EventId, SimTime};
use serde::Serialize;
use tracing::warn;

/// 剩余量小于该值（MI）即视为完成，吸收浮点误差。
pub const FINISH_EPSILON_MI: f64 = 1e-6;

/// Cloudlet 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudletStatus {
    /// 已提交给经纪人，尚未分配 VM
    Submitted,
    /// 已分配 VM，排队等待开始执行
    Waiting,
    /// 正在获得 CPU 份额
    Executing,
    Finished,
    /// 所属 VM 在完成前被销毁
    Failed,
    Canceled,
}

impl CloudletStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CloudletStatus::Finished | CloudletStatus::Failed | CloudletStatus::Canceled
        )
    }

    /// 合法的状态迁移
    pub fn can_transition_to(self, next: CloudletStatus) -> bool {
        use CloudletStatus::*;
        matches!(
            (self, next),
            (Submitted, Waiting)
                | (Submitted, Failed)
                | (Submitted, Canceled)
                | (Waiting, Executing)
                | (Waiting, Failed)
                | (Waiting, Canceled)
                | (Executing, Finished)
                | (Executing, Failed)
                | (Executing, Canceled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CloudletStatus::Submitted => "SUBMITTED",
            CloudletStatus::Waiting => "WAITING",
            CloudletStatus::Executing => "EXECUTING",
            CloudletStatus::Finished => "SUCCESS",
            CloudletStatus::Failed => "FAILED",
            CloudletStatus::Canceled => "CANCELED",
        }
    }
}

/// Cloudlet 的静态需求
#[derive(Debug, Clone)]
pub struct CloudletSpec {
    /// 每个 PE 的指令长度（MI）
    pub length: u64,
    pub pes: u32,
    /// 输入文件大小（MB）
    pub file_size: u64,
    /// 输出文件大小（MB）
    pub output_size: u64,
    /// 相对 VM 创建时间的提交延迟
    pub submission_delay: SimTime,
}

impl CloudletSpec {
    pub fn new(length: u64, pes: u32) -> Self {
        Self {
            length,
            pes,
            file_size: 0,
            output_size: 0,
            submission_delay: SimTime::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cloudlet {
    id: CloudletId,
    spec: CloudletSpec,
    status: CloudletStatus,
    pub(crate) vm: Option<VmId>,
    pub(crate) host: Option<HostId>,
    /// 每个 PE 已执行的 MI
    pub(crate) executed_mi: f64,
    /// 当前获得的 MIPS（所有 PE 合计）
    pub(crate) rate_mips: f64,
    pub(crate) start_time: Option<SimTime>,
    pub(crate) finish_time: Option<SimTime>,
    /// 已调度的完成事件及其触发时间
    pub(crate) finish_event: Option<(EventId, SimTime)>,
    pub(crate) failure: Option<SimError>,
}

impl Cloudlet {
    pub fn new(id: CloudletId, spec: CloudletSpec) -> Self {
        Self {
            id,
            spec,
            status: CloudletStatus::Submitted,
            vm: None,
            host: None,
            executed_mi: 0.0,
            rate_mips: 0.0,
            start_time: None,
            finish_time: None,
            finish_event: None,
            failure: None,
        }
    }

    pub fn id(&self) -> CloudletId {
        self.id
    }

    pub fn spec(&self) -> &CloudletSpec {
        &self.spec
    }

    pub fn status(&self) -> CloudletStatus {
        self.status
    }

    pub fn vm(&self) -> Option<VmId> {
        self.vm
    }

    pub fn host(&self) -> Option<HostId> {
        self.host
    }

    pub fn start_time(&self) -> Option<SimTime> {
        self.start_time
    }

    pub fn finish_time(&self) -> Option<SimTime> {
        self.finish_time
    }

    pub fn failure(&self) -> Option<&SimError> {
        self.failure.as_ref()
    }

    /// 当前 MIPS 份额（所有 PE 合计）
    pub fn rate_mips(&self) -> f64 {
        self.rate_mips
    }

    /// 每个 PE 已执行的 MI
    pub fn executed_mi(&self) -> f64 {
        self.executed_mi
    }

    /// 每个 PE 剩余的 MI
    pub fn remaining_mi(&self) -> f64 {
        (self.spec.length as f64 - self.executed_mi).max(0.0)
    }

    /// 剩余量不超过 `FINISH_EPSILON_MI`，或按当前份额不足 1 ns 即可执行完
    pub fn is_complete(&self) -> bool {
        let remaining = self.remaining_mi();
        if remaining <= FINISH_EPSILON_MI {
            return true;
        }
        let per_pe = self.rate_mips / self.spec.pes as f64;
        per_pe > 0.0 && remaining <= per_pe * 1e-9
    }

    /// 按当前份额还需多少秒完成；份额为 0 时返回 None
    pub fn time_to_finish(&self) -> Option<f64> {
        let per_pe = self.rate_mips / self.spec.pes as f64;
        if per_pe <= 0.0 {
            return None;
        }
        Some(self.remaining_mi() / per_pe)
    }

    /// 按 `rate_mips` 推进 `dt` 秒
    pub(crate) fn progress(&mut self, dt: f64) {
        if dt <= 0.0 || self.rate_mips <= 0.0 {
            return;
        }
        let per_pe = self.rate_mips / self.spec.pes as f64;
        self.executed_mi = (self.executed_mi + per_pe * dt).min(self.spec.length as f64);
    }

    /// 状态迁移；终止状态不可再改变
    pub(crate) fn transition(&mut self, next: CloudletStatus) -> bool {
        if !self.status.can_transition_to(next) {
            warn!(
                cloudlet = self.id.0,
                from = ?self.status,
                to = ?next,
                "非法的 cloudlet 状态迁移"
            );
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.rate_mips = 0.0;
        }
        true
    }
}
