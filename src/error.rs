//! 仿真错误类型
//!
//! 只有 `LogicalTimeViolation`（以及未知 ID）会中止仿真；
//! 其余错误作为结果数据的一部分记录下来。

use crate::cloud::{CloudletId, HostId, VmId};
use crate::sim::SimTime;
use thiserror::Error;

/// 资源不足的具体原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortfall {
    Pes { requested: u32, available: u32 },
    Ram { requested: u64, available: u64 },
    Bw { requested: u64, available: u64 },
    Storage { requested: u64, available: u64 },
    /// 没有任何候选（主机或 VM）
    NoCandidate,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shortfall::Pes {
                requested,
                available,
            } => write!(f, "pes requested={requested} available={available}"),
            Shortfall::Ram {
                requested,
                available,
            } => write!(f, "ram requested={requested} available={available}"),
            Shortfall::Bw {
                requested,
                available,
            } => write!(f, "bw requested={requested} available={available}"),
            Shortfall::Storage {
                requested,
                available,
            } => write!(f, "storage requested={requested} available={available}"),
            Shortfall::NoCandidate => write!(f, "no suitable candidate"),
        }
    }
}

/// 被放置的实体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Vm(VmId),
    Cloudlet(CloudletId),
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Vm(id) => write!(f, "vm {id}"),
            Entity::Cloudlet(id) => write!(f, "cloudlet {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("insufficient capacity for {entity}: {shortfall}")]
    InsufficientCapacity { entity: Entity, shortfall: Shortfall },
    #[error("event scheduled at {at:?} before current clock {now:?}")]
    LogicalTimeViolation { now: SimTime, at: SimTime },
    #[error("{what} submitted after the simulation started")]
    LateSubmission { what: &'static str },
    #[error("cloudlet {cloudlet} failed: vm {vm} was destroyed before it finished")]
    WorkloadFailure { cloudlet: CloudletId, vm: VmId },
    #[error("simulation has not signaled completion yet")]
    SimulationNotFinished,
    #[error("unknown host {0}")]
    UnknownHost(HostId),
    #[error("unknown vm {0}")]
    UnknownVm(VmId),
    #[error("unknown cloudlet {0}")]
    UnknownCloudlet(CloudletId),
}

impl SimError {
    /// 是否为不可恢复的内部错误
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SimError::LogicalTimeViolation { .. }
                | SimError::UnknownHost(_)
                | SimError::UnknownVm(_)
                | SimError::UnknownCloudlet(_)
        )
    }
}
