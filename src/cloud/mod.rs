//! 云数据中心模块
//!
//! 主机、虚拟机、cloudlet，两级分时调度（主机 → VM → cloudlet），
//! 经纪人与放置策略，以及驱动它们的仿真事件和结果收集。

// 子模块声明
mod allocation;
mod broker;
mod cloud_world;
mod cloudlet;
mod cloudlet_scheduler;
mod datacenter;
mod events;
mod host;
mod id;
mod placement;
mod report;
mod vm;
mod vm_scheduler;

// 重新导出公共接口
pub use allocation::{AllocationPolicy, FairShare};
pub use broker::{Broker, Rejection};
pub use cloud_world::CloudWorld;
pub use cloudlet::{Cloudlet, CloudletSpec, CloudletStatus, FINISH_EPSILON_MI};
pub use cloudlet_scheduler::CloudletSchedulerTimeShared;
pub use datacenter::Datacenter;
pub use events::{CancelCloudlet, CloudletArrive, CloudletFinish, CreateVms, DestroyVm};
pub use host::{Host, HostSpec, Pe};
pub use id::{CloudletId, HostId, VmId};
pub use placement::{
    CloudletAssignment, FirstAvailable, FirstFit, PlacementPolicy, RoundRobin, WorstFit,
    cloudlet_assignment, placement_policy,
};
pub use report::{CloudletRecord, RejectionRecord, SimulationReport, VmRecord};
pub use vm::{Vm, VmSpec, VmState};
pub use vm_scheduler::VmSchedulerTimeShared;
