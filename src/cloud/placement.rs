//! 放置策略
//!
//! `PlacementPolicy` 决定 VM 放到哪台主机，`CloudletAssignment` 决定
//! cloudlet 交给哪个 VM。新策略只需实现对应 trait。

use super::cloudlet::CloudletSpec;
use super::host::Host;
use super::id::{HostId, VmId};
use super::vm::{Vm, VmSpec};
use crate::sim::{AssignmentKind, PlacementKind};

/// VM → 主机
pub trait PlacementPolicy: std::fmt::Debug + Send {
    /// `vm_pes` 返回某个已放置 VM 的 PE 数
    fn select_host(
        &self,
        vm: VmId,
        spec: &VmSpec,
        hosts: &[Host],
        vm_pes: &dyn Fn(VmId) -> u32,
    ) -> Option<HostId>;
}

/// 第一个资源足够的主机
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstFit;

impl PlacementPolicy for FirstFit {
    fn select_host(
        &self,
        vm: VmId,
        spec: &VmSpec,
        hosts: &[Host],
        _vm_pes: &dyn Fn(VmId) -> u32,
    ) -> Option<HostId> {
        hosts
            .iter()
            .find(|h| h.is_suitable_for(vm, spec).is_ok())
            .map(Host::id)
    }
}

/// 已占用 PE 最少的合适主机（把负载摊开）
#[derive(Debug, Default, Clone, Copy)]
pub struct WorstFit;

impl PlacementPolicy for WorstFit {
    fn select_host(
        &self,
        vm: VmId,
        spec: &VmSpec,
        hosts: &[Host],
        vm_pes: &dyn Fn(VmId) -> u32,
    ) -> Option<HostId> {
        hosts
            .iter()
            .filter(|h| h.is_suitable_for(vm, spec).is_ok())
            .min_by_key(|h| (h.used_pes(vm_pes), h.id()))
            .map(Host::id)
    }
}

/// Cloudlet → VM
pub trait CloudletAssignment: std::fmt::Debug + Send {
    /// `vms` 为已创建的 VM（按提交顺序）
    fn select_vm(&mut self, cloudlet: &CloudletSpec, vms: &[&Vm]) -> Option<VmId>;
}

fn fits(cloudlet: &CloudletSpec, vm: &Vm) -> bool {
    cloudlet.pes <= vm.spec().pes
}

/// 依次轮转，跳过 PE 不够的 VM
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobin {
    next: usize,
}

impl CloudletAssignment for RoundRobin {
    fn select_vm(&mut self, cloudlet: &CloudletSpec, vms: &[&Vm]) -> Option<VmId> {
        let n = vms.len();
        for k in 0..n {
            let idx = (self.next + k) % n;
            if fits(cloudlet, vms[idx]) {
                self.next = idx + 1;
                return Some(vms[idx].id());
            }
        }
        None
    }
}

/// 第一个空闲的合适 VM；都忙时选任务最少的那个
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstAvailable;

impl CloudletAssignment for FirstAvailable {
    fn select_vm(&mut self, cloudlet: &CloudletSpec, vms: &[&Vm]) -> Option<VmId> {
        let load = |vm: &Vm| vm.scheduler().waiting().len() + vm.scheduler().executing().len();
        vms.iter()
            .filter(|vm| fits(cloudlet, vm))
            .min_by_key(|vm| (load(vm), vm.id()))
            .map(|vm| vm.id())
    }
}

pub fn placement_policy(kind: PlacementKind) -> Box<dyn PlacementPolicy> {
    match kind {
        PlacementKind::FirstFit => Box::new(FirstFit),
        PlacementKind::WorstFit => Box::new(WorstFit),
    }
}

pub fn cloudlet_assignment(kind: AssignmentKind) -> Box<dyn CloudletAssignment> {
    match kind {
        AssignmentKind::RoundRobin => Box::new(RoundRobin::default()),
        AssignmentKind::FirstAvailable => Box::new(FirstAvailable),
    }
}
