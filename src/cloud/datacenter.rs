//! 数据中心
//!
//! 持有所有主机和 VM，负责把 cloudlet 的进度、VM 份额与 cloudlet 份额
//! 在同一时刻一次性更新，并重新调度每个 cloudlet 的完成事件。

use super::allocation::{AllocationPolicy, FairShare};
use super::cloudlet::{Cloudlet, CloudletStatus};
use super::cloudlet_scheduler::CloudletSchedulerTimeShared;
use super::events::CloudletFinish;
use super::host::{Host, HostSpec};
use super::id::{CloudletId, HostId, VmId};
use super::placement::PlacementPolicy;
use super::vm::{Vm, VmState};
use super::vm_scheduler::VmSchedulerTimeShared;
use crate::error::{Entity, SimError};
use crate::sim::{SimTime, Simulator};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

/// 浮点比较容差（MIPS）
const MIPS_EPSILON: f64 = 1e-6;

#[derive(Debug)]
pub struct Datacenter {
    hosts: Vec<Host>,
    vms: BTreeMap<VmId, Vm>,
    policy: Box<dyn AllocationPolicy>,
}

impl Datacenter {
    pub fn new(hosts: &[HostSpec]) -> Self {
        Self::with_policy(hosts, Box::new(FairShare))
    }

    pub fn with_policy(hosts: &[HostSpec], policy: Box<dyn AllocationPolicy>) -> Self {
        Self {
            hosts: hosts
                .iter()
                .enumerate()
                .map(|(i, spec)| Host::new(HostId(i), spec))
                .collect(),
            vms: BTreeMap::new(),
            policy,
        }
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host(&self, id: HostId) -> Result<&Host, SimError> {
        self.hosts.get(id.0).ok_or(SimError::UnknownHost(id))
    }

    pub fn vms(&self) -> impl Iterator<Item = &Vm> {
        self.vms.values()
    }

    pub fn vm(&self, id: VmId) -> Result<&Vm, SimError> {
        self.vms.get(&id).ok_or(SimError::UnknownVm(id))
    }

    fn vm_mut(&mut self, id: VmId) -> Result<&mut Vm, SimError> {
        self.vms.get_mut(&id).ok_or(SimError::UnknownVm(id))
    }

    /// 正在运行的 VM（按 ID 顺序）
    pub fn running_vms(&self) -> Vec<&Vm> {
        self.vms.values().filter(|vm| vm.is_running()).collect()
    }

    /// VM 当前获得的 MIPS
    pub fn vm_granted_mips(&self, id: VmId) -> f64 {
        self.vms
            .get(&id)
            .and_then(|vm| vm.host)
            .and_then(|h| self.hosts.get(h.0))
            .map_or(0.0, |h| h.available_mips_for(id))
    }

    /// 查找一个未终止的 cloudlet
    pub fn cloudlet(&self, id: CloudletId) -> Option<&Cloudlet> {
        self.vms.values().find_map(|vm| vm.scheduler.get(id))
    }

    fn owner_of(&self, id: CloudletId) -> Option<VmId> {
        self.vms
            .values()
            .find(|vm| vm.scheduler.get(id).is_some())
            .map(Vm::id)
    }

    pub fn has_pending_work(&self) -> bool {
        self.vms.values().any(|vm| vm.scheduler.has_work())
    }

    /// 用放置策略为 VM 选择主机并预留资源。
    ///
    /// 失败时 VM 以 `Rejected` 状态保留（便于报告），并返回错误。
    #[tracing::instrument(skip(self, vm, placement), fields(vm = vm.id().0))]
    pub fn place_vm(
        &mut self,
        mut vm: Vm,
        placement: &dyn PlacementPolicy,
        now: SimTime,
    ) -> Result<HostId, SimError> {
        let id = vm.id();
        let pes_of = |v: VmId| self.vms.get(&v).map_or(0, |vm| vm.spec.pes);
        let chosen = placement.select_host(id, &vm.spec, &self.hosts, &pes_of);

        let result = match chosen {
            Some(host_id) => match self.hosts.get_mut(host_id.0) {
                Some(host) => host.allocate(id, &vm.spec).map(|_| host_id),
                None => Err(SimError::UnknownHost(host_id)),
            },
            None => Err(self.placement_error(&vm)),
        };

        match result {
            Ok(host_id) => {
                vm.state = VmState::Running;
                vm.host = Some(host_id);
                vm.created_at = Some(now);
                info!(host = host_id.0, "✅ VM 已创建");
            }
            Err(_) => {
                vm.state = VmState::Rejected;
            }
        }
        self.vms.insert(id, vm);
        result
    }

    /// 没有主机可选时，报告第一台主机的具体缺口
    fn placement_error(&self, vm: &Vm) -> SimError {
        self.hosts
            .iter()
            .find_map(|h| h.is_suitable_for(vm.id(), &vm.spec).err())
            .unwrap_or(SimError::InsufficientCapacity {
                entity: Entity::Vm(vm.id()),
                shortfall: crate::error::Shortfall::NoCandidate,
            })
    }

    /// 把 cloudlet 交给 VM，进入等待队列
    pub(crate) fn submit_cloudlet(&mut self, vm_id: VmId, mut cloudlet: Cloudlet) -> Result<(), SimError> {
        let vm = self.vm_mut(vm_id)?;
        cloudlet.vm = Some(vm_id);
        cloudlet.host = vm.host;
        vm.scheduler.submit(cloudlet);
        Ok(())
    }

    /// 等待中的 cloudlet 开始执行；VM 已不在运行时返回 false
    pub(crate) fn start_cloudlet(&mut self, vm_id: VmId, id: CloudletId, now: SimTime) -> Result<bool, SimError> {
        let vm = self.vm_mut(vm_id)?;
        if !vm.is_running() {
            return Ok(false);
        }
        Ok(vm.scheduler.start(id, now))
    }

    /// 用旧份额把主机上所有 VM 的 cloudlet 进度推进到 `now`
    fn update_host_progress(&mut self, host_id: HostId, now: SimTime) -> Result<(), SimError> {
        let resident = self.host(host_id)?.vms().to_vec();
        for vm_id in resident {
            self.vm_mut(vm_id)?.scheduler.update_progress(now);
        }
        Ok(())
    }

    /// 重新计算主机上各 VM 的份额，再计算每个 VM 内各 cloudlet 的份额，
    /// 最后取消并重新调度所有正在执行的 cloudlet 的完成事件。
    #[tracing::instrument(skip(self, sim), fields(host = host_id.0, now = ?sim.now()))]
    pub(crate) fn rebalance_host(&mut self, host_id: HostId, sim: &mut Simulator) -> Result<(), SimError> {
        let now = sim.now();
        self.update_host_progress(host_id, now)?;

        let host = self.hosts.get(host_id.0).ok_or(SimError::UnknownHost(host_id))?;
        let resident = host.vms().to_vec();
        let pe_mips = host.pe_mips();
        let capacity = host.total_pe_mips();

        let mut demands = Vec::with_capacity(resident.len());
        for &vm_id in &resident {
            let vm = self.vm(vm_id)?;
            let workload = vm.scheduler.demand(&vm.spec);
            demands.push((vm_id, VmSchedulerTimeShared::demand_of(&vm.spec, pe_mips, workload)));
        }

        let policy = self.policy.as_ref();
        let host = self
            .hosts
            .get_mut(host_id.0)
            .ok_or(SimError::UnknownHost(host_id))?;
        host.vm_scheduler.reallocate(capacity, &demands, policy);

        for vm_id in resident {
            let grant = host.vm_scheduler.granted(vm_id);
            let vm = self.vms.get_mut(&vm_id).ok_or(SimError::UnknownVm(vm_id))?;
            vm.scheduler.reallocate(grant, &vm.spec, policy);
            for c in vm.scheduler.executing_mut() {
                let Some(secs) = c.time_to_finish() else {
                    if let Some((ev, _)) = c.finish_event.take() {
                        sim.cancel(ev);
                    }
                    trace!(cloudlet = c.id().0, "份额为 0，暂不调度完成事件");
                    continue;
                };
                // 完成时间必须严格晚于 now，否则同一时刻会反复触发而进度不变
                let at = match now.saturating_add(SimTime::from_secs_f64(secs)) {
                    at if at > now || c.is_complete() => at,
                    _ => now.saturating_add(SimTime(1)),
                };
                // 完成时间未变且事件仍在队列中时保留原事件
                if let Some((ev, old_at)) = c.finish_event {
                    if old_at == at && sim.is_scheduled(ev) {
                        continue;
                    }
                    sim.cancel(ev);
                    c.finish_event = None;
                }
                let ev = sim.schedule(
                    at,
                    CloudletFinish {
                        vm: vm_id,
                        cloudlet: c.id(),
                    },
                )?;
                c.finish_event = Some((ev, at));
                trace!(
                    cloudlet = c.id().0,
                    rate_mips = c.rate_mips,
                    remaining_mi = c.remaining_mi(),
                    finish_at = ?at,
                    "重新调度完成事件"
                );
            }
        }
        Ok(())
    }

    /// 取出 VM 上已执行完的 cloudlet（进度先推进到 `now`）
    pub(crate) fn take_completed(
        &mut self,
        vm_id: VmId,
        now: SimTime,
        sim: &mut Simulator,
    ) -> Result<(HostId, Vec<Cloudlet>), SimError> {
        let host_id = self.vm(vm_id)?.host.ok_or(SimError::UnknownVm(vm_id))?;
        self.update_host_progress(host_id, now)?;
        let vm = self.vm_mut(vm_id)?;
        let mut done = vm.scheduler.take_completed(now);
        for c in &mut done {
            if let Some((ev, _)) = c.finish_event.take() {
                sim.cancel(ev);
            }
            info!(cloudlet = c.id().0, vm = vm_id.0, now = ?now, "🏁 cloudlet 完成");
        }
        Ok((host_id, done))
    }

    /// 销毁 VM：它上面的 cloudlet 全部失败，释放主机资源。
    ///
    /// 返回 VM 所在主机（需要重新分配）和失败的 cloudlet。
    #[tracing::instrument(skip(self, sim), fields(vm = vm_id.0))]
    pub(crate) fn destroy_vm(
        &mut self,
        vm_id: VmId,
        sim: &mut Simulator,
    ) -> Result<Option<(HostId, Vec<Cloudlet>)>, SimError> {
        let now = sim.now();
        let vm = self.vm(vm_id)?;
        if !vm.is_running() {
            debug!(state = ?vm.state, "VM 未在运行，忽略销毁");
            return Ok(None);
        }
        let host_id = vm.host.ok_or(SimError::UnknownVm(vm_id))?;
        self.update_host_progress(host_id, now)?;

        let vm = self.vm_mut(vm_id)?;
        let mut failed = vm.scheduler.drain();
        vm.state = VmState::Destroyed;
        vm.destroyed_at = Some(now);
        let spec = vm.spec.clone();
        for c in &mut failed {
            if let Some((ev, _)) = c.finish_event.take() {
                sim.cancel(ev);
            }
            c.transition(CloudletStatus::Failed);
            c.finish_time = Some(now);
            c.failure = Some(SimError::WorkloadFailure {
                cloudlet: c.id(),
                vm: vm_id,
            });
            warn!(cloudlet = c.id().0, "💥 VM 被销毁，cloudlet 失败");
        }

        let host = self
            .hosts
            .get_mut(host_id.0)
            .ok_or(SimError::UnknownHost(host_id))?;
        host.deallocate(vm_id, &spec);
        info!(host = host_id.0, now = ?now, failed = failed.len(), "🗑️  VM 已销毁");
        Ok(Some((host_id, failed)))
    }

    /// 取消一个尚未终止的 cloudlet
    pub(crate) fn cancel_cloudlet(
        &mut self,
        id: CloudletId,
        sim: &mut Simulator,
    ) -> Result<Option<(HostId, Cloudlet)>, SimError> {
        let now = sim.now();
        let Some(vm_id) = self.owner_of(id) else {
            debug!(cloudlet = id.0, "cloudlet 不在任何 VM 上，忽略取消");
            return Ok(None);
        };
        let host_id = self.vm(vm_id)?.host.ok_or(SimError::UnknownVm(vm_id))?;
        self.update_host_progress(host_id, now)?;
        let vm = self.vm_mut(vm_id)?;
        let Some(mut c) = vm.scheduler.remove(id) else {
            return Err(SimError::UnknownCloudlet(id));
        };
        if let Some((ev, _)) = c.finish_event.take() {
            sim.cancel(ev);
        }
        c.transition(CloudletStatus::Canceled);
        c.finish_time = Some(now);
        info!(cloudlet = id.0, vm = vm_id.0, now = ?now, "⛔ cloudlet 已取消");
        Ok(Some((host_id, c)))
    }

    /// 仿真结束时销毁仍在运行的 VM（此时它们应当已经空闲）
    pub(crate) fn shutdown(&mut self, now: SimTime) -> Vec<Cloudlet> {
        let mut leftovers = Vec::new();
        for vm in self.vms.values_mut().filter(|vm| vm.is_running()) {
            vm.scheduler.update_progress(now);
            for mut c in vm.scheduler.drain() {
                c.transition(CloudletStatus::Failed);
                c.finish_time = Some(now);
                c.failure = Some(SimError::WorkloadFailure {
                    cloudlet: c.id(),
                    vm: vm.id(),
                });
                leftovers.push(c);
            }
            vm.state = VmState::Destroyed;
            vm.destroyed_at = Some(now);
            if let Some(host) = vm.host.and_then(|h| self.hosts.get_mut(h.0)) {
                host.deallocate(vm.id(), &vm.spec);
            }
        }
        leftovers
    }

    /// 检查分配不变量：主机份额之和不超过 PE 总量，VM 内份额之和不超过 VM 份额，
    /// 且 VM 每 PE 份额不超过其请求的 MIPS。
    pub fn allocation_invariants_hold(&self) -> bool {
        for host in &self.hosts {
            if host.vm_scheduler.total_granted() > host.total_pe_mips() + MIPS_EPSILON {
                return false;
            }
            for &vm_id in host.vms() {
                let Some(vm) = self.vms.get(&vm_id) else {
                    return false;
                };
                let grant = host.available_mips_for(vm_id);
                if host.vm_scheduler.granted_per_pe(vm_id, &vm.spec) > vm.spec.mips + MIPS_EPSILON {
                    return false;
                }
                if vm.scheduler.total_rate() > grant + MIPS_EPSILON {
                    return false;
                }
                let over_demand = vm.scheduler.executing().iter().any(|c| {
                    c.rate_mips > CloudletSchedulerTimeShared::demand_of(c, &vm.spec) + MIPS_EPSILON
                });
                if over_demand {
                    return false;
                }
            }
        }
        true
    }
}
