//! 云仿真世界
//!
//! `World` 的实现：持有数据中心、经纪人和可选的时间线记录器，
//! 所有云事件最终都在这里处理。

use super::broker::Broker;
use super::cloudlet::Cloudlet;
use super::datacenter::Datacenter;
use super::events::{CancelCloudlet, CloudletArrive, CreateVms, DestroyVm};
use super::host::HostSpec;
use super::id::{CloudletId, HostId, VmId};
use super::report::SimulationReport;
use crate::error::{Entity, Shortfall, SimError};
use crate::sim::{EventId, SimTime, Simulator, World};
use crate::viz::{VizEvent, VizEventKind, VizHostInfo, VizLogger, VizVmInfo};
use std::any::Any;
use tracing::{debug, info};

#[derive(Debug)]
pub struct CloudWorld {
    pub datacenter: Datacenter,
    pub broker: Broker,
    pub viz: Option<VizLogger>,
}

impl CloudWorld {
    pub fn new(hosts: &[HostSpec], broker: Broker) -> Self {
        Self {
            datacenter: Datacenter::new(hosts),
            broker,
            viz: None,
        }
    }

    pub fn with_datacenter(datacenter: Datacenter, broker: Broker) -> Self {
        Self {
            datacenter,
            broker,
            viz: None,
        }
    }

    fn emit(&mut self, now: SimTime, kind: VizEventKind) {
        if let Some(viz) = self.viz.as_mut() {
            viz.push(VizEvent { t_ns: now.0, kind });
        }
    }

    /// 开始仿真：此后经纪人拒绝新的提交
    pub fn start(&mut self, sim: &mut Simulator) -> Result<EventId, SimError> {
        if self.broker.is_started() {
            return Err(SimError::LateSubmission { what: "start" });
        }
        self.broker.mark_started();
        info!(
            hosts = self.datacenter.hosts().len(),
            "🚀 经纪人开始提交"
        );
        Ok(sim.schedule_now(CreateVms))
    }

    /// 完成后的结果；仿真尚未发出完成信号时返回 `SimulationNotFinished`
    pub fn report(&self, sim: &Simulator) -> Result<SimulationReport, SimError> {
        SimulationReport::collect(self, sim)
    }

    /// 在 `at` 时刻销毁 VM
    pub fn schedule_vm_destroy(&mut self, sim: &mut Simulator, vm: VmId, at: SimTime) -> Result<EventId, SimError> {
        sim.schedule(at, DestroyVm { vm })
    }

    /// 在 `at` 时刻取消 cloudlet
    pub fn schedule_cloudlet_cancel(
        &mut self,
        sim: &mut Simulator,
        cloudlet: CloudletId,
        at: SimTime,
    ) -> Result<EventId, SimError> {
        sim.schedule(at, CancelCloudlet { cloudlet })
    }

    fn emit_meta(&mut self, now: SimTime, vms: Vec<VizVmInfo>) {
        if self.viz.is_none() {
            return;
        }
        let hosts = self
            .datacenter
            .hosts()
            .iter()
            .map(|h| VizHostInfo {
                id: h.id().0,
                pes: h.pe_count(),
                pe_mips: h.pe_mips(),
            })
            .collect();
        self.emit(now, VizEventKind::Meta { hosts, vms });
    }

    #[tracing::instrument(skip(self, sim), fields(now = ?sim.now()))]
    pub(crate) fn on_create_vms(&mut self, sim: &mut Simulator) -> Result<(), SimError> {
        let now = sim.now();
        let vms = self.broker.take_pending_vms();
        self.emit_meta(
            now,
            vms.iter()
                .map(|vm| VizVmInfo {
                    id: vm.id().0,
                    pes: vm.spec().pes,
                    mips: vm.spec().mips,
                })
                .collect(),
        );

        for vm in vms {
            let id = vm.id();
            let lifetime = vm.spec().lifetime;
            match self.datacenter.place_vm(vm, self.broker.placement.as_ref(), now) {
                Ok(host) => {
                    self.emit(now, VizEventKind::VmCreated { vm: id.0, host: host.0 });
                    if let Some(lifetime) = lifetime {
                        sim.schedule_in(lifetime, DestroyVm { vm: id });
                    }
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    self.emit(
                        now,
                        VizEventKind::VmRejected {
                            vm: id.0,
                            reason: err.to_string(),
                        },
                    );
                    self.broker.reject(Entity::Vm(id), err, now);
                }
            }
        }

        for cloudlet in self.broker.take_pending_cloudlets() {
            self.assign_cloudlet(cloudlet, sim)?;
        }
        Ok(())
    }

    fn assign_cloudlet(&mut self, cloudlet: Cloudlet, sim: &mut Simulator) -> Result<(), SimError> {
        let now = sim.now();
        let id = cloudlet.id();
        let running = self.datacenter.running_vms();
        let chosen = self.broker.assignment.select_vm(cloudlet.spec(), &running);
        let Some(vm) = chosen else {
            let shortfall = match running.iter().map(|vm| vm.spec().pes).max() {
                Some(available) => Shortfall::Pes {
                    requested: cloudlet.spec().pes,
                    available,
                },
                None => Shortfall::NoCandidate,
            };
            let err = SimError::InsufficientCapacity {
                entity: Entity::Cloudlet(id),
                shortfall,
            };
            self.emit(
                now,
                VizEventKind::CloudletRejected {
                    cloudlet: id.0,
                    reason: err.to_string(),
                },
            );
            self.broker.reject(Entity::Cloudlet(id), err, now);
            return Ok(());
        };

        let delay = cloudlet.spec().submission_delay;
        self.datacenter.submit_cloudlet(vm, cloudlet)?;
        sim.schedule_in(delay, CloudletArrive { vm, cloudlet: id });
        debug!(cloudlet = id.0, vm = vm.0, delay = ?delay, "cloudlet 已分配");
        Ok(())
    }

    pub(crate) fn on_cloudlet_arrive(
        &mut self,
        vm: VmId,
        cloudlet: CloudletId,
        sim: &mut Simulator,
    ) -> Result<(), SimError> {
        if !self.datacenter.start_cloudlet(vm, cloudlet, sim.now())? {
            debug!(vm = vm.0, cloudlet = cloudlet.0, "cloudlet 已不在等待队列，忽略到达");
            return Ok(());
        }
        self.emit(
            sim.now(),
            VizEventKind::CloudletStart {
                cloudlet: cloudlet.0,
                vm: vm.0,
            },
        );
        let host = self.host_of(vm)?;
        self.rebalance(host, sim)
    }

    pub(crate) fn on_cloudlet_finish(
        &mut self,
        vm: VmId,
        cloudlet: CloudletId,
        sim: &mut Simulator,
    ) -> Result<(), SimError> {
        let now = sim.now();
        let (host, done) = self.datacenter.take_completed(vm, now, sim)?;
        if !done.iter().any(|c| c.id() == cloudlet) {
            debug!(cloudlet = cloudlet.0, "完成事件触发时 cloudlet 尚未执行完");
        }
        for c in done {
            self.finish_terminal(c, now);
        }
        self.rebalance(host, sim)
    }

    pub(crate) fn on_destroy_vm(&mut self, vm: VmId, sim: &mut Simulator) -> Result<(), SimError> {
        let now = sim.now();
        let Some((host, failed)) = self.datacenter.destroy_vm(vm, sim)? else {
            return Ok(());
        };
        self.emit(now, VizEventKind::VmDestroyed { vm: vm.0, host: host.0 });
        for c in failed {
            self.finish_terminal(c, now);
        }
        self.rebalance(host, sim)
    }

    pub(crate) fn on_cancel_cloudlet(&mut self, cloudlet: CloudletId, sim: &mut Simulator) -> Result<(), SimError> {
        let now = sim.now();
        let Some((host, c)) = self.datacenter.cancel_cloudlet(cloudlet, sim)? else {
            return Ok(());
        };
        self.finish_terminal(c, now);
        self.rebalance(host, sim)
    }

    fn finish_terminal(&mut self, c: Cloudlet, now: SimTime) {
        self.emit(
            now,
            VizEventKind::CloudletEnd {
                cloudlet: c.id().0,
                vm: c.vm().map_or(usize::MAX, |v| v.0),
                status: c.status().as_str().to_string(),
            },
        );
        self.broker.record_terminal(c);
    }

    fn host_of(&self, vm: VmId) -> Result<HostId, SimError> {
        self.datacenter.vm(vm)?.host().ok_or(SimError::UnknownVm(vm))
    }

    fn rebalance(&mut self, host: HostId, sim: &mut Simulator) -> Result<(), SimError> {
        self.datacenter.rebalance_host(host, sim)?;
        if self.viz.is_some() {
            let now = sim.now();
            let samples: Vec<VizEventKind> = self
                .datacenter
                .host(host)?
                .vms()
                .iter()
                .filter_map(|&vm| self.datacenter.vm(vm).ok())
                .map(|vm| VizEventKind::VmShare {
                    host: host.0,
                    vm: vm.id().0,
                    granted_mips: self.datacenter.vm_granted_mips(vm.id()),
                    cloudlets: vm.scheduler().executing().len(),
                })
                .collect();
            for kind in samples {
                self.emit(now, kind);
            }
        }
        Ok(())
    }
}

impl World for CloudWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        debug_assert!(
            self.datacenter.allocation_invariants_hold(),
            "CPU allocation exceeds capacity"
        );
    }

    fn has_pending_work(&self) -> bool {
        self.datacenter.has_pending_work() || self.broker.has_pending_submissions()
    }

    fn on_complete(&mut self, sim: &mut Simulator) {
        let now = sim.now();
        for c in self.datacenter.shutdown(now) {
            self.finish_terminal(c, now);
        }
        self.broker.signal_complete();
        info!(
            now = ?now,
            terminal = self.broker.terminal_so_far().len(),
            rejected = self.broker.rejections().len(),
            "📋 经纪人已收集全部结果"
        );
    }
}
