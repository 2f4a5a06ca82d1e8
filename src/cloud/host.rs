//! 主机（资源池）
//!
//! 持有固定数量的 PE 以及 RAM/带宽/存储容量。RAM/带宽/存储在放置时
//! 整体预留；CPU（MIPS）只做分时共享，由 `VmSchedulerTimeShared` 分配。

use super::id::{HostId, VmId};
use super::vm::VmSpec;
use super::vm_scheduler::VmSchedulerTimeShared;
use crate::error::{Entity, Shortfall, SimError};
use tracing::{debug, info};

/// 处理单元（一个 CPU 核）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pe {
    pub mips: f64,
}

/// 主机硬件规格
#[derive(Debug, Clone)]
pub struct HostSpec {
    pub pes: u32,
    pub pe_mips: f64,
    pub ram: u64,
    pub bw: u64,
    pub storage: u64,
}

/// 主机
#[derive(Debug)]
pub struct Host {
    id: HostId,
    pes: Vec<Pe>,
    ram: u64,
    bw: u64,
    storage: u64,
    ram_used: u64,
    bw_used: u64,
    storage_used: u64,
    vms: Vec<VmId>,
    pub(crate) vm_scheduler: VmSchedulerTimeShared,
}

impl Host {
    /// 创建新主机
    pub fn new(id: HostId, spec: &HostSpec) -> Self {
        Self {
            id,
            pes: vec![Pe { mips: spec.pe_mips }; spec.pes as usize],
            ram: spec.ram,
            bw: spec.bw,
            storage: spec.storage,
            ram_used: 0,
            bw_used: 0,
            storage_used: 0,
            vms: Vec::new(),
            vm_scheduler: VmSchedulerTimeShared::default(),
        }
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn pes(&self) -> &[Pe] {
        &self.pes
    }

    pub fn pe_count(&self) -> u32 {
        self.pes.len() as u32
    }

    /// 单个 PE 的最大 MIPS
    pub fn pe_mips(&self) -> f64 {
        self.pes.iter().map(|pe| pe.mips).fold(0.0, f64::max)
    }

    /// 所有 PE 的 MIPS 之和
    pub fn total_pe_mips(&self) -> f64 {
        self.pes.iter().map(|pe| pe.mips).sum()
    }

    pub fn free_ram(&self) -> u64 {
        self.ram - self.ram_used
    }

    pub fn free_bw(&self) -> u64 {
        self.bw - self.bw_used
    }

    pub fn free_storage(&self) -> u64 {
        self.storage - self.storage_used
    }

    /// 驻留在本主机上的 VM
    pub fn vms(&self) -> &[VmId] {
        &self.vms
    }

    /// 已被驻留 VM 占用的 PE 数（分时共享时可超过物理 PE 数）
    pub fn used_pes(&self, vm_pes: impl Fn(VmId) -> u32) -> u32 {
        self.vms.iter().map(|&vm| vm_pes(vm)).sum()
    }

    /// VM 在当前 VM 调度策略下可获得的 MIPS（总和，非每 PE）
    pub fn available_mips_for(&self, vm: VmId) -> f64 {
        self.vm_scheduler.granted(vm)
    }

    /// 检查 VM 能否放到本主机上
    pub fn is_suitable_for(&self, vm: VmId, spec: &VmSpec) -> Result<(), SimError> {
        let shortfall = if spec.pes > self.pe_count() {
            Some(Shortfall::Pes {
                requested: spec.pes,
                available: self.pe_count(),
            })
        } else if spec.ram > self.free_ram() {
            Some(Shortfall::Ram {
                requested: spec.ram,
                available: self.free_ram(),
            })
        } else if spec.bw > self.free_bw() {
            Some(Shortfall::Bw {
                requested: spec.bw,
                available: self.free_bw(),
            })
        } else if spec.size > self.free_storage() {
            Some(Shortfall::Storage {
                requested: spec.size,
                available: self.free_storage(),
            })
        } else {
            None
        };
        match shortfall {
            Some(shortfall) => Err(SimError::InsufficientCapacity {
                entity: Entity::Vm(vm),
                shortfall,
            }),
            None => Ok(()),
        }
    }

    /// 为 VM 预留 RAM/带宽/存储
    #[tracing::instrument(skip(self, spec), fields(host = self.id.0))]
    pub fn allocate(&mut self, vm: VmId, spec: &VmSpec) -> Result<(), SimError> {
        self.is_suitable_for(vm, spec)?;
        self.ram_used += spec.ram;
        self.bw_used += spec.bw;
        self.storage_used += spec.size;
        self.vms.push(vm);
        info!(vm = vm.0, pes = spec.pes, mips = spec.mips, "🖥️  VM 放置到主机");
        Ok(())
    }

    /// 释放 VM 占用的资源并收回它的 CPU 份额
    #[tracing::instrument(skip(self, spec), fields(host = self.id.0))]
    pub fn deallocate(&mut self, vm: VmId, spec: &VmSpec) {
        let Some(pos) = self.vms.iter().position(|&v| v == vm) else {
            return;
        };
        self.vms.remove(pos);
        self.ram_used -= spec.ram;
        self.bw_used -= spec.bw;
        self.storage_used -= spec.size;
        self.vm_scheduler.remove(vm);
        debug!(vm = vm.0, free_ram = self.free_ram(), "释放 VM 资源");
    }
}
