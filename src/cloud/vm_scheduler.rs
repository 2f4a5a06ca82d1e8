//! 分时 VM 调度器
//!
//! 在一台主机内，把所有 PE 的 MIPS 总量分给驻留的 VM。

use super::allocation::AllocationPolicy;
use super::id::VmId;
use super::vm::VmSpec;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// 每台主机一个；只在需求变化（cloudlet 到达/完成/取消、VM 销毁）时重算。
#[derive(Debug, Default)]
pub struct VmSchedulerTimeShared {
    granted: BTreeMap<VmId, f64>,
}

impl VmSchedulerTimeShared {
    /// VM 当前获得的 MIPS（所有 PE 合计）
    pub fn granted(&self, vm: VmId) -> f64 {
        self.granted.get(&vm).copied().unwrap_or(0.0)
    }

    /// VM 每个 PE 获得的 MIPS
    pub fn granted_per_pe(&self, vm: VmId, spec: &VmSpec) -> f64 {
        self.granted(vm) / spec.pes as f64
    }

    pub fn total_granted(&self) -> f64 {
        self.granted.values().sum()
    }

    pub(crate) fn remove(&mut self, vm: VmId) {
        self.granted.remove(&vm);
    }

    /// VM 的 CPU 需求：不超过自身 PE 数 × min(请求 MIPS, 主机 PE MIPS)，
    /// 也不超过它上面正在执行的 cloudlet 的需求之和。
    pub fn demand_of(spec: &VmSpec, host_pe_mips: f64, workload_demand: f64) -> f64 {
        let cap = spec.pes as f64 * spec.mips.min(host_pe_mips);
        cap.min(workload_demand).max(0.0)
    }

    /// 按策略把 `capacity` 重新分给 `demands`，返回每个 VM 的新份额。
    #[tracing::instrument(skip(self, demands, policy), fields(vms = demands.len()))]
    pub fn reallocate(
        &mut self,
        capacity: f64,
        demands: &[(VmId, f64)],
        policy: &dyn AllocationPolicy,
    ) -> &BTreeMap<VmId, f64> {
        let raw: Vec<f64> = demands.iter().map(|&(_, d)| d).collect();
        let grants = policy.allocate(capacity, &raw);

        self.granted.clear();
        for (&(vm, demand), grant) in demands.iter().zip(grants) {
            trace!(vm = vm.0, demand, grant, "VM 份额");
            self.granted.insert(vm, grant);
        }
        debug!(
            capacity,
            total_granted = self.total_granted(),
            "🔁 重新分配主机 CPU"
        );
        &self.granted
    }
}
