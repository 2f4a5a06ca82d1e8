use serde::{Deserialize, Serialize};

/// 时间线事件类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 数据中心元信息（建议作为 t=0 的第一条事件）
    Meta {
        hosts: Vec<VizHostInfo>,
        vms: Vec<VizVmInfo>,
    },
    /// VM 放置成功
    VmCreated { vm: usize, host: usize },
    /// VM 无法放置
    VmRejected { vm: usize, reason: String },
    /// VM 被销毁
    VmDestroyed { vm: usize, host: usize },
    /// cloudlet 无法分配到任何 VM
    CloudletRejected { cloudlet: usize, reason: String },
    /// cloudlet 开始执行
    CloudletStart { cloudlet: usize, vm: usize },
    /// cloudlet 进入终止状态
    CloudletEnd {
        cloudlet: usize,
        vm: usize,
        status: String,
    },
    /// 主机重新分配后某个 VM 的份额采样
    VmShare {
        host: usize,
        vm: usize,
        granted_mips: f64,
        cloudlets: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VizHostInfo {
    pub id: usize,
    pub pes: u32,
    pub pe_mips: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VizVmInfo {
    pub id: usize,
    pub pes: u32,
    /// 每个 PE 请求的 MIPS
    pub mips: f64,
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VizEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, ev: VizEvent) {
        self.events.push(ev);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}
