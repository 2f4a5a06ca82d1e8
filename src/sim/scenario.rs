//! Scenario description: hosts, VMs, cloudlets and broker policies.
//!
//! A scenario is loaded from JSON (see `scenario_sim`) or built from CLI
//! flags (see `simple_cloud`). Validation happens here, before anything is
//! submitted to the simulation core.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 场景配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported schema_version {0} (expected 1)")]
    SchemaVersion(u32),
    #[error("{group}[{index}].{field} must be {expect}")]
    OutOfRange {
        group: &'static str,
        index: usize,
        field: &'static str,
        expect: &'static str,
    },
    #[error("scenario declares no {0}")]
    Empty(&'static str),
    #[error("unknown {kind} policy: {raw}")]
    UnknownPolicy { kind: &'static str, raw: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<ScenarioMeta>,
    pub hosts: Vec<HostGroupSpec>,
    pub vms: Vec<VmGroupSpec>,
    #[serde(default)]
    pub cloudlets: Vec<CloudletGroupSpec>,
    #[serde(default)]
    pub policies: PolicySpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `count` identical hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostGroupSpec {
    #[serde(default = "one")]
    pub count: usize,
    pub pes: u32,
    pub pe_mips: f64,
    /// MB
    pub ram: u64,
    /// MB/s
    pub bw: u64,
    /// MB
    pub storage: u64,
}

/// `count` identical VMs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmGroupSpec {
    #[serde(default = "one")]
    pub count: usize,
    pub pes: u32,
    /// Requested MIPS per PE.
    pub mips: f64,
    pub ram: u64,
    pub bw: u64,
    /// Image size (MB).
    pub size: u64,
    /// Destroy the VM this many seconds after it is created.
    #[serde(default)]
    pub lifetime_s: Option<f64>,
}

/// `count` cloudlets; the i-th one in the group has length `length + i * length_step`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudletGroupSpec {
    #[serde(default = "one")]
    pub count: usize,
    /// Length in MI per PE.
    pub length: u64,
    #[serde(default)]
    pub length_step: u64,
    pub pes: u32,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub output_size: u64,
    #[serde(default)]
    pub submission_delay_s: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    #[default]
    FirstFit,
    WorstFit,
}

impl PlacementKind {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "first_fit" | "firstfit" => Ok(Self::FirstFit),
            "worst_fit" | "worstfit" => Ok(Self::WorstFit),
            _ => Err(ConfigError::UnknownPolicy {
                kind: "placement",
                raw: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    #[default]
    RoundRobin,
    FirstAvailable,
}

impl AssignmentKind {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_lowercase().replace('-', "_").as_str() {
            "round_robin" | "roundrobin" => Ok(Self::RoundRobin),
            "first_available" | "firstavailable" => Ok(Self::FirstAvailable),
            _ => Err(ConfigError::UnknownPolicy {
                kind: "assignment",
                raw: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PolicySpec {
    #[serde(default)]
    pub placement: PlacementKind,
    #[serde(default)]
    pub assignment: AssignmentKind,
}

fn one() -> usize {
    1
}

impl Default for ScenarioSpec {
    /// 1 host × 8 PEs × 1000 MIPS, 2 VMs × 2 PEs, 10 cloudlets of 10000 + i·1000 MI.
    fn default() -> Self {
        Self {
            schema_version: 1,
            meta: Some(ScenarioMeta {
                name: Some("simple".to_string()),
                description: None,
            }),
            hosts: vec![HostGroupSpec {
                count: 1,
                pes: 8,
                pe_mips: 1000.0,
                ram: 8192,
                bw: 10_000,
                storage: 1_000_000,
            }],
            vms: vec![VmGroupSpec {
                count: 2,
                pes: 2,
                mips: 1000.0,
                ram: 1024,
                bw: 1000,
                size: 10_000,
                lifetime_s: None,
            }],
            cloudlets: vec![CloudletGroupSpec {
                count: 10,
                length: 10_000,
                length_step: 1000,
                pes: 2,
                file_size: 300,
                output_size: 300,
                submission_delay_s: 0.0,
            }],
            policies: PolicySpec::default(),
        }
    }
}

impl ScenarioSpec {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let spec: ScenarioSpec = serde_json::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// 检查所有数值是否在合法范围内（长度 > 0，PE ≥ 1 等）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != 1 {
            return Err(ConfigError::SchemaVersion(self.schema_version));
        }
        if self.hosts.iter().all(|h| h.count == 0) {
            return Err(ConfigError::Empty("hosts"));
        }
        if self.vms.iter().all(|v| v.count == 0) {
            return Err(ConfigError::Empty("vms"));
        }

        let out = |group, index, field, expect| ConfigError::OutOfRange {
            group,
            index,
            field,
            expect,
        };
        for (i, h) in self.hosts.iter().enumerate() {
            if h.pes == 0 {
                return Err(out("hosts", i, "pes", ">= 1"));
            }
            if !(h.pe_mips > 0.0 && h.pe_mips.is_finite()) {
                return Err(out("hosts", i, "pe_mips", "> 0"));
            }
        }
        for (i, v) in self.vms.iter().enumerate() {
            if v.pes == 0 {
                return Err(out("vms", i, "pes", ">= 1"));
            }
            if !(v.mips > 0.0 && v.mips.is_finite()) {
                return Err(out("vms", i, "mips", "> 0"));
            }
            if let Some(lifetime) = v.lifetime_s {
                if !(lifetime > 0.0 && lifetime.is_finite()) {
                    return Err(out("vms", i, "lifetime_s", "> 0"));
                }
            }
        }
        for (i, c) in self.cloudlets.iter().enumerate() {
            if c.length == 0 {
                return Err(out("cloudlets", i, "length", "> 0"));
            }
            if c.pes == 0 {
                return Err(out("cloudlets", i, "pes", ">= 1"));
            }
            if !(c.submission_delay_s >= 0.0 && c.submission_delay_s.is_finite()) {
                return Err(out("cloudlets", i, "submission_delay_s", ">= 0"));
            }
        }
        Ok(())
    }

    pub fn host_count(&self) -> usize {
        self.hosts.iter().map(|h| h.count).sum()
    }

    pub fn vm_count(&self) -> usize {
        self.vms.iter().map(|v| v.count).sum()
    }

    pub fn cloudlet_count(&self) -> usize {
        self.cloudlets.iter().map(|c| c.count).sum()
    }
}
