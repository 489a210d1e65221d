//! Contribution reports, credit transactions, and rolling contribution
//! shares (§3, §4.11, §4.12).

use serde::{Deserialize, Serialize};

use crate::subtask::ResourceClass;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContributionReport {
    /// Unique; a report may be accepted at most once per engine lifetime.
    pub report_id: String,
    pub agent_id: String,
    pub task_id: String,
    pub resource_class: ResourceClass,
    pub cpu_seconds: f64,
    pub gpu_seconds: f64,
    pub success: bool,
    pub quality_score: f64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Earn,
    Spend,
    Faucet,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditTransaction {
    pub tx_id: String,
    pub account_id: String,
    /// Positive for earn/faucet/transfer-in, negative for spend/transfer-out.
    pub credits: f64,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub source_report_id: Option<String>,
    pub timestamp_ms: u64,
}

/// Load snapshot feeding `load_multiplier` (§4.11) and the load index (§4.12).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LoadSnapshot {
    pub queued_tasks: u64,
    pub active_agents: u64,
}

impl LoadSnapshot {
    pub fn pressure(&self) -> f64 {
        self.queued_tasks as f64 / (self.active_agents.max(1) as f64)
    }
}

/// Rolling contribution share for one account over an accounting window (§3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RollingContributionShare {
    pub cpu_seconds: f64,
    pub gpu_seconds: f64,
    pub avg_quality_score: f64,
    pub reliability_score: f64,
}

pub const R_CPU: f64 = 1.0;
pub const R_GPU: f64 = 4.0;

impl RollingContributionShare {
    /// `(cpu_s·R_cpu + gpu_s·R_gpu) · clamp(quality, 0.5, 1.5)` (§3).
    pub fn weighted_contribution(&self) -> f64 {
        let quality = self.avg_quality_score.clamp(0.5, 1.5);
        (self.cpu_seconds * R_CPU + self.gpu_seconds * R_GPU) * quality
    }
}
