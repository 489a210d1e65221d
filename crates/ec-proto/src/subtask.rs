//! Swarm subtask types (§3, §4.10).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Cpu,
    Gpu,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Cpu => "cpu",
            ResourceClass::Gpu => "gpu",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMeta {
    pub project_id: String,
    pub resource_class: ResourceClass,
    /// 1..=100
    pub priority: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subtask {
    /// Assigned by the queue on enqueue.
    pub id: u64,
    pub task_id: String,
    pub kind: String,
    pub language: String,
    pub input: String,
    pub timeout_ms: u64,
    pub snapshot_ref: Option<String>,
    pub project_meta: ProjectMeta,
    /// Monotonic millisecond timestamp at enqueue time; used for tie-breaks.
    pub queued_at_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubtaskResult {
    pub subtask_id: u64,
    pub task_id: String,
    pub agent_id: String,
    pub ok: bool,
    pub output: String,
    pub error: Option<String>,
    pub duration_ms: u64,
}
