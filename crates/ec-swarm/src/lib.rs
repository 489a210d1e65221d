//! Swarm task queue (§4.10): project-fair scheduling, claim/complete/requeue.

pub mod server;

use std::collections::HashMap;
use std::sync::Mutex;

use ec_proto::{ProjectMeta, Subtask, SubtaskResult};
use thiserror::Error;

pub use server::{build_router, NullSubtaskWorker, SubtaskOutcome, SubtaskWorker, SwarmServerState};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwarmError {
    #[error("subtask not claimed: {0}")]
    NotClaimed(u64),
}

#[derive(Debug, Clone)]
pub struct AgentRecord {
    pub agent_id: String,
    pub policy: String,
}

#[derive(Debug, Clone)]
struct ClaimedSubtask {
    subtask: Subtask,
    #[allow(dead_code)]
    agent_id: String,
    claimed_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    pub queued: usize,
    pub agents: usize,
    pub results: usize,
}

#[derive(Default)]
struct Inner {
    agents: HashMap<String, AgentRecord>,
    next_id: u64,
    queued: Vec<Subtask>,
    claimed: HashMap<u64, ClaimedSubtask>,
    completed: Vec<SubtaskResult>,
    project_completions: HashMap<String, u64>,
}

/// All mutation goes through one exclusive lock (§5): fairness depends on
/// `claim`/`complete` ordering being a single source of truth.
#[derive(Default)]
pub struct SwarmQueue {
    inner: Mutex<Inner>,
}

impl SwarmQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_agent(&self, agent_id: impl Into<String>, policy: impl Into<String>) {
        let agent_id = agent_id.into();
        let mut inner = self.inner.lock().unwrap();
        inner.agents.insert(
            agent_id.clone(),
            AgentRecord {
                agent_id,
                policy: policy.into(),
            },
        );
    }

    /// Assigns a fresh monotonic id and appends to the queue.
    #[allow(clippy::too_many_arguments)]
    pub fn enqueue_subtask(
        &self,
        task_id: impl Into<String>,
        kind: impl Into<String>,
        language: impl Into<String>,
        input: impl Into<String>,
        timeout_ms: u64,
        snapshot_ref: Option<String>,
        project_meta: ProjectMeta,
        queued_at_ms: u64,
    ) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.queued.push(Subtask {
            id,
            task_id: task_id.into(),
            kind: kind.into(),
            language: language.into(),
            input: input.into(),
            timeout_ms,
            snapshot_ref,
            project_meta,
            queued_at_ms,
        });
        id
    }

    /// Fair-share claim (§4.10): the project with the fewest completions so
    /// far wins; ties broken by lowest `queued_at_ms`, then by priority
    /// descending.
    pub fn claim(&self, agent_id: impl Into<String>, now_ms: u64) -> Option<Subtask> {
        let agent_id = agent_id.into();
        let mut inner = self.inner.lock().unwrap();
        if inner.queued.is_empty() {
            return None;
        }

        let min_completions = inner
            .queued
            .iter()
            .map(|s| {
                inner
                    .project_completions
                    .get(&s.project_meta.project_id)
                    .copied()
                    .unwrap_or(0)
            })
            .min()?;

        let winner_index = inner
            .queued
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                inner
                    .project_completions
                    .get(&s.project_meta.project_id)
                    .copied()
                    .unwrap_or(0)
                    == min_completions
            })
            .min_by(|(_, a), (_, b)| {
                a.queued_at_ms
                    .cmp(&b.queued_at_ms)
                    .then(b.project_meta.priority.cmp(&a.project_meta.priority))
            })
            .map(|(i, _)| i)?;

        let subtask = inner.queued.remove(winner_index);
        inner.claimed.insert(
            subtask.id,
            ClaimedSubtask {
                subtask: subtask.clone(),
                agent_id,
                claimed_at_ms: now_ms,
            },
        );
        Some(subtask)
    }

    pub fn complete(&self, result: SubtaskResult) -> Result<(), SwarmError> {
        let mut inner = self.inner.lock().unwrap();
        let claimed = inner
            .claimed
            .remove(&result.subtask_id)
            .ok_or(SwarmError::NotClaimed(result.subtask_id))?;
        *inner
            .project_completions
            .entry(claimed.subtask.project_meta.project_id.clone())
            .or_insert(0) += 1;
        inner.completed.push(result);
        Ok(())
    }

    /// Any claim older than `max_age_ms` (relative to `now_ms`) returns to
    /// the queue; the original claimer receives no credit. Returns the
    /// count requeued.
    pub fn requeue_stale(&self, max_age_ms: u64, now_ms: u64) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        let stale_ids: Vec<u64> = inner
            .claimed
            .iter()
            .filter(|(_, c)| now_ms.saturating_sub(c.claimed_at_ms) > max_age_ms)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale_ids {
            if let Some(claimed) = inner.claimed.remove(id) {
                inner.queued.push(claimed.subtask);
            }
        }
        stale_ids.len() as u64
    }

    pub fn status(&self) -> QueueStatus {
        let inner = self.inner.lock().unwrap();
        QueueStatus {
            queued: inner.queued.len(),
            agents: inner.agents.len(),
            results: inner.completed.len(),
        }
    }

    /// The result for `subtask_id`, once its claimer has completed it.
    pub fn completed_result(&self, subtask_id: u64) -> Option<SubtaskResult> {
        self.inner
            .lock()
            .unwrap()
            .completed
            .iter()
            .find(|r| r.subtask_id == subtask_id)
            .cloned()
    }

    pub fn project_completion_count(&self, project_id: &str) -> u64 {
        self.inner
            .lock()
            .unwrap()
            .project_completions
            .get(project_id)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(project_id: &str) -> ProjectMeta {
        ProjectMeta {
            project_id: project_id.to_string(),
            resource_class: ec_proto::ResourceClass::Cpu,
            priority: 50,
        }
    }

    fn result(subtask_id: u64, agent_id: &str) -> SubtaskResult {
        SubtaskResult {
            subtask_id,
            task_id: "t".to_string(),
            agent_id: agent_id.to_string(),
            ok: true,
            output: "done".to_string(),
            error: None,
            duration_ms: 10,
        }
    }

    /// Scenario S1: 3 agents, 3 projects, 3 subtasks each, all claimed and
    /// completed round-robin — each project ends at exactly 3 completions.
    #[test]
    fn scenario_s1_fair_share() {
        let queue = SwarmQueue::new();
        queue.register_agent("A", "");
        queue.register_agent("B", "");
        queue.register_agent("C", "");

        for project in ["X", "Y", "Z"] {
            for i in 0..3 {
                queue.enqueue_subtask(
                    format!("{project}-{i}"),
                    "inference",
                    "en",
                    "prompt",
                    30_000,
                    None,
                    meta(project),
                    i as u64,
                );
            }
        }

        for _ in 0..9 {
            let subtask = queue.claim("A", 0).expect("subtask available");
            queue.complete(result(subtask.id, "A")).unwrap();
        }

        let status = queue.status();
        assert_eq!(status.queued, 0);
        assert_eq!(status.agents, 3);
        assert_eq!(status.results, 9);
        for project in ["X", "Y", "Z"] {
            assert_eq!(queue.project_completion_count(project), 3);
        }
    }

    #[test]
    fn claim_prefers_lowest_queued_at_on_tie() {
        let queue = SwarmQueue::new();
        queue.enqueue_subtask("t2", "k", "en", "i", 1000, None, meta("X"), 20);
        queue.enqueue_subtask("t1", "k", "en", "i", 1000, None, meta("X"), 10);
        let claimed = queue.claim("A", 0).unwrap();
        assert_eq!(claimed.task_id, "t1");
    }

    #[test]
    fn claim_prefers_higher_priority_on_further_tie() {
        let queue = SwarmQueue::new();
        let mut low = meta("X");
        low.priority = 10;
        let mut high = meta("X");
        high.priority = 90;
        queue.enqueue_subtask("low", "k", "en", "i", 1000, None, low, 10);
        queue.enqueue_subtask("high", "k", "en", "i", 1000, None, high, 10);
        let claimed = queue.claim("A", 0).unwrap();
        assert_eq!(claimed.task_id, "high");
    }

    #[test]
    fn requeue_stale_returns_claim_to_queue_without_credit() {
        let queue = SwarmQueue::new();
        queue.enqueue_subtask("t1", "k", "en", "i", 1000, None, meta("X"), 0);
        let claimed = queue.claim("A", 0).unwrap();
        assert_eq!(queue.requeue_stale(1_000, 500), 0);
        let count = queue.requeue_stale(1_000, 2_000);
        assert_eq!(count, 1);
        assert_eq!(queue.status().queued, 1);
        assert_eq!(queue.project_completion_count("X"), 0);

        let reclaimed = queue.claim("B", 2_000).unwrap();
        assert_eq!(reclaimed.id, claimed.id);
    }

    #[test]
    fn complete_unclaimed_subtask_is_error() {
        let queue = SwarmQueue::new();
        assert_eq!(
            queue.complete(result(999, "A")),
            Err(SwarmError::NotClaimed(999))
        );
    }

    #[test]
    fn claim_on_empty_queue_returns_none() {
        let queue = SwarmQueue::new();
        assert!(queue.claim("A", 0).is_none());
    }

    #[test]
    fn completed_result_is_retrievable_after_complete() {
        let queue = SwarmQueue::new();
        queue.enqueue_subtask("t1", "k", "en", "i", 1000, None, meta("X"), 0);
        let claimed = queue.claim("A", 0).unwrap();
        assert!(queue.completed_result(claimed.id).is_none());
        queue.complete(result(claimed.id, "A")).unwrap();
        let found = queue.completed_result(claimed.id).unwrap();
        assert_eq!(found.output, "done");
    }
}
