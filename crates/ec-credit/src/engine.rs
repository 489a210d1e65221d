//! Credit engine (§4.11): deterministic accrual from contribution reports,
//! duplicate rejection, and an append-only transaction history.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use ec_proto::credit::{CreditTransaction, LoadSnapshot, TxType};
use ec_proto::{ContributionReport, ResourceClass};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CreditError {
    #[error("duplicate_contribution_report: {0}")]
    DuplicateContributionReport(String),

    #[error("adjustment would drive balance negative for account {0}")]
    InsufficientBalance(String),
}

pub fn base_rate(resource_class: ResourceClass) -> f64 {
    match resource_class {
        ResourceClass::Cpu => 1.0,
        ResourceClass::Gpu => 4.0,
    }
}

/// `load_multiplier(pressure)` tiers (§4.11); non-decreasing across the
/// boundaries {0.5, 1.0, 2.0} (§8 property 8).
pub fn load_multiplier(pressure: f64) -> f64 {
    if pressure <= 0.5 {
        0.8
    } else if pressure <= 1.0 {
        1.0
    } else if pressure <= 2.0 {
        1.25
    } else {
        1.6
    }
}

struct Inner {
    seen_report_ids: HashSet<String>,
    history: Vec<CreditTransaction>,
    balances: HashMap<String, f64>,
}

/// Process-wide singleton in production (§9); constructed explicitly here
/// and passed to whatever owns the routing/swarm lifecycle.
pub struct CreditEngine {
    inner: Mutex<Inner>,
}

impl Default for CreditEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CreditEngine {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                seen_report_ids: HashSet::new(),
                history: Vec::new(),
                balances: HashMap::new(),
            }),
        }
    }

    /// Accept one contribution report, appending an `earn` transaction.
    pub fn record_report(
        &self,
        report: &ContributionReport,
        load: LoadSnapshot,
    ) -> Result<CreditTransaction, CreditError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.seen_report_ids.insert(report.report_id.clone()) {
            return Err(CreditError::DuplicateContributionReport(
                report.report_id.clone(),
            ));
        }

        let seconds = match report.resource_class {
            ResourceClass::Cpu => report.cpu_seconds,
            ResourceClass::Gpu => report.gpu_seconds,
        };
        let credits = seconds
            * base_rate(report.resource_class)
            * report.quality_score.clamp(0.5, 1.5)
            * load_multiplier(load.pressure());

        let tx = CreditTransaction {
            tx_id: format!("earn-{}", report.report_id),
            account_id: report.agent_id.clone(),
            credits,
            tx_type: TxType::Earn,
            source_report_id: Some(report.report_id.clone()),
            timestamp_ms: report.timestamp_ms,
        };
        *inner.balances.entry(tx.account_id.clone()).or_insert(0.0) += tx.credits;
        inner.history.push(tx.clone());
        Ok(tx)
    }

    /// Faucet grants or manual corrections. Balance may not go negative
    /// except via an explicit `spend`.
    pub fn adjust(
        &self,
        account_id: impl Into<String>,
        delta: f64,
        tx_type: TxType,
        timestamp_ms: u64,
    ) -> Result<CreditTransaction, CreditError> {
        let account_id = account_id.into();
        let mut inner = self.inner.lock().unwrap();
        let current = inner.balances.get(&account_id).copied().unwrap_or(0.0);
        let next = current + delta;
        if next < 0.0 && !matches!(tx_type, TxType::Spend) {
            return Err(CreditError::InsufficientBalance(account_id));
        }

        let tx = CreditTransaction {
            tx_id: format!("{account_id}-{}-{timestamp_ms}", inner.history.len()),
            account_id: account_id.clone(),
            credits: delta,
            tx_type,
            source_report_id: None,
            timestamp_ms,
        };
        inner.balances.insert(account_id, next);
        inner.history.push(tx.clone());
        Ok(tx)
    }

    pub fn balance(&self, account_id: &str) -> f64 {
        self.inner
            .lock()
            .unwrap()
            .balances
            .get(account_id)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn history(&self, account_id: &str) -> Vec<CreditTransaction> {
        self.inner
            .lock()
            .unwrap()
            .history
            .iter()
            .filter(|tx| tx.account_id == account_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, seconds: f64, class: ResourceClass) -> ContributionReport {
        ContributionReport {
            report_id: id.to_string(),
            agent_id: "agent-1".to_string(),
            task_id: "task-1".to_string(),
            resource_class: class,
            cpu_seconds: if matches!(class, ResourceClass::Cpu) { seconds } else { 0.0 },
            gpu_seconds: if matches!(class, ResourceClass::Gpu) { seconds } else { 0.0 },
            success: true,
            quality_score: 1.0,
            timestamp_ms: 1_000,
        }
    }

    /// Scenario S2: pressure 1.0 (mult 1.0), 20 cpu-seconds at quality 1.0 → 20.000 credits.
    #[test]
    fn scenario_s2_credits() {
        let engine = CreditEngine::new();
        let load = LoadSnapshot {
            queued_tasks: 5,
            active_agents: 5,
        };
        let tx = engine
            .record_report(&report("r1", 20.0, ResourceClass::Cpu), load)
            .unwrap();
        assert!((tx.credits - 20.0).abs() < 1e-9);

        let err = engine.record_report(&report("r1", 20.0, ResourceClass::Cpu), load);
        assert_eq!(
            err,
            Err(CreditError::DuplicateContributionReport("r1".to_string()))
        );
    }

    /// Scenario S3: 10s CPU report, quality 1.0, across load tiers.
    #[test]
    fn scenario_s3_load_tiers() {
        let engine = CreditEngine::new();
        let cases = [
            (1u64, 5u64, 8.0),
            (5, 5, 10.0),
            (8, 5, 12.5),
            (15, 5, 16.0),
        ];
        for (i, (queued, active, expected)) in cases.iter().enumerate() {
            let load = LoadSnapshot {
                queued_tasks: *queued,
                active_agents: *active,
            };
            let tx = engine
                .record_report(&report(&format!("r{i}"), 10.0, ResourceClass::Cpu), load)
                .unwrap();
            assert!((tx.credits - expected).abs() < 1e-9, "case {i}");
        }
    }

    #[test]
    fn invariant_1_balance_equals_sum_of_accepted_credits() {
        let engine = CreditEngine::new();
        let load = LoadSnapshot {
            queued_tasks: 1,
            active_agents: 5,
        };
        let mut expected = 0.0;
        for i in 0..5 {
            let r = report(&format!("r{i}"), 10.0, ResourceClass::Cpu);
            let tx = engine.record_report(&r, load).unwrap();
            expected += tx.credits;
        }
        assert!((engine.balance("agent-1") - expected).abs() < 1e-9);
    }

    #[test]
    fn adjust_faucet_cannot_go_negative() {
        let engine = CreditEngine::new();
        let err = engine.adjust("acct", -10.0, TxType::Faucet, 0);
        assert!(err.is_err());
    }

    #[test]
    fn adjust_spend_may_go_negative() {
        let engine = CreditEngine::new();
        let tx = engine.adjust("acct", -10.0, TxType::Spend, 0).unwrap();
        assert_eq!(tx.credits, -10.0);
        assert_eq!(engine.balance("acct"), -10.0);
    }

    #[test]
    fn load_multiplier_is_nondecreasing_across_tiers() {
        let samples = [0.1, 0.5, 0.6, 1.0, 1.1, 2.0, 2.1, 10.0];
        let mut prev = 0.0;
        for p in samples {
            let m = load_multiplier(p);
            assert!(m >= prev);
            prev = m;
        }
    }
}
