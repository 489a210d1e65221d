//! Anomaly detector + auto-blacklister (§4.16): per-agent behavior
//! statistics over a rolling window feed a fixed rule table; non-critical
//! firings accumulate strikes, critical firings blacklist immediately.

use std::collections::HashMap;

use ec_proto::blacklist::ReasonCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warn,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleFiring {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub reason_code: ReasonCode,
    pub description: &'static str,
}

/// Per-agent behavior statistics gathered over the rolling 1h window (§4.16).
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorStats {
    pub fast_count: u32,
    pub avg_duration_ms: f64,
    pub empty_count: u32,
    pub total: u32,
    pub identical_consecutive: u32,
    pub success_rate: f64,
    pub sig_fail: u32,
    pub replay: u32,
    pub gap_max_ms: u64,
    pub claims: u32,
    pub concurrent: u32,
    pub requeue: u32,
    pub registrations: u32,
    pub duration_stddev_ms: f64,
    pub avg_output_len: f64,
}

/// Evaluate the full BHV001-BHV010 rule table against one agent's stats.
pub fn evaluate_rules(stats: &BehaviorStats) -> Vec<RuleFiring> {
    let mut firings = Vec::new();

    if stats.fast_count >= 3 && stats.avg_duration_ms < 1000.0 {
        firings.push(RuleFiring {
            rule_id: "BHV001",
            severity: Severity::Critical,
            reason_code: ReasonCode::ForgedResults,
            description: "suspiciously fast completions",
        });
    }
    if stats.empty_count >= 5 && stats.total > 0 && stats.empty_count as f64 / stats.total as f64 >= 0.5 {
        firings.push(RuleFiring {
            rule_id: "BHV002",
            severity: Severity::High,
            reason_code: ReasonCode::ForgedResults,
            description: "mass empty output",
        });
    }
    if stats.identical_consecutive >= 3 {
        firings.push(RuleFiring {
            rule_id: "BHV003",
            severity: Severity::High,
            reason_code: ReasonCode::ForgedResults,
            description: "duplicate forgery",
        });
    }
    if stats.total >= 10 && stats.success_rate <= 0.1 {
        firings.push(RuleFiring {
            rule_id: "BHV004",
            severity: Severity::High,
            reason_code: ReasonCode::PolicyViolation,
            description: "success collapse",
        });
    }
    if stats.sig_fail + stats.replay >= 5 {
        firings.push(RuleFiring {
            rule_id: "BHV005",
            severity: Severity::Critical,
            reason_code: ReasonCode::CredentialAbuse,
            description: "protocol abuse",
        });
    }
    if stats.gap_max_ms >= 5 * 60_000 && stats.claims > 0 {
        firings.push(RuleFiring {
            rule_id: "BHV006",
            severity: Severity::High,
            reason_code: ReasonCode::DosBehavior,
            description: "heartbeat manipulation",
        });
    }
    if stats.concurrent >= 5 || stats.requeue >= 8 {
        firings.push(RuleFiring {
            rule_id: "BHV007",
            severity: Severity::High,
            reason_code: ReasonCode::DosBehavior,
            description: "task hoarding",
        });
    }
    if stats.registrations >= 10 {
        firings.push(RuleFiring {
            rule_id: "BHV008",
            severity: Severity::High,
            reason_code: ReasonCode::DosBehavior,
            description: "registration storm",
        });
    }
    if stats.duration_stddev_ms < 50.0 && stats.total >= 10 {
        firings.push(RuleFiring {
            rule_id: "BHV009",
            severity: Severity::Warn,
            reason_code: ReasonCode::ForgedResults,
            description: "robot precision",
        });
    }
    if stats.avg_output_len < 10.0 && stats.total >= 8 && stats.success_rate > 0.8 {
        firings.push(RuleFiring {
            rule_id: "BHV010",
            severity: Severity::Warn,
            reason_code: ReasonCode::ForgedResults,
            description: "tiny outputs",
        });
    }

    firings
}

const STRIKE_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;
const STRIKES_TO_BLACKLIST: usize = 3;

struct Strike {
    recorded_at_ms: u64,
    severity: Severity,
    reason_code: ReasonCode,
}

/// Accumulates non-critical strikes per agent over a rolling 24h window.
#[derive(Default)]
pub struct AutoBlacklister {
    strikes: HashMap<String, Vec<Strike>>,
}

impl AutoBlacklister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this tick's rule firings for one agent. Returns `Some(reason)`
    /// when a blacklist event should be produced right now — either a
    /// CRITICAL firing (immediate) or the third strike within the rolling
    /// window (using the most severe reason code among the accumulated
    /// strikes). Strikes reset once a blacklist decision is returned.
    pub fn record_firings(
        &mut self,
        agent_id: &str,
        firings: &[RuleFiring],
        now_ms: u64,
    ) -> Option<ReasonCode> {
        for firing in firings {
            if firing.severity == Severity::Critical {
                self.strikes.remove(agent_id);
                return Some(firing.reason_code);
            }
        }

        let entry = self.strikes.entry(agent_id.to_string()).or_default();
        entry.retain(|s| now_ms.saturating_sub(s.recorded_at_ms) < STRIKE_WINDOW_MS);
        for firing in firings {
            entry.push(Strike {
                recorded_at_ms: now_ms,
                severity: firing.severity,
                reason_code: firing.reason_code,
            });
        }

        if entry.len() >= STRIKES_TO_BLACKLIST {
            let most_severe = entry
                .iter()
                .max_by_key(|s| s.severity)
                .map(|s| s.reason_code);
            self.strikes.remove(agent_id);
            most_severe
        } else {
            None
        }
    }
}
