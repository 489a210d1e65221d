//! Issuance engine (§4.12): a smoothed load index drives a clamped daily
//! pool, allocated hourly in proportion to rolling contribution shares.

use std::collections::HashMap;

use ec_proto::credit::RollingContributionShare;

const LOAD_INDEX_MIN: f64 = 0.2;
const LOAD_INDEX_MAX: f64 = 6.0;
const EMA_ALPHA: f64 = 0.3;

/// Per-account share of one hourly allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub allocation_share: f64,
    pub tokens: f64,
}

pub struct IssuanceEngine {
    base_pool: f64,
    min_pool: f64,
    max_pool: f64,
    slope: f64,
    cpu_capacity: f64,
    gpu_capacity: f64,
    smoothed_load_index: Option<f64>,
}

impl IssuanceEngine {
    pub fn new(
        base_pool: f64,
        min_pool: f64,
        max_pool: f64,
        slope: f64,
        cpu_capacity: f64,
        gpu_capacity: f64,
    ) -> Self {
        Self {
            base_pool,
            min_pool,
            max_pool,
            slope,
            cpu_capacity,
            gpu_capacity,
            smoothed_load_index: None,
        }
    }

    /// Raw demand/capacity ratio, clamped to `[0.2, 6.0]` (§4.12). Total
    /// capacity scales with the number of active agents serving it.
    fn raw_load_index(&self, queued_tasks: u64, active_agents: u64) -> f64 {
        let total_capacity = active_agents as f64 * (self.cpu_capacity + self.gpu_capacity);
        if total_capacity <= 0.0 {
            return LOAD_INDEX_MAX;
        }
        (queued_tasks as f64 / total_capacity).clamp(LOAD_INDEX_MIN, LOAD_INDEX_MAX)
    }

    /// Compute the raw load index and fold it into the smoothed series.
    /// First call sets the smoothed value directly to the raw value.
    pub fn update_load_index(&mut self, queued_tasks: u64, active_agents: u64) -> f64 {
        let raw = self.raw_load_index(queued_tasks, active_agents);
        let smoothed = match self.smoothed_load_index {
            None => raw,
            Some(prev) => prev * (1.0 - EMA_ALPHA) + raw * EMA_ALPHA,
        };
        self.smoothed_load_index = Some(smoothed);
        smoothed
    }

    pub fn smoothed_load_index(&self) -> Option<f64> {
        self.smoothed_load_index
    }

    /// Daily pool tokens from the current smoothed load index (§4.12).
    pub fn daily_pool(&self) -> f64 {
        let l_smooth = self.smoothed_load_index.unwrap_or(1.0);
        let pool = self.base_pool * (1.0 + (l_smooth - 1.0).max(0.0) * self.slope);
        pool.clamp(self.min_pool, self.max_pool)
    }

    /// Hourly pool = daily / 24, split proportional to `weighted_contribution`.
    /// Zero-contribution accounts receive nothing. `Σ allocation_share == 1`
    /// to within 1e-6 as long as at least one account has positive weight.
    pub fn allocate_hourly(
        &self,
        shares: &HashMap<String, RollingContributionShare>,
    ) -> HashMap<String, Allocation> {
        let hourly_pool = self.daily_pool() / 24.0;
        let weighted: HashMap<&String, f64> = shares
            .iter()
            .map(|(id, share)| (id, share.weighted_contribution().max(0.0)))
            .collect();
        let total_weight: f64 = weighted.values().sum();

        if total_weight <= 0.0 {
            return shares
                .keys()
                .map(|id| {
                    (
                        id.clone(),
                        Allocation {
                            allocation_share: 0.0,
                            tokens: 0.0,
                        },
                    )
                })
                .collect();
        }

        weighted
            .into_iter()
            .map(|(id, weight)| {
                let share = weight / total_weight;
                (
                    id.clone(),
                    Allocation {
                        allocation_share: share,
                        tokens: hourly_pool * share,
                    },
                )
            })
            .collect()
    }
}
