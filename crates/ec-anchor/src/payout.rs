//! Batch payout splitting (§4.15): fees taken in order, residual split
//! proportional to `allocation_share` with integer-floor amounts.

/// Basis-point fees applied in order: coordinator, then reserve (§4.15).
pub const COORDINATOR_FEE_BPS: u64 = 500;
pub const RESERVE_FEE_BPS: u64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct PayoutResult {
    pub coordinator_fee: u64,
    pub reserve_fee: u64,
    pub payouts: Vec<(String, u64)>,
    pub dust: u64,
}

fn bps_of(amount: u64, bps: u64) -> u64 {
    amount * bps / 10_000
}

/// Split a gross amount by configured fee bps, then distribute the residual
/// proportional to each participant's `allocation_share`, integer-floored.
/// `dust = residual - Σ payouts`, always `< participants.len()`.
pub fn split_payout(gross: u64, shares: &[(String, f64)]) -> PayoutResult {
    let coordinator_fee = bps_of(gross, COORDINATOR_FEE_BPS);
    let after_coordinator = gross - coordinator_fee;
    let reserve_fee = bps_of(after_coordinator, RESERVE_FEE_BPS);
    let residual = after_coordinator - reserve_fee;

    let payouts: Vec<(String, u64)> = shares
        .iter()
        .map(|(account_id, share)| {
            let amount = (residual as f64 * share).floor() as u64;
            (account_id.clone(), amount)
        })
        .collect();

    let distributed: u64 = payouts.iter().map(|(_, amount)| amount).sum();
    let dust = residual - distributed;

    PayoutResult {
        coordinator_fee,
        reserve_fee,
        payouts,
        dust,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scenario S6: gross 100000 sats, bps (500, 500), shares {0.6, 0.3, 0.1}.
    #[test]
    fn scenario_s6_payout() {
        let shares = vec![
            ("a1".to_string(), 0.6),
            ("a2".to_string(), 0.3),
            ("a3".to_string(), 0.1),
        ];
        let result = split_payout(100_000, &shares);
        assert_eq!(result.coordinator_fee, 5_000);
        assert_eq!(result.reserve_fee, 4_750);
        assert_eq!(
            result.payouts,
            vec![
                ("a1".to_string(), 54_150),
                ("a2".to_string(), 27_075),
                ("a3".to_string(), 9_025),
            ]
        );
        assert_eq!(result.dust, 0);
    }

    /// §8 property 6: fees + payouts + dust == gross, dust < participant count.
    #[test]
    fn invariant_6_conservation_and_bounded_dust() {
        let shares = vec![
            ("a1".to_string(), 1.0 / 3.0),
            ("a2".to_string(), 1.0 / 3.0),
            ("a3".to_string(), 1.0 / 3.0),
        ];
        let gross = 100_001u64;
        let result = split_payout(gross, &shares);
        let distributed: u64 = result.payouts.iter().map(|(_, a)| a).sum();
        assert_eq!(
            result.coordinator_fee + result.reserve_fee + distributed + result.dust,
            gross
        );
        assert!((result.dust as usize) < shares.len());
    }

    #[test]
    fn empty_shares_leaves_full_residual_as_dust() {
        let result = split_payout(10_000, &[]);
        assert!(result.payouts.is_empty());
        assert_eq!(result.coordinator_fee, 500);
        assert_eq!(result.reserve_fee, 475);
        assert_eq!(result.dust, 9_025);
    }
}
