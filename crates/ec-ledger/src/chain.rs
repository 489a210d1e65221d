//! Generic hash-chained audit log (§3 "Ledger event", §4.14 `verify_chain`).

use ec_proto::canonical::{hex_hash, sha256_concat};
use ec_proto::ledger::{ChainBreakReason, ChainVerification};
pub use ec_proto::ledger::LedgerEvent;

/// Hash of an empty predecessor, used as `prev_hash` for the first event.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000";

fn event_hash(prev_hash: &str, payload: &str) -> String {
    hex_hash(&sha256_concat(prev_hash.as_bytes(), payload.as_bytes()))
}

/// An append-only chain a single writer owns.
#[derive(Debug, Default)]
pub struct LedgerChain {
    events: Vec<LedgerEvent>,
}

impl LedgerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, payload: impl Into<String>) -> LedgerEvent {
        let payload = payload.into();
        let prev_hash = self
            .events
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let hash = event_hash(&prev_hash, &payload);
        let event = LedgerEvent {
            sequence: self.events.len() as u64 + 1,
            prev_hash,
            payload,
            hash,
        };
        self.events.push(event.clone());
        event
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }
}

/// Verify an arbitrary event sequence (§4.14): strictly consecutive
/// `sequence`, each `hash == SHA256(prev_hash || payload)`, and each
/// event's `prev_hash` equal to the prior event's `hash`.
pub fn verify_chain(events: &[LedgerEvent]) -> ChainVerification {
    let mut prev_hash: Option<String> = None;
    for (i, event) in events.iter().enumerate() {
        let expected_sequence = (i + 1) as u64;
        if event.sequence != expected_sequence {
            return ChainVerification {
                valid: false,
                breakpoint: Some(event.sequence),
                reason: Some(ChainBreakReason::SequenceGap),
            };
        }

        let expected_hash = event_hash(&event.prev_hash, &event.payload);
        if event.hash != expected_hash {
            return ChainVerification {
                valid: false,
                breakpoint: Some(event.sequence),
                reason: Some(ChainBreakReason::HashMismatch),
            };
        }

        if let Some(prev) = &prev_hash {
            if &event.prev_hash != prev {
                return ChainVerification {
                    valid: false,
                    breakpoint: Some(event.sequence),
                    reason: Some(ChainBreakReason::ChainBreak),
                };
            }
        }

        prev_hash = Some(event.hash.clone());
    }

    ChainVerification {
        valid: true,
        breakpoint: None,
        reason: None,
    }
}
