//! Generic audit-chain event (§3 "Ledger event").
//!
//! Distinct from `BlacklistEvent`: this is the append-only sequence-numbered
//! chain used by `verify_chain` (§4.14) and tested directly by §8 property 2
//! and scenario S5.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEvent {
    pub sequence: u64,
    pub prev_hash: String,
    pub payload: String,
    pub hash: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChainBreakReason {
    SequenceGap,
    HashMismatch,
    ChainBreak,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainVerification {
    pub valid: bool,
    pub breakpoint: Option<u64>,
    pub reason: Option<ChainBreakReason>,
}
