pub mod anomaly;
pub mod blacklist;
pub mod chain;
pub mod error;

pub use anomaly::{evaluate_rules, AutoBlacklister, BehaviorStats, RuleFiring, Severity};
pub use blacklist::BlacklistLedger;
pub use chain::{verify_chain, LedgerChain, GENESIS_HASH};
pub use error::LedgerError;
