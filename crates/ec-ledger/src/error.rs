use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("reporter signature invalid")]
    ReporterSignatureInvalid,

    #[error("blacklist_event_hash_mismatch")]
    BlacklistEventHashMismatch,

    #[error("blacklist_coordinator_signature_invalid")]
    BlacklistCoordinatorSignatureInvalid,

    #[error("chain_break")]
    ChainBreak,
}
