use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BleError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("timeout waiting for task response")]
    Timeout,

    #[error("chunk reassembly failed: {0}")]
    ChunkReassemblyFailed(String),

    #[error("no reachable peer below the cost threshold")]
    Unreachable,

    #[error("peer not found: {0}")]
    PeerNotFound(String),

    #[error("ledger io error: {0}")]
    LedgerIo(String),
}

impl From<ec_chunk::ChunkError> for BleError {
    fn from(e: ec_chunk::ChunkError) -> Self {
        BleError::ChunkReassemblyFailed(e.to_string())
    }
}
