//! Epoch checkpoint payload and its OP_RETURN anchor (§4.15).

use ec_proto::canonical::canonical_sha256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationLine {
    pub account_id: String,
    pub issued_tokens: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpochCheckpoint {
    pub epoch: u64,
    pub load_index: f64,
    pub allocations: Vec<AllocationLine>,
}

impl EpochCheckpoint {
    pub fn hash(&self) -> [u8; 32] {
        canonical_sha256(self)
    }
}

const MAGIC: [u8; 2] = [0x45, 0x43]; // ASCII "EC"
const VERSION: u8 = 0x01;
pub const OP_RETURN_LEN: usize = 35;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("OP_RETURN payload must be exactly {OP_RETURN_LEN} bytes, got {0}")]
    WrongLength(usize),
    #[error("OP_RETURN payload has an unrecognized magic/version header")]
    BadHeader,
}

/// `"EC"` + version `0x01` + 32-byte hash, exactly 35 bytes (§4.15, §6).
pub fn encode_op_return(hash: &[u8; 32]) -> [u8; OP_RETURN_LEN] {
    let mut out = [0u8; OP_RETURN_LEN];
    out[0..2].copy_from_slice(&MAGIC);
    out[2] = VERSION;
    out[3..35].copy_from_slice(hash);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAnchor {
    pub version: u8,
    pub hash: [u8; 32],
}

/// Rejects anything that isn't exactly the `encode_op_return` layout.
pub fn decode_op_return(bytes: &[u8]) -> Result<DecodedAnchor, AnchorError> {
    if bytes.len() != OP_RETURN_LEN {
        return Err(AnchorError::WrongLength(bytes.len()));
    }
    if bytes[0..2] != MAGIC || bytes[2] != VERSION {
        return Err(AnchorError::BadHeader);
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes[3..35]);
    Ok(DecodedAnchor { version: VERSION, hash })
}
