pub mod checkpoint;
pub mod payout;
pub mod provider;

pub use checkpoint::{
    decode_op_return, encode_op_return, AllocationLine, AnchorError, DecodedAnchor,
    EpochCheckpoint, OP_RETURN_LEN,
};
pub use payout::{split_payout, PayoutResult, COORDINATOR_FEE_BPS, RESERVE_FEE_BPS};
pub use provider::{AnchorProvider, AnchorProviderError, NullAnchorProvider};
