//! Anchor provider (§9): settlement is an external collaborator (Bitcoin),
//! so this is a closed trait with a single real implementation deferred to
//! the settlement integration and a null implementation for nodes that
//! don't anchor at all.

use async_trait::async_trait;
use thiserror::Error;

use crate::checkpoint::OP_RETURN_LEN;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnchorProviderError {
    #[error("anchoring is disabled for this node")]
    Disabled,
}

#[async_trait]
pub trait AnchorProvider: Send + Sync {
    /// Broadcast an OP_RETURN-bearing transaction carrying `payload`
    /// (exactly [`OP_RETURN_LEN`] bytes), returning a settlement-side
    /// transaction reference on success.
    async fn broadcast(&self, payload: [u8; OP_RETURN_LEN]) -> Result<String, AnchorProviderError>;
}

/// Anchoring disabled: every call fails immediately rather than silently
/// pretending to have anchored.
#[derive(Default)]
pub struct NullAnchorProvider;

#[async_trait]
impl AnchorProvider for NullAnchorProvider {
    async fn broadcast(&self, _payload: [u8; OP_RETURN_LEN]) -> Result<String, AnchorProviderError> {
        Err(AnchorProviderError::Disabled)
    }
}
