//! Signed gossip envelopes (§4.8): every message exchanged between peers is
//! wrapped with the sender's SPKI-PEM public key and an Ed25519 signature
//! over the canonical JSON encoding of its payload.

use ec_proto::canonical::canonical_bytes;
use ec_proto::identity::{self, LocalIdentity};
use serde::{Deserialize, Serialize};

use crate::error::GossipError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope<T> {
    pub payload: T,
    pub signer_public_key_pem: String,
    pub signature_hex: String,
}

impl<T: Serialize> SignedEnvelope<T> {
    pub fn sign(payload: T, identity: &LocalIdentity) -> Self {
        let bytes = canonical_bytes(&payload);
        let signature = identity.sign(&bytes);
        SignedEnvelope {
            payload,
            signer_public_key_pem: identity.public_key_pem(),
            signature_hex: hex::encode(signature),
        }
    }
}

impl<T: Serialize + for<'de> Deserialize<'de>> SignedEnvelope<T> {
    /// Verify the envelope's signature, returning the payload on success.
    pub fn verify(&self) -> Result<&T, GossipError> {
        let bytes = canonical_bytes(&self.payload);
        let signature = hex::decode(&self.signature_hex)
            .map_err(|_| GossipError::SignatureInvalid)?;
        identity::verify(&self.signer_public_key_pem, &bytes, &signature)
            .map_err(|_| GossipError::SignatureInvalid)?;
        Ok(&self.payload)
    }
}
