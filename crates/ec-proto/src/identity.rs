//! Ed25519 identity: keypair generation, SPKI-PEM public keys, and signing.
//!
//! `public_key` in the data model (§3) is "Ed25519 SPKI PEM" — a portable
//! representation any peer can parse without sharing a private key format.
//! `ed25519-dalek`'s `pkcs8`/`pem` features round-trip directly to/from
//! `spki::SubjectPublicKeyInfo` PEM, so no hand-rolled ASN.1 is needed.

use ed25519_dalek::pkcs8::{DecodePublicKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use pkcs8::LineEnding;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid SPKI PEM public key: {0}")]
    InvalidPublicKeyPem(String),
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A local Ed25519 identity able to sign on behalf of a peer or coordinator.
pub struct LocalIdentity {
    signing_key: SigningKey,
}

impl LocalIdentity {
    /// Generate a fresh, random identity.
    pub fn generate() -> Self {
        let mut rng = rand_core::OsRng;
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Load an identity from a 32-byte Ed25519 seed.
    pub fn from_seed_bytes(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The raw 32-byte seed, for persistence.
    pub fn to_seed_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// This identity's public key, encoded as SPKI PEM (§3 `public_key` field).
    pub fn public_key_pem(&self) -> String {
        self.signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("Ed25519 verifying key always encodes to SPKI PEM")
    }

    /// Sign `message`, returning the raw 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Verify `signature` over `message` was produced by the holder of
/// `public_key_pem`.
pub fn verify(public_key_pem: &str, message: &[u8], signature: &[u8]) -> Result<(), IdentityError> {
    let verifying_key = parse_public_key_pem(public_key_pem)?;
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| IdentityError::InvalidSignatureEncoding("signature must be 64 bytes".into()))?;
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(message, &signature)
        .map_err(|_| IdentityError::VerificationFailed)
}

/// Parse an SPKI-PEM-encoded Ed25519 public key.
pub fn parse_public_key_pem(pem: &str) -> Result<VerifyingKey, IdentityError> {
    VerifyingKey::from_public_key_pem(pem)
        .map_err(|e| IdentityError::InvalidPublicKeyPem(e.to_string()))
}
