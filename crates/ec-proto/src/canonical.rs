//! Canonical JSON used everywhere a signature is computed over a structured
//! payload: gossip envelopes (§4.8) and blacklist events (§4.14) must both
//! hash/sign the exact same byte string on every platform.
//!
//! Canonicalization rules (Design Notes, §9):
//! - object keys sorted lexicographically
//! - numbers emitted without trailing zeros
//!
//! `serde_json::Map` is backed by a `BTreeMap` as long as the `preserve_order`
//! cargo feature is not enabled anywhere in the dependency graph (it is not,
//! here), so round-tripping any `Value` through this crate already sorts keys.
//! Number formatting falls out of `serde_json`'s own float/int writer, which
//! never emits superfluous trailing zeros.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serialize `value` to its canonical JSON byte representation.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    let v = serde_json::to_value(value).expect("value must serialize to JSON");
    serde_json::to_vec(&v).expect("canonical value must serialize")
}

/// Serialize `value` to its canonical JSON string.
pub fn canonical_string<T: Serialize>(value: &T) -> String {
    String::from_utf8(canonical_bytes(value)).expect("canonical JSON is valid UTF-8")
}

/// SHA-256 over the canonical JSON encoding of `value`.
pub fn canonical_sha256<T: Serialize>(value: &T) -> [u8; 32] {
    let bytes = canonical_bytes(value);
    sha256(&bytes)
}

/// Plain SHA-256 of an arbitrary byte slice.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// SHA-256 over the concatenation of two byte slices — used by the generic
/// ledger chain (`hash = SHA256(prev_hash || payload)`, §3).
pub fn sha256_concat(a: &[u8], b: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(a);
    hasher.update(b);
    hasher.finalize().into()
}

/// Hex-encode a 32-byte hash for storage/log output.
pub fn hex_hash(hash: &[u8; 32]) -> String {
    hex::encode(hash)
}
