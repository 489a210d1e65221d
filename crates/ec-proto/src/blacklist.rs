//! Blacklist event data model (§3, §4.14, §4.16).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    ForgedResults,
    PolicyViolation,
    CredentialAbuse,
    DosBehavior,
}

/// A single appended, hash-chained blacklist record (§3).
///
/// Every field except `coordinator_signature` and `event_hash` participates
/// in the canonical payload that `event_hash` commits to (§4.14).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlacklistEvent {
    pub event_id: String,
    pub agent_id: String,
    pub reason_code: ReasonCode,
    pub reason: String,
    pub evidence_hash_sha256: String,
    pub reporter_id: String,
    pub reporter_public_key: String,
    pub reporter_signature: String,
    pub evidence_signature_verified: bool,
    pub source_coordinator_id: String,
    pub timestamp_ms: u64,
    pub expires_at_ms: Option<u64>,
    pub prev_event_hash: String,
    pub event_hash: String,
    pub coordinator_signature: String,
}

/// The subset of `BlacklistEvent` fields that `event_hash` is computed over —
/// everything except `coordinator_signature` and `event_hash` itself (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlacklistEventPayload {
    pub event_id: String,
    pub agent_id: String,
    pub reason_code: ReasonCode,
    pub reason: String,
    pub evidence_hash_sha256: String,
    pub reporter_id: String,
    pub reporter_public_key: String,
    pub reporter_signature: String,
    pub evidence_signature_verified: bool,
    pub source_coordinator_id: String,
    pub timestamp_ms: u64,
    pub expires_at_ms: Option<u64>,
    pub prev_event_hash: String,
}

impl From<&BlacklistEvent> for BlacklistEventPayload {
    fn from(e: &BlacklistEvent) -> Self {
        Self {
            event_id: e.event_id.clone(),
            agent_id: e.agent_id.clone(),
            reason_code: e.reason_code,
            reason: e.reason.clone(),
            evidence_hash_sha256: e.evidence_hash_sha256.clone(),
            reporter_id: e.reporter_id.clone(),
            reporter_public_key: e.reporter_public_key.clone(),
            reporter_signature: e.reporter_signature.clone(),
            evidence_signature_verified: e.evidence_signature_verified,
            source_coordinator_id: e.source_coordinator_id.clone(),
            timestamp_ms: e.timestamp_ms,
            expires_at_ms: e.expires_at_ms,
            prev_event_hash: e.prev_event_hash.clone(),
        }
    }
}

/// Unsigned evidence submitted by a reporter, prior to coordinator countersignature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReporterEvidence {
    pub agent_id: String,
    pub reason_code: ReasonCode,
    pub reason: String,
    pub evidence_hash_sha256: String,
    pub reporter_id: String,
    pub reporter_public_key: String,
    /// Signature over the canonical JSON of this struct with `reporter_signature`
    /// cleared (i.e. over the other six fields above).
    pub reporter_signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReporterEvidenceUnsigned {
    pub agent_id: String,
    pub reason_code: ReasonCode,
    pub reason: String,
    pub evidence_hash_sha256: String,
    pub reporter_id: String,
    pub reporter_public_key: String,
}

impl From<&ReporterEvidence> for ReporterEvidenceUnsigned {
    fn from(e: &ReporterEvidence) -> Self {
        Self {
            agent_id: e.agent_id.clone(),
            reason_code: e.reason_code,
            reason: e.reason.clone(),
            evidence_hash_sha256: e.evidence_hash_sha256.clone(),
            reporter_id: e.reporter_id.clone(),
            reporter_public_key: e.reporter_public_key.clone(),
        }
    }
}
