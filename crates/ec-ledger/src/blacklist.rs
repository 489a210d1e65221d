//! Blacklist ledger (§4.14): reporter-attested, coordinator-signed,
//! hash-chained events with gossip-side validation.

use ec_proto::blacklist::{BlacklistEvent, BlacklistEventPayload, ReporterEvidence, ReporterEvidenceUnsigned};
use ec_proto::canonical::{canonical_bytes, canonical_sha256, hex_hash};
use ec_proto::identity::{self, LocalIdentity};

use crate::chain::GENESIS_HASH;
use crate::error::LedgerError;

pub struct BlacklistLedger {
    identity: LocalIdentity,
    coordinator_id: String,
    events: Vec<BlacklistEvent>,
    head_hash: String,
}

impl BlacklistLedger {
    pub fn new(identity: LocalIdentity, coordinator_id: impl Into<String>) -> Self {
        Self {
            identity,
            coordinator_id: coordinator_id.into(),
            events: Vec::new(),
            head_hash: GENESIS_HASH.to_string(),
        }
    }

    pub fn head_hash(&self) -> &str {
        &self.head_hash
    }

    pub fn events(&self) -> &[BlacklistEvent] {
        &self.events
    }

    /// Verify the reporter's signature, compute `event_hash` over the
    /// canonical payload (including the current chain head), countersign
    /// with the coordinator key, and append (§4.14 step 1-3).
    pub fn add_event(
        &mut self,
        evidence: &ReporterEvidence,
        timestamp_ms: u64,
        expires_at_ms: Option<u64>,
        event_id: impl Into<String>,
    ) -> Result<BlacklistEvent, LedgerError> {
        let unsigned = ReporterEvidenceUnsigned::from(evidence);
        let bytes = canonical_bytes(&unsigned);
        let signature = hex::decode(&evidence.reporter_signature)
            .map_err(|_| LedgerError::ReporterSignatureInvalid)?;
        identity::verify(&evidence.reporter_public_key, &bytes, &signature)
            .map_err(|_| LedgerError::ReporterSignatureInvalid)?;

        let payload = BlacklistEventPayload {
            event_id: event_id.into(),
            agent_id: evidence.agent_id.clone(),
            reason_code: evidence.reason_code,
            reason: evidence.reason.clone(),
            evidence_hash_sha256: evidence.evidence_hash_sha256.clone(),
            reporter_id: evidence.reporter_id.clone(),
            reporter_public_key: evidence.reporter_public_key.clone(),
            reporter_signature: evidence.reporter_signature.clone(),
            evidence_signature_verified: true,
            source_coordinator_id: self.coordinator_id.clone(),
            timestamp_ms,
            expires_at_ms,
            prev_event_hash: self.head_hash.clone(),
        };
        let event_hash = hex_hash(&canonical_sha256(&payload));
        let coordinator_signature = hex::encode(self.identity.sign(event_hash.as_bytes()));

        let event = BlacklistEvent {
            event_id: payload.event_id,
            agent_id: payload.agent_id,
            reason_code: payload.reason_code,
            reason: payload.reason,
            evidence_hash_sha256: payload.evidence_hash_sha256,
            reporter_id: payload.reporter_id,
            reporter_public_key: payload.reporter_public_key,
            reporter_signature: payload.reporter_signature,
            evidence_signature_verified: payload.evidence_signature_verified,
            source_coordinator_id: payload.source_coordinator_id,
            timestamp_ms: payload.timestamp_ms,
            expires_at_ms: payload.expires_at_ms,
            prev_event_hash: payload.prev_event_hash,
            event_hash: event_hash.clone(),
            coordinator_signature,
        };

        self.events.push(event.clone());
        self.head_hash = event_hash;
        Ok(event)
    }

    /// Gossip-side validation (§4.14): recompute `event_hash`, verify the
    /// coordinator's signature, and check the chain links against our head.
    pub fn validate_incoming(
        &self,
        event: &BlacklistEvent,
        peer_public_key: &str,
    ) -> Result<(), LedgerError> {
        let payload = BlacklistEventPayload::from(event);
        let expected_hash = hex_hash(&canonical_sha256(&payload));
        if expected_hash != event.event_hash {
            return Err(LedgerError::BlacklistEventHashMismatch);
        }

        let signature = hex::decode(&event.coordinator_signature)
            .map_err(|_| LedgerError::BlacklistCoordinatorSignatureInvalid)?;
        identity::verify(peer_public_key, event.event_hash.as_bytes(), &signature)
            .map_err(|_| LedgerError::BlacklistCoordinatorSignatureInvalid)?;

        if event.prev_event_hash != self.head_hash {
            return Err(LedgerError::ChainBreak);
        }

        Ok(())
    }

    /// Append an event already accepted by [`Self::validate_incoming`].
    pub fn accept_validated(&mut self, event: BlacklistEvent) {
        self.head_hash = event.event_hash.clone();
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_proto::blacklist::ReasonCode;

    fn signed_evidence(reporter: &LocalIdentity, agent_id: &str) -> ReporterEvidence {
        let unsigned = ReporterEvidenceUnsigned {
            agent_id: agent_id.to_string(),
            reason_code: ReasonCode::ForgedResults,
            reason: "fabricated output".to_string(),
            evidence_hash_sha256: hex_hash(&canonical_sha256(&"evidence")),
            reporter_id: "reporter-1".to_string(),
            reporter_public_key: reporter.public_key_pem(),
        };
        let bytes = canonical_bytes(&unsigned);
        let signature = hex::encode(reporter.sign(&bytes));
        ReporterEvidence {
            agent_id: unsigned.agent_id,
            reason_code: unsigned.reason_code,
            reason: unsigned.reason,
            evidence_hash_sha256: unsigned.evidence_hash_sha256,
            reporter_id: unsigned.reporter_id,
            reporter_public_key: unsigned.reporter_public_key,
            reporter_signature: signature,
        }
    }

    #[test]
    fn add_event_chains_and_signs() {
        let coordinator = LocalIdentity::generate();
        let reporter = LocalIdentity::generate();
        let mut ledger = BlacklistLedger::new(coordinator, "coord-1");

        let evidence = signed_evidence(&reporter, "bad-agent");
        let event = ledger.add_event(&evidence, 1_000, None, "evt-1").unwrap();
        assert_eq!(event.prev_event_hash, crate::chain::GENESIS_HASH);
        assert_eq!(ledger.head_hash(), event.event_hash);
    }

    #[test]
    fn tampered_reporter_signature_rejected() {
        let coordinator = LocalIdentity::generate();
        let reporter = LocalIdentity::generate();
        let mut ledger = BlacklistLedger::new(coordinator, "coord-1");
        let mut evidence = signed_evidence(&reporter, "bad-agent");
        evidence.agent_id = "different-agent".to_string();
        let err = ledger.add_event(&evidence, 1_000, None, "evt-1");
        assert_eq!(err, Err(LedgerError::ReporterSignatureInvalid));
    }

    #[test]
    fn validate_incoming_accepts_matching_peer_event() {
        let coordinator = LocalIdentity::generate();
        let reporter = LocalIdentity::generate();
        let coordinator_pem = coordinator.public_key_pem();
        let mut producer = BlacklistLedger::new(coordinator, "coord-1");
        let evidence = signed_evidence(&reporter, "bad-agent");
        let event = producer.add_event(&evidence, 1_000, None, "evt-1").unwrap();

        let other_coordinator = LocalIdentity::generate();
        let consumer = BlacklistLedger::new(other_coordinator, "coord-2");
        assert!(consumer.validate_incoming(&event, &coordinator_pem).is_ok());
    }

    #[test]
    fn validate_incoming_rejects_hash_mismatch() {
        let coordinator = LocalIdentity::generate();
        let reporter = LocalIdentity::generate();
        let coordinator_pem = coordinator.public_key_pem();
        let mut producer = BlacklistLedger::new(coordinator, "coord-1");
        let evidence = signed_evidence(&reporter, "bad-agent");
        let mut event = producer.add_event(&evidence, 1_000, None, "evt-1").unwrap();
        event.reason = "edited after signing".to_string();

        let other_coordinator = LocalIdentity::generate();
        let consumer = BlacklistLedger::new(other_coordinator, "coord-2");
        assert_eq!(
            consumer.validate_incoming(&event, &coordinator_pem),
            Err(LedgerError::BlacklistEventHashMismatch)
        );
    }

    #[test]
    fn validate_incoming_rejects_wrong_signer() {
        let coordinator = LocalIdentity::generate();
        let reporter = LocalIdentity::generate();
        let mut producer = BlacklistLedger::new(coordinator, "coord-1");
        let evidence = signed_evidence(&reporter, "bad-agent");
        let event = producer.add_event(&evidence, 1_000, None, "evt-1").unwrap();

        let wrong_key = LocalIdentity::generate().public_key_pem();
        let other_coordinator = LocalIdentity::generate();
        let consumer = BlacklistLedger::new(other_coordinator, "coord-2");
        assert_eq!(
            consumer.validate_incoming(&event, &wrong_key),
            Err(LedgerError::BlacklistCoordinatorSignatureInvalid)
        );
    }
}
