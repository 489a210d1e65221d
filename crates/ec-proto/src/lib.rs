//! Wire and data-model types shared across the EdgeCoder mesh crates.
//!
//! Kept independent of any transport crate (libp2p, axum, BLE bindings) so
//! that every component — gossip, BLE, swarm, credit, ledger — can depend on
//! it without pulling in the others' transports.

pub mod ble;
pub mod blacklist;
pub mod canonical;
pub mod credit;
pub mod identity;
pub mod ledger;
pub mod peer;
pub mod subtask;

pub use ble::{BleCapability, BleIdentity, DeviceType, BLE_SERVICE_UUID};
pub use blacklist::{BlacklistEvent, BlacklistEventPayload, ReasonCode, ReporterEvidence};
pub use credit::{
    ContributionReport, CreditTransaction, LoadSnapshot, RollingContributionShare, TxType,
};
pub use ledger::{ChainBreakReason, ChainVerification, LedgerEvent};
pub use peer::{NetworkMode, PeerRecord, PeerRole, BLE_PEER_TTL_MS, GOSSIP_PEER_TTL_MS};
pub use subtask::{ProjectMeta, ResourceClass, Subtask, SubtaskResult};
