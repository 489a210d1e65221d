pub mod error;
pub mod ledger;
pub mod manager;
pub mod quality;
pub mod router;
pub mod transport;

pub use error::BleError;
pub use ledger::{BleCreditTx, OfflineLedger};
pub use manager::{model_quality_multiplier, BleMeshManager, BleTaskOutcome};
pub use quality::ConnectionQualityMonitor;
pub use router::{compute_cost, select_peers, RankedPeer, COST_THRESHOLD};
pub use transport::{
    characteristic, BleTaskResponse, BleTransport, MockBleTransport, NullBleTransport, STALE_PEER_MS,
};
