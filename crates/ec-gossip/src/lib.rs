pub mod client;
pub mod envelope;
pub mod error;
pub mod server;
pub mod state;

pub use client::{GossipClient, EVICTION_INTERVAL, GOSSIP_INTERVAL};
pub use envelope::SignedEnvelope;
pub use error::GossipError;
pub use server::{build_router, AppState, IdentityResponse};
pub use state::{PeerTable, PEER_EXCHANGE_BATCH};
