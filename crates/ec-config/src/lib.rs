pub mod loader;
pub mod schema;

pub use loader::{expand_home, load};
pub use schema::{
    AnchorConfig, BleConfig, Config, GossipConfig, IssuanceConfig, NodeConfig, SwarmConfig,
};
