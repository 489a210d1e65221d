use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Root configuration for an edgecoder node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub gossip: GossipConfig,
    #[serde(default)]
    pub ble: BleConfig,
    #[serde(default)]
    pub swarm: SwarmConfig,
    #[serde(default)]
    pub issuance: IssuanceConfig,
    #[serde(default)]
    pub anchor: AnchorConfig,
}

/// Local node identity and data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Path to the persisted Ed25519 keypair seed. Generated on first run.
    pub keypair_path: String,
    /// Base directory for the offline BLE ledger and blacklist log.
    pub data_dir: String,
    /// `coordinator` or `agent` (§3 Peer record `role`).
    pub role: String,
    /// Inference concurrency cap — 2 on desktop, 1 on mobile (§5).
    pub concurrency_cap: u32,
    /// Local-inference latency p95 threshold in ms (§4.9 step 2).
    pub latency_threshold_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            keypair_path: "~/.config/edgecoder/identity.key".to_string(),
            data_dir: "~/.local/share/edgecoder".to_string(),
            role: "agent".to_string(),
            concurrency_cap: 2,
            latency_threshold_ms: 8_000,
        }
    }
}

/// Gossip peer table / HTTP overlay (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipConfig {
    /// Seed URLs contacted in order during `bootstrap` (§4.8, §6 CLI).
    #[serde(default)]
    pub seeds: Vec<String>,
    /// Local HTTP listen address for `/identity`, `/mesh/peers`, etc.
    pub listen_addr: String,
    /// Shared bearer token compared in constant time (§6).
    pub mesh_token: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            listen_addr: "127.0.0.1:8787".to_string(),
            mesh_token: None,
            enabled: true,
        }
    }
}

/// BLE mesh transport and routing thresholds (§4.4–§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BleConfig {
    pub mtu: usize,
    pub cost_threshold: f64,
    pub max_concurrent_connections: u32,
    pub task_timeout_ms: u64,
    pub mesh_token_hash: Option<String>,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            mtu: 512,
            cost_threshold: 200.0,
            max_concurrent_connections: 5,
            task_timeout_ms: 90_000,
            mesh_token_hash: None,
        }
    }
}

/// Swarm coordinator connection (§4.9 step 3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfig {
    pub coordinator_url: Option<String>,
    pub mesh_auth_token: Option<String>,
    pub poll_interval_ms: u64,
    pub poll_deadline_ms: u64,
    /// Listen address for this node's own `/tasks` coordinator surface.
    /// Only bound when `node.role == "coordinator"`.
    pub listen_addr: Option<String>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            coordinator_url: None,
            mesh_auth_token: None,
            poll_interval_ms: 2_000,
            poll_deadline_ms: 90_000,
            listen_addr: None,
        }
    }
}

/// Issuance pool parameters (§4.12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuanceConfig {
    pub base_pool: f64,
    pub min_pool: f64,
    pub max_pool: f64,
    pub slope: f64,
    pub cpu_capacity: f64,
    pub gpu_capacity: f64,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            base_pool: 10_000.0,
            min_pool: 2_000.0,
            max_pool: 50_000.0,
            slope: 1.5,
            cpu_capacity: 100.0,
            gpu_capacity: 20.0,
        }
    }
}

/// Anchor / payout settlement interface (§4.15, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    pub coordinator_fee_bps: u32,
    pub reserve_fee_bps: u32,
    #[serde(default)]
    pub enabled: bool,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            coordinator_fee_bps: 500,
            reserve_fee_bps: 500,
            enabled: false,
        }
    }
}
