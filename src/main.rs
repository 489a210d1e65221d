mod cli;
mod worker;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use ec_config::Config;
use ec_gossip::server::{build_router, AppState};
use ec_proto::identity::LocalIdentity;
use ec_proto::{NetworkMode, PeerRecord, PeerRole};

const EXIT_OK: i32 = 0;
const EXIT_CONFIG_ERROR: i32 = 1;
const EXIT_BOOTSTRAP_FAILURE: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(()) => EXIT_OK,
        Err(err) => {
            if err.downcast_ref::<BootstrapFailure>().is_some() {
                eprintln!("bootstrap failed: {err:#}");
                EXIT_BOOTSTRAP_FAILURE
            } else {
                eprintln!("fatal: {err:#}");
                EXIT_CONFIG_ERROR
            }
        }
    };
    std::process::exit(code);
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct BootstrapFailure(String);

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => run_start(cli.config.as_deref()).await,
        Commands::Bootstrap { seeds } => run_bootstrap(cli.config.as_deref(), seeds).await,
        Commands::Status => run_status(cli.config.as_deref()).await,
        Commands::ShowConfig => {
            let config = ec_config::load(cli.config.as_deref())?;
            println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
            Ok(())
        }
        Commands::Completions { shell } => {
            cli::print_completions(shell);
            Ok(())
        }
    }
}

fn load_or_create_identity(config: &Config) -> anyhow::Result<LocalIdentity> {
    let path = ec_config::expand_home(&config.node.keypair_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if path.is_file() {
        let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .with_context(|| format!("{} is not a 32-byte Ed25519 seed", path.display()))?;
        Ok(LocalIdentity::from_seed_bytes(&seed))
    } else {
        let identity = LocalIdentity::generate();
        std::fs::write(&path, identity.to_seed_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "generated new node identity");
        Ok(identity)
    }
}

fn self_peer_record(config: &Config, identity: &LocalIdentity, peer_id: &str) -> PeerRecord {
    PeerRecord {
        peer_id: peer_id.to_string(),
        public_key_pem: identity.public_key_pem(),
        address: format!("http://{}", config.gossip.listen_addr),
        role: if config.node.role == "coordinator" {
            PeerRole::Coordinator
        } else {
            PeerRole::Agent
        },
        network_mode: NetworkMode::PublicMesh,
        last_seen_ms: now_ms(),
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Wires the routing waterfall, swarm queue, credit engine, and BLE mesh
/// manager into one running node (C7, C9-C13); kept separate from gossip
/// bring-up so `run_start`/`run_bootstrap` can share `self_peer_record`.
struct NodeServices {
    #[allow(dead_code)]
    routing: Arc<ec_routing::RoutingEngine>,
    credit: Arc<ec_credit::CreditEngine>,
    swarm: Arc<ec_swarm::SwarmQueue>,
}

fn build_node_services(config: &Config) -> NodeServices {
    let credit = Arc::new(ec_credit::CreditEngine::new());
    let swarm = Arc::new(ec_swarm::SwarmQueue::new());

    let swarm_client = config.swarm.coordinator_url.as_ref().map(|url| {
        ec_routing::SwarmCoordinatorClient::new(
            url.clone(),
            config.swarm.mesh_auth_token.clone().unwrap_or_default(),
            std::time::Duration::from_millis(config.swarm.poll_interval_ms),
            std::time::Duration::from_millis(config.swarm.poll_deadline_ms),
        )
    });
    let routing = Arc::new(ec_routing::RoutingEngine::new(
        Arc::new(ec_routing::NullBluetoothProxy),
        Arc::new(ec_routing::StubModelProvider),
        swarm_client,
        config.node.concurrency_cap,
        config.node.latency_threshold_ms,
    ));

    NodeServices { routing, credit, swarm }
}

/// Binds the swarm coordinator's own `/tasks` surface (§6) when this node's
/// role is `coordinator` and a listen address is configured.
async fn maybe_serve_swarm_coordinator(
    config: &Config,
    services: &NodeServices,
) -> anyhow::Result<()> {
    if config.node.role != "coordinator" {
        return Ok(());
    }
    let Some(listen_addr) = config.swarm.listen_addr.clone() else {
        return Ok(());
    };

    let worker = Arc::new(worker::LocalInferenceWorker::new(
        Arc::new(ec_routing::StubModelProvider),
        services.credit.clone(),
        "local-worker",
    ));
    let state = Arc::new(ec_swarm::SwarmServerState::new(
        services.swarm.clone(),
        worker,
        config.swarm.mesh_auth_token.clone(),
    ));
    let router = ec_swarm::build_router(state);
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding swarm coordinator listener on {listen_addr}"))?;
    info!(addr = %listen_addr, "swarm coordinator HTTP server listening");
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            warn!(error = %err, "swarm coordinator server exited");
        }
    });
    Ok(())
}

async fn run_start(config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let config = ec_config::load(config_path).context("loading configuration")?;
    let identity = load_or_create_identity(&config)?;
    let peer_id = short_fingerprint(&identity.public_key_pem());

    info!(peer_id = %peer_id, listen_addr = %config.gossip.listen_addr, "starting edgecoder node");

    let services = build_node_services(&config);
    maybe_serve_swarm_coordinator(&config, &services).await?;

    let state = Arc::new(AppState {
        identity,
        peers: ec_gossip::state::PeerTable::new(),
        mesh_token: config.gossip.mesh_token.clone(),
        self_peer_id: peer_id.clone(),
        network_mode: NetworkMode::PublicMesh,
    });

    if config.gossip.enabled {
        let listen_addr = config.gossip.listen_addr.clone();
        let router = build_router(state.clone());
        let listener = tokio::net::TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("binding gossip listener on {listen_addr}"))?;
        info!(addr = %listen_addr, "gossip HTTP server listening");
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                warn!(error = %err, "gossip server exited");
            }
        });
    }

    for seed in &config.gossip.seeds {
        let record = self_peer_record(&config, &state.identity, &peer_id);
        let client = ec_gossip::client::GossipClient::new();
        match client
            .bootstrap(seed, record, &state, config.gossip.mesh_token.as_deref())
            .await
        {
            Ok(count) => info!(seed = %seed, peers = count, "bootstrapped from seed"),
            Err(err) => warn!(seed = %seed, error = %err, "seed bootstrap failed, continuing"),
        }
    }

    gossip_loop(state, config).await;
    Ok(())
}

/// Periodic peer exchange + stale eviction (§4.8), until interrupted.
async fn gossip_loop(state: Arc<AppState>, config: Config) {
    let mut gossip_tick = tokio::time::interval(ec_gossip::client::GOSSIP_INTERVAL);
    let mut eviction_tick = tokio::time::interval(ec_gossip::client::EVICTION_INTERVAL);
    let client = ec_gossip::client::GossipClient::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                return;
            }
            _ = gossip_tick.tick() => {
                let recent = state.peers.most_recent(ec_gossip::state::PEER_EXCHANGE_BATCH);
                for peer in state.peers.all() {
                    if let Err(err) = client
                        .broadcast_to(&peer.address, recent.clone(), &state, config.gossip.mesh_token.as_deref())
                        .await
                    {
                        warn!(peer = %peer.peer_id, error = %err, "gossip broadcast failed");
                    }
                }
            }
            _ = eviction_tick.tick() => {
                let before = state.peers.len();
                state.peers.evict_stale(now_ms());
                let evicted = before.saturating_sub(state.peers.len());
                if evicted > 0 {
                    info!(evicted, "evicted stale gossip peers");
                }
            }
        }
    }
}

async fn run_bootstrap(config_path: Option<&std::path::Path>, seeds: Vec<String>) -> anyhow::Result<()> {
    let config = ec_config::load(config_path).context("loading configuration")?;
    let identity = load_or_create_identity(&config)?;
    let peer_id = short_fingerprint(&identity.public_key_pem());

    let state = Arc::new(AppState {
        identity,
        peers: ec_gossip::state::PeerTable::new(),
        mesh_token: config.gossip.mesh_token.clone(),
        self_peer_id: peer_id.clone(),
        network_mode: NetworkMode::PublicMesh,
    });

    let client = ec_gossip::client::GossipClient::new();
    let mut total = 0usize;
    for seed in &seeds {
        let record = self_peer_record(&config, &state.identity, &peer_id);
        let count = client
            .bootstrap(seed, record, &state, config.gossip.mesh_token.as_deref())
            .await
            .map_err(|e| BootstrapFailure(format!("{seed}: {e}")))?;
        info!(seed = %seed, peers = count, "bootstrapped from seed");
        total += count;
    }
    println!("bootstrapped with {total} known peers across {} seed(s)", seeds.len());
    Ok(())
}

async fn run_status(config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let config = ec_config::load(config_path).context("loading configuration")?;
    let identity = load_or_create_identity(&config)?;
    let peer_id = short_fingerprint(&identity.public_key_pem());

    println!("peer_id:       {peer_id}");
    println!("role:          {}", config.node.role);
    println!("gossip:        {} (enabled={})", config.gossip.listen_addr, config.gossip.enabled);
    println!("swarm:         {}", config.swarm.coordinator_url.as_deref().unwrap_or("(not configured)"));
    println!("anchor:        enabled={}", config.anchor.enabled);
    Ok(())
}

/// A short hex fingerprint derived from the public key, used as `peer_id`.
fn short_fingerprint(public_key_pem: &str) -> String {
    let digest = ec_proto::canonical::sha256(public_key_pem.as_bytes());
    hex::encode(&digest[..8])
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}
