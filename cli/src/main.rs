use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde_json::json;
use std::path::{Path, PathBuf};
use crop_registry_core::{BatchId, Principal, Registry, RegistryConfig, RegistrySnapshot, SnapshotLock};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Crop Registry reference host")]
struct Args {
    /// Config file path
    #[clap(short, long, env = "CROP_REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Snapshot file holding the registry state
    #[clap(short, long, env = "CROP_REGISTRY_STATE")]
    state: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty registry
    Init {
        /// Principal allowed to verify batches
        #[clap(long)]
        admin: String,
    },

    /// Register a crop batch
    Register {
        /// Authenticated caller identity
        #[clap(long)]
        caller: String,

        #[clap(long)]
        crop_type: String,

        #[clap(long)]
        location: String,

        /// Unix epoch seconds
        #[clap(long, allow_hyphen_values = true)]
        harvest_date: i64,

        #[clap(long)]
        cert_hash: String,
    },

    /// Verify a crop batch (admin only)
    Verify {
        /// Authenticated caller identity
        #[clap(long)]
        caller: String,

        #[clap(long)]
        id: u64,
    },

    /// Show a crop batch
    Get {
        #[clap(long)]
        id: u64,
    },

    /// List crop batches in id order
    List {
        /// Only batches registered by this principal
        #[clap(long)]
        farmer: Option<String>,
    },
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Some(
            RegistryConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
        ),
        None => None,
    };

    // Initialize logging
    let default_level = config.as_ref().map(|c| c.effective_log_level()).unwrap_or("info");
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, default_level),
    );

    let state_path = args
        .state
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.snapshot_path.clone()))
        .ok_or_else(|| anyhow!("No state file given; use --state or set snapshot_path in the config"))?;

    let output = run(args.command, &state_path, config.as_ref())?;
    println!("{}", output);

    Ok(())
}

/// Execute one command against the snapshot at `state_path`
///
/// Commands that write hold the exclusive snapshot lock from load through
/// save; reads hold a shared one.
fn run(command: Command, state_path: &Path, config: Option<&RegistryConfig>) -> Result<String> {
    match command {
        Command::Init { admin } => init(state_path, admin, config),

        Command::Register { caller, crop_type, location, harvest_date, cert_hash } => {
            let _lock = lock(state_path, true)?;
            let mut registry = load(state_path, config)?;
            let caller = Principal::new(caller);
            let id = registry.register(&caller, crop_type, location, harvest_date, cert_hash);

            // The counter must be durable before the id is reported
            save(&registry, state_path)?;
            info!("Registered batch {} for {}", id, caller);
            Ok(id.to_string())
        }

        Command::Verify { caller, id } => {
            let _lock = lock(state_path, true)?;
            let mut registry = load(state_path, config)?;
            let id = BatchId::new(id);
            registry
                .verify(&Principal::new(caller), id)
                .map_err(|e| anyhow!("{} ({}): {}", e.kind(), e.code(), e))?;

            save(&registry, state_path)?;
            Ok("verified".to_string())
        }

        Command::Get { id } => {
            let _lock = lock(state_path, false)?;
            let registry = load(state_path, config)?;
            let id = BatchId::new(id);
            let batch = registry
                .get(id)
                .map_err(|e| anyhow!("{} ({}): {}", e.kind(), e.code(), e))?;

            let view = json!({
                "id": id,
                "fingerprint": batch.fingerprint_hex(id),
                "batch": batch,
            });
            Ok(serde_json::to_string_pretty(&view)?)
        }

        Command::List { farmer } => {
            let _lock = lock(state_path, false)?;
            let registry = load(state_path, config)?;
            let batches = match farmer {
                Some(farmer) => registry.batches_by_farmer(&Principal::new(farmer)),
                None => registry.iter().map(|(id, batch)| (id, batch.clone())).collect(),
            };

            let rows: Vec<_> = batches
                .iter()
                .map(|(id, batch)| json!({ "id": id, "batch": batch }))
                .collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
    }
}

fn init(state_path: &Path, admin: String, config: Option<&RegistryConfig>) -> Result<String> {
    let admin = Principal::new(admin);
    if let Some(config) = config {
        if config.admin != admin {
            bail!("Admin {} does not match configured admin {}", admin, config.admin);
        }
    }

    let _lock = lock(state_path, true)?;
    if state_path.exists() {
        bail!("Refusing to overwrite existing state file {}", state_path.display());
    }

    let registry = Registry::from_config(&RegistryConfig::new(admin.clone()))?;
    save(&registry, state_path)?;

    info!("Initialized registry administered by {}", admin);
    Ok(format!("initialized {}", state_path.display()))
}

fn lock(state_path: &Path, exclusive: bool) -> Result<SnapshotLock> {
    let lock = if exclusive {
        SnapshotLock::exclusive(state_path)
    } else {
        SnapshotLock::shared(state_path)
    };
    lock.with_context(|| format!("Failed to lock state file {}", state_path.display()))
}

fn load(state_path: &Path, config: Option<&RegistryConfig>) -> Result<Registry> {
    let snapshot = RegistrySnapshot::from_file(state_path)
        .with_context(|| format!("Failed to read state file {}", state_path.display()))?;
    let registry = Registry::restore(snapshot)?;

    if let Some(config) = config {
        if config.admin != *registry.admin() {
            bail!(
                "State file admin {} does not match configured admin {}",
                registry.admin(),
                config.admin
            );
        }
    }

    debug!("Loaded registry with {} batches", registry.len());
    Ok(registry)
}

fn save(registry: &Registry, state_path: &Path) -> Result<()> {
    registry
        .snapshot()
        .to_file(state_path)
        .with_context(|| format!("Failed to write state file {}", state_path.display()))
}
