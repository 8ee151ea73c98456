use anyhow::{anyhow, Context, Result};
use sst_bridge::config::{load_config, BridgeConfig, RuntimeOverrides};
use sst_bridge::world::{MemoryWorld, World};
use sst_bridge::Bridge;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sst_bridge=info".into()),
        )
        .init();

    info!("SST bridge starting...");

    let mut config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)
            .map_err(|e| anyhow!("Failed to load config {}: {}", path, e))?,
        None => {
            warn!("No config file given, using defaults");
            BridgeConfig::default()
        }
    };
    let overrides = RuntimeOverrides::from_env();
    overrides.apply(&mut config);

    let world: Arc<dyn World> = match &overrides.world_fixture {
        Some(path) => {
            let world = MemoryWorld::load_fixture(path)
                .with_context(|| format!("Failed to build world from {}", path.display()))?;
            info!(fixture = %path.display(), "World loaded from fixture");
            Arc::new(world)
        }
        None => Arc::new(MemoryWorld::new()),
    };
    let bridge = Bridge::new(config, Arc::clone(&world));
    for player in world.players() {
        bridge.player_connected(&player);
    }
    let scheduler = bridge.start()?;
    info!(root = %bridge.paths().root().display(), "Bridge running");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    scheduler.shutdown().await;
    info!("SST bridge stopped");

    Ok(())
}
