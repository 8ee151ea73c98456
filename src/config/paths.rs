use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File layout under the profile root shared with the management process.
#[derive(Debug, Clone)]
pub struct BridgePaths {
    root: PathBuf,
}

impl BridgePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn api_dir(&self) -> PathBuf {
        self.root.join("api")
    }

    pub fn inventories_dir(&self) -> PathBuf {
        self.root.join("inventories")
    }

    pub fn events_dir(&self) -> PathBuf {
        self.root.join("events")
    }

    pub fn life_events_dir(&self) -> PathBuf {
        self.root.join("life_events")
    }

    pub fn trades_dir(&self) -> PathBuf {
        self.root.join("trades")
    }

    pub fn vehicles_dir(&self) -> PathBuf {
        self.root.join("vehicles")
    }

    /// `api/<name>_queue.json`
    pub fn command_queue(&self, name: &str) -> PathBuf {
        self.api_dir().join(format!("{}_queue.json", name))
    }

    /// `api/<name>_results.json`
    pub fn command_results(&self, name: &str) -> PathBuf {
        self.api_dir().join(format!("{}_results.json", name))
    }

    pub fn item_grants(&self) -> PathBuf {
        self.api_dir().join("item_grants.json")
    }

    pub fn item_grants_results(&self) -> PathBuf {
        self.api_dir().join("item_grants_results.json")
    }

    pub fn item_deletes(&self) -> PathBuf {
        self.api_dir().join("item_deletes.json")
    }

    pub fn item_deletes_results(&self) -> PathBuf {
        self.api_dir().join("item_deletes_results.json")
    }

    pub fn player_commands(&self) -> PathBuf {
        self.api_dir().join("player_commands.json")
    }

    pub fn player_commands_results(&self) -> PathBuf {
        self.api_dir().join("player_commands_results.json")
    }

    pub fn key_grants(&self) -> PathBuf {
        self.api_dir().join("key_grants.json")
    }

    pub fn key_grants_results(&self) -> PathBuf {
        self.api_dir().join("key_grants_results.json")
    }

    pub fn vehicle_delete(&self) -> PathBuf {
        self.api_dir().join("vehicle_delete.json")
    }

    pub fn vehicle_delete_results(&self) -> PathBuf {
        self.api_dir().join("vehicle_delete_results.json")
    }

    pub fn online_players(&self) -> PathBuf {
        self.api_dir().join("online_players.json")
    }

    pub fn purchases(&self) -> PathBuf {
        self.vehicles_dir().join("purchases.json")
    }

    pub fn tracked_vehicles(&self) -> PathBuf {
        self.vehicles_dir().join("tracked.json")
    }

    /// Create every directory the bridge reads from or writes to.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.api_dir(),
            self.inventories_dir(),
            self.events_dir(),
            self.life_events_dir(),
            self.trades_dir(),
            self.vehicles_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}
