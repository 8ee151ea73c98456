use crate::inventory::{export_tree, ExportedItem};
use crate::persistence::save_json;
use crate::scheduler::PollJob;
use crate::world::{PlayerSnapshot, World};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

/// `inventories/<playerId>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDocument {
    pub generated_at: DateTime<Utc>,
    pub player_count: usize,
    pub players: Vec<PlayerInventory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInventory {
    pub player_name: String,
    pub player_id: String,
    pub bi_id: String,
    /// Root items with their paths
    pub inventory: Vec<ExportedItem>,
}

/// Writes one inventory file per online player.
pub struct InventoryExporter {
    world: Arc<dyn World>,
    dir: PathBuf,
}

impl InventoryExporter {
    pub fn new(world: Arc<dyn World>, dir: impl Into<PathBuf>) -> Self {
        Self {
            world,
            dir: dir.into(),
        }
    }

    pub fn path_for(&self, player_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", player_id))
    }

    pub fn document(&self, player: &PlayerSnapshot) -> InventoryDocument {
        let snapshot = self.world.inventory(&player.id).unwrap_or_default();
        InventoryDocument {
            generated_at: Utc::now(),
            player_count: 1,
            players: vec![PlayerInventory {
                player_name: player.name.clone(),
                player_id: player.id.clone(),
                bi_id: player.bi_id.clone(),
                inventory: export_tree(&snapshot),
            }],
        }
    }

    fn write(&self, player: &PlayerSnapshot) -> Result<()> {
        let path = self.path_for(&player.id);
        save_json(&path, &self.document(player))?;
        debug!(player_id = %player.id, path = %path.display(), "Inventory exported");
        Ok(())
    }

    /// Export a single player now. `Ok(false)` when the player is offline.
    pub fn export_player(&self, player_id: &str) -> Result<bool> {
        match self.world.find_player(player_id) {
            Some(player) => self.write(&player).map(|_| true),
            None => Ok(false),
        }
    }

    /// Export every online player; one failed write does not stop the rest.
    pub fn export_all(&self) -> usize {
        let mut written = 0;
        for player in self.world.players() {
            match self.write(&player) {
                Ok(()) => written += 1,
                Err(e) => {
                    error!(error = %e, player_id = %player.id, "Failed to export inventory")
                }
            }
        }
        written
    }
}

impl PollJob for InventoryExporter {
    fn name(&self) -> &str {
        "inventory_export"
    }

    fn poll(&self) -> Result<()> {
        let written = self.export_all();
        debug!(players = written, "Inventory export pass complete");
        Ok(())
    }
}
