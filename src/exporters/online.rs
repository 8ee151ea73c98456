use crate::persistence::save_json;
use crate::scheduler::PollJob;
use crate::world::{PlayerSnapshot, World};
use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const MAX_WATER: f32 = 5000.0;
const MAX_ENERGY: f32 = 20000.0;

/// One player seen this session, online or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlinePlayer {
    pub player_id: String,
    pub player_name: String,
    pub bi_id: String,
    pub is_online: bool,
    pub connected_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub pos_x: f32,
    pub pos_y: f32,
    pub pos_z: f32,
    pub health: f32,
    pub blood: f32,
    /// Percent of maximum
    pub water: f32,
    /// Percent of maximum
    pub energy: f32,
    pub is_alive: bool,
    pub is_unconscious: bool,
}

impl OnlinePlayer {
    fn new(player: &PlayerSnapshot, now: DateTime<Utc>) -> Self {
        let mut entry = Self {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            bi_id: player.bi_id.clone(),
            is_online: true,
            connected_at: now,
            last_update: now,
            pos_x: 0.0,
            pos_y: 0.0,
            pos_z: 0.0,
            health: 0.0,
            blood: 0.0,
            water: 0.0,
            energy: 0.0,
            is_alive: false,
            is_unconscious: false,
        };
        entry.update(player, now);
        entry
    }

    fn update(&mut self, player: &PlayerSnapshot, now: DateTime<Utc>) {
        self.pos_x = player.position.x;
        self.pos_y = player.position.y;
        self.pos_z = player.position.z;
        self.health = player.health;
        self.blood = player.blood;
        self.water = player.water / MAX_WATER * 100.0;
        self.energy = player.energy / MAX_ENERGY * 100.0;
        self.is_alive = player.alive;
        self.is_unconscious = player.unconscious;
        self.last_update = now;
    }
}

/// `api/online_players.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlinePlayersDocument {
    pub generated_at: DateTime<Utc>,
    pub online_count: usize,
    pub players: Vec<OnlinePlayer>,
}

/// Session roster of connected and disconnected players.
///
/// Disconnected players stay in the export with `isOnline: false`.
pub struct OnlinePlayerTracker {
    world: Arc<dyn World>,
    path: PathBuf,
    players: DashMap<String, OnlinePlayer>,
}

impl OnlinePlayerTracker {
    pub fn new(world: Arc<dyn World>, path: impl Into<PathBuf>) -> Self {
        Self {
            world,
            path: path.into(),
            players: DashMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn player_connected(&self, player: &PlayerSnapshot) {
        let now = Utc::now();
        self.players
            .entry(player.id.clone())
            .and_modify(|entry| {
                entry.player_name = player.name.clone();
                entry.bi_id = player.bi_id.clone();
                entry.is_online = true;
                entry.connected_at = now;
                entry.update(player, now);
            })
            .or_insert_with(|| OnlinePlayer::new(player, now));
        info!(player = %player.name, player_id = %player.id, "Player connected");
    }

    pub fn player_disconnected(&self, player_id: &str) {
        if let Some(mut entry) = self.players.get_mut(player_id) {
            entry.is_online = false;
            entry.last_update = Utc::now();
            info!(player = %entry.player_name, player_id = %player_id, "Player disconnected");
        }
    }

    pub fn get(&self, player_id: &str) -> Option<OnlinePlayer> {
        self.players.get(player_id).map(|entry| entry.clone())
    }

    /// Copy live state onto online entries and register players that
    /// connected without a hook firing.
    pub fn refresh(&self) {
        let now = Utc::now();
        for player in self.world.players() {
            let known = match self.players.get_mut(&player.id) {
                Some(mut entry) => {
                    if entry.is_online {
                        entry.update(&player, now);
                    }
                    true
                }
                None => false,
            };
            if !known {
                self.player_connected(&player);
            }
        }
    }

    /// Every tracked player, ordered by id
    pub fn document(&self) -> OnlinePlayersDocument {
        let mut players: Vec<OnlinePlayer> =
            self.players.iter().map(|entry| entry.value().clone()).collect();
        players.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        OnlinePlayersDocument {
            generated_at: Utc::now(),
            online_count: players.iter().filter(|p| p.is_online).count(),
            players,
        }
    }

    pub fn export(&self) -> Result<()> {
        let document = self.document();
        save_json(&self.path, &document)?;
        debug!(online = document.online_count, "Online players exported");
        Ok(())
    }
}

impl PollJob for OnlinePlayerTracker {
    fn name(&self) -> &str {
        "online_players"
    }

    fn poll(&self) -> Result<()> {
        self.refresh();
        self.export()
    }
}
