use super::{BoundedLog, SubjectLog};
use crate::world::{ItemNode, PlayerSnapshot, Vec3};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryEventType {
    /// Left the player for the ground
    Dropped,
    /// Left the player for storage, a vehicle or another player
    Removed,
    PickedUp,
    Added,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: InventoryEventType,
    pub player_name: String,
    pub player_id: String,
    pub item_class_name: String,
    pub item_display_name: String,
    pub item_health: f32,
    pub item_quantity: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEventsLog {
    pub player_name: String,
    pub player_id: String,
    #[serde(default)]
    pub events: Vec<InventoryEvent>,
}

impl SubjectLog for InventoryEventsLog {
    type Entry = InventoryEvent;

    fn create(subject_id: &str, subject_name: &str) -> Self {
        Self {
            player_name: subject_name.to_string(),
            player_id: subject_id.to_string(),
            events: Vec::new(),
        }
    }

    fn entries(&self) -> &[InventoryEvent] {
        &self.events
    }

    fn entries_mut(&mut self) -> &mut Vec<InventoryEvent> {
        &mut self.events
    }
}

/// Who holds an item before or after a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// Anywhere in this player's hierarchy
    Player(String),
    Ground,
    /// Storage, vehicles and anything else without a player root
    Elsewhere,
}

/// Events produced by an ownership change, as `(player_id, event)` pairs.
pub fn classify_transfer(from: &Owner, to: &Owner) -> Vec<(String, InventoryEventType)> {
    match (from, to) {
        (Owner::Player(old), Owner::Player(new)) if old == new => Vec::new(),
        (Owner::Player(old), Owner::Player(new)) => vec![
            (old.clone(), InventoryEventType::Removed),
            (new.clone(), InventoryEventType::Added),
        ],
        (Owner::Player(old), Owner::Ground) => vec![(old.clone(), InventoryEventType::Dropped)],
        (Owner::Player(old), Owner::Elsewhere) => vec![(old.clone(), InventoryEventType::Removed)],
        (Owner::Ground, Owner::Player(new)) => vec![(new.clone(), InventoryEventType::PickedUp)],
        (Owner::Elsewhere, Owner::Player(new)) => vec![(new.clone(), InventoryEventType::Added)],
        _ => Vec::new(),
    }
}

/// Per-player inventory event log (`events/<id>_events.json`)
pub struct InventoryEventLogger {
    log: BoundedLog<InventoryEventsLog>,
}

impl InventoryEventLogger {
    pub fn new(dir: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            log: BoundedLog::per_subject(dir, "_events.json", cap),
        }
    }

    pub fn log_event(
        &self,
        event_type: InventoryEventType,
        player: &PlayerSnapshot,
        item: &ItemNode,
        position: Vec3,
    ) {
        let event = InventoryEvent {
            timestamp: Utc::now(),
            event_type,
            player_name: player.name.clone(),
            player_id: player.id.clone(),
            item_class_name: item.class_name.clone(),
            item_display_name: item.display_name.clone(),
            item_health: item.health,
            item_quantity: item.kind.quantity(),
            position,
        };
        self.log.append(&player.id, &player.name, event);

        info!(
            event = ?event_type,
            player_id = %player.id,
            item = %item.class_name,
            "Inventory event"
        );
    }

    /// Log whatever an item move means for the players involved.
    ///
    /// `lookup` resolves a player id to its snapshot; players it cannot
    /// resolve are skipped.
    pub fn record_transfer(
        &self,
        item: &ItemNode,
        from: &Owner,
        to: &Owner,
        position: Vec3,
        lookup: impl Fn(&str) -> Option<PlayerSnapshot>,
    ) -> usize {
        let mut logged = 0;
        for (player_id, event_type) in classify_transfer(from, to) {
            if let Some(player) = lookup(&player_id) {
                self.log_event(event_type, &player, item, position);
                logged += 1;
            }
        }
        logged
    }

    pub fn events(&self, player_id: &str) -> Vec<InventoryEvent> {
        self.log
            .get(player_id)
            .map(|doc| doc.events)
            .unwrap_or_default()
    }

    pub fn path_for(&self, player_id: &str) -> PathBuf {
        self.log.path_for(player_id)
    }
}
