use super::{BoundedLog, SubjectLog};
use crate::world::{PlayerSnapshot, Vec3};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifeEventType {
    /// Fresh character
    Spawned,
    Respawned,
    Died,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: LifeEventType,
    pub player_name: String,
    pub player_id: String,
    pub position: Vec3,
    /// Killer description, empty unless `DIED`
    #[serde(default)]
    pub cause_of_death: String,
    /// -1 unless `DIED`
    #[serde(default = "no_health")]
    pub health_at_death: f32,
}

fn no_health() -> f32 {
    -1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeEventsLog {
    pub player_name: String,
    pub player_id: String,
    #[serde(default)]
    pub events: Vec<LifeEvent>,
}

impl SubjectLog for LifeEventsLog {
    type Entry = LifeEvent;

    fn create(subject_id: &str, subject_name: &str) -> Self {
        Self {
            player_name: subject_name.to_string(),
            player_id: subject_id.to_string(),
            events: Vec::new(),
        }
    }

    fn entries(&self) -> &[LifeEvent] {
        &self.events
    }

    fn entries_mut(&mut self) -> &mut Vec<LifeEvent> {
        &mut self.events
    }
}

/// What killed a player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Killer {
    Player { name: String, id: String },
    /// Class name of a zombie, animal, vehicle or other object
    Object(String),
}

impl Killer {
    fn describe(&self) -> String {
        match self {
            Killer::Player { name, id } => format!("Player: {} ({})", name, id),
            Killer::Object(class_name) => class_name.clone(),
        }
    }
}

/// Per-player life event log (`life_events/<id>_life.json`)
pub struct LifeEventLogger {
    log: BoundedLog<LifeEventsLog>,
}

impl LifeEventLogger {
    pub fn new(dir: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            log: BoundedLog::per_subject(dir, "_life.json", cap),
        }
    }

    fn log_event(
        &self,
        event_type: LifeEventType,
        player: &PlayerSnapshot,
        cause_of_death: String,
        health_at_death: f32,
    ) {
        let event = LifeEvent {
            timestamp: Utc::now(),
            event_type,
            player_name: player.name.clone(),
            player_id: player.id.clone(),
            position: player.position,
            cause_of_death,
            health_at_death,
        };
        self.log.append(&player.id, &player.name, event);

        info!(
            event = ?event_type,
            player_id = %player.id,
            position = ?player.position,
            "Life event"
        );
    }

    pub fn log_spawn(&self, player: &PlayerSnapshot) {
        self.log_event(LifeEventType::Spawned, player, String::new(), no_health());
    }

    pub fn log_respawn(&self, player: &PlayerSnapshot) {
        self.log_event(LifeEventType::Respawned, player, String::new(), no_health());
    }

    pub fn log_death(&self, player: &PlayerSnapshot, killer: Option<&Killer>) {
        let cause = killer.map(Killer::describe).unwrap_or_default();
        self.log_event(LifeEventType::Died, player, cause, player.health);
    }

    pub fn log_connect(&self, player: &PlayerSnapshot) {
        self.log_event(LifeEventType::Connected, player, String::new(), no_health());
    }

    pub fn log_disconnect(&self, player: &PlayerSnapshot) {
        self.log_event(LifeEventType::Disconnected, player, String::new(), no_health());
    }

    pub fn events(&self, player_id: &str) -> Vec<LifeEvent> {
        self.log
            .get(player_id)
            .map(|doc| doc.events)
            .unwrap_or_default()
    }
}
