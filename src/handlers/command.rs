//! Generic command queue with pluggable actions.

use super::ADMIN_MESSAGE;
use crate::exporters::InventoryExporter;
use crate::queue::{null_as_default, Failure, RequestHandler};
use crate::world::{Notification, PlayerSnapshot, Vec3, World};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload_value: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pos_x: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pos_y: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pos_z: f32,
}

impl CommandRequest {
    pub fn new(action: &str, player_id: &str) -> Self {
        Self {
            action: action.to_string(),
            player_id: player_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.payload_text = text.to_string();
        self
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.pos_x, self.pos_y, self.pos_z)
    }
}

/// What an action sees besides its own request
pub struct ActionContext<'a> {
    pub world: &'a dyn World,
    /// Resolved when the request names a player
    pub player: Option<PlayerSnapshot>,
}

impl ActionContext<'_> {
    pub fn require_player(&self) -> Result<&PlayerSnapshot, Failure> {
        self.player
            .as_ref()
            .ok_or_else(|| Failure::missing("MISSING_PLAYER_ID", "playerId is required"))
    }
}

type Action =
    Box<dyn Fn(&ActionContext<'_>, &mut CommandRequest) -> Result<String, Failure> + Send + Sync>;

/// Named actions dispatched by [`CommandHandler`]
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in actions: `notify` and `export_inventory`
    pub fn with_defaults(exporter: Arc<InventoryExporter>) -> Self {
        let mut registry = Self::new();

        registry.register("notify", |ctx, request| {
            let player = ctx.require_player()?;
            if request.payload_text.is_empty() {
                return Err(Failure::missing("EMPTY_MESSAGE", "payloadText is required"));
            }
            ctx.world.notify(
                &player.id,
                &Notification::new(
                    ADMIN_MESSAGE,
                    request.payload_text.clone(),
                    "set:dayz_gui image:icon_info",
                    8.0,
                ),
            );
            Ok("SUCCESS".to_string())
        });

        registry.register("export_inventory", move |ctx, _request| {
            let player = ctx.require_player()?;
            match exporter.export_player(&player.id) {
                Ok(true) => Ok("SUCCESS".to_string()),
                Ok(false) => Err(Failure::not_found(
                    "PLAYER_NOT_FOUND",
                    format!("player {} went offline", player.id),
                )),
                Err(e) => Err(Failure::persistence("EXPORT_FAILED", format!("{:#}", e))),
            }
        });

        registry
    }

    /// Add or replace an action.
    pub fn register<F>(&mut self, name: &str, action: F)
    where
        F: Fn(&ActionContext<'_>, &mut CommandRequest) -> Result<String, Failure>
            + Send
            + Sync
            + 'static,
    {
        self.actions.insert(name.to_string(), Box::new(action));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }
}

pub struct CommandHandler {
    name: String,
    world: Arc<dyn World>,
    registry: ActionRegistry,
}

impl CommandHandler {
    pub fn new(name: &str, world: Arc<dyn World>, registry: ActionRegistry) -> Self {
        Self {
            name: name.to_string(),
            world,
            registry,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }
}

impl RequestHandler for CommandHandler {
    type Payload = CommandRequest;

    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, request: &mut CommandRequest) -> Result<String, Failure> {
        let action_name = request.action.trim().to_string();
        if action_name.is_empty() {
            return Err(Failure::missing("MISSING_ACTION", "action is required"));
        }

        let player = if request.player_id.trim().is_empty() {
            None
        } else {
            Some(self.world.find_player(&request.player_id).ok_or_else(|| {
                Failure::not_found(
                    "PLAYER_NOT_FOUND",
                    format!("player {} is not online", request.player_id),
                )
            })?)
        };

        let action = self.registry.actions.get(&action_name).ok_or_else(|| {
            Failure::invalid("UNKNOWN_ACTION", format!("no action named '{}'", action_name))
        })?;

        let ctx = ActionContext {
            world: self.world.as_ref(),
            player,
        };
        let result = action(&ctx, request)?;
        info!(queue = %self.name, action = %action_name, "Command executed");
        Ok(result)
    }
}
