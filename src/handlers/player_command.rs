use super::{online_player, ADMIN_MESSAGE};
use crate::queue::{null_as_default, Failure, RequestHandler};
use crate::world::{Notification, PlayerSnapshot, Vec3, World};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const ICON_INFO: &str = "set:dayz_gui image:icon_info";

/// Heal, teleport, message or broadcast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCommandRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub command_type: String,
    /// Heal percentage
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pos_x: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pos_y: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pos_z: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// `notification`, `chat` or `both`; empty means notification
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_type: String,
}

impl PlayerCommandRequest {
    pub fn heal(player_id: &str, value: f32) -> Self {
        Self {
            player_id: player_id.to_string(),
            command_type: "heal".to_string(),
            value,
            ..Default::default()
        }
    }

    pub fn teleport(player_id: &str, x: f32, y: f32, z: f32) -> Self {
        Self {
            player_id: player_id.to_string(),
            command_type: "teleport".to_string(),
            pos_x: x,
            pos_y: y,
            pos_z: z,
            ..Default::default()
        }
    }

    pub fn message(player_id: &str, message: &str, message_type: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            command_type: "message".to_string(),
            message: message.to_string(),
            message_type: message_type.to_string(),
            ..Default::default()
        }
    }

    pub fn broadcast(message: &str, message_type: &str) -> Self {
        Self {
            command_type: "broadcast".to_string(),
            message: message.to_string(),
            message_type: message_type.to_string(),
            ..Default::default()
        }
    }
}

/// Delivery channels selected by `messageType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Channels {
    notification: bool,
    chat: bool,
}

impl Channels {
    fn parse(message_type: &str) -> Self {
        match message_type.trim().to_ascii_lowercase().as_str() {
            "" | "notification" => Self {
                notification: true,
                chat: false,
            },
            "chat" => Self {
                notification: false,
                chat: true,
            },
            "both" => Self {
                notification: true,
                chat: true,
            },
            _ => Self {
                notification: false,
                chat: false,
            },
        }
    }
}

pub struct PlayerCommandHandler {
    world: Arc<dyn World>,
    world_extent: f32,
}

impl PlayerCommandHandler {
    pub fn new(world: Arc<dyn World>, world_extent: f32) -> Self {
        Self {
            world,
            world_extent,
        }
    }

    fn require_alive(player: &PlayerSnapshot) -> Result<(), Failure> {
        if player.alive {
            Ok(())
        } else {
            Err(Failure::operation(
                "PLAYER_DEAD",
                format!("player {} is dead", player.name),
            ))
        }
    }

    fn heal(&self, request: &PlayerCommandRequest, player: &PlayerSnapshot) -> Result<String, Failure> {
        Self::require_alive(player)?;
        let percent = if request.value <= 0.0 || request.value > 100.0 {
            100.0
        } else {
            request.value
        };
        if !self.world.heal_player(&player.id, percent / 100.0) {
            return Err(Failure::operation("HEAL_FAILED", "heal was rejected"));
        }
        self.world.notify(
            &player.id,
            &Notification::new(
                ADMIN_MESSAGE,
                format!("You have been healed to {}%", percent),
                "set:dayz_gui image:icon_health",
                5.0,
            ),
        );
        info!(player = %player.name, percent, "Player healed");
        Ok("SUCCESS".to_string())
    }

    fn teleport(
        &self,
        request: &mut PlayerCommandRequest,
        player: &PlayerSnapshot,
    ) -> Result<String, Failure> {
        Self::require_alive(player)?;
        let bounds = 0.0..=self.world_extent;
        if !bounds.contains(&request.pos_x) || !bounds.contains(&request.pos_z) {
            return Err(Failure::invalid(
                "INVALID_COORDINATES",
                format!("({}, {}) is outside the map", request.pos_x, request.pos_z),
            ));
        }
        if request.pos_y <= 0.0 {
            request.pos_y = self.world.surface_y(request.pos_x, request.pos_z);
        }

        let destination = Vec3::new(request.pos_x, request.pos_y, request.pos_z);
        if !self.world.set_player_position(&player.id, destination) {
            return Err(Failure::operation("TELEPORT_FAILED", "position was rejected"));
        }
        self.world.notify(
            &player.id,
            &Notification::new(
                ADMIN_MESSAGE,
                "You have been teleported",
                "set:dayz_gui image:icon_arrow_right",
                5.0,
            ),
        );
        info!(
            player = %player.name,
            from = ?player.position,
            to = ?destination,
            "Player teleported"
        );
        Ok("SUCCESS".to_string())
    }

    fn message(&self, request: &PlayerCommandRequest, player: &PlayerSnapshot) -> Result<String, Failure> {
        require_message(request)?;
        let channels = Channels::parse(&request.message_type);
        if channels.notification {
            self.world.notify(
                &player.id,
                &Notification::new(ADMIN_MESSAGE, request.message.clone(), ICON_INFO, 8.0),
            );
        }
        if channels.chat {
            self.world
                .send_chat(&player.id, &format!("[ADMIN] {}", request.message));
        }
        info!(player = %player.name, message = %request.message, "Message sent");
        Ok("SUCCESS".to_string())
    }

    fn broadcast(&self, request: &PlayerCommandRequest) -> Result<String, Failure> {
        require_message(request)?;
        let channels = Channels::parse(&request.message_type);
        let players = self.world.players();
        for player in &players {
            if channels.notification {
                self.world.notify(
                    &player.id,
                    &Notification::new("SERVER BROADCAST", request.message.clone(), ICON_INFO, 10.0),
                );
            }
            if channels.chat {
                self.world
                    .send_chat(&player.id, &format!("[SERVER] {}", request.message));
            }
        }
        info!(recipients = players.len(), message = %request.message, "Broadcast sent");
        Ok("SUCCESS".to_string())
    }
}

fn require_message(request: &PlayerCommandRequest) -> Result<(), Failure> {
    if request.message.is_empty() {
        Err(Failure::missing("EMPTY_MESSAGE", "message is required"))
    } else {
        Ok(())
    }
}

impl RequestHandler for PlayerCommandHandler {
    type Payload = PlayerCommandRequest;

    fn name(&self) -> &str {
        "player_commands"
    }

    fn handle(&self, request: &mut PlayerCommandRequest) -> Result<String, Failure> {
        let command = request.command_type.trim().to_ascii_lowercase();
        if command == "broadcast" {
            return self.broadcast(request);
        }

        let player = online_player(self.world.as_ref(), &request.player_id)?;
        match command.as_str() {
            "heal" => self.heal(request, &player),
            "teleport" => self.teleport(request, &player),
            "message" => self.message(request, &player),
            other => Err(Failure::invalid(
                "INVALID_COMMAND",
                format!("unknown command type '{}'", other),
            )),
        }
    }
}
