use super::{count_suffix, online_player, ADMIN_MESSAGE};
use crate::queue::{null_as_default, Failure, RequestHandler};
use crate::world::{ItemKind, Notification, World};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

fn default_quantity() -> i64 {
    1
}

fn default_health() -> f32 {
    -1.0
}

/// Spawn an item for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemGrantRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_class_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Health percentage 0..=100, anything else keeps the spawn default
    #[serde(default = "default_health")]
    pub health: f32,
}

impl ItemGrantRequest {
    pub fn new(player_id: &str, item_class_name: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            item_class_name: item_class_name.to_string(),
            quantity: default_quantity(),
            health: default_health(),
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = health;
        self
    }
}

pub struct ItemGrantHandler {
    world: Arc<dyn World>,
}

impl ItemGrantHandler {
    pub fn new(world: Arc<dyn World>) -> Self {
        Self { world }
    }
}

impl RequestHandler for ItemGrantHandler {
    type Payload = ItemGrantRequest;

    fn name(&self) -> &str {
        "item_grants"
    }

    fn handle(&self, request: &mut ItemGrantRequest) -> Result<String, Failure> {
        if request.item_class_name.trim().is_empty() {
            return Err(Failure::missing(
                "MISSING_ITEM_CLASS",
                "itemClassName is required",
            ));
        }
        let player = online_player(self.world.as_ref(), &request.player_id)?;

        if !self.world.is_known_class(&request.item_class_name) {
            return Err(Failure::invalid(
                "INVALID_ITEM_CLASS",
                format!("unknown item class {}", request.item_class_name),
            ));
        }

        let item = match self
            .world
            .create_in_inventory(&player.id, &request.item_class_name)
        {
            Some(item) => item,
            None => {
                warn!(
                    player_id = %player.id,
                    class = %request.item_class_name,
                    "Inventory full, spawning on ground"
                );
                self.world
                    .create_on_ground(&request.item_class_name, player.position)
                    .ok_or_else(|| {
                        Failure::operation(
                            "SPAWN_FAILED",
                            format!("could not create {}", request.item_class_name),
                        )
                    })?
            }
        };

        if (0.0..=100.0).contains(&request.health) {
            self.world.set_item_health(item, request.health / 100.0);
        }

        let spawned = self.world.item(item);
        if request.quantity > 1 {
            if let Some(node) = &spawned {
                let capped = match node.kind {
                    ItemKind::AmmoContainer { max, .. } => {
                        Some((request.quantity as f32).min(max as f32))
                    }
                    ItemKind::Stackable { max, .. } if max > 0.0 => {
                        Some((request.quantity as f32).min(max))
                    }
                    _ => None,
                };
                if let Some(quantity) = capped {
                    self.world.set_item_quantity(item, quantity);
                }
            }
        }

        let display_name = spawned
            .map(|node| node.display_name)
            .unwrap_or_else(|| request.item_class_name.clone());
        self.world.notify(
            &player.id,
            &Notification::new(
                ADMIN_MESSAGE,
                format!(
                    "Item {}{} added to inventory",
                    display_name,
                    count_suffix(request.quantity)
                ),
                "set:dayz_gui image:icon_connect",
                5.0,
            ),
        );

        info!(
            player = %player.name,
            class = %request.item_class_name,
            quantity = request.quantity,
            "Item granted"
        );
        Ok("SUCCESS".to_string())
    }
}
