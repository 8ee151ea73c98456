use super::online_player;
use crate::inventory::{locate, LocateError, PathError};
use crate::queue::{null_as_default, Failure, RequestHandler};
use crate::world::{Notification, World};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Remove (or reduce) one item addressed by its export path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDeleteRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_id: String,
    /// Expected class; drives the fallback search when the path is stale
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_class_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_path: String,
    /// Units to remove from a stack; 0 removes the whole item
    #[serde(default, deserialize_with = "null_as_default")]
    pub delete_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requested_at: String,
}

impl ItemDeleteRequest {
    pub fn new(player_id: &str, item_class_name: &str, item_path: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            item_class_name: item_class_name.to_string(),
            item_path: item_path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_count(mut self, delete_count: i64) -> Self {
        self.delete_count = delete_count;
        self
    }
}

pub struct ItemDeleteHandler {
    world: Arc<dyn World>,
}

impl ItemDeleteHandler {
    pub fn new(world: Arc<dyn World>) -> Self {
        Self { world }
    }
}

fn locate_failure(err: LocateError) -> Failure {
    match err {
        LocateError::NotFound {
            source: PathError::OutOfRange { .. },
            ..
        } => Failure::not_found("ITEM_NOT_FOUND", err.to_string()),
        LocateError::NotFound { ref source, .. } => {
            Failure::invalid(source.code(), err.to_string())
        }
        LocateError::Mismatch { .. } => Failure::invalid("ITEM_MISMATCH", err.to_string()),
    }
}

impl RequestHandler for ItemDeleteHandler {
    type Payload = ItemDeleteRequest;

    fn name(&self) -> &str {
        "item_deletes"
    }

    fn handle(&self, request: &mut ItemDeleteRequest) -> Result<String, Failure> {
        let player = online_player(self.world.as_ref(), &request.player_id)?;
        if request.item_path.trim().is_empty() {
            return Err(Failure::missing("MISSING_ITEM_PATH", "itemPath is required"));
        }

        let inventory = self.world.inventory(&player.id).unwrap_or_default();
        let item = locate(&inventory, &request.item_path, &request.item_class_name)
            .map_err(locate_failure)?;
        let node = inventory.node(item).cloned().ok_or_else(|| {
            Failure::not_found("ITEM_NOT_FOUND", format!("item {:?} vanished", item))
        })?;

        let quantity = node.kind.quantity();
        let count = request.delete_count as f32;
        let result = if node.kind.is_stackable() && count > 0.0 && count < quantity {
            let remaining = quantity - count;
            if !self.world.set_item_quantity(item, remaining) {
                return Err(Failure::operation(
                    "DELETE_FAILED",
                    format!("could not reduce {}", node.display_name),
                ));
            }
            format!(
                "Reduced {} quantity by {} (now {})",
                node.display_name, request.delete_count, remaining
            )
        } else {
            if !self.world.delete_item(item) {
                return Err(Failure::operation(
                    "DELETE_FAILED",
                    format!("could not delete {}", node.display_name),
                ));
            }
            format!("Deleted {}", node.display_name)
        };

        self.world.notify(
            &player.id,
            &Notification::new(
                "ADMIN ACTION",
                format!("{} was removed from your inventory", node.display_name),
                "set:dayz_gui image:icon_x",
                5.0,
            ),
        );

        info!(
            player = %player.name,
            path = %request.item_path,
            class = %node.class_name,
            "{}", result
        );
        Ok(result)
    }
}
