use super::online_player;
use crate::persistent_id::PersistentId;
use crate::queue::{null_as_default, Failure, RequestHandler};
use crate::tracking::VehicleTracker;
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Issue an extra key for a vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyGrantRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_id: String,
    /// Encoded persistent id of the vehicle
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicle_id: String,
    /// Empty means the configured default key class
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_class_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_master_key: bool,
}

impl KeyGrantRequest {
    pub fn new(player_id: &str, vehicle_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            vehicle_id: vehicle_id.to_string(),
            ..Default::default()
        }
    }
}

pub struct KeyGrantHandler {
    world: Arc<dyn World>,
    tracker: Arc<VehicleTracker>,
    default_key_class: String,
}

impl KeyGrantHandler {
    pub fn new(world: Arc<dyn World>, tracker: Arc<VehicleTracker>, default_key_class: &str) -> Self {
        Self {
            world,
            tracker,
            default_key_class: default_key_class.to_string(),
        }
    }
}

impl RequestHandler for KeyGrantHandler {
    type Payload = KeyGrantRequest;

    fn name(&self) -> &str {
        "key_grants"
    }

    fn handle(&self, request: &mut KeyGrantRequest) -> Result<String, Failure> {
        let player = online_player(self.world.as_ref(), &request.player_id)?;

        let vehicle_id = PersistentId::decode(request.vehicle_id.trim()).map_err(|e| {
            Failure::invalid(
                "INVALID_VEHICLE_ID",
                format!("'{}': {}", request.vehicle_id, e),
            )
        })?;
        let vehicle = self.world.find_vehicle(vehicle_id).ok_or_else(|| {
            Failure::not_found(
                "VEHICLE_NOT_FOUND",
                format!("vehicle {} not found in world", vehicle_id),
            )
        })?;

        let key_class = if request.key_class_name.trim().is_empty() {
            self.default_key_class.clone()
        } else {
            request.key_class_name.clone()
        };

        let key = self
            .world
            .create_in_inventory(&player.id, &key_class)
            .or_else(|| self.world.create_on_ground(&key_class, player.position))
            .ok_or_else(|| {
                Failure::operation("KEY_SPAWN_FAILED", format!("could not create {}", key_class))
            })?;

        if !self.world.is_vehicle_key(key) {
            self.world.delete_item(key);
            return Err(Failure::invalid(
                "NOT_A_KEY",
                format!("{} is not a vehicle key", key_class),
            ));
        }

        let key_id = self
            .world
            .pair_key(vehicle.entity, key, request.is_master_key)
            .ok_or_else(|| {
                Failure::operation("PAIRING_FAILED", format!("could not pair {}", key_class))
            })?;

        let tracked_id = vehicle_id.encode();
        match self.tracker.add_secondary_key(&tracked_id, key_id) {
            Ok(true) => {}
            Ok(false) => warn!(vehicle_id = %tracked_id, "Key issued for untracked vehicle"),
            Err(e) => {
                error!(error = %e, vehicle_id = %tracked_id, "Failed to persist additional key")
            }
        }

        info!(
            player = %player.name,
            vehicle_id = %tracked_id,
            key_class = %key_class,
            master = request.is_master_key,
            "Key created and paired"
        );
        Ok("Key created and paired to vehicle".to_string())
    }
}
