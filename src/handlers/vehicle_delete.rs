use crate::persistent_id::PersistentId;
use crate::queue::{null_as_default, Failure, RequestHandler};
use crate::tracking::VehicleTracker;
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Destroy a vehicle and stop tracking it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDeleteRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicle_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicle_class_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vehicle_display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requested_at: String,
}

impl VehicleDeleteRequest {
    pub fn new(vehicle_id: &str) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            ..Default::default()
        }
    }
}

pub struct VehicleDeleteHandler {
    world: Arc<dyn World>,
    tracker: Arc<VehicleTracker>,
}

impl VehicleDeleteHandler {
    pub fn new(world: Arc<dyn World>, tracker: Arc<VehicleTracker>) -> Self {
        Self { world, tracker }
    }

    /// Delete the world vehicle; true when one was destroyed
    fn destroy(&self, id: PersistentId, vehicle_id: &str) -> bool {
        match self.world.find_vehicle(id) {
            Some(vehicle) if self.world.delete_vehicle(vehicle.entity) => {
                info!(
                    vehicle_id = %vehicle_id,
                    name = %vehicle.display_name,
                    position = ?vehicle.position,
                    "Vehicle destroyed in world"
                );
                true
            }
            _ => false,
        }
    }
}

impl RequestHandler for VehicleDeleteHandler {
    type Payload = VehicleDeleteRequest;

    fn name(&self) -> &str {
        "vehicle_delete"
    }

    fn handle(&self, request: &mut VehicleDeleteRequest) -> Result<String, Failure> {
        let vehicle_id = request.vehicle_id.trim().to_string();
        if vehicle_id.is_empty() {
            return Err(Failure::missing("MISSING_VEHICLE_ID", "vehicleId is required"));
        }

        // Tracking is keyed by the canonical encoding
        let decoded = PersistentId::decode(&vehicle_id).ok();
        let vehicle_id = decoded.map(|id| id.encode()).unwrap_or(vehicle_id);

        let destroyed = decoded.is_some_and(|id| self.destroy(id, &vehicle_id));
        let was_tracked = match self.tracker.remove(&vehicle_id) {
            Ok(removed) => removed.is_some(),
            Err(e) => {
                // Record is already gone from memory; only the snapshot write failed
                error!(error = %e, vehicle_id = %vehicle_id, "Failed to persist tracking removal");
                true
            }
        };

        match (destroyed, was_tracked) {
            (true, true) => Ok("Vehicle destroyed and removed from tracking".to_string()),
            (true, false) => Ok("Vehicle destroyed (was not tracked)".to_string()),
            (false, true) => Ok(
                "Vehicle not found in world (already despawned) - removed from tracking"
                    .to_string(),
            ),
            (false, false) => Err(Failure::not_found(
                "VEHICLE_NOT_FOUND",
                format!("vehicle {} not found in world or tracking", vehicle_id),
            )),
        }
    }
}
