//! Boundary between the bridge and the hosting simulation.
//!
//! Request handlers, exporters and the tracking refresh only ever talk to the
//! simulation through [`World`]. The hosting process supplies the real
//! implementation; [`MemoryWorld`] is a self-contained one used by tests and
//! by the standalone binary.

use crate::persistent_id::PersistentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod memory;

pub use memory::{
    ItemFixture, ItemSpec, MemoryWorld, PlayerFixture, SpecKind, VehicleFixture, WorldFixture,
};

#[cfg(test)]
mod tests;

/// World-space position, serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// Handle of an inventory item inside the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Handle of a world entity (vehicles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Quantity capability of an item, resolved once when the item is observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Item with a fractional or counted quantity (food, liquids, rags)
    Stackable { quantity: f32, max: f32 },
    /// Magazine or ammo box; quantity is the round count
    AmmoContainer { ammo: u32, max: u32 },
    Plain,
}

impl ItemKind {
    pub fn quantity(&self) -> f32 {
        match self {
            ItemKind::Stackable { quantity, .. } => *quantity,
            ItemKind::AmmoContainer { ammo, .. } => *ammo as f32,
            ItemKind::Plain => 0.0,
        }
    }

    pub fn quantity_max(&self) -> f32 {
        match self {
            ItemKind::Stackable { max, .. } => *max,
            ItemKind::AmmoContainer { max, .. } => *max as f32,
            ItemKind::Plain => 0.0,
        }
    }

    pub fn is_stackable(&self) -> bool {
        matches!(self, ItemKind::Stackable { .. })
    }
}

/// Attachment slot an item currently occupies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: i32,
    pub name: String,
}

impl Slot {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One item as seen at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemNode {
    pub id: ItemId,
    pub class_name: String,
    pub display_name: String,
    pub health: f32,
    pub kind: ItemKind,
    /// Set when the item sits in an attachment slot
    pub slot: Option<Slot>,
    /// Attached items, in attachment index order
    pub attachments: Vec<ItemId>,
    /// Container contents, in cargo index order
    pub cargo: Vec<ItemId>,
}

/// Everything a player owns, captured in one call.
///
/// `order` is a pre-order enumeration of every reachable item (the player
/// entity itself is never included).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySnapshot {
    pub order: Vec<ItemId>,
    pub nodes: HashMap<ItemId, ItemNode>,
}

impl InventorySnapshot {
    pub fn node(&self, id: ItemId) -> Option<&ItemNode> {
        self.nodes.get(&id)
    }

    /// Items in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = &ItemNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Online player state
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    /// Plain (Steam64) id
    pub id: String,
    pub name: String,
    pub bi_id: String,
    pub position: Vec3,
    pub health: f32,
    pub blood: f32,
    pub water: f32,
    pub energy: f32,
    pub alive: bool,
    pub unconscious: bool,
}

/// Vehicle state
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub entity: EntityId,
    pub class_name: String,
    pub display_name: String,
    /// Master key pairing id; `None` for vehicles without a key
    pub persistent_id: Option<PersistentId>,
    pub position: Vec3,
    pub ruined: bool,
}

/// In-simulation popup shown to a player
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub text: String,
    pub icon: String,
    pub seconds: f32,
}

impl Notification {
    pub fn new(title: &str, text: impl Into<String>, icon: &str, seconds: f32) -> Self {
        Self {
            title: title.to_string(),
            text: text.into(),
            icon: icon.to_string(),
            seconds,
        }
    }
}

/// Operations the bridge needs from the simulation.
///
/// Every method is synchronous and bounded; implementations use interior
/// mutability so one instance can be shared by every service.
pub trait World: Send + Sync {
    fn players(&self) -> Vec<PlayerSnapshot>;

    fn find_player(&self, player_id: &str) -> Option<PlayerSnapshot> {
        self.players().into_iter().find(|p| p.id == player_id)
    }

    /// Full inventory of an online player
    fn inventory(&self, player_id: &str) -> Option<InventorySnapshot>;

    /// True when the class can be instantiated
    fn is_known_class(&self, class_name: &str) -> bool;

    fn create_in_inventory(&self, player_id: &str, class_name: &str) -> Option<ItemId>;

    fn create_on_ground(&self, class_name: &str, position: Vec3) -> Option<ItemId>;

    fn item(&self, item: ItemId) -> Option<ItemNode>;

    /// Set health to `fraction` of the item's maximum
    fn set_item_health(&self, item: ItemId, fraction: f32) -> bool;

    /// Set quantity (or round count for ammo containers)
    fn set_item_quantity(&self, item: ItemId, quantity: f32) -> bool;

    fn delete_item(&self, item: ItemId) -> bool;

    fn is_vehicle_key(&self, item: ItemId) -> bool;

    /// Restore health, blood, water and energy to `fraction` of their maximum.
    /// At `fraction >= 1.0` bleeding and diseases are cured as well.
    fn heal_player(&self, player_id: &str, fraction: f32) -> bool;

    fn set_player_position(&self, player_id: &str, position: Vec3) -> bool;

    /// Terrain height at `(x, z)`
    fn surface_y(&self, x: f32, z: f32) -> f32;

    fn notify(&self, player_id: &str, notification: &Notification);

    fn send_chat(&self, player_id: &str, message: &str);

    fn vehicles(&self) -> Vec<VehicleSnapshot>;

    fn find_vehicle(&self, id: PersistentId) -> Option<VehicleSnapshot> {
        self.vehicles()
            .into_iter()
            .find(|v| v.persistent_id == Some(id))
    }

    fn delete_vehicle(&self, entity: EntityId) -> bool;

    /// Pair a key item with a vehicle, returning the key's persistent id.
    fn pair_key(&self, vehicle: EntityId, key: ItemId, master: bool) -> Option<PersistentId>;
}
