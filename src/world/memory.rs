use super::*;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Catalog entry describing an item class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSpec {
    pub display_name: String,
    #[serde(default)]
    pub kind: SpecKind,
    #[serde(default = "default_max_health")]
    pub max_health: f32,
    #[serde(default)]
    pub cargo_capacity: usize,
    #[serde(default)]
    pub vehicle_key: bool,
}

fn default_max_health() -> f32 {
    100.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecKind {
    Stackable {
        max: f32,
    },
    AmmoContainer {
        max: u32,
    },
    #[default]
    Plain,
}

impl ItemSpec {
    pub fn plain(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            kind: SpecKind::Plain,
            max_health: default_max_health(),
            cargo_capacity: 0,
            vehicle_key: false,
        }
    }

    pub fn stackable(display_name: &str, max: f32) -> Self {
        Self {
            kind: SpecKind::Stackable { max },
            ..Self::plain(display_name)
        }
    }

    pub fn ammo(display_name: &str, max: u32) -> Self {
        Self {
            kind: SpecKind::AmmoContainer { max },
            ..Self::plain(display_name)
        }
    }

    pub fn container(display_name: &str, cargo_capacity: usize) -> Self {
        Self {
            cargo_capacity,
            ..Self::plain(display_name)
        }
    }

    pub fn key(display_name: &str) -> Self {
        Self {
            vehicle_key: true,
            ..Self::plain(display_name)
        }
    }

    fn kind_with(&self, quantity: f32) -> ItemKind {
        match self.kind {
            SpecKind::Stackable { max } => ItemKind::Stackable { quantity, max },
            SpecKind::AmmoContainer { max } => ItemKind::AmmoContainer {
                ammo: quantity.max(0.0) as u32,
                max,
            },
            SpecKind::Plain => ItemKind::Plain,
        }
    }

    fn initial_quantity(&self) -> f32 {
        match self.kind {
            SpecKind::Stackable { max } => max,
            SpecKind::AmmoContainer { max } => max as f32,
            SpecKind::Plain => 0.0,
        }
    }
}

/// JSON description of a world used to seed [`MemoryWorld`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldFixture {
    #[serde(default)]
    pub catalog: HashMap<String, ItemSpec>,
    #[serde(default)]
    pub players: Vec<PlayerFixture>,
    #[serde(default)]
    pub vehicles: Vec<VehicleFixture>,
    #[serde(default)]
    pub surface_height: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerFixture {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bi_id: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub items: Vec<ItemFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFixture {
    pub class_name: String,
    #[serde(default)]
    pub slot: Option<Slot>,
    #[serde(default)]
    pub quantity: Option<f32>,
    #[serde(default)]
    pub attachments: Vec<ItemFixture>,
    #[serde(default)]
    pub cargo: Vec<ItemFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFixture {
    pub class_name: String,
    pub display_name: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub persistent_id: Option<PersistentId>,
}

#[derive(Debug, Clone, PartialEq)]
enum Parent {
    Player(String),
    Item(ItemId),
    Ground,
}

#[derive(Debug, Clone)]
struct ItemState {
    class_name: String,
    health: f32,
    quantity: f32,
    slot: Option<Slot>,
    attachments: Vec<ItemId>,
    cargo: Vec<ItemId>,
    parent: Parent,
    pairing: Option<PersistentId>,
    master: bool,
}

#[derive(Debug, Clone)]
struct PlayerState {
    snapshot: PlayerSnapshot,
    /// Top-level items in enumeration order
    items: Vec<ItemId>,
}

#[derive(Debug, Clone)]
struct VehicleState {
    snapshot: VehicleSnapshot,
}

#[derive(Debug, Default)]
struct WorldState {
    catalog: HashMap<String, ItemSpec>,
    players: Vec<PlayerState>,
    items: HashMap<ItemId, ItemState>,
    vehicles: Vec<VehicleState>,
    ground: Vec<ItemId>,
    next_id: u64,
    keys_issued: i32,
    surface_height: f32,
    notifications: Vec<(String, Notification)>,
    chats: Vec<(String, String)>,
}

impl WorldState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn player(&self, player_id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.snapshot.id == player_id)
    }

    fn player_mut(&mut self, player_id: &str) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.snapshot.id == player_id)
    }

    fn new_item(&mut self, class_name: &str, parent: Parent, slot: Option<Slot>) -> Option<ItemId> {
        let spec = self.catalog.get(class_name)?;
        let health = spec.max_health;
        let quantity = spec.initial_quantity();
        let id = ItemId(self.allocate_id());
        self.items.insert(
            id,
            ItemState {
                class_name: class_name.to_string(),
                health,
                quantity,
                slot,
                attachments: Vec::new(),
                cargo: Vec::new(),
                parent,
                pairing: None,
                master: false,
            },
        );
        Some(id)
    }

    fn preorder(&self, root: ItemId, out: &mut Vec<ItemId>) {
        let Some(item) = self.items.get(&root) else {
            return;
        };
        out.push(root);
        for child in &item.attachments {
            self.preorder(*child, out);
        }
        for child in &item.cargo {
            self.preorder(*child, out);
        }
    }

    fn player_items(&self, player: &PlayerState) -> Vec<ItemId> {
        let mut order = Vec::new();
        for root in &player.items {
            self.preorder(*root, &mut order);
        }
        order
    }

    fn node(&self, id: ItemId) -> Option<ItemNode> {
        let item = self.items.get(&id)?;
        let spec = self.catalog.get(&item.class_name)?;
        Some(ItemNode {
            id,
            class_name: item.class_name.clone(),
            display_name: spec.display_name.clone(),
            health: item.health,
            kind: spec.kind_with(item.quantity),
            slot: item.slot.clone(),
            attachments: item.attachments.clone(),
            cargo: item.cargo.clone(),
        })
    }

    fn detach(&mut self, id: ItemId) {
        let Some(parent) = self.items.get(&id).map(|i| i.parent.clone()) else {
            return;
        };
        match parent {
            Parent::Player(player_id) => {
                if let Some(player) = self.player_mut(&player_id) {
                    player.items.retain(|i| *i != id);
                }
            }
            Parent::Item(parent_id) => {
                if let Some(parent) = self.items.get_mut(&parent_id) {
                    parent.attachments.retain(|i| *i != id);
                    parent.cargo.retain(|i| *i != id);
                }
            }
            Parent::Ground => self.ground.retain(|i| *i != id),
        }
    }

    fn remove_tree(&mut self, id: ItemId) {
        let mut doomed = Vec::new();
        self.preorder(id, &mut doomed);
        for item in doomed {
            self.items.remove(&item);
        }
    }

    fn build_item(&mut self, fixture: &ItemFixture, parent: Parent) -> Result<ItemId> {
        let Some(id) = self.new_item(&fixture.class_name, parent, fixture.slot.clone()) else {
            bail!("Unknown item class '{}' in fixture", fixture.class_name);
        };
        if let Some(quantity) = fixture.quantity {
            if let Some(item) = self.items.get_mut(&id) {
                item.quantity = quantity;
            }
        }
        for attachment in &fixture.attachments {
            if attachment.slot.is_none() {
                bail!(
                    "Attachment '{}' of '{}' has no slot",
                    attachment.class_name,
                    fixture.class_name
                );
            }
            let child = self.build_item(attachment, Parent::Item(id))?;
            if let Some(item) = self.items.get_mut(&id) {
                item.attachments.push(child);
            }
        }
        for content in &fixture.cargo {
            let child = self.build_item(content, Parent::Item(id))?;
            if let Some(item) = self.items.get_mut(&id) {
                item.cargo.push(child);
            }
        }
        Ok(id)
    }
}

/// In-memory simulation with players, nested inventories and vehicles.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    state: Mutex<WorldState>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: &WorldFixture) -> Result<Self> {
        let world = Self::new();
        {
            let mut state = world.state();
            state.catalog = fixture.catalog.clone();
            state.surface_height = fixture.surface_height;
        }
        for player in &fixture.players {
            world.add_player(&player.id, &player.name);
            let mut state = world.state();
            if let Some(p) = state.player_mut(&player.id) {
                p.snapshot.bi_id = player.bi_id.clone();
                p.snapshot.position = player.position;
            }
            for item in &player.items {
                let id = state.build_item(item, Parent::Player(player.id.clone()))?;
                if let Some(p) = state.player_mut(&player.id) {
                    p.items.push(id);
                }
            }
        }
        for vehicle in &fixture.vehicles {
            world.spawn_vehicle(
                &vehicle.class_name,
                &vehicle.display_name,
                vehicle.position,
                vehicle.persistent_id,
            );
        }
        Ok(world)
    }

    pub fn load_fixture(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read world fixture {}", path.display()))?;
        let fixture: WorldFixture =
            serde_json::from_str(&contents).context("Failed to parse world fixture")?;
        Self::from_fixture(&fixture)
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn define_class(&self, class_name: &str, spec: ItemSpec) {
        self.state().catalog.insert(class_name.to_string(), spec);
    }

    pub fn set_surface_height(&self, height: f32) {
        self.state().surface_height = height;
    }

    /// Connect a healthy, alive player at the origin.
    pub fn add_player(&self, player_id: &str, name: &str) {
        let mut state = self.state();
        if state.player(player_id).is_some() {
            return;
        }
        state.players.push(PlayerState {
            snapshot: PlayerSnapshot {
                id: player_id.to_string(),
                name: name.to_string(),
                bi_id: format!("bi-{}", player_id),
                position: Vec3::default(),
                health: 100.0,
                blood: 5000.0,
                water: 5000.0,
                energy: 20000.0,
                alive: true,
                unconscious: false,
            },
            items: Vec::new(),
        });
    }

    /// Drop a player from the online list together with their items.
    pub fn remove_player(&self, player_id: &str) {
        let mut state = self.state();
        let Some(index) = state.players.iter().position(|p| p.snapshot.id == player_id) else {
            return;
        };
        let player = state.players.remove(index);
        for root in player.items {
            state.remove_tree(root);
        }
    }

    pub fn update_player(&self, player_id: &str, update: impl FnOnce(&mut PlayerSnapshot)) {
        if let Some(player) = self.state().player_mut(player_id) {
            update(&mut player.snapshot);
        }
    }

    /// Give a top-level item to a player, optionally in an attachment slot.
    pub fn give_to_player(&self, player_id: &str, slot: Option<Slot>, class_name: &str) -> Option<ItemId> {
        let mut state = self.state();
        state.player(player_id)?;
        let id = state.new_item(class_name, Parent::Player(player_id.to_string()), slot)?;
        state.player_mut(player_id)?.items.push(id);
        Some(id)
    }

    pub fn attach(&self, parent: ItemId, slot: Slot, class_name: &str) -> Option<ItemId> {
        let mut state = self.state();
        if !state.items.contains_key(&parent) {
            return None;
        }
        let id = state.new_item(class_name, Parent::Item(parent), Some(slot))?;
        state.items.get_mut(&parent)?.attachments.push(id);
        Some(id)
    }

    /// Place an item in a container, ignoring its capacity.
    pub fn put_in_cargo(&self, parent: ItemId, class_name: &str) -> Option<ItemId> {
        let mut state = self.state();
        if !state.items.contains_key(&parent) {
            return None;
        }
        let id = state.new_item(class_name, Parent::Item(parent), None)?;
        state.items.get_mut(&parent)?.cargo.push(id);
        Some(id)
    }

    pub fn spawn_vehicle(
        &self,
        class_name: &str,
        display_name: &str,
        position: Vec3,
        persistent_id: Option<PersistentId>,
    ) -> EntityId {
        let mut state = self.state();
        let entity = EntityId(state.allocate_id());
        state.vehicles.push(VehicleState {
            snapshot: VehicleSnapshot {
                entity,
                class_name: class_name.to_string(),
                display_name: display_name.to_string(),
                persistent_id,
                position,
                ruined: false,
            },
        });
        entity
    }

    pub fn update_vehicle(&self, entity: EntityId, update: impl FnOnce(&mut VehicleSnapshot)) {
        let mut state = self.state();
        if let Some(vehicle) = state.vehicles.iter_mut().find(|v| v.snapshot.entity == entity) {
            update(&mut vehicle.snapshot);
        }
    }

    pub fn ground_items(&self) -> Vec<ItemId> {
        self.state().ground.clone()
    }

    pub fn notifications(&self) -> Vec<(String, Notification)> {
        self.state().notifications.clone()
    }

    pub fn chats(&self) -> Vec<(String, String)> {
        self.state().chats.clone()
    }

    pub fn key_pairing(&self, item: ItemId) -> Option<(PersistentId, bool)> {
        let state = self.state();
        let key = state.items.get(&item)?;
        key.pairing.map(|id| (id, key.master))
    }
}

impl World for MemoryWorld {
    fn players(&self) -> Vec<PlayerSnapshot> {
        self.state().players.iter().map(|p| p.snapshot.clone()).collect()
    }

    fn inventory(&self, player_id: &str) -> Option<InventorySnapshot> {
        let state = self.state();
        let player = state.player(player_id)?;
        let order = state.player_items(player);
        let nodes = order
            .iter()
            .filter_map(|id| state.node(*id).map(|node| (*id, node)))
            .collect();
        Some(InventorySnapshot { order, nodes })
    }

    fn is_known_class(&self, class_name: &str) -> bool {
        self.state().catalog.contains_key(class_name)
    }

    fn create_in_inventory(&self, player_id: &str, class_name: &str) -> Option<ItemId> {
        let mut state = self.state();
        let player = state.player(player_id)?;
        let container = state.player_items(player).into_iter().find(|id| {
            state
                .items
                .get(id)
                .and_then(|item| {
                    state
                        .catalog
                        .get(&item.class_name)
                        .map(|spec| item.cargo.len() < spec.cargo_capacity)
                })
                .unwrap_or(false)
        })?;
        let id = state.new_item(class_name, Parent::Item(container), None)?;
        state.items.get_mut(&container)?.cargo.push(id);
        Some(id)
    }

    fn create_on_ground(&self, class_name: &str, _position: Vec3) -> Option<ItemId> {
        let mut state = self.state();
        let id = state.new_item(class_name, Parent::Ground, None)?;
        state.ground.push(id);
        Some(id)
    }

    fn item(&self, item: ItemId) -> Option<ItemNode> {
        self.state().node(item)
    }

    fn set_item_health(&self, item: ItemId, fraction: f32) -> bool {
        let mut state = self.state();
        let Some(max_health) = state
            .items
            .get(&item)
            .and_then(|i| state.catalog.get(&i.class_name))
            .map(|spec| spec.max_health)
        else {
            return false;
        };
        match state.items.get_mut(&item) {
            Some(entry) => {
                entry.health = max_health * fraction.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    fn set_item_quantity(&self, item: ItemId, quantity: f32) -> bool {
        let mut state = self.state();
        let Some(max) = state
            .items
            .get(&item)
            .and_then(|i| state.catalog.get(&i.class_name))
            .map(|spec| spec.kind_with(0.0).quantity_max())
        else {
            return false;
        };
        match state.items.get_mut(&item) {
            Some(entry) if max > 0.0 => {
                entry.quantity = quantity.clamp(0.0, max);
                true
            }
            _ => false,
        }
    }

    fn delete_item(&self, item: ItemId) -> bool {
        let mut state = self.state();
        if !state.items.contains_key(&item) {
            return false;
        }
        state.detach(item);
        state.remove_tree(item);
        true
    }

    fn is_vehicle_key(&self, item: ItemId) -> bool {
        let state = self.state();
        state
            .items
            .get(&item)
            .and_then(|i| state.catalog.get(&i.class_name))
            .map_or(false, |spec| spec.vehicle_key)
    }

    fn heal_player(&self, player_id: &str, fraction: f32) -> bool {
        let mut state = self.state();
        let Some(player) = state.player_mut(player_id) else {
            return false;
        };
        let fraction = fraction.clamp(0.0, 1.0);
        let snapshot = &mut player.snapshot;
        snapshot.health = 100.0 * fraction;
        snapshot.blood = 5000.0 * fraction;
        snapshot.water = 5000.0 * fraction;
        snapshot.energy = 20000.0 * fraction;
        snapshot.unconscious = false;
        true
    }

    fn set_player_position(&self, player_id: &str, position: Vec3) -> bool {
        match self.state().player_mut(player_id) {
            Some(player) => {
                player.snapshot.position = position;
                true
            }
            None => false,
        }
    }

    fn surface_y(&self, _x: f32, _z: f32) -> f32 {
        self.state().surface_height
    }

    fn notify(&self, player_id: &str, notification: &Notification) {
        self.state()
            .notifications
            .push((player_id.to_string(), notification.clone()));
    }

    fn send_chat(&self, player_id: &str, message: &str) {
        self.state()
            .chats
            .push((player_id.to_string(), message.to_string()));
    }

    fn vehicles(&self) -> Vec<VehicleSnapshot> {
        self.state()
            .vehicles
            .iter()
            .map(|v| v.snapshot.clone())
            .collect()
    }

    fn delete_vehicle(&self, entity: EntityId) -> bool {
        let mut state = self.state();
        let before = state.vehicles.len();
        state.vehicles.retain(|v| v.snapshot.entity != entity);
        state.vehicles.len() != before
    }

    fn pair_key(&self, vehicle: EntityId, key: ItemId, master: bool) -> Option<PersistentId> {
        let mut state = self.state();
        let is_key = state
            .items
            .get(&key)
            .and_then(|i| state.catalog.get(&i.class_name))
            .map_or(false, |spec| spec.vehicle_key);
        if !is_key {
            return None;
        }

        state.keys_issued += 1;
        let n = state.keys_issued;
        let key_id = PersistentId::new(1000 + n, n * 7, -n, n * 31);

        let target = state
            .vehicles
            .iter_mut()
            .find(|v| v.snapshot.entity == vehicle)?;
        if target.snapshot.persistent_id.is_none() {
            target.snapshot.persistent_id = Some(key_id);
        }

        let item = state.items.get_mut(&key)?;
        item.pairing = Some(key_id);
        item.master = master;
        Some(key_id)
    }
}
