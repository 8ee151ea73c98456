use super::*;

fn world_with_backpack() -> (MemoryWorld, ItemId) {
    let world = MemoryWorld::new();
    world.define_class("Backpack", ItemSpec::container("Backpack", 2));
    world.define_class("Apple", ItemSpec::stackable("Apple", 1.0));
    world.define_class("Rag", ItemSpec::stackable("Rag", 6.0));
    world.define_class("Mag_AKM_30Rnd", ItemSpec::ammo("AKM 30Rnd", 30));
    world.add_player("76561198000000001", "Survivor");
    let backpack = world
        .give_to_player("76561198000000001", Some(Slot::new(4, "Back")), "Backpack")
        .unwrap();
    (world, backpack)
}

#[test]
fn test_inventory_is_preorder() {
    let (world, backpack) = world_with_backpack();
    world.define_class("Pouch", ItemSpec::container("Pouch", 1));
    let pouch = world.attach(backpack, Slot::new(9, "Pouch"), "Pouch").unwrap();
    let rag = world.put_in_cargo(pouch, "Rag").unwrap();
    let apple = world.put_in_cargo(backpack, "Apple").unwrap();

    let inventory = world.inventory("76561198000000001").unwrap();
    assert_eq!(inventory.order, vec![backpack, pouch, rag, apple]);
    assert_eq!(inventory.node(pouch).unwrap().slot, Some(Slot::new(9, "Pouch")));
    assert_eq!(inventory.node(apple).unwrap().slot, None);
}

#[test]
fn test_unknown_player_has_no_inventory() {
    let (world, _) = world_with_backpack();
    assert!(world.inventory("nobody").is_none());
    assert!(world.find_player("nobody").is_none());
}

#[test]
fn test_create_in_inventory_respects_capacity() {
    let (world, backpack) = world_with_backpack();
    let first = world.create_in_inventory("76561198000000001", "Apple").unwrap();
    let second = world.create_in_inventory("76561198000000001", "Apple").unwrap();
    assert_eq!(world.item(backpack).unwrap().cargo, vec![first, second]);

    // Backpack is full
    assert!(world.create_in_inventory("76561198000000001", "Apple").is_none());
    assert!(world.create_in_inventory("76561198000000001", "Unknown").is_none());
}

#[test]
fn test_quantity_clamped_to_capability() {
    let (world, backpack) = world_with_backpack();
    let rag = world.put_in_cargo(backpack, "Rag").unwrap();
    assert_eq!(world.item(rag).unwrap().kind.quantity(), 6.0);

    assert!(world.set_item_quantity(rag, 2.0));
    assert_eq!(world.item(rag).unwrap().kind.quantity(), 2.0);
    assert!(world.set_item_quantity(rag, 50.0));
    assert_eq!(world.item(rag).unwrap().kind.quantity(), 6.0);

    // Plain items have no quantity
    assert!(!world.set_item_quantity(backpack, 1.0));
}

#[test]
fn test_delete_item_removes_subtree() {
    let (world, backpack) = world_with_backpack();
    let apple = world.put_in_cargo(backpack, "Apple").unwrap();

    assert!(world.delete_item(backpack));
    assert!(world.item(apple).is_none());
    assert!(world.inventory("76561198000000001").unwrap().is_empty());
    assert!(!world.delete_item(backpack));
}

#[test]
fn test_heal_and_teleport() {
    let (world, _) = world_with_backpack();
    world.update_player("76561198000000001", |p| {
        p.health = 10.0;
        p.blood = 100.0;
    });

    assert!(world.heal_player("76561198000000001", 0.5));
    let player = world.find_player("76561198000000001").unwrap();
    assert_eq!(player.health, 50.0);
    assert_eq!(player.blood, 2500.0);

    assert!(world.set_player_position("76561198000000001", Vec3::new(1.0, 2.0, 3.0)));
    assert_eq!(
        world.find_player("76561198000000001").unwrap().position,
        Vec3::new(1.0, 2.0, 3.0)
    );
    assert!(!world.heal_player("nobody", 1.0));
}

#[test]
fn test_pair_key_assigns_ids() {
    let world = MemoryWorld::new();
    world.define_class("CarKey", ItemSpec::key("Car Key"));
    world.define_class("Apple", ItemSpec::stackable("Apple", 1.0));
    let known = PersistentId::new(1, 2, 3, -4);
    let car = world.spawn_vehicle("OffroadHatchback", "Ada", Vec3::default(), Some(known));
    let key = world.create_on_ground("CarKey", Vec3::default()).unwrap();
    let apple = world.create_on_ground("Apple", Vec3::default()).unwrap();

    assert!(world.is_vehicle_key(key));
    assert!(!world.is_vehicle_key(apple));
    assert!(world.pair_key(car, apple, false).is_none());

    let key_id = world.pair_key(car, key, false).unwrap();
    assert_ne!(key_id, known);
    assert_eq!(world.key_pairing(key), Some((key_id, false)));
    assert_eq!(world.find_vehicle(known).unwrap().entity, car);
}

#[test]
fn test_vehicle_delete() {
    let world = MemoryWorld::new();
    let id = PersistentId::new(9, 9, 9, 9);
    let car = world.spawn_vehicle("Sedan_02", "Sarka", Vec3::default(), Some(id));

    assert!(world.delete_vehicle(car));
    assert!(world.find_vehicle(id).is_none());
    assert!(!world.delete_vehicle(car));
}

#[test]
fn test_fixture() {
    let json = r#"{
        "catalog": {
            "Backpack": { "displayName": "Backpack", "cargoCapacity": 4 },
            "Apple": { "displayName": "Apple", "kind": { "type": "stackable", "max": 1.0 } }
        },
        "players": [{
            "id": "1",
            "name": "Survivor",
            "position": [100.0, 5.0, 200.0],
            "items": [{
                "className": "Backpack",
                "slot": { "id": 4, "name": "Back" },
                "cargo": [{ "className": "Apple", "quantity": 0.5 }]
            }]
        }],
        "vehicles": [{
            "className": "OffroadHatchback",
            "displayName": "Ada",
            "persistentId": "1-2-3--4"
        }],
        "surfaceHeight": 12.5
    }"#;
    let fixture: WorldFixture = serde_json::from_str(json).unwrap();
    let world = MemoryWorld::from_fixture(&fixture).unwrap();

    let inventory = world.inventory("1").unwrap();
    assert_eq!(inventory.len(), 2);
    let apple = inventory.iter().nth(1).unwrap();
    assert_eq!(apple.class_name, "Apple");
    assert_eq!(apple.kind.quantity(), 0.5);

    assert!(world.find_vehicle(PersistentId::new(1, 2, 3, -4)).is_some());
    assert_eq!(world.surface_y(0.0, 0.0), 12.5);
}

#[test]
fn test_fixture_unknown_class() {
    let json = r#"{ "players": [{ "id": "1", "name": "x", "items": [{ "className": "Nope" }] }] }"#;
    let fixture: WorldFixture = serde_json::from_str(json).unwrap();
    assert!(MemoryWorld::from_fixture(&fixture).is_err());
}
