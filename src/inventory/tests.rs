use super::*;
use crate::world::{ItemSpec, MemoryWorld, Slot, World};

const PLAYER: &str = "76561198000000001";

struct Fixture {
    world: MemoryWorld,
    vest: ItemId,
    backpack: ItemId,
    pouch: ItemId,
    cargo: Vec<ItemId>,
}

/// Vest (root 0) holding an apple, backpack (root 1) with a pouch
/// attachment and three cargo items.
fn fixture() -> Fixture {
    let world = MemoryWorld::new();
    world.define_class("Vest", ItemSpec::container("Vest", 4));
    world.define_class("Backpack", ItemSpec::container("Backpack", 10));
    world.define_class("Pouch", ItemSpec::container("Pouch", 2));
    world.define_class("Apple", ItemSpec::stackable("Apple", 1.0));
    world.define_class("Rag", ItemSpec::stackable("Rag", 6.0));
    world.define_class("Mag", ItemSpec::ammo("Magazine", 30));
    world.add_player(PLAYER, "Survivor");

    let vest = world
        .give_to_player(PLAYER, Some(Slot::new(3, "Vest")), "Vest")
        .unwrap();
    world.put_in_cargo(vest, "Apple").unwrap();
    let backpack = world
        .give_to_player(PLAYER, Some(Slot::new(4, "Back")), "Backpack")
        .unwrap();
    let pouch = world.attach(backpack, Slot::new(9, "Pouch"), "Pouch").unwrap();
    world.put_in_cargo(pouch, "Mag").unwrap();
    let cargo = vec![
        world.put_in_cargo(backpack, "Rag").unwrap(),
        world.put_in_cargo(backpack, "Apple").unwrap(),
        world.put_in_cargo(backpack, "Mag").unwrap(),
    ];

    Fixture {
        world,
        vest,
        backpack,
        pouch,
        cargo,
    }
}

fn snapshot(f: &Fixture) -> InventorySnapshot {
    f.world.inventory(PLAYER).unwrap()
}

#[test]
fn test_roots_exclude_children() {
    let f = fixture();
    assert_eq!(roots(&snapshot(&f)), vec![f.vest, f.backpack]);
}

#[test]
fn test_path_parse_and_display() {
    let path: ItemPath = "3.attachments.0.cargo.1".parse().unwrap();
    assert_eq!(path.root, 3);
    assert_eq!(
        path.hops,
        vec![(Segment::Attachments, 0), (Segment::Cargo, 1)]
    );
    assert_eq!(path.to_string(), "3.attachments.0.cargo.1");
}

#[test]
fn test_path_parse_errors() {
    assert_eq!("".parse::<ItemPath>().unwrap_err().code(), "MALFORMED_PATH");
    assert_eq!("x".parse::<ItemPath>().unwrap_err().code(), "MALFORMED_PATH");
    assert_eq!("-1".parse::<ItemPath>().unwrap_err().code(), "MALFORMED_PATH");
    assert_eq!("0.cargo".parse::<ItemPath>().unwrap_err().code(), "MALFORMED_PATH");
    assert_eq!("0.cargo.x".parse::<ItemPath>().unwrap_err().code(), "MALFORMED_PATH");
    assert_eq!(
        "0.pockets.1".parse::<ItemPath>().unwrap_err(),
        PathError::UnknownSegment("pockets".to_string())
    );
    assert_eq!(
        "0.cargo.1.hands".parse::<ItemPath>().unwrap_err().code(),
        "UNKNOWN_PATH_SEGMENT"
    );
}

#[test]
fn test_resolve_cargo_index() {
    let f = fixture();
    let snap = snapshot(&f);
    let path: ItemPath = "1.cargo.2".parse().unwrap();
    assert_eq!(resolve(&snap, &path), Ok(f.cargo[2]));

    let path: ItemPath = "1.attachments.0".parse().unwrap();
    assert_eq!(resolve(&snap, &path), Ok(f.pouch));
}

#[test]
fn test_resolve_out_of_range() {
    let f = fixture();
    let snap = snapshot(&f);

    let err = resolve(&snap, &"5".parse().unwrap()).unwrap_err();
    assert_eq!(err.code(), "OUT_OF_RANGE");

    let err = resolve(&snap, &"0.cargo.1".parse().unwrap()).unwrap_err();
    assert_eq!(
        err,
        PathError::OutOfRange {
            at: "0.cargo".to_string(),
            index: 1,
            len: 1
        }
    );

    // Apple has no attachments at all
    let err = resolve(&snap, &"0.cargo.0.attachments.0".parse().unwrap()).unwrap_err();
    assert_eq!(err.code(), "OUT_OF_RANGE");
}

#[test]
fn test_export_is_deterministic_and_resolvable() {
    let f = fixture();
    let snap = snapshot(&f);
    let first = export_tree(&snap);
    let second = export_tree(&f.world.inventory(PLAYER).unwrap());
    assert_eq!(first, second);

    fn walk(items: &[ExportedItem], snap: &InventorySnapshot) {
        for item in items {
            let id = resolve(snap, &item.path.parse().unwrap()).unwrap();
            assert_eq!(snap.node(id).unwrap().class_name, item.class_name);
            walk(&item.attachments, snap);
            walk(&item.cargo, snap);
        }
    }
    walk(&first, &snap);
}

#[test]
fn test_export_shape() {
    let f = fixture();
    let tree = export_tree(&snapshot(&f));
    assert_eq!(tree.len(), 2);

    let backpack = &tree[1];
    assert_eq!(backpack.path, "1");
    assert_eq!(backpack.slot, 4);
    assert_eq!(backpack.slot_name, "Back");

    let pouch = &backpack.attachments[0];
    assert_eq!(pouch.path, "1.attachments.0");
    assert_eq!(pouch.slot, 9);
    assert_eq!(pouch.cargo[0].path, "1.attachments.0.cargo.0");
    assert_eq!(pouch.cargo[0].quantity, 30.0);
    assert_eq!(pouch.cargo[0].quantity_max, 30.0);

    let rag = &backpack.cargo[0];
    assert_eq!(rag.path, "1.cargo.0");
    assert_eq!(rag.slot, -1);
    assert_eq!(rag.slot_name, "");
    assert_eq!(rag.quantity_max, 6.0);

    let json = serde_json::to_value(rag).unwrap();
    assert!(json.get("quantityMax").is_some());
    assert!(json.get("slotName").is_some());
}

#[test]
fn test_locate_exact_match() {
    let f = fixture();
    let snap = snapshot(&f);
    assert_eq!(locate(&snap, "1.cargo.2", "Mag"), Ok(f.cargo[2]));
    assert_eq!(locate(&snap, "1.cargo.2", ""), Ok(f.cargo[2]));
}

#[test]
fn test_locate_falls_back_on_stale_path() {
    let f = fixture();
    let snap = snapshot(&f);

    // Path out of range, class exists elsewhere: first Rag in preorder
    assert_eq!(locate(&snap, "1.cargo.7", "Rag"), Ok(f.cargo[0]));

    // Path lands on the wrong class: first Apple is inside the vest
    let apple_in_vest = snap.node(f.vest).unwrap().cargo[0];
    assert_eq!(locate(&snap, "1.cargo.0", "Apple"), Ok(apple_in_vest));
}

#[test]
fn test_locate_failures() {
    let f = fixture();
    let snap = snapshot(&f);

    let err = locate(&snap, "1.cargo.7", "Helmet").unwrap_err();
    assert!(matches!(
        err,
        LocateError::NotFound {
            source: PathError::OutOfRange { .. },
            ..
        }
    ));

    let err = locate(&snap, "1.bogus.0", "").unwrap_err();
    assert!(matches!(
        err,
        LocateError::NotFound {
            source: PathError::UnknownSegment(_),
            ..
        }
    ));

    f.world.define_class("Helmet", ItemSpec::plain("Helmet"));
    let err = locate(&snap, "1.cargo.0", "Helmet").unwrap_err();
    assert_eq!(
        err,
        LocateError::Mismatch {
            path: "1.cargo.0".to_string(),
            found: "Rag".to_string(),
            expected: "Helmet".to_string(),
        }
    );
}

#[test]
fn test_delete_scenario_two_cargo_entries() {
    let world = MemoryWorld::new();
    world.define_class("Backpack", ItemSpec::container("Backpack", 5));
    world.define_class("Rag", ItemSpec::stackable("Rag", 6.0));
    world.add_player(PLAYER, "Survivor");
    let backpack = world.give_to_player(PLAYER, None, "Backpack").unwrap();
    world.put_in_cargo(backpack, "Rag").unwrap();
    let second = world.put_in_cargo(backpack, "Rag").unwrap();

    let snap = world.inventory(PLAYER).unwrap();
    let err = resolve(&snap, &"0.cargo.2".parse().unwrap()).unwrap_err();
    assert_eq!(err.code(), "OUT_OF_RANGE");

    world.put_in_cargo(backpack, "Rag").unwrap();
    let snap = world.inventory(PLAYER).unwrap();
    let third = snap.node(backpack).unwrap().cargo[2];
    assert_ne!(third, second);
    assert_eq!(resolve(&snap, &"0.cargo.2".parse().unwrap()), Ok(third));
}
