use super::*;
use crate::world::{ItemId, ItemKind, ItemNode, PlayerSnapshot, Vec3};
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Counter {
    owner: String,
    total: u64,
    entries: Vec<u64>,
}

impl SubjectLog for Counter {
    type Entry = u64;

    fn create(subject_id: &str, _subject_name: &str) -> Self {
        Self {
            owner: subject_id.to_string(),
            total: 0,
            entries: Vec::new(),
        }
    }

    fn entries(&self) -> &[u64] {
        &self.entries
    }

    fn entries_mut(&mut self) -> &mut Vec<u64> {
        &mut self.entries
    }

    fn record(&mut self, entry: &u64) {
        self.total += entry;
    }
}

fn player(id: &str) -> PlayerSnapshot {
    PlayerSnapshot {
        id: id.to_string(),
        name: format!("Player {}", id),
        bi_id: String::new(),
        position: Vec3::new(10.0, 0.0, 20.0),
        health: 37.0,
        blood: 5000.0,
        water: 5000.0,
        energy: 20000.0,
        alive: true,
        unconscious: false,
    }
}

fn apple() -> ItemNode {
    ItemNode {
        id: ItemId(1),
        class_name: "Apple".to_string(),
        display_name: "Apple".to_string(),
        health: 100.0,
        kind: ItemKind::Stackable {
            quantity: 0.5,
            max: 1.0,
        },
        slot: None,
        attachments: Vec::new(),
        cargo: Vec::new(),
    }
}

#[test]
fn test_eviction_keeps_most_recent() {
    let temp_dir = TempDir::new().unwrap();
    let log: BoundedLog<Counter> = BoundedLog::per_subject(temp_dir.path(), "_c.json", 5);

    for i in 0..8u64 {
        log.append("a", "A", i);
    }

    let doc = log.get("a").unwrap();
    assert_eq!(doc.entries, vec![3, 4, 5, 6, 7]);
    // Aggregates survive eviction
    assert_eq!(doc.total, (0..8).sum::<u64>());
}

#[test]
fn test_write_through_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    {
        let log: BoundedLog<Counter> = BoundedLog::per_subject(temp_dir.path(), "_c.json", 3);
        log.append("a", "A", 1);
        log.append("a", "A", 2);
        log.append("b", "B", 9);
        assert!(temp_dir.path().join("a_c.json").exists());
        assert!(temp_dir.path().join("b_c.json").exists());
    }

    // Fresh instance loads from disk and keeps appending
    let log: BoundedLog<Counter> = BoundedLog::per_subject(temp_dir.path(), "_c.json", 3);
    assert_eq!(log.append("a", "A", 3), 3);
    assert_eq!(log.append("a", "A", 4), 3);
    let doc = log.get("a").unwrap();
    assert_eq!(doc.entries, vec![2, 3, 4]);
    assert_eq!(doc.owner, "a");
    assert_eq!(doc.total, 10);
}

#[test]
fn test_single_layout_shares_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("results.json");
    let log: BoundedLog<Counter> = BoundedLog::single(&path, 4);

    log.append_all("x", "", vec![1, 2, 3]);
    log.append_all("y", "", vec![4, 5]);

    assert_eq!(log.path_for("anything"), path);
    let doc = log.get("z").unwrap();
    assert_eq!(doc.entries, vec![2, 3, 4, 5]);
}

#[test]
fn test_corrupt_file_starts_fresh() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("a_c.json"), "{ not json").unwrap();

    let log: BoundedLog<Counter> = BoundedLog::per_subject(temp_dir.path(), "_c.json", 3);
    assert_eq!(log.append("a", "A", 7), 1);
    assert_eq!(log.get("a").unwrap().entries, vec![7]);
}

#[test]
fn test_persist_failure_keeps_memory() {
    let temp_dir = TempDir::new().unwrap();
    // A file where the directory should be makes every write fail
    let blocker = temp_dir.path().join("blocked");
    std::fs::write(&blocker, "").unwrap();

    let log: BoundedLog<Counter> = BoundedLog::per_subject(&blocker, "_c.json", 3);
    assert_eq!(log.append("a", "A", 1), 1);
    assert_eq!(log.append("a", "A", 2), 2);
    assert_eq!(log.get("a").unwrap().entries, vec![1, 2]);
}

#[test]
fn test_classify_transfer() {
    let alice = Owner::Player("alice".to_string());
    let bob = Owner::Player("bob".to_string());

    assert_eq!(
        classify_transfer(&alice, &Owner::Ground),
        vec![("alice".to_string(), InventoryEventType::Dropped)]
    );
    assert_eq!(
        classify_transfer(&alice, &Owner::Elsewhere),
        vec![("alice".to_string(), InventoryEventType::Removed)]
    );
    assert_eq!(
        classify_transfer(&Owner::Ground, &bob),
        vec![("bob".to_string(), InventoryEventType::PickedUp)]
    );
    assert_eq!(
        classify_transfer(&Owner::Elsewhere, &bob),
        vec![("bob".to_string(), InventoryEventType::Added)]
    );
    assert_eq!(
        classify_transfer(&alice, &bob),
        vec![
            ("alice".to_string(), InventoryEventType::Removed),
            ("bob".to_string(), InventoryEventType::Added),
        ]
    );
    assert!(classify_transfer(&alice, &alice).is_empty());
    assert!(classify_transfer(&Owner::Ground, &Owner::Elsewhere).is_empty());
}

#[test]
fn test_inventory_logger_records_transfer() {
    let temp_dir = TempDir::new().unwrap();
    let logger = InventoryEventLogger::new(temp_dir.path(), 100);
    let item = apple();

    let logged = logger.record_transfer(
        &item,
        &Owner::Player("1".to_string()),
        &Owner::Player("2".to_string()),
        Vec3::default(),
        |id| Some(player(id)),
    );
    assert_eq!(logged, 2);

    let events = logger.events("1");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, InventoryEventType::Removed);
    assert_eq!(events[0].item_quantity, 0.5);
    assert_eq!(logger.events("2")[0].event_type, InventoryEventType::Added);

    let raw = std::fs::read_to_string(logger.path_for("1")).unwrap();
    assert!(raw.contains("\"eventType\": \"REMOVED\""));
    assert!(raw.contains("\"itemClassName\": \"Apple\""));

    // Unknown players are skipped
    let logged = logger.record_transfer(
        &item,
        &Owner::Ground,
        &Owner::Player("ghost".to_string()),
        Vec3::default(),
        |_| None,
    );
    assert_eq!(logged, 0);
}

#[test]
fn test_life_logger() {
    let temp_dir = TempDir::new().unwrap();
    let logger = LifeEventLogger::new(temp_dir.path(), 2);
    let victim = player("1");

    logger.log_spawn(&victim);
    logger.log_connect(&victim);
    logger.log_death(
        &victim,
        Some(&Killer::Player {
            name: "Bandit".to_string(),
            id: "2".to_string(),
        }),
    );

    let events = logger.events("1");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, LifeEventType::Connected);
    assert_eq!(events[0].health_at_death, -1.0);
    assert_eq!(events[1].event_type, LifeEventType::Died);
    assert_eq!(events[1].cause_of_death, "Player: Bandit (2)");
    assert_eq!(events[1].health_at_death, 37.0);

    logger.log_death(&victim, Some(&Killer::Object("ZmbM_HermitSkinny".to_string())));
    assert_eq!(logger.events("1")[1].cause_of_death, "ZmbM_HermitSkinny");
    assert!(temp_dir.path().join("1_life.json").exists());
}

#[test]
fn test_trade_totals() {
    let temp_dir = TempDir::new().unwrap();
    let logger = TradeLogger::new(temp_dir.path(), 500);
    let buyer = player("1");
    let trader = Trader {
        name: "Weapons".to_string(),
        zone: "Green Mountain".to_string(),
        position: Vec3::new(3700.0, 400.0, 6000.0),
    };
    let ak = TradedItem {
        class_name: "AKM".to_string(),
        display_name: "AKM".to_string(),
        quantity: 1,
        price: 5000,
    };
    let ammo = TradedItem {
        class_name: "Ammo_762x39".to_string(),
        display_name: "7.62x39mm Rounds".to_string(),
        quantity: 20,
        price: 300,
    };

    logger.log_purchase(&buyer, &ak, &trader);
    logger.log_purchase(&buyer, &ammo, &trader);
    logger.log_sale(&buyer, &ak, &trader);

    let log = logger.trade_log("1").unwrap();
    assert_eq!(log.trades.len(), 3);
    assert_eq!(log.total_purchases, 21);
    assert_eq!(log.total_spent, 5300);
    assert_eq!(log.total_sales, 1);
    assert_eq!(log.total_earned, 5000);
    assert_eq!(log.trades[2].event_type, TradeEventType::Sale);
    assert!(temp_dir.path().join("1_trades.json").exists());
}
