// End-to-end tests: scheduler-driven bridge against an in-memory world

use serde_json::Value;
use sst_bridge::config::BridgeConfig;
use sst_bridge::handlers::{KeyGrantRequest, PlayerCommandRequest, VehicleDeleteRequest};
use sst_bridge::persistent_id::PersistentId;
use sst_bridge::queue::{enqueue, Request};
use sst_bridge::tracking::Purchase;
use sst_bridge::world::{ItemSpec, MemoryWorld, Vec3, World};
use sst_bridge::Bridge;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const PLAYER: &str = "76561198000000001";

fn fast_config(dir: &TempDir) -> BridgeConfig {
    let mut config = BridgeConfig {
        root: dir.path().join("SST"),
        ..Default::default()
    };
    config.queues.player_commands_seconds = 1;
    config.queues.vehicle_requests_seconds = 1;
    config.exports.online_players_seconds = 1;
    config.exports.online_players_initial_delay_seconds = 0;
    config.exports.inventory_seconds = 1;
    config.exports.inventory_initial_delay_seconds = 0;
    config.tracking.refresh_seconds = 1;
    config
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn world() -> Arc<MemoryWorld> {
    let world = MemoryWorld::new();
    world.define_class("ExpansionCarKey", ItemSpec::key("Car Key"));
    world.add_player(PLAYER, "Survivor");
    Arc::new(world)
}

#[tokio::test]
async fn test_scheduler_drains_queues_and_exports() {
    let dir = TempDir::new().unwrap();
    let world = world();
    world.update_player(PLAYER, |p| p.health = 20.0);
    let bridge = Bridge::new(fast_config(&dir), world.clone());
    let paths = bridge.paths().clone();
    paths.ensure_dirs().unwrap();

    enqueue(
        &paths.player_commands(),
        Request::new(PlayerCommandRequest::heal(PLAYER, 100.0)),
    )
    .unwrap();

    let handle = bridge.start().unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    handle.shutdown().await;

    assert_eq!(world.find_player(PLAYER).unwrap().health, 100.0);
    let results = read(&paths.player_commands_results());
    assert_eq!(results["requests"][0]["status"], "completed");

    let online = read(&paths.online_players());
    assert_eq!(online["onlineCount"], 1);
    assert_eq!(online["players"][0]["playerId"], PLAYER);

    let inventory = read(&bridge.inventory_exporter().path_for(PLAYER));
    assert_eq!(inventory["playerCount"], 1);
}

#[tokio::test]
async fn test_shutdown_stops_polling() {
    let dir = TempDir::new().unwrap();
    let world = world();
    let bridge = Bridge::new(fast_config(&dir), world.clone());
    let paths = bridge.paths().clone();

    let handle = bridge.start().unwrap();
    handle.shutdown().await;

    enqueue(
        &paths.player_commands(),
        Request::new(PlayerCommandRequest::heal(PLAYER, 100.0)),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let queue = read(&paths.player_commands());
    assert_eq!(queue["requests"].as_array().unwrap().len(), 1);
}

#[test]
fn test_vehicle_lifecycle() {
    let dir = TempDir::new().unwrap();
    let world = world();
    let bridge = Bridge::new(fast_config(&dir), world.clone());
    bridge.prepare().unwrap();
    let paths = bridge.paths().clone();

    // Purchase starts tracking under the master key id
    let master = PersistentId::new(10, 20, 30, -5);
    let entity = world.spawn_vehicle(
        "OffroadHatchback",
        "Ada 4x4",
        Vec3::new(100.0, 5.0, 100.0),
        Some(master),
    );
    let vehicle_id = bridge
        .tracker()
        .record_purchase(
            Purchase {
                owner_id: PLAYER.to_string(),
                owner_name: "Survivor".to_string(),
                key_class_name: "ExpansionCarKey".to_string(),
                key_id: master,
                price: 25000,
                trader_name: "Vehicle Trader".to_string(),
                trader_zone: "Krasnostav".to_string(),
            },
            &world.find_vehicle(master).unwrap(),
        )
        .unwrap();
    assert_eq!(vehicle_id, "10-20-30--5");

    // Refresh copies the new position
    world.update_vehicle(entity, |v| v.position = Vec3::new(500.0, 6.0, 700.0));
    bridge.poll_once();
    let tracked = read(&paths.tracked_vehicles());
    assert_eq!(tracked[0]["vehicleId"], "10-20-30--5");
    assert_eq!(tracked[0]["lastPosition"][0], 500.0);
    assert_eq!(tracked[0]["keyData"]["persistentIdD"], -5);

    // Extra key lands in additionalKeys
    enqueue(
        &paths.key_grants(),
        Request::new(KeyGrantRequest::new(PLAYER, "10-20-30--5")),
    )
    .unwrap();
    bridge.poll_once();
    let tracked = read(&paths.tracked_vehicles());
    assert_eq!(tracked[0]["additionalKeys"].as_array().unwrap().len(), 1);

    // Deletion removes both the vehicle and the record
    enqueue(
        &paths.vehicle_delete(),
        Request::new(VehicleDeleteRequest::new("10-20-30--5")),
    )
    .unwrap();
    bridge.poll_once();
    let results = read(&paths.vehicle_delete_results());
    assert_eq!(
        results["requests"][0]["result"],
        "Vehicle destroyed and removed from tracking"
    );
    assert!(world.find_vehicle(master).is_none());
    assert!(bridge.tracker().is_empty());
    assert_eq!(read(&paths.tracked_vehicles()).as_array().unwrap().len(), 0);

    let purchases = read(&paths.purchases());
    assert_eq!(purchases[0]["purchasePrice"], 25000);
}

#[test]
fn test_tracking_survives_restart() {
    let dir = TempDir::new().unwrap();
    let world = world();
    let master = PersistentId::new(1, -2, 3, -4);
    world.spawn_vehicle("Sedan_02", "Sarka 120", Vec3::default(), Some(master));

    {
        let bridge = Bridge::new(fast_config(&dir), world.clone());
        bridge.prepare().unwrap();
        bridge
            .tracker()
            .record_purchase(
                Purchase {
                    owner_id: PLAYER.to_string(),
                    owner_name: "Survivor".to_string(),
                    key_class_name: "ExpansionCarKey".to_string(),
                    key_id: master,
                    price: 9000,
                    trader_name: String::new(),
                    trader_zone: String::new(),
                },
                &world.find_vehicle(master).unwrap(),
            )
            .unwrap();
    }

    let bridge = Bridge::new(fast_config(&dir), world);
    bridge.prepare().unwrap();
    let record = bridge.tracker().get("1--2-3--4").unwrap();
    assert_eq!(record.vehicle_display_name, "Sarka 120");
    assert_eq!(record.purchase_price, 9000);
}

#[test]
fn test_connect_hooks_feed_logs() {
    let dir = TempDir::new().unwrap();
    let world = world();
    let bridge = Bridge::new(fast_config(&dir), world.clone());
    bridge.prepare().unwrap();

    let player = world.find_player(PLAYER).unwrap();
    bridge.player_connected(&player);
    bridge.player_disconnected(&player);

    let events = bridge.life_events().events(PLAYER);
    assert_eq!(events.len(), 2);
    assert!(!bridge.online_players().get(PLAYER).unwrap().is_online);

    let path = bridge.paths().life_events_dir().join(format!("{}_life.json", PLAYER));
    let log = read(&path);
    assert_eq!(log["events"][0]["eventType"], "CONNECTED");
    assert_eq!(log["events"][1]["eventType"], "DISCONNECTED");
}
