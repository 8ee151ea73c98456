//! Vehicle tracking store.
//!
//! Records are keyed by the master key persistent id string, held in a
//! concurrent map and written through to `vehicles/tracked.json` (an array,
//! order not significant) after every mutation. A periodic refresh copies
//! position and ruin state from the live world onto existing records.

use crate::persistence::{load_json, save_json};
use crate::persistent_id::PersistentId;
use crate::world::{VehicleSnapshot, Vec3, World};
use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use tracing::{error, info, warn};


/// Key pairing id as four integer fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyData {
    pub persistent_id_a: i32,
    pub persistent_id_b: i32,
    pub persistent_id_c: i32,
    pub persistent_id_d: i32,
}

impl From<PersistentId> for KeyData {
    fn from(id: PersistentId) -> Self {
        let [a, b, c, d] = id.parts();
        Self {
            persistent_id_a: a,
            persistent_id_b: b,
            persistent_id_c: c,
            persistent_id_d: d,
        }
    }
}

impl From<KeyData> for PersistentId {
    fn from(key: KeyData) -> Self {
        PersistentId::new(
            key.persistent_id_a,
            key.persistent_id_b,
            key.persistent_id_c,
            key.persistent_id_d,
        )
    }
}

/// One purchased vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedVehicle {
    /// Encoded master key persistent id
    pub vehicle_id: String,
    pub vehicle_class_name: String,
    pub vehicle_display_name: String,
    pub owner_id: String,
    pub owner_name: String,
    pub key_class_name: String,
    pub last_position: Vec3,
    pub last_update_time: DateTime<Utc>,
    pub is_destroyed: bool,
    pub key_data: KeyData,
    /// Keys issued after the purchase
    #[serde(default)]
    pub additional_keys: Vec<KeyData>,
    pub purchase_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub purchase_price: i64,
    #[serde(default)]
    pub trader_name: String,
    #[serde(default)]
    pub trader_zone: String,
    /// Consecutive refreshes in which the vehicle was not seen
    #[serde(default)]
    pub missed_refreshes: u32,
}

/// Entry of `vehicles/purchases.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePurchase {
    pub timestamp: DateTime<Utc>,
    pub vehicle_class_name: String,
    pub vehicle_display_name: String,
    pub owner_id: String,
    pub owner_name: String,
    pub key_class_name: String,
    pub key_data: KeyData,
    pub purchase_price: i64,
    pub trader_name: String,
    pub trader_zone: String,
    pub purchase_position: Vec3,
}

/// Details of a completed vehicle sale
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub owner_id: String,
    pub owner_name: String,
    pub key_class_name: String,
    pub key_id: PersistentId,
    pub price: i64,
    pub trader_name: String,
    pub trader_zone: String,
}

/// Outcome of one refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: usize,
    pub missing: usize,
    pub marked_destroyed: usize,
}

pub struct VehicleTracker {
    tracked_path: PathBuf,
    purchases_path: PathBuf,
    vehicles: DashMap<String, TrackedVehicle>,
    purchases: Mutex<Vec<VehiclePurchase>>,
    /// Serializes writes to `tracked_path`
    write_lock: Mutex<()>,
    loaded: Once,
    missed_refresh_threshold: u32,
}

impl VehicleTracker {
    /// `missed_refresh_threshold` of 0 never marks unseen vehicles destroyed.
    pub fn new(
        tracked_path: impl Into<PathBuf>,
        purchases_path: impl Into<PathBuf>,
        missed_refresh_threshold: u32,
    ) -> Self {
        Self {
            tracked_path: tracked_path.into(),
            purchases_path: purchases_path.into(),
            vehicles: DashMap::new(),
            purchases: Mutex::new(Vec::new()),
            write_lock: Mutex::new(()),
            loaded: Once::new(),
            missed_refresh_threshold,
        }
    }

    pub fn tracked_path(&self) -> &Path {
        &self.tracked_path
    }

    fn ensure_loaded(&self) {
        self.loaded.call_once(|| {
            if let Err(e) = self.load_from_disk() {
                error!(error = %e, path = %self.tracked_path.display(), "Failed to load tracked vehicles");
            }
        });
    }

    fn load_from_disk(&self) -> Result<()> {
        if let Some(records) = load_json::<Vec<TrackedVehicle>>(&self.tracked_path)? {
            for record in records {
                self.vehicles.insert(record.vehicle_id.clone(), record);
            }
            info!(count = self.vehicles.len(), "Loaded tracked vehicles");
        }
        if let Some(purchases) = load_json::<Vec<VehiclePurchase>>(&self.purchases_path)? {
            *self.purchases.lock().unwrap() = purchases;
        }
        Ok(())
    }

    /// Load the snapshot now instead of on first use. Returns the record count.
    pub fn load(&self) -> usize {
        self.ensure_loaded();
        self.vehicles.len()
    }

    fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut records: Vec<TrackedVehicle> =
            self.vehicles.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        save_json(&self.tracked_path, &records)
    }

    /// Insert or replace by id and persist.
    pub fn upsert(&self, record: TrackedVehicle) -> Result<()> {
        self.ensure_loaded();
        self.vehicles.insert(record.vehicle_id.clone(), record);
        self.persist()
    }

    pub fn remove(&self, vehicle_id: &str) -> Result<Option<TrackedVehicle>> {
        self.ensure_loaded();
        let removed = self.vehicles.remove(vehicle_id).map(|(_, record)| record);
        if removed.is_some() {
            info!(vehicle_id = %vehicle_id, "Removed from tracking");
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn get(&self, vehicle_id: &str) -> Option<TrackedVehicle> {
        self.ensure_loaded();
        self.vehicles.get(vehicle_id).map(|r| r.clone())
    }

    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.ensure_loaded();
        self.vehicles.contains_key(vehicle_id)
    }

    pub fn all(&self) -> Vec<TrackedVehicle> {
        self.ensure_loaded();
        self.vehicles.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.ensure_loaded();
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn purchases(&self) -> Vec<VehiclePurchase> {
        self.ensure_loaded();
        self.purchases.lock().unwrap().clone()
    }

    /// Append a purchase record and start tracking the vehicle.
    ///
    /// Returns the tracked vehicle id.
    pub fn record_purchase(&self, purchase: Purchase, vehicle: &VehicleSnapshot) -> Result<String> {
        self.ensure_loaded();
        let now = Utc::now();
        let vehicle_id = purchase.key_id.encode();
        let key_data = KeyData::from(purchase.key_id);

        let entry = VehiclePurchase {
            timestamp: now,
            vehicle_class_name: vehicle.class_name.clone(),
            vehicle_display_name: vehicle.display_name.clone(),
            owner_id: purchase.owner_id.clone(),
            owner_name: purchase.owner_name.clone(),
            key_class_name: purchase.key_class_name.clone(),
            key_data,
            purchase_price: purchase.price,
            trader_name: purchase.trader_name.clone(),
            trader_zone: purchase.trader_zone.clone(),
            purchase_position: vehicle.position,
        };
        {
            let mut purchases = self.purchases.lock().unwrap();
            purchases.push(entry);
            if let Err(e) = save_json(&self.purchases_path, &*purchases) {
                error!(error = %e, path = %self.purchases_path.display(), "Failed to save purchases");
            }
        }

        self.upsert(TrackedVehicle {
            vehicle_id: vehicle_id.clone(),
            vehicle_class_name: vehicle.class_name.clone(),
            vehicle_display_name: vehicle.display_name.clone(),
            owner_id: purchase.owner_id,
            owner_name: purchase.owner_name.clone(),
            key_class_name: purchase.key_class_name,
            last_position: vehicle.position,
            last_update_time: now,
            is_destroyed: false,
            key_data,
            additional_keys: Vec::new(),
            purchase_timestamp: now,
            purchase_price: purchase.price,
            trader_name: purchase.trader_name,
            trader_zone: purchase.trader_zone,
            missed_refreshes: 0,
        })?;

        info!(
            vehicle_id = %vehicle_id,
            class = %vehicle.class_name,
            owner = %purchase.owner_name,
            "Vehicle purchased and tracked"
        );
        Ok(vehicle_id)
    }

    /// Record an extra key issued for a tracked vehicle.
    ///
    /// Returns `false` when the vehicle is not tracked.
    pub fn add_secondary_key(&self, vehicle_id: &str, key: PersistentId) -> Result<bool> {
        self.ensure_loaded();
        match self.vehicles.get_mut(vehicle_id) {
            Some(mut record) => record.additional_keys.push(key.into()),
            None => return Ok(false),
        }
        self.persist()?;
        Ok(true)
    }

    /// Copy position and ruin state from the world onto tracked records.
    ///
    /// Never creates or removes records. A record whose vehicle is absent
    /// for `missed_refresh_threshold` consecutive passes is flagged destroyed.
    pub fn refresh(&self, world: &dyn World) -> Result<RefreshReport> {
        self.ensure_loaded();
        let mut report = RefreshReport::default();
        if self.vehicles.is_empty() {
            return Ok(report);
        }

        let now = Utc::now();
        let mut seen = HashSet::new();
        for vehicle in world.vehicles() {
            let Some(id) = vehicle.persistent_id else {
                continue;
            };
            let vehicle_id = id.encode();
            if let Some(mut record) = self.vehicles.get_mut(&vehicle_id) {
                record.last_position = vehicle.position;
                record.last_update_time = now;
                record.is_destroyed = vehicle.ruined;
                record.missed_refreshes = 0;
                report.updated += 1;
                seen.insert(vehicle_id);
            }
        }

        for mut record in self.vehicles.iter_mut() {
            if seen.contains(record.key()) {
                continue;
            }
            report.missing += 1;
            record.missed_refreshes = record.missed_refreshes.saturating_add(1);
            if self.missed_refresh_threshold > 0
                && record.missed_refreshes >= self.missed_refresh_threshold
                && !record.is_destroyed
            {
                record.is_destroyed = true;
                report.marked_destroyed += 1;
                warn!(
                    vehicle_id = %record.key(),
                    missed = record.missed_refreshes,
                    "Tracked vehicle not seen, marking destroyed"
                );
            }
        }

        self.persist()?;
        Ok(report)
    }
}
