//! Periodic snapshots of live state written for the management process.

pub mod inventory;
pub mod online;

pub use inventory::{InventoryDocument, InventoryExporter, PlayerInventory};
pub use online::{OnlinePlayer, OnlinePlayerTracker, OnlinePlayersDocument};
