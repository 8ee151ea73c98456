// File layout, TOML configuration and environment overrides
pub mod config;

// Atomic JSON file helpers
pub mod persistence;

// Four-field persistent id codec
pub mod persistent_id;

// Simulation boundary
pub mod world;

// Inventory tree export and path resolution
pub mod inventory;

// Capped per-subject logs
pub mod event_log;

// Request queues and their lifecycle
pub mod queue;

// Handlers for each queue kind
pub mod handlers;

// Vehicle tracking store
pub mod tracking;

// Inventory and online player snapshots
pub mod exporters;

// Interval-driven job runner
pub mod scheduler;

// Service wiring
pub mod bridge;

pub use bridge::Bridge;
