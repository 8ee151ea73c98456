pub mod paths;
pub mod runtime;
pub use paths::BridgePaths;
pub use runtime::RuntimeOverrides;

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Complete bridge configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Profile directory that holds every exchanged file
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub queues: QueueConfig,
    #[serde(default)]
    pub exports: ExportConfig,
    #[serde(default)]
    pub logs: LogConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub commands: CommandConfig,
}

fn default_root() -> PathBuf {
    PathBuf::from("profile/SST")
}

/// Poll intervals and result retention for the request queues
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_fast_poll")]
    pub player_commands_seconds: u64,
    #[serde(default = "default_slow_poll")]
    pub item_grants_seconds: u64,
    #[serde(default = "default_slow_poll")]
    pub item_deletes_seconds: u64,
    /// Shared by key generation and vehicle deletion
    #[serde(default = "default_slow_poll")]
    pub vehicle_requests_seconds: u64,
    #[serde(default = "default_fast_poll")]
    pub command_seconds: u64,
    /// Name of the generic command queue (`api/<name>_queue.json`)
    #[serde(default = "default_command_queue_name")]
    pub command_queue_name: String,
    /// Maximum entries kept in every results file
    #[serde(default = "default_results_cap")]
    pub results_cap: usize,
}

fn default_fast_poll() -> u64 {
    2
}

fn default_slow_poll() -> u64 {
    5
}

fn default_command_queue_name() -> String {
    "command".to_string()
}

fn default_results_cap() -> usize {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            player_commands_seconds: default_fast_poll(),
            item_grants_seconds: default_slow_poll(),
            item_deletes_seconds: default_slow_poll(),
            vehicle_requests_seconds: default_slow_poll(),
            command_seconds: default_fast_poll(),
            command_queue_name: default_command_queue_name(),
            results_cap: default_results_cap(),
        }
    }
}

/// Snapshot exporters
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_inventory_interval")]
    pub inventory_seconds: u64,
    #[serde(default = "default_inventory_initial_delay")]
    pub inventory_initial_delay_seconds: u64,
    #[serde(default = "default_slow_poll")]
    pub online_players_seconds: u64,
    #[serde(default = "default_fast_poll")]
    pub online_players_initial_delay_seconds: u64,
}

fn default_inventory_interval() -> u64 {
    10
}

fn default_inventory_initial_delay() -> u64 {
    5
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            inventory_seconds: default_inventory_interval(),
            inventory_initial_delay_seconds: default_inventory_initial_delay(),
            online_players_seconds: default_slow_poll(),
            online_players_initial_delay_seconds: default_fast_poll(),
        }
    }
}

/// Per-subject event log caps
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_inventory_cap")]
    pub inventory_cap: usize,
    #[serde(default = "default_life_cap")]
    pub life_cap: usize,
    #[serde(default = "default_trade_cap")]
    pub trade_cap: usize,
}

fn default_inventory_cap() -> usize {
    100
}

fn default_life_cap() -> usize {
    50
}

fn default_trade_cap() -> usize {
    500
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            inventory_cap: default_inventory_cap(),
            life_cap: default_life_cap(),
            trade_cap: default_trade_cap(),
        }
    }
}

/// Vehicle tracking store
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_seconds: u64,
    /// Consecutive refreshes a vehicle may be missing before it is marked
    /// destroyed. 0 disables the rule.
    #[serde(default = "default_missed_refresh_threshold")]
    pub missed_refresh_threshold: u32,
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_missed_refresh_threshold() -> u32 {
    3
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            refresh_seconds: default_refresh_interval(),
            missed_refresh_threshold: default_missed_refresh_threshold(),
        }
    }
}

/// Limits applied by request handlers
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// Teleport targets must satisfy `0 <= x, z <= world_extent`
    #[serde(default = "default_world_extent")]
    pub world_extent: f32,
    #[serde(default = "default_key_class")]
    pub default_key_class: String,
}

fn default_world_extent() -> f32 {
    20000.0
}

fn default_key_class() -> String {
    "ExpansionCarKey".to_string()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            world_extent: default_world_extent(),
            default_key_class: default_key_class(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            queues: QueueConfig::default(),
            exports: ExportConfig::default(),
            logs: LogConfig::default(),
            tracking: TrackingConfig::default(),
            commands: CommandConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn paths(&self) -> BridgePaths {
        BridgePaths::new(&self.root)
    }
}

/// Seconds to `Duration`, never zero so intervals stay valid
pub fn seconds(value: u64) -> Duration {
    Duration::from_secs(value.max(1))
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: BridgeConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.root, PathBuf::from("profile/SST"));
        assert_eq!(config.queues.player_commands_seconds, 2);
        assert_eq!(config.queues.item_grants_seconds, 5);
        assert_eq!(config.queues.results_cap, 100);
        assert_eq!(config.exports.inventory_seconds, 10);
        assert_eq!(config.logs.inventory_cap, 100);
        assert_eq!(config.logs.life_cap, 50);
        assert_eq!(config.logs.trade_cap, 500);
        assert_eq!(config.tracking.refresh_seconds, 60);
        assert_eq!(config.commands.default_key_class, "ExpansionCarKey");
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            root = "/srv/dayz/profiles/SST"

            [queues]
            player_commands_seconds = 1
            item_grants_seconds = 3
            command_queue_name = "template"
            results_cap = 25

            [logs]
            trade_cap = 1000

            [tracking]
            refresh_seconds = 30
            missed_refresh_threshold = 0

            [commands]
            world_extent = 15360.0
        "#;

        let config: BridgeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/dayz/profiles/SST"));
        assert_eq!(config.queues.player_commands_seconds, 1);
        assert_eq!(config.queues.item_grants_seconds, 3);
        assert_eq!(config.queues.item_deletes_seconds, 5);
        assert_eq!(config.queues.command_queue_name, "template");
        assert_eq!(config.queues.results_cap, 25);
        assert_eq!(config.logs.trade_cap, 1000);
        assert_eq!(config.logs.life_cap, 50);
        assert_eq!(config.tracking.refresh_seconds, 30);
        assert_eq!(config.tracking.missed_refresh_threshold, 0);
        assert_eq!(config.commands.world_extent, 15360.0);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections use defaults
        let toml = r#"
            [exports]
            inventory_seconds = 20
        "#;

        let config: BridgeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.exports.inventory_seconds, 20);
        assert_eq!(config.exports.inventory_initial_delay_seconds, 5);
        assert_eq!(config.queues.results_cap, 100);
    }

    #[test]
    fn test_seconds_never_zero() {
        assert_eq!(seconds(0), Duration::from_secs(1));
        assert_eq!(seconds(5), Duration::from_secs(5));
    }
}
