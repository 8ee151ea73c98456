//! Service wiring.
//!
//! [`Bridge`] constructs every service once, shares the [`World`] between
//! them and registers each periodic job with the [`PollScheduler`].

use crate::config::{seconds, BridgeConfig, BridgePaths};
use crate::event_log::{InventoryEventLogger, LifeEventLogger, TradeLogger};
use crate::exporters::{InventoryExporter, OnlinePlayerTracker};
use crate::handlers::{
    ActionRegistry, CommandHandler, ItemDeleteHandler, ItemGrantHandler, KeyGrantHandler,
    PlayerCommandHandler, VehicleDeleteHandler,
};
use crate::queue::QueueProcessor;
use crate::scheduler::{FnJob, PollJob, PollScheduler, SchedulerHandle};
use crate::tracking::VehicleTracker;
use crate::world::{PlayerSnapshot, World};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// A job plus its `(interval, initial delay)`
pub struct JobSpec {
    pub job: Arc<dyn PollJob>,
    pub every: Duration,
    pub initial_delay: Duration,
}

pub struct Bridge {
    config: BridgeConfig,
    paths: BridgePaths,
    world: Arc<dyn World>,
    tracker: Arc<VehicleTracker>,
    inventory_exporter: Arc<InventoryExporter>,
    online_players: Arc<OnlinePlayerTracker>,
    inventory_events: Arc<InventoryEventLogger>,
    life_events: Arc<LifeEventLogger>,
    trades: Arc<TradeLogger>,
    item_grants: Arc<QueueProcessor<ItemGrantHandler>>,
    item_deletes: Arc<QueueProcessor<ItemDeleteHandler>>,
    player_commands: Arc<QueueProcessor<PlayerCommandHandler>>,
    key_grants: Arc<QueueProcessor<KeyGrantHandler>>,
    vehicle_delete: Arc<QueueProcessor<VehicleDeleteHandler>>,
    commands: Arc<QueueProcessor<CommandHandler>>,
}

impl Bridge {
    pub fn new(config: BridgeConfig, world: Arc<dyn World>) -> Self {
        Self::with_actions(config, world, |_| {})
    }

    /// Build the bridge, letting the caller add generic command actions on
    /// top of the built-in ones.
    pub fn with_actions(
        config: BridgeConfig,
        world: Arc<dyn World>,
        extend: impl FnOnce(&mut ActionRegistry),
    ) -> Self {
        let paths = config.paths();
        let cap = config.queues.results_cap;

        let tracker = Arc::new(VehicleTracker::new(
            paths.tracked_vehicles(),
            paths.purchases(),
            config.tracking.missed_refresh_threshold,
        ));
        let inventory_exporter = Arc::new(InventoryExporter::new(
            Arc::clone(&world),
            paths.inventories_dir(),
        ));
        let online_players = Arc::new(OnlinePlayerTracker::new(
            Arc::clone(&world),
            paths.online_players(),
        ));

        let mut registry = ActionRegistry::with_defaults(Arc::clone(&inventory_exporter));
        extend(&mut registry);
        let command_name = config.queues.command_queue_name.clone();

        Self {
            item_grants: Arc::new(QueueProcessor::new(
                paths.item_grants(),
                paths.item_grants_results(),
                cap,
                ItemGrantHandler::new(Arc::clone(&world)),
            )),
            item_deletes: Arc::new(QueueProcessor::new(
                paths.item_deletes(),
                paths.item_deletes_results(),
                cap,
                ItemDeleteHandler::new(Arc::clone(&world)),
            )),
            player_commands: Arc::new(QueueProcessor::new(
                paths.player_commands(),
                paths.player_commands_results(),
                cap,
                PlayerCommandHandler::new(Arc::clone(&world), config.commands.world_extent),
            )),
            key_grants: Arc::new(QueueProcessor::new(
                paths.key_grants(),
                paths.key_grants_results(),
                cap,
                KeyGrantHandler::new(
                    Arc::clone(&world),
                    Arc::clone(&tracker),
                    &config.commands.default_key_class,
                ),
            )),
            vehicle_delete: Arc::new(QueueProcessor::new(
                paths.vehicle_delete(),
                paths.vehicle_delete_results(),
                cap,
                VehicleDeleteHandler::new(Arc::clone(&world), Arc::clone(&tracker)),
            )),
            commands: Arc::new(QueueProcessor::new(
                paths.command_queue(&command_name),
                paths.command_results(&command_name),
                cap,
                CommandHandler::new(&command_name, Arc::clone(&world), registry),
            )),
            inventory_events: Arc::new(InventoryEventLogger::new(
                paths.events_dir(),
                config.logs.inventory_cap,
            )),
            life_events: Arc::new(LifeEventLogger::new(
                paths.life_events_dir(),
                config.logs.life_cap,
            )),
            trades: Arc::new(TradeLogger::new(paths.trades_dir(), config.logs.trade_cap)),
            tracker,
            inventory_exporter,
            online_players,
            world,
            paths,
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn paths(&self) -> &BridgePaths {
        &self.paths
    }

    pub fn tracker(&self) -> &Arc<VehicleTracker> {
        &self.tracker
    }

    pub fn inventory_exporter(&self) -> &Arc<InventoryExporter> {
        &self.inventory_exporter
    }

    pub fn online_players(&self) -> &Arc<OnlinePlayerTracker> {
        &self.online_players
    }

    pub fn inventory_events(&self) -> &Arc<InventoryEventLogger> {
        &self.inventory_events
    }

    pub fn life_events(&self) -> &Arc<LifeEventLogger> {
        &self.life_events
    }

    pub fn trades(&self) -> &Arc<TradeLogger> {
        &self.trades
    }

    /// Create the directory layout and load the tracking snapshot.
    pub fn prepare(&self) -> Result<()> {
        self.paths.ensure_dirs()?;
        let tracked = self.tracker.load();
        info!(
            root = %self.paths.root().display(),
            tracked_vehicles = tracked,
            "Bridge prepared"
        );
        Ok(())
    }

    /// Connect hook: life log plus online roster
    pub fn player_connected(&self, player: &PlayerSnapshot) {
        self.life_events.log_connect(player);
        self.online_players.player_connected(player);
    }

    /// Disconnect hook: life log plus online roster
    pub fn player_disconnected(&self, player: &PlayerSnapshot) {
        self.life_events.log_disconnect(player);
        self.online_players.player_disconnected(&player.id);
    }

    /// Every periodic job with its configured timing.
    pub fn jobs(&self) -> Vec<JobSpec> {
        let queues = &self.config.queues;
        let exports = &self.config.exports;
        let none = Duration::ZERO;

        let tracker = Arc::clone(&self.tracker);
        let world = Arc::clone(&self.world);
        let refresh = FnJob::new("vehicle_tracking", move || {
            let report = tracker.refresh(world.as_ref())?;
            debug!(
                updated = report.updated,
                missing = report.missing,
                marked_destroyed = report.marked_destroyed,
                "Tracking refresh complete"
            );
            Ok(())
        });

        vec![
            JobSpec {
                job: self.player_commands.clone(),
                every: seconds(queues.player_commands_seconds),
                initial_delay: seconds(queues.player_commands_seconds),
            },
            JobSpec {
                job: self.commands.clone(),
                every: seconds(queues.command_seconds),
                initial_delay: seconds(queues.command_seconds),
            },
            JobSpec {
                job: self.item_grants.clone(),
                every: seconds(queues.item_grants_seconds),
                initial_delay: seconds(queues.item_grants_seconds),
            },
            JobSpec {
                job: self.item_deletes.clone(),
                every: seconds(queues.item_deletes_seconds),
                initial_delay: seconds(queues.item_deletes_seconds),
            },
            JobSpec {
                job: self.key_grants.clone(),
                every: seconds(queues.vehicle_requests_seconds),
                initial_delay: seconds(queues.vehicle_requests_seconds),
            },
            JobSpec {
                job: self.vehicle_delete.clone(),
                every: seconds(queues.vehicle_requests_seconds),
                initial_delay: seconds(queues.vehicle_requests_seconds),
            },
            JobSpec {
                job: self.inventory_exporter.clone(),
                every: seconds(exports.inventory_seconds),
                initial_delay: Duration::from_secs(exports.inventory_initial_delay_seconds),
            },
            JobSpec {
                job: self.online_players.clone(),
                every: seconds(exports.online_players_seconds),
                initial_delay: Duration::from_secs(exports.online_players_initial_delay_seconds),
            },
            JobSpec {
                job: Arc::new(refresh),
                every: seconds(self.config.tracking.refresh_seconds),
                initial_delay: none,
            },
        ]
    }

    /// Run every job once, in registration order.
    pub fn poll_once(&self) {
        for spec in self.jobs() {
            if let Err(e) = spec.job.poll() {
                error!(job = %spec.job.name(), error = %e, "Poll job failed");
            }
        }
    }

    pub fn scheduler(&self) -> PollScheduler {
        let mut scheduler = PollScheduler::new();
        for spec in self.jobs() {
            scheduler.add(spec.job, spec.every, spec.initial_delay);
        }
        scheduler
    }

    /// Prepare and start polling on the current runtime.
    pub fn start(&self) -> Result<SchedulerHandle> {
        self.prepare()?;
        let scheduler = self.scheduler();
        info!(jobs = scheduler.len(), "Starting bridge");
        Ok(scheduler.start())
    }
}
