use super::{BoundedLog, SubjectLog};
use crate::world::{PlayerSnapshot, Vec3};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeEventType {
    Purchase,
    Sale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: TradeEventType,
    pub player_name: String,
    pub player_id: String,
    pub item_class_name: String,
    pub item_display_name: String,
    pub quantity: i64,
    pub price: i64,
    pub trader_name: String,
    pub trader_zone: String,
    pub trader_position: Vec3,
    pub player_position: Vec3,
}

/// Trade history with lifetime totals.
///
/// Totals keep counting after old trades are evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLog {
    pub player_name: String,
    pub player_id: String,
    #[serde(default)]
    pub total_purchases: i64,
    #[serde(default)]
    pub total_sales: i64,
    #[serde(default)]
    pub total_spent: i64,
    #[serde(default)]
    pub total_earned: i64,
    #[serde(default)]
    pub trades: Vec<TradeEvent>,
}

impl SubjectLog for TradeLog {
    type Entry = TradeEvent;

    fn create(subject_id: &str, subject_name: &str) -> Self {
        Self {
            player_name: subject_name.to_string(),
            player_id: subject_id.to_string(),
            total_purchases: 0,
            total_sales: 0,
            total_spent: 0,
            total_earned: 0,
            trades: Vec::new(),
        }
    }

    fn entries(&self) -> &[TradeEvent] {
        &self.trades
    }

    fn entries_mut(&mut self) -> &mut Vec<TradeEvent> {
        &mut self.trades
    }

    fn record(&mut self, entry: &TradeEvent) {
        match entry.event_type {
            TradeEventType::Purchase => {
                self.total_purchases += entry.quantity;
                self.total_spent += entry.price;
            }
            TradeEventType::Sale => {
                self.total_sales += entry.quantity;
                self.total_earned += entry.price;
            }
        }
    }
}

/// Trader taking part in a trade
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trader {
    pub name: String,
    pub zone: String,
    pub position: Vec3,
}

/// Item side of a trade
#[derive(Debug, Clone, PartialEq)]
pub struct TradedItem {
    pub class_name: String,
    pub display_name: String,
    pub quantity: i64,
    pub price: i64,
}

/// Per-player trade log (`trades/<id>_trades.json`)
pub struct TradeLogger {
    log: BoundedLog<TradeLog>,
}

impl TradeLogger {
    pub fn new(dir: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            log: BoundedLog::per_subject(dir, "_trades.json", cap),
        }
    }

    pub fn log_trade(
        &self,
        event_type: TradeEventType,
        player: &PlayerSnapshot,
        item: &TradedItem,
        trader: &Trader,
    ) {
        let event = TradeEvent {
            timestamp: Utc::now(),
            event_type,
            player_name: player.name.clone(),
            player_id: player.id.clone(),
            item_class_name: item.class_name.clone(),
            item_display_name: item.display_name.clone(),
            quantity: item.quantity,
            price: item.price,
            trader_name: trader.name.clone(),
            trader_zone: trader.zone.clone(),
            trader_position: trader.position,
            player_position: player.position,
        };
        self.log.append(&player.id, &player.name, event);

        info!(
            event = ?event_type,
            player_id = %player.id,
            item = %item.display_name,
            quantity = item.quantity,
            price = item.price,
            "Trade"
        );
    }

    pub fn log_purchase(&self, player: &PlayerSnapshot, item: &TradedItem, trader: &Trader) {
        self.log_trade(TradeEventType::Purchase, player, item, trader);
    }

    pub fn log_sale(&self, player: &PlayerSnapshot, item: &TradedItem, trader: &Trader) {
        self.log_trade(TradeEventType::Sale, player, item, trader);
    }

    pub fn trade_log(&self, player_id: &str) -> Option<TradeLog> {
        self.log.get(player_id)
    }
}
