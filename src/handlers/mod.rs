//! Request handlers for every queue kind.
//!
//! Each handler validates one payload against the live [`World`] and applies
//! its effect. Failures come back as [`Failure`] values; the queue processor
//! turns them into a `failed` status.

use crate::queue::Failure;
use crate::world::{PlayerSnapshot, World};

pub mod command;
pub mod item_delete;
pub mod item_grant;
pub mod key_grant;
pub mod player_command;
pub mod vehicle_delete;

pub use command::{ActionContext, ActionRegistry, CommandHandler, CommandRequest};
pub use item_delete::{ItemDeleteHandler, ItemDeleteRequest};
pub use item_grant::{ItemGrantHandler, ItemGrantRequest};
pub use key_grant::{KeyGrantHandler, KeyGrantRequest};
pub use player_command::{PlayerCommandHandler, PlayerCommandRequest};
pub use vehicle_delete::{VehicleDeleteHandler, VehicleDeleteRequest};


/// Popup title used for admin effects on a player
pub(crate) const ADMIN_MESSAGE: &str = "ADMIN MESSAGE";

/// Require a non-empty player id naming an online player.
pub(crate) fn online_player(world: &dyn World, player_id: &str) -> Result<PlayerSnapshot, Failure> {
    if player_id.trim().is_empty() {
        return Err(Failure::missing("MISSING_PLAYER_ID", "playerId is required"));
    }
    world.find_player(player_id).ok_or_else(|| {
        Failure::not_found(
            "PLAYER_NOT_FOUND",
            format!("player {} is not online", player_id),
        )
    })
}

/// `" x3"` for counts above one, empty otherwise
pub(crate) fn count_suffix(quantity: i64) -> String {
    if quantity > 1 {
        format!(" x{}", quantity)
    } else {
        String::new()
    }
}
