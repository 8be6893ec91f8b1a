//! Game state for Squirrel.
//!
//! - [`GameState`] is the per-match model the renderer reads.
//! - [`GameState::apply`] / [`GameState::apply_block`] dispatch commands
//!   received from the relay.
//! - [`GameState::advance`], [`GameState::act`], and
//!   [`GameState::finish_tick`] run the local player's rules and return the
//!   commands to send.
//! - [`HouseLayout`] loads furniture placement from a layout file.

mod apply;
mod config;
mod error;
mod layout;
mod rules;
mod state;

pub use apply::ApplyReport;
pub use config::RulesConfig;
pub use error::GameError;
pub use layout::HouseLayout;
pub use rules::{Action, MoveIntent};
pub use state::{
    ARENA_CENTRE, ARENA_HEIGHT, ARENA_WIDTH, Area, FURNITURE_SLOTS, Furniture, FurnitureKind,
    GameState, HOUSE_HEIGHT, HOUSE_WIDTH, Outcome, Player, ROOM_COUNT, START_HEALTH, TRAP_SLOTS,
    Trap,
};
