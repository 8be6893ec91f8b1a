//! The match model: players, traps, furniture, and terminal flags.
//!
//! `GameState` is mutated in two places only: [`GameState::apply`] for
//! commands received from the relay, and the local rules in
//! [`crate::rules`] for things the local player does. The renderer reads it
//! through the accessors below once per frame.

use serde::{Deserialize, Serialize};
use squirrel_protocol::{Facing, FoodKind, LobbyId, PlayerId, Position, TrapKind};

use crate::HouseLayout;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Arena width in pixels. Every room has the same size.
pub const ARENA_WIDTH: f32 = 1200.0;

/// Arena height in pixels.
pub const ARENA_HEIGHT: f32 = 800.0;

/// Where players spawn and respawn.
pub const ARENA_CENTRE: Position = Position::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0);

/// Rooms per row of the house.
pub const HOUSE_WIDTH: u32 = 3;

/// Rows of rooms in the house.
pub const HOUSE_HEIGHT: u32 = 2;

/// Total number of rooms.
pub const ROOM_COUNT: u32 = HOUSE_WIDTH * HOUSE_HEIGHT;

/// Size of the shared trap table.
pub const TRAP_SLOTS: usize = 100;

/// Maximum number of furniture records in a house.
pub const FURNITURE_SLOTS: usize = 100;

/// Health at spawn.
pub const START_HEALTH: f32 = 100.0;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One squirrel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Position,
    pub facing: Facing,
    pub room: u32,
    /// One flag per [`FoodKind`], indexed by [`FoodKind::slot`].
    pub inventory: [bool; FoodKind::COUNT],
    pub health: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: ARENA_CENTRE,
            facing: Facing::default(),
            room: 0,
            inventory: [false; FoodKind::COUNT],
            health: START_HEALTH,
        }
    }
}

impl Player {
    /// Back to the centre of room 0 at full health. Facing and inventory
    /// are left alone.
    pub fn respawn(&mut self) {
        self.pos = ARENA_CENTRE;
        self.room = 0;
        self.health = START_HEALTH;
    }

    pub fn holds(&self, food: FoodKind) -> bool {
        self.inventory[food.slot()]
    }

    /// Every food item is held.
    pub fn has_full_inventory(&self) -> bool {
        self.inventory.iter().all(|&held| held)
    }

    /// The food items currently held, in slot order.
    pub fn held_food(&self) -> impl Iterator<Item = FoodKind> + '_ {
        FoodKind::ALL.into_iter().filter(|food| self.holds(*food))
    }
}

// ---------------------------------------------------------------------------
// Traps and furniture
// ---------------------------------------------------------------------------

/// A live trap in the shared trap table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trap {
    pub kind: TrapKind,
    pub owner: PlayerId,
    pub room: u32,
    pub pos: Position,
}

/// The three kinds of furniture food can hide in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FurnitureKind {
    Cabinet,
    Carpet,
    Bookshelf,
}

impl FurnitureKind {
    pub const COUNT: usize = 3;

    /// Layout-file value: 1 cabinet, 2 carpet, 3 bookshelf.
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Cabinet),
            2 => Some(Self::Carpet),
            3 => Some(Self::Bookshelf),
            _ => None,
        }
    }

    /// Index into per-kind tables such as the search areas.
    pub fn index(self) -> usize {
        match self {
            Self::Cabinet => 0,
            Self::Carpet => 1,
            Self::Bookshelf => 2,
        }
    }
}

/// A piece of furniture, placed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Furniture {
    pub kind: FurnitureKind,
    pub room: u32,
    pub food: Option<FoodKind>,
}

/// A circular zone the player must stand in to search a furniture kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub centre: Position,
    pub radius: f32,
}

impl Area {
    pub const fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            centre: Position::new(x, y),
            radius,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.centre.distance(pos) <= self.radius
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a match ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The relay announced a winner.
    Won { winner: PlayerId },
    /// The relay refused or removed this client.
    Kicked { reason: String },
    /// The local user left.
    Quit,
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Everything one client knows about the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) lobby: LobbyId,
    pub(crate) local: PlayerId,
    pub(crate) players: [Player; PlayerId::COUNT],
    /// Fixed length [`TRAP_SLOTS`]; `None` is an empty slot.
    pub(crate) traps: Vec<Option<Trap>>,
    pub(crate) furniture: Vec<Furniture>,
    /// Which of the local player's traps are still available.
    pub(crate) trap_inventory: [bool; TrapKind::COUNT],
    pub(crate) exit_room: u32,
    pub(crate) exit_unlocked: bool,
    /// The local room changed and has not been announced yet.
    pub(crate) room_changed: bool,
    pub(crate) outcome: Option<Outcome>,
}

impl GameState {
    /// A fresh match in `lobby`, played as `local`, in the given house.
    pub fn new(lobby: LobbyId, local: PlayerId, layout: HouseLayout) -> Self {
        Self {
            lobby,
            local,
            players: Default::default(),
            traps: vec![None; TRAP_SLOTS],
            furniture: layout.furniture,
            trap_inventory: [true; TrapKind::COUNT],
            exit_room: layout.exit_room,
            exit_unlocked: false,
            room_changed: false,
            outcome: None,
        }
    }

    pub fn lobby(&self) -> LobbyId {
        self.lobby
    }

    /// The player this client controls.
    pub fn local_id(&self) -> PlayerId {
        self.local
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    pub fn local_player(&self) -> &Player {
        self.player(self.local)
    }

    pub fn opponent(&self) -> &Player {
        self.player(self.local.other())
    }

    pub fn trap(&self, slot: usize) -> Option<&Trap> {
        self.traps.get(slot)?.as_ref()
    }

    /// Live traps with their slot numbers.
    pub fn traps(&self) -> impl Iterator<Item = (usize, &Trap)> + '_ {
        self.traps
            .iter()
            .enumerate()
            .filter_map(|(slot, trap)| trap.as_ref().map(|t| (slot, t)))
    }

    pub fn furniture(&self) -> &[Furniture] {
        &self.furniture
    }

    /// Whether the local player can still place a trap of `kind`.
    pub fn trap_available(&self, kind: TrapKind) -> bool {
        self.trap_inventory[kind.slot()]
    }

    pub fn exit_room(&self) -> u32 {
        self.exit_room
    }

    pub fn exit_unlocked(&self) -> bool {
        self.exit_unlocked
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// The match has ended, for whatever reason.
    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    /// Ends the match locally. An earlier outcome is kept.
    pub fn finish(&mut self, outcome: Outcome) {
        if self.outcome.is_none() {
            tracing::info!(?outcome, "match finished");
            self.outcome = Some(outcome);
        }
    }

    pub(crate) fn local_mut(&mut self) -> &mut Player {
        &mut self.players[self.local.index()]
    }
}
