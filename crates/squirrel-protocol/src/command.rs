//! The commands that travel between a client and the relay.
//!
//! Each protocol line is one command. [`ClientCommand`] is what this client
//! sends, [`ServerCommand`] is what the relay forwards to it (with the lobby
//! field already stripped).

use serde::{Deserialize, Serialize};

use crate::{Facing, FoodKind, ItemSource, PlayerId, Position, TrapKind};

/// A command sent by the client to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientCommand {
    /// Join the lobby the codec is bound to.
    JoinLobby,

    /// Absolute position of `player`.
    Position { player: PlayerId, pos: Position },

    /// `player` moved to `room`.
    Room { player: PlayerId, room: u32 },

    /// `owner` placed a trap where they stand.
    PlaceTrap {
        owner: PlayerId,
        kind: TrapKind,
        room: u32,
        pos: Position,
    },

    /// Trap slot `slot` was triggered and is consumed.
    TrapActivated { slot: usize },

    /// `player` takes `food` from `source`.
    ItemTaken {
        player: PlayerId,
        source: ItemSource,
        food: FoodKind,
    },

    /// Deal `damage` to `target`.
    Attack { target: PlayerId, damage: f32 },

    /// The match is over and `winner` won.
    GameOver { winner: PlayerId },

    /// `player` turned to `facing`.
    Facing { player: PlayerId, facing: Facing },
}

/// A command received from the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerCommand {
    /// `P`: absolute position update.
    Position { player: PlayerId, pos: Position },

    /// `R`: room change.
    Room { player: PlayerId, room: u32 },

    /// `T`: a trap was placed.
    TrapPlaced {
        owner: PlayerId,
        kind: TrapKind,
        room: u32,
        pos: Position,
    },

    /// `A`: trap slot `slot` was triggered.
    TrapActivated { slot: usize },

    /// `I`: `player` received the item in inventory slot `slot`.
    ItemTaken {
        player: PlayerId,
        source: ItemSource,
        slot: usize,
    },

    /// `C`: the receiving client's own player takes `damage`.
    Attacked { damage: f32 },

    /// `O`: the match is over.
    GameOver { winner: PlayerId },

    /// `F`: facing change.
    Facing { player: PlayerId, facing: Facing },

    /// `K`: the relay kicked this client.
    Kicked { reason: String },
}

impl ClientCommand {
    /// The single-letter tag this command is sent with.
    pub fn tag(&self) -> char {
        match self {
            Self::JoinLobby => 'J',
            Self::Position { .. } => 'P',
            Self::Room { .. } => 'R',
            Self::PlaceTrap { .. } => 'T',
            Self::TrapActivated { .. } => 'A',
            Self::ItemTaken { .. } => 'I',
            Self::Attack { .. } => 'C',
            Self::GameOver { .. } => 'O',
            Self::Facing { .. } => 'F',
        }
    }
}

impl ServerCommand {
    /// The single-letter tag this command arrived with.
    pub fn tag(&self) -> char {
        match self {
            Self::Position { .. } => 'P',
            Self::Room { .. } => 'R',
            Self::TrapPlaced { .. } => 'T',
            Self::TrapActivated { .. } => 'A',
            Self::ItemTaken { .. } => 'I',
            Self::Attacked { .. } => 'C',
            Self::GameOver { .. } => 'O',
            Self::Facing { .. } => 'F',
            Self::Kicked { .. } => 'K',
        }
    }
}
