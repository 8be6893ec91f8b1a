//! Error types for the game layer.

use squirrel_protocol::ProtocolError;

/// Errors raised while loading a house or applying a command.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The line did not decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// `R` or `T` named a room the house does not have.
    #[error("room {room} out of range ({count} rooms)")]
    RoomOutOfRange { room: u32, count: u32 },

    /// `A` named a trap slot past the end of the trap table.
    #[error("trap slot {slot} out of range (max {max})")]
    TrapSlotOutOfRange { slot: usize, max: usize },

    /// `I` named furniture that the house does not have.
    #[error("furniture {index} out of range ({count} loaded)")]
    FurnitureOutOfRange { index: usize, count: usize },

    /// `I` named an inventory slot past the food table.
    #[error("inventory slot {slot} out of range")]
    InventorySlotOutOfRange { slot: usize },

    /// A house layout line is malformed.
    #[error("layout line {line}: {msg}")]
    Layout { line: usize, msg: String },

    /// The house layout file could not be read.
    #[error("failed to read layout: {0}")]
    Io(#[from] std::io::Error),
}
