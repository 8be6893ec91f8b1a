//! Wire protocol for Squirrel.
//!
//! This crate defines what the client and the relay say to each other:
//!
//! - **Types** ([`PlayerId`], [`Position`], [`TrapKind`], [`FoodKind`], ...)
//!   the values carried in protocol fields.
//! - **Commands** ([`ClientCommand`], [`ServerCommand`]) one per line.
//! - **Codec** ([`Codec`] trait, [`TextCodec`]) how commands become
//!   comma-separated lines and back.
//! - **Errors** ([`ProtocolError`]) what can be wrong with a single line.
//!
//! The protocol layer knows nothing about sockets or game rules. It sits
//! between the transport (bytes) and the game state (commands applied).
//!
//! ```text
//! Transport (lines) → Protocol (ServerCommand) → Game (state)
//! ```

mod codec;
mod command;
mod error;
mod types;

pub use codec::{Codec, TextCodec, decode_line, split_lines};
pub use command::{ClientCommand, ServerCommand};
pub use error::ProtocolError;
pub use types::{
    Facing, FoodKind, ItemSource, LobbyId, PlayerId, Position, TrapKind,
};
