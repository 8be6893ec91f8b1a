//! Unified error type for the Squirrel client.

use squirrel_game::GameError;
use squirrel_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum SquirrelError {
    /// Connecting, sending, or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Loading the house, or decoding or applying a command, failed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The relay connection died while the match was still running.
    #[error("lost connection to relay: {0}")]
    LinkLost(String),
}
