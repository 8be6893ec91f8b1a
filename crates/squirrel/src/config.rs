//! Client configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! changes. Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use squirrel_game::RulesConfig;
use squirrel_protocol::{LobbyId, PlayerId};
use squirrel_tick::FrameConfig;
use squirrel_transport::{ConnectionConfig, DEFAULT_PORT};

use crate::SquirrelError;

/// Everything the client needs to join and play one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Relay host name or address.
    pub host: String,
    pub port: u16,
    pub lobby: LobbyId,
    /// Which squirrel to play, 0 or 1.
    pub player: u8,
    /// House layout file.
    pub layout: PathBuf,
    pub connection: ConnectionConfig,
    pub rules: RulesConfig,
    pub frame: FrameConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            lobby: LobbyId(0),
            player: 0,
            layout: PathBuf::from("room.txt"),
            connection: ConnectionConfig::default(),
            rules: RulesConfig::default(),
            frame: FrameConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SquirrelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SquirrelError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
            .map_err(|e| SquirrelError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> Result<Self, SquirrelError> {
        serde_json::from_str(text).map_err(|e| SquirrelError::Config(e.to_string()))
    }

    /// The local player, if `player` is 0 or 1.
    pub fn player_id(&self) -> Result<PlayerId, SquirrelError> {
        PlayerId::new(self.player).ok_or_else(|| {
            SquirrelError::Config(format!("player must be 0 or 1, got {}", self.player))
        })
    }

    /// Checks the fields that cannot be clamped into range.
    pub fn validate(&self) -> Result<(), SquirrelError> {
        self.player_id()?;
        if self.host.trim().is_empty() {
            return Err(SquirrelError::Config("host is empty".into()));
        }
        if self.port == 0 {
            return Err(SquirrelError::Config("port must not be 0".into()));
        }
        Ok(())
    }
}
