//! # Squirrel
//!
//! Client for Squirrel vs Squirrel, a two-player game synchronised through
//! a relay server over a line-based TCP protocol.
//!
//! This crate ties the layers together:
//!
//! ```text
//! squirrel-transport  socket, reader task, framed queue
//! squirrel-protocol   commands and the line codec
//! squirrel-game       game state, dispatch, local rules
//! squirrel-tick       frame clock
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use squirrel::prelude::*;
//!
//! # async fn run() -> Result<(), SquirrelError> {
//! let mut ctx = ClientContext::new(ClientConfig::default());
//! let layout = HouseLayout::load(&ctx.config.layout)?;
//! let mut driver = GameDriver::connect(&ctx.config, layout).await?;
//! let mut clock = FrameClock::new(ctx.config.frame.clone());
//!
//! while !driver.is_done() {
//!     let frame = clock.wait_for_frame().await;
//!     driver.tick(&mut ctx, frame.dt_secs()).await?;
//!     clock.record_frame_end();
//! }
//! driver.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod context;
mod driver;
mod error;

pub use config::ClientConfig;
pub use context::{ClientContext, InputState, Key};
pub use driver::GameDriver;
pub use error::SquirrelError;

pub use squirrel_game as game;
pub use squirrel_protocol as protocol;
pub use squirrel_tick as tick;
pub use squirrel_transport as transport;

pub mod prelude {
    pub use crate::{ClientConfig, ClientContext, GameDriver, InputState, Key, SquirrelError};
    pub use squirrel_game::{GameState, HouseLayout, Outcome, RulesConfig};
    pub use squirrel_protocol::{LobbyId, PlayerId};
    pub use squirrel_tick::{FrameClock, FrameConfig};
    pub use squirrel_transport::{Connection, ConnectionConfig, TcpConnection};
}
