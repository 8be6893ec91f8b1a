//! The per-frame game loop driver.
//!
//! Owns the connection and the game state. The UI (or the headless binary)
//! calls [`GameDriver::tick`] once per frame and forwards key events; it
//! reads [`GameDriver::state`] to render.

use squirrel_game::{ApplyReport, GameState, HouseLayout, Outcome};
use squirrel_protocol::{ClientCommand, Codec, TextCodec};
use squirrel_transport::{Connection, LinkStatus, TcpConnection};

use crate::{ClientConfig, ClientContext, Key, SquirrelError};

/// Runs one client's side of a match over a [`Connection`].
pub struct GameDriver<C: Connection> {
    conn: C,
    codec: TextCodec,
    state: GameState,
}

impl GameDriver<TcpConnection> {
    /// Connects to the relay in `config`, starts the reader, and joins the
    /// lobby.
    ///
    /// # Errors
    /// An invalid config, a connection that cannot be established, or a
    /// failed join. All are fatal for the client.
    pub async fn connect(
        config: &ClientConfig,
        layout: HouseLayout,
    ) -> Result<Self, SquirrelError> {
        config.validate()?;
        let local = config.player_id()?;

        let mut conn =
            TcpConnection::connect(&config.host, config.port, config.connection.clone()).await?;
        conn.start()?;

        let driver = Self::new(conn, GameState::new(config.lobby, local, layout));
        driver.join().await?;
        Ok(driver)
    }
}

impl<C: Connection> GameDriver<C> {
    /// Wraps a started connection. The codec is bound to the state's lobby.
    pub fn new(conn: C, state: GameState) -> Self {
        let codec = TextCodec::new(state.lobby());
        Self { conn, codec, state }
    }

    /// Asks the relay to put this client in its lobby.
    pub async fn join(&self) -> Result<(), SquirrelError> {
        let line = self.codec.encode(&ClientCommand::JoinLobby);
        self.conn.send_all(&line).await?;
        tracing::info!(
            conn = %self.conn.id(),
            lobby = %self.state.lobby(),
            player = %self.state.local_id(),
            "join requested"
        );
        Ok(())
    }

    /// A key went down. One-shot keys act immediately.
    pub async fn key_down(&mut self, ctx: &mut ClientContext, key: Key) {
        ctx.input.press(key);
        if let Some(action) = key.action() {
            let out = self.state.act(&ctx.config.rules, action);
            self.send(&out).await;
        }
    }

    pub fn key_up(&mut self, ctx: &mut ClientContext, key: Key) {
        ctx.input.release(key);
    }

    /// Runs one frame: local movement, received commands, announcements.
    ///
    /// # Errors
    /// [`SquirrelError::LinkLost`] if the reader died before the match
    /// ended. Send failures are logged, not returned.
    pub async fn tick(
        &mut self,
        ctx: &mut ClientContext,
        dt: f32,
    ) -> Result<ApplyReport, SquirrelError> {
        let rules = &ctx.config.rules;

        let mut out = self.state.advance(rules, ctx.input.intent(), dt);
        ctx.input.end_frame();

        // Read before draining: once the reader has failed, everything it
        // received is already queued and this frame's take gets all of it.
        let status = self.conn.status();
        let report = match self.conn.take_complete() {
            Some(block) => self.state.apply_block(&self.codec, &block),
            None => ApplyReport::default(),
        };

        out.extend(self.state.finish_tick());
        self.send(&out).await;

        if let LinkStatus::Failed(reason) = status {
            if !self.state.is_done() {
                tracing::error!(conn = %self.conn.id(), %reason, "relay link lost");
                return Err(SquirrelError::LinkLost(reason));
            }
            tracing::debug!(%reason, "link closed after match end");
        }

        if report.applied + report.rejected > 0 {
            tracing::debug!(applied = report.applied, rejected = report.rejected, "frame applied");
        }
        Ok(report)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Ends the match from this side.
    pub fn quit(&mut self) {
        self.state.finish(Outcome::Quit);
    }

    /// Stops the reader and closes the connection, returning the final
    /// state.
    pub async fn shutdown(self) -> Result<GameState, SquirrelError> {
        let id = self.conn.id();
        self.conn.stop().await?;
        tracing::info!(conn = %id, outcome = ?self.state.outcome(), "client shut down");
        Ok(self.state)
    }

    /// Sends `commands` as one write. A failure is logged and the frame
    /// carries on.
    async fn send(&self, commands: &[ClientCommand]) {
        if commands.is_empty() {
            return;
        }
        let mut buf = Vec::with_capacity(commands.len() * 24);
        for command in commands {
            buf.extend_from_slice(&self.codec.encode(command));
        }
        if let Err(e) = self.conn.send_all(&buf).await {
            tracing::warn!(
                conn = %self.conn.id(),
                error = %e,
                count = commands.len(),
                "send failed"
            );
        }
    }
}
