//! Headless Squirrel vs Squirrel client.
//!
//! Connects to a relay, joins a lobby, and runs the game loop without a
//! window. Keys come from stdin, whitespace-separated:
//!
//! ```text
//! +w -w        hold / release a movement key (w a s d)
//! space p 1 2 3   search, attack, place a trap
//! q            quit
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use squirrel::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "squirrel-client",
    about = "Play Squirrel vs Squirrel headless, keys on stdin",
    version
)]
struct Cli {
    #[arg(long, env = "SQUIRREL_HOST", help = "Relay host")]
    host: Option<String>,

    #[arg(long, env = "SQUIRREL_PORT", help = "Relay port [default: 3490]")]
    port: Option<u16>,

    #[arg(long, env = "SQUIRREL_LOBBY", help = "Lobby number to join")]
    lobby: Option<u32>,

    #[arg(long, env = "SQUIRREL_PLAYER", help = "Squirrel to play, 0 or 1")]
    player: Option<u8>,

    #[arg(long, value_name = "PATH", help = "House layout file")]
    layout: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        env = "SQUIRREL_CONFIG",
        help = "JSON config file; flags override its values"
    )]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ClientConfig, SquirrelError> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(lobby) = self.lobby {
            config.lobby = LobbyId(lobby);
        }
        if let Some(player) = self.player {
            config.player = player;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        config.validate()?;
        Ok(config)
    }
}

/// One stdin token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Down(Key),
    Up(Key),
    /// Press and release in the same frame.
    Tap(Key),
    Quit,
}

fn parse_token(token: &str) -> Result<Input, String> {
    if token.eq_ignore_ascii_case("q") {
        return Ok(Input::Quit);
    }
    if let Some(name) = token.strip_prefix('+') {
        return name.parse().map(Input::Down);
    }
    if let Some(name) = token.strip_prefix('-') {
        return name.parse().map(Input::Up);
    }
    token.parse().map(Input::Tap)
}

/// Forwards stdin tokens until stdin closes.
async fn read_stdin(tx: mpsc::Sender<Input>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        for token in line.split_whitespace() {
            match parse_token(token) {
                Ok(input) => {
                    if tx.send(input).await.is_err() {
                        return;
                    }
                }
                Err(e) => warn!(token, "ignored: {e}"),
            }
        }
    }
    debug!("stdin closed");
}

async fn run(cli: Cli) -> Result<Option<Outcome>, SquirrelError> {
    let config = cli.into_config()?;
    let layout = HouseLayout::load(&config.layout)?;
    let mut ctx = ClientContext::new(config);

    let mut driver = GameDriver::connect(&ctx.config, layout).await?;
    info!(
        host = %ctx.config.host,
        port = ctx.config.port,
        lobby = %ctx.config.lobby,
        "connected"
    );

    let (tx, mut inputs) = mpsc::channel(64);
    tokio::spawn(read_stdin(tx));
    let mut stdin_open = true;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    let mut clock = FrameClock::new(ctx.config.frame.clone());

    while !driver.is_done() {
        tokio::select! {
            frame = clock.wait_for_frame() => {
                if let Err(e) = driver.tick(&mut ctx, frame.dt_secs()).await {
                    // The link is already gone; stopping only reaps the reader.
                    if let Err(stop) = driver.shutdown().await {
                        debug!(error = %stop, "shutdown after fatal error failed");
                    }
                    return Err(e);
                }
                clock.record_frame_end();
            }
            input = inputs.recv(), if stdin_open => match input {
                Some(Input::Down(key)) => driver.key_down(&mut ctx, key).await,
                Some(Input::Up(key)) => driver.key_up(&mut ctx, key),
                Some(Input::Tap(key)) => {
                    driver.key_down(&mut ctx, key).await;
                    driver.key_up(&mut ctx, key);
                }
                Some(Input::Quit) => driver.quit(),
                None => stdin_open = false,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                info!("interrupted");
                driver.quit();
            }
        }
    }

    let state = driver.shutdown().await?;
    Ok(state.outcome().cloned())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(outcome) => {
            match outcome {
                Some(Outcome::Won { winner }) => println!("squirrel {winner} wins"),
                Some(Outcome::Kicked { reason }) => println!("kicked: {reason}"),
                Some(Outcome::Quit) | None => println!("left the match"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("squirrel-client: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squirrel::protocol::TrapKind;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_token("+w"), Ok(Input::Down(Key::Up)));
        assert_eq!(parse_token("-d"), Ok(Input::Up(Key::Right)));
        assert_eq!(parse_token("space"), Ok(Input::Tap(Key::Search)));
        assert_eq!(parse_token("2"), Ok(Input::Tap(Key::Trap(TrapKind::Acid))));
        assert_eq!(parse_token("Q"), Ok(Input::Quit));
        assert!(parse_token("+x").is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "squirrel-client",
            "--host",
            "relay.local",
            "--lobby",
            "9",
            "--player",
            "1",
        ]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.host, "relay.local");
        assert_eq!(config.lobby, LobbyId(9));
        assert_eq!(config.player, 1);
        assert_eq!(config.port, 3490);
    }

    #[test]
    fn test_bad_player_flag_is_rejected() {
        let cli = Cli::parse_from(["squirrel-client", "--player", "4"]);
        assert!(matches!(cli.into_config(), Err(SquirrelError::Config(_))));
    }
}
