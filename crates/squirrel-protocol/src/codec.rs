//! Line codec: renders [`ClientCommand`]s and parses [`ServerCommand`]s.
//!
//! Every command is one ASCII line of comma-separated fields ending in
//! `\n`. Outbound lines start with the lobby id so the relay can route
//! them; the relay strips it before forwarding, so inbound lines start with
//! the tag.
//!
//! ```text
//! out: 3,P,0,12.50,34.00\n     in: P,0,12.50,34.00\n
//! out: J,3\n                   in: K,The lobby is full.\n
//! ```
//!
//! Decoding is tokenizer-based: split on `,`, dispatch on the tag, then
//! parse the exact number of fields that tag expects. Anything else is a
//! [`ProtocolError`] for that line alone.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::{
    ClientCommand, Facing, FoodKind, ItemSource, LobbyId, PlayerId, Position,
    ProtocolError, ServerCommand, TrapKind,
};

/// Converts commands to and from wire lines.
pub trait Codec: Send + Sync + 'static {
    /// Renders one outbound command as exactly one `\n`-terminated line.
    fn encode(&self, command: &ClientCommand) -> Vec<u8>;

    /// Parses one inbound line (with or without its terminator).
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the line matches no command.
    fn decode(&self, line: &str) -> Result<ServerCommand, ProtocolError>;
}

/// The comma-separated text codec spoken by the relay.
///
/// Bound to one lobby, which it prefixes to every outbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCodec {
    lobby: LobbyId,
}

impl TextCodec {
    pub fn new(lobby: LobbyId) -> Self {
        Self { lobby }
    }

    pub fn lobby(&self) -> LobbyId {
        self.lobby
    }

    /// Renders `command` as a line, terminator included.
    ///
    /// Coordinates and damage use two decimals. The join line is the one
    /// line without a lobby prefix: the relay handles it before any lobby
    /// exists, keyed on its first field.
    pub fn line(&self, command: &ClientCommand) -> String {
        let lobby = self.lobby;
        let mut out = String::with_capacity(32);
        // Writing into a String cannot fail.
        let _ = match command {
            ClientCommand::JoinLobby => write!(out, "J,{lobby}"),
            ClientCommand::Position { player, pos } => {
                write!(out, "{lobby},P,{player},{:.2},{:.2}", pos.x, pos.y)
            }
            ClientCommand::Room { player, room } => {
                write!(out, "{lobby},R,{player},{room}")
            }
            ClientCommand::PlaceTrap {
                owner,
                kind,
                room,
                pos,
            } => write!(
                out,
                "{lobby},T,{owner},{},{room},{:.2},{:.2}",
                kind.wire(),
                pos.x,
                pos.y
            ),
            ClientCommand::TrapActivated { slot } => {
                write!(out, "{lobby},A,{slot}")
            }
            ClientCommand::ItemTaken {
                player,
                source,
                food,
            } => {
                let source: i64 = match source {
                    ItemSource::Furniture(index) => *index as i64,
                    ItemSource::Player => -1,
                };
                write!(out, "{lobby},I,{player},{source},{}", food.wire())
            }
            ClientCommand::Attack { target, damage } => {
                write!(out, "{lobby},C,{target},{damage:.2}")
            }
            ClientCommand::GameOver { winner } => {
                write!(out, "{lobby},O,{winner}")
            }
            ClientCommand::Facing { player, facing } => {
                write!(out, "{lobby},F,{player},{}", facing.wire())
            }
        };
        out.push('\n');
        out
    }
}

impl Codec for TextCodec {
    fn encode(&self, command: &ClientCommand) -> Vec<u8> {
        self.line(command).into_bytes()
    }

    fn decode(&self, line: &str) -> Result<ServerCommand, ProtocolError> {
        decode_line(line)
    }
}

/// Splits a block of received text into its non-empty lines.
///
/// Trailing `\r` and NUL padding are dropped, as are blank lines.
pub fn split_lines(block: &str) -> impl Iterator<Item = &str> {
    block
        .split('\n')
        .map(|line| line.trim_matches(|c| c == '\r' || c == '\0'))
        .filter(|line| !line.is_empty())
}

/// Parses one inbound line into a [`ServerCommand`].
pub fn decode_line(line: &str) -> Result<ServerCommand, ProtocolError> {
    let line = line.trim_matches(|c| c == '\r' || c == '\n' || c == '\0');
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }

    let (tag, rest) = match line.split_once(',') {
        Some((tag, rest)) => (tag, Some(rest)),
        None => (line, None),
    };

    match tag {
        "P" => {
            let [pid, x, y] = fields('P', rest)?;
            Ok(ServerCommand::Position {
                player: player('P', pid)?,
                pos: Position::new(float('P', "x", x)?, float('P', "y", y)?),
            })
        }
        "R" => {
            let [pid, room] = fields('R', rest)?;
            Ok(ServerCommand::Room {
                player: player('R', pid)?,
                room: number('R', "room", room)?,
            })
        }
        "T" => {
            let [owner, kind, room, x, y] = fields('T', rest)?;
            Ok(ServerCommand::TrapPlaced {
                owner: player('T', owner)?,
                kind: number('T', "kind", kind)
                    .ok()
                    .and_then(TrapKind::from_wire)
                    .ok_or_else(|| invalid('T', "kind", kind))?,
                room: number('T', "room", room)?,
                pos: Position::new(float('T', "x", x)?, float('T', "y", y)?),
            })
        }
        "A" => {
            let [slot] = fields('A', rest)?;
            Ok(ServerCommand::TrapActivated {
                slot: number('A', "slot", slot)?,
            })
        }
        "I" => {
            let [pid, source, slot] = fields('I', rest)?;
            let source = match number::<i64>('I', "furniture", source)? {
                -1 => ItemSource::Player,
                index if index >= 0 => ItemSource::Furniture(index as usize),
                _ => return Err(invalid('I', "furniture", source)),
            };
            let item: usize = number('I', "item", slot)?;
            if item >= FoodKind::COUNT {
                return Err(invalid('I', "item", slot));
            }
            Ok(ServerCommand::ItemTaken {
                player: player('I', pid)?,
                source,
                slot: item,
            })
        }
        "C" => {
            let [damage] = fields('C', rest)?;
            Ok(ServerCommand::Attacked {
                damage: float('C', "damage", damage)?,
            })
        }
        "O" => {
            let [winner] = fields('O', rest)?;
            Ok(ServerCommand::GameOver {
                winner: player('O', winner)?,
            })
        }
        "F" => {
            let [pid, facing] = fields('F', rest)?;
            Ok(ServerCommand::Facing {
                player: player('F', pid)?,
                facing: number('F', "facing", facing)
                    .ok()
                    .and_then(Facing::from_wire)
                    .ok_or_else(|| invalid('F', "facing", facing))?,
            })
        }
        // The reason is free text and may itself contain commas.
        "K" => match rest {
            Some(reason) if !reason.is_empty() => Ok(ServerCommand::Kicked {
                reason: reason.to_string(),
            }),
            Some(reason) => Err(invalid('K', "reason", reason)),
            None => Err(ProtocolError::FieldCount {
                tag: 'K',
                expected: 1,
                found: 0,
            }),
        },
        other => Err(ProtocolError::UnknownTag(other.to_string())),
    }
}

/// Splits the fields after the tag, requiring exactly `N` of them.
fn fields<const N: usize>(
    tag: char,
    rest: Option<&str>,
) -> Result<[&str; N], ProtocolError> {
    let items: Vec<&str> = rest.map(|r| r.split(',').collect()).unwrap_or_default();
    <[&str; N]>::try_from(items.as_slice()).map_err(|_| ProtocolError::FieldCount {
        tag,
        expected: N,
        found: items.len(),
    })
}

fn invalid(tag: char, field: &'static str, value: &str) -> ProtocolError {
    ProtocolError::InvalidField {
        tag,
        field,
        value: value.to_string(),
    }
}

fn number<T: FromStr>(
    tag: char,
    field: &'static str,
    value: &str,
) -> Result<T, ProtocolError> {
    value.trim().parse().map_err(|_| invalid(tag, field, value))
}

fn float(tag: char, field: &'static str, value: &str) -> Result<f32, ProtocolError> {
    let parsed: f32 = number(tag, field, value)?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(invalid(tag, field, value))
    }
}

fn player(tag: char, value: &str) -> Result<PlayerId, ProtocolError> {
    let index: i64 = number(tag, "player", value)?;
    u8::try_from(index)
        .ok()
        .and_then(PlayerId::new)
        .ok_or(ProtocolError::PlayerOutOfRange { tag, index })
}
