//! House layout files.
//!
//! One directive per line:
//!
//! ```text
//! F <furniture kind> <room> <food id>   # 1 cabinet, 2 carpet, 3 bookshelf; food 0 = none
//! E <room>                              # the room whose top door is the exit
//! ```
//!
//! Lines that start with anything else are ignored, so the file can carry
//! comments.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use squirrel_protocol::FoodKind;

use crate::{FURNITURE_SLOTS, Furniture, FurnitureKind, GameError, ROOM_COUNT};

/// Furniture placement and exit room for one house.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseLayout {
    pub furniture: Vec<Furniture>,
    pub exit_room: u32,
}

impl HouseLayout {
    /// Parses layout text.
    ///
    /// # Errors
    /// [`GameError::Layout`] with the 1-based line number of the first bad
    /// directive.
    pub fn parse(text: &str) -> Result<Self, GameError> {
        let mut layout = Self::default();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let mut words = raw.split_whitespace();
            match words.next() {
                Some("F") => {
                    let [kind, room, food] = numbers(line, words)?;
                    if layout.furniture.len() == FURNITURE_SLOTS {
                        return Err(bad(line, format!("more than {FURNITURE_SLOTS} furniture")));
                    }
                    let kind = FurnitureKind::from_wire(kind)
                        .ok_or_else(|| bad(line, format!("unknown furniture kind {kind}")))?;
                    let room = room_number(line, room)?;
                    let food = match food {
                        0 => None,
                        id => Some(
                            u8::try_from(id)
                                .ok()
                                .and_then(FoodKind::from_wire)
                                .ok_or_else(|| bad(line, format!("unknown food id {id}")))?,
                        ),
                    };
                    layout.furniture.push(Furniture { kind, room, food });
                }
                Some("E") => {
                    let [room] = numbers(line, words)?;
                    layout.exit_room = room_number(line, room)?;
                }
                _ => {}
            }
        }

        tracing::debug!(
            furniture = layout.furniture.len(),
            exit_room = layout.exit_room,
            "house layout parsed"
        );
        Ok(layout)
    }

    /// Reads and parses a layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }
}

impl FromStr for HouseLayout {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn bad(line: usize, msg: String) -> GameError {
    GameError::Layout { line, msg }
}

fn numbers<'a, const N: usize>(
    line: usize,
    words: impl Iterator<Item = &'a str>,
) -> Result<[i64; N], GameError> {
    let parsed = words
        .map(|w| w.parse::<i64>().map_err(|_| bad(line, format!("not a number: {w:?}"))))
        .collect::<Result<Vec<_>, _>>()?;
    let found = parsed.len();
    <[i64; N]>::try_from(parsed)
        .map_err(|_| bad(line, format!("expected {N} number(s), found {found}")))
}

fn room_number(line: usize, room: i64) -> Result<u32, GameError> {
    u32::try_from(room)
        .ok()
        .filter(|r| *r < ROOM_COUNT)
        .ok_or_else(|| bad(line, format!("room {room} outside the house")))
}
