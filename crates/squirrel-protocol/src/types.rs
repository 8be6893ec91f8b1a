//! Core value types that appear in protocol lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of one of the two players in a match (0 or 1).
///
/// Construct with [`PlayerId::new`], which rejects anything else.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerId(u8);

impl PlayerId {
    /// Number of players in a match.
    pub const COUNT: usize = 2;

    pub const FIRST: Self = Self(0);
    pub const SECOND: Self = Self(1);

    /// Returns `None` unless `index < PlayerId::COUNT`.
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < Self::COUNT).then_some(Self(index))
    }

    /// The opponent.
    pub fn other(self) -> Self {
        Self(1 - self.0)
    }

    /// Array index for per-player storage.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("player index {value} out of range"))
    }
}

impl From<PlayerId> for u8 {
    fn from(id: PlayerId) -> u8 {
        id.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric lobby a match is played in. The relay routes by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub u32);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in arena pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance.
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Direction a player sprite is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Up,
    Left,
    Down,
    Right,
}

impl Facing {
    /// Wire value: 0 up, 1 left, 2 down, 3 right.
    pub fn wire(self) -> u8 {
        match self {
            Self::Up => 0,
            Self::Left => 1,
            Self::Down => 2,
            Self::Right => 3,
        }
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Up),
            1 => Some(Self::Left),
            2 => Some(Self::Down),
            3 => Some(Self::Right),
            _ => None,
        }
    }
}

/// The three kinds of trap a player carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrapKind {
    Cheese,
    Acid,
    Bomb,
}

impl TrapKind {
    /// Number of trap kinds, and slots in the trap inventory.
    pub const COUNT: usize = 3;

    pub const ALL: [Self; Self::COUNT] = [Self::Cheese, Self::Acid, Self::Bomb];

    /// Wire value, starting at 1 (0 means "no trap").
    pub fn wire(self) -> u8 {
        self.slot() as u8 + 1
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        Self::from_slot(usize::from(value).checked_sub(1)?)
    }

    /// Trap-inventory slot, starting at 0.
    pub fn slot(self) -> usize {
        match self {
            Self::Cheese => 0,
            Self::Acid => 1,
            Self::Bomb => 2,
        }
    }

    pub fn from_slot(slot: usize) -> Option<Self> {
        Self::ALL.get(slot).copied()
    }
}

/// The five food items hidden in the house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodKind {
    Banana,
    Cereal,
    Strawberry,
    Peanut,
    Pizza,
}

impl FoodKind {
    /// Number of food kinds, and slots in a player's food inventory.
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Banana,
        Self::Cereal,
        Self::Strawberry,
        Self::Peanut,
        Self::Pizza,
    ];

    /// Wire value, starting at 1 (0 means "no food").
    pub fn wire(self) -> u8 {
        self.slot() as u8 + 1
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        Self::from_slot(usize::from(value).checked_sub(1)?)
    }

    /// Inventory slot, starting at 0.
    pub fn slot(self) -> usize {
        match self {
            Self::Banana => 0,
            Self::Cereal => 1,
            Self::Strawberry => 2,
            Self::Peanut => 3,
            Self::Pizza => 4,
        }
    }

    pub fn from_slot(slot: usize) -> Option<Self> {
        Self::ALL.get(slot).copied()
    }
}

/// Where a taken food item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemSource {
    /// A furniture record, by index.
    Furniture(usize),
    /// A dying player's inventory. Encoded as furniture index `-1`.
    Player,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_range() {
        assert_eq!(PlayerId::new(0), Some(PlayerId::FIRST));
        assert_eq!(PlayerId::new(1), Some(PlayerId::SECOND));
        assert_eq!(PlayerId::new(2), None);
    }

    #[test]
    fn test_player_id_other() {
        assert_eq!(PlayerId::FIRST.other(), PlayerId::SECOND);
        assert_eq!(PlayerId::SECOND.other(), PlayerId::FIRST);
    }

    #[test]
    fn test_player_id_serde_rejects_out_of_range() {
        let ok: PlayerId = serde_json::from_str("1").unwrap();
        assert_eq!(ok, PlayerId::SECOND);
        assert!(serde_json::from_str::<PlayerId>("2").is_err());
    }

    #[test]
    fn test_trap_kind_wire_values_start_at_one() {
        assert_eq!(TrapKind::Cheese.wire(), 1);
        assert_eq!(TrapKind::Bomb.wire(), 3);
        assert_eq!(TrapKind::from_wire(0), None);
        assert_eq!(TrapKind::from_wire(2), Some(TrapKind::Acid));
        assert_eq!(TrapKind::from_wire(4), None);
    }

    #[test]
    fn test_food_kind_slot_is_wire_minus_one() {
        for food in FoodKind::ALL {
            assert_eq!(usize::from(food.wire()), food.slot() + 1);
            assert_eq!(FoodKind::from_slot(food.slot()), Some(food));
        }
        assert_eq!(FoodKind::from_wire(0), None);
    }

    #[test]
    fn test_facing_wire() {
        assert_eq!(Facing::from_wire(1), Some(Facing::Left));
        assert_eq!(Facing::Right.wire(), 3);
        assert_eq!(Facing::from_wire(4), None);
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
    }
}
