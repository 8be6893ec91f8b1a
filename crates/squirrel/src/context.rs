//! Per-process client context: configuration and the key table.

use std::str::FromStr;

use squirrel_game::{Action, MoveIntent};
use squirrel_protocol::TrapKind;

use crate::ClientConfig;

/// A game key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Left,
    Down,
    Right,
    Trap(TrapKind),
    Search,
    Attack,
}

impl Key {
    pub const COUNT: usize = 6 + TrapKind::COUNT;

    fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Left => 1,
            Self::Down => 2,
            Self::Right => 3,
            Self::Search => 4,
            Self::Attack => 5,
            Self::Trap(kind) => 6 + kind.slot(),
        }
    }

    /// The one-shot action this key triggers when pressed, if any.
    pub fn action(self) -> Option<Action> {
        match self {
            Self::Trap(kind) => Some(Action::PlaceTrap(kind)),
            Self::Search => Some(Action::Search),
            Self::Attack => Some(Action::Attack),
            Self::Up | Self::Left | Self::Down | Self::Right => None,
        }
    }
}

/// Keyboard names: `w a s d` to move, `1`-`3` for traps, `space` to
/// search, `p` to attack.
impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "w" => Ok(Self::Up),
            "a" => Ok(Self::Left),
            "s" => Ok(Self::Down),
            "d" => Ok(Self::Right),
            "space" => Ok(Self::Search),
            "p" => Ok(Self::Attack),
            other => other
                .parse::<usize>()
                .ok()
                .and_then(|n| TrapKind::from_slot(n.checked_sub(1)?))
                .map(Self::Trap)
                .ok_or_else(|| format!("unknown key {s:?}")),
        }
    }
}

const SEEN: u8 = 1;
const RELEASED: u8 = 2;

/// Which keys are down.
///
/// A press sets both bits; a release clears `SEEN`; the end of each frame
/// clears `RELEASED`. A key tapped and released within one frame therefore
/// still counts as held for that frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    keys: [u8; Key::COUNT],
}

impl InputState {
    pub fn press(&mut self, key: Key) {
        self.keys[key.index()] = SEEN | RELEASED;
    }

    pub fn release(&mut self, key: Key) {
        self.keys[key.index()] &= RELEASED;
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.keys[key.index()] != 0
    }

    /// Forgets keys released during the frame that just ran.
    pub fn end_frame(&mut self) {
        for key in &mut self.keys {
            *key &= SEEN;
        }
    }

    /// Movement keys held this frame.
    pub fn intent(&self) -> MoveIntent {
        MoveIntent {
            up: self.is_down(Key::Up),
            left: self.is_down(Key::Left),
            down: self.is_down(Key::Down),
            right: self.is_down(Key::Right),
        }
    }
}

/// State created at startup and handed by reference to the game loop.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub config: ClientConfig,
    pub input: InputState,
}

impl ClientContext {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            input: InputState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_indices_are_distinct() {
        let keys = [
            Key::Up,
            Key::Left,
            Key::Down,
            Key::Right,
            Key::Search,
            Key::Attack,
            Key::Trap(TrapKind::Cheese),
            Key::Trap(TrapKind::Acid),
            Key::Trap(TrapKind::Bomb),
        ];
        assert_eq!(keys.len(), Key::COUNT);
        let mut seen = [false; Key::COUNT];
        for key in keys {
            assert!(!seen[key.index()], "{key:?}");
            seen[key.index()] = true;
        }
    }

    #[test]
    fn test_key_names() {
        assert_eq!("W".parse::<Key>().unwrap(), Key::Up);
        assert_eq!("space".parse::<Key>().unwrap(), Key::Search);
        assert_eq!("3".parse::<Key>().unwrap(), Key::Trap(TrapKind::Bomb));
        assert!("0".parse::<Key>().is_err());
        assert!("4".parse::<Key>().is_err());
        assert!("x".parse::<Key>().is_err());
    }

    #[test]
    fn test_held_key_survives_frames() {
        let mut input = InputState::default();
        input.press(Key::Right);
        input.end_frame();
        input.end_frame();
        assert!(input.is_down(Key::Right));
        assert!(input.intent().right);
    }

    #[test]
    fn test_tap_lasts_one_frame() {
        let mut input = InputState::default();
        input.press(Key::Up);
        input.release(Key::Up);
        assert!(input.is_down(Key::Up));
        input.end_frame();
        assert!(!input.is_down(Key::Up));
    }

    #[test]
    fn test_release_after_frame_clears_immediately() {
        let mut input = InputState::default();
        input.press(Key::Left);
        input.end_frame();
        input.release(Key::Left);
        assert!(!input.is_down(Key::Left));
    }

    #[test]
    fn test_only_one_shot_keys_have_actions() {
        assert_eq!(Key::Up.action(), None);
        assert_eq!(Key::Search.action(), Some(Action::Search));
        assert_eq!(
            Key::Trap(TrapKind::Acid).action(),
            Some(Action::PlaceTrap(TrapKind::Acid))
        );
    }
}
