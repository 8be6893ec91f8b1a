//! Dispatch of received commands into [`GameState`].
//!
//! The relay is trusted: positions, rooms, and damage are applied as sent,
//! last write wins. Only indices that would fall outside our own tables
//! are rejected.

use squirrel_protocol::{Codec, FoodKind, ItemSource, ServerCommand, split_lines};

use crate::{GameError, GameState, Outcome, ROOM_COUNT, TRAP_SLOTS, Trap};

/// What happened to one block of received lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub rejected: usize,
}

impl GameState {
    /// Applies one received command.
    ///
    /// # Errors
    /// A room outside the house, or an index out of range for the trap,
    /// furniture, or inventory tables.
    /// The state is unchanged when an error is returned.
    pub fn apply(&mut self, command: ServerCommand) -> Result<(), GameError> {
        match command {
            ServerCommand::Position { player, pos } => {
                self.players[player.index()].pos = pos;
            }
            ServerCommand::Room { player, room } => {
                check_room(room)?;
                self.players[player.index()].room = room;
            }
            ServerCommand::Facing { player, facing } => {
                self.players[player.index()].facing = facing;
            }
            ServerCommand::TrapPlaced {
                owner,
                kind,
                room,
                pos,
            } => {
                check_room(room)?;
                // With every slot taken, slot 0 is overwritten.
                let slot = self.traps.iter().position(Option::is_none).unwrap_or(0);
                if self.traps[slot].is_some() {
                    tracing::warn!(slot, "trap table full, overwriting");
                }
                self.traps[slot] = Some(Trap {
                    kind,
                    owner,
                    room,
                    pos,
                });
                tracing::trace!(slot, %owner, ?kind, room, "trap placed");
            }
            ServerCommand::TrapActivated { slot } => {
                let entry = self
                    .traps
                    .get_mut(slot)
                    .ok_or(GameError::TrapSlotOutOfRange {
                        slot,
                        max: TRAP_SLOTS,
                    })?;
                if let Some(trap) = entry.take() {
                    if trap.owner == self.local {
                        self.trap_inventory[trap.kind.slot()] = true;
                    }
                    tracing::trace!(slot, owner = %trap.owner, "trap cleared");
                }
            }
            ServerCommand::ItemTaken {
                player,
                source,
                slot,
            } => {
                if FoodKind::from_slot(slot).is_none() {
                    return Err(GameError::InventorySlotOutOfRange { slot });
                }
                if let ItemSource::Furniture(index) = source {
                    let count = self.furniture.len();
                    let furniture = self
                        .furniture
                        .get_mut(index)
                        .ok_or(GameError::FurnitureOutOfRange { index, count })?;
                    furniture.food = None;
                }
                let holder = &mut self.players[player.index()];
                holder.inventory[slot] = true;
                if holder.has_full_inventory() && !self.exit_unlocked {
                    tracing::info!(%player, "all food collected, exit unlocked");
                    self.exit_unlocked = true;
                }
            }
            ServerCommand::Attacked { damage } => {
                let local = self.local_mut();
                local.health -= damage;
                tracing::debug!(damage, health = local.health, "attacked");
            }
            ServerCommand::GameOver { winner } => {
                self.finish(Outcome::Won { winner });
            }
            ServerCommand::Kicked { reason } => {
                tracing::warn!(%reason, "kicked by relay");
                self.finish(Outcome::Kicked { reason });
            }
        }
        Ok(())
    }

    /// Decodes and applies every line in `block`, in order.
    ///
    /// A line that fails to decode or apply is logged and skipped; the
    /// lines after it are still applied.
    pub fn apply_block<C: Codec + ?Sized>(&mut self, codec: &C, block: &[u8]) -> ApplyReport {
        let text = String::from_utf8_lossy(block);
        let mut report = ApplyReport::default();

        for line in split_lines(&text) {
            let result = codec
                .decode(line)
                .map_err(GameError::from)
                .and_then(|command| {
                    tracing::trace!(tag = %command.tag(), line, "dispatch");
                    self.apply(command)
                });
            match result {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    tracing::warn!(line, error = %e, "dropping command");
                    report.rejected += 1;
                }
            }
        }
        report
    }
}

fn check_room(room: u32) -> Result<(), GameError> {
    if room < ROOM_COUNT {
        Ok(())
    } else {
        Err(GameError::RoomOutOfRange {
            room,
            count: ROOM_COUNT,
        })
    }
}

#[cfg(test)]
mod tests {
    use squirrel_protocol::{Facing, LobbyId, PlayerId, Position, TrapKind};

    use super::*;
    use crate::HouseLayout;

    fn state(local: PlayerId) -> GameState {
        let layout = HouseLayout::parse("F 1 0 1\nF 2 1 2\nF 3 2 4\n").unwrap();
        GameState::new(LobbyId(7), local, layout)
    }

    fn trap(owner: PlayerId, kind: TrapKind) -> ServerCommand {
        ServerCommand::TrapPlaced {
            owner,
            kind,
            room: 1,
            pos: Position::new(10.0, 10.0),
        }
    }

    #[test]
    fn test_overwrites_are_last_write_wins() {
        let mut state = state(PlayerId::FIRST);
        state
            .apply(ServerCommand::Position {
                player: PlayerId::SECOND,
                pos: Position::new(1.0, 2.0),
            })
            .unwrap();
        state
            .apply(ServerCommand::Position {
                player: PlayerId::SECOND,
                pos: Position::new(3.0, 4.0),
            })
            .unwrap();
        state
            .apply(ServerCommand::Facing {
                player: PlayerId::SECOND,
                facing: Facing::Left,
            })
            .unwrap();
        let other = state.player(PlayerId::SECOND);
        assert_eq!(other.pos, Position::new(3.0, 4.0));
        assert_eq!(other.facing, Facing::Left);
    }

    #[test]
    fn test_trap_fills_first_free_slot() {
        let mut state = state(PlayerId::FIRST);
        state.apply(trap(PlayerId::FIRST, TrapKind::Cheese)).unwrap();
        state.apply(trap(PlayerId::SECOND, TrapKind::Acid)).unwrap();
        state.apply(ServerCommand::TrapActivated { slot: 0 }).unwrap();
        state.apply(trap(PlayerId::SECOND, TrapKind::Bomb)).unwrap();

        assert_eq!(state.trap(0).map(|t| t.kind), Some(TrapKind::Bomb));
        assert_eq!(state.trap(1).map(|t| t.kind), Some(TrapKind::Acid));
        assert_eq!(state.traps().count(), 2);
    }

    #[test]
    fn test_trap_activated_out_of_range() {
        let mut state = state(PlayerId::FIRST);
        let err = state
            .apply(ServerCommand::TrapActivated { slot: TRAP_SLOTS })
            .unwrap_err();
        assert!(matches!(err, GameError::TrapSlotOutOfRange { slot: 100, .. }));
    }

    #[test]
    fn test_clearing_empty_trap_slot_is_a_no_op() {
        let mut state = state(PlayerId::FIRST);
        state.trap_inventory = [false; TrapKind::COUNT];
        state.apply(ServerCommand::TrapActivated { slot: 5 }).unwrap();
        assert!(!state.trap_available(TrapKind::Cheese));
    }

    #[test]
    fn test_item_from_player_leaves_furniture() {
        let mut state = state(PlayerId::FIRST);
        state
            .apply(ServerCommand::ItemTaken {
                player: PlayerId::SECOND,
                source: ItemSource::Player,
                slot: 0,
            })
            .unwrap();
        assert!(state.player(PlayerId::SECOND).holds(FoodKind::Banana));
        assert_eq!(state.furniture()[0].food, Some(FoodKind::Banana));
    }

    #[test]
    fn test_item_from_missing_furniture_changes_nothing() {
        let mut state = state(PlayerId::FIRST);
        let before = state.clone();
        let err = state
            .apply(ServerCommand::ItemTaken {
                player: PlayerId::FIRST,
                source: ItemSource::Furniture(3),
                slot: 1,
            })
            .unwrap_err();
        assert!(matches!(err, GameError::FurnitureOutOfRange { index: 3, count: 3 }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_attack_hits_local_player() {
        let mut state = state(PlayerId::SECOND);
        state.apply(ServerCommand::Attacked { damage: 20.0 }).unwrap();
        assert_eq!(state.local_player().health, 80.0);
        assert_eq!(state.opponent().health, 100.0);
    }

    #[test]
    fn test_game_over_and_kick_end_match() {
        let mut state = state(PlayerId::FIRST);
        state
            .apply(ServerCommand::GameOver {
                winner: PlayerId::FIRST,
            })
            .unwrap();
        assert!(state.is_done());

        let mut kicked = self::state(PlayerId::FIRST);
        kicked
            .apply(ServerCommand::Kicked {
                reason: "The lobby is full.".into(),
            })
            .unwrap();
        assert_eq!(
            kicked.outcome(),
            Some(&Outcome::Kicked {
                reason: "The lobby is full.".into()
            })
        );
    }

    #[test]
    fn test_apply_block_counts() {
        let mut state = state(PlayerId::FIRST);
        let codec = squirrel_protocol::TextCodec::new(LobbyId(7));
        let report = state.apply_block(&codec, b"R,1,2\nZ,9,9\nA,250\nC,5.0\n");
        assert_eq!(
            report,
            ApplyReport {
                applied: 2,
                rejected: 2,
            }
        );
        assert_eq!(state.player(PlayerId::SECOND).room, 2);
        assert_eq!(state.local_player().health, 95.0);
    }
}
