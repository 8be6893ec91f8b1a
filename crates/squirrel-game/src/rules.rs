//! What the local player does each frame.
//!
//! A frame runs in this order:
//!
//! ```text
//! advance(intent, dt)     move, doors, opponent traps
//! (input frame ends)
//! apply_block(lines)      everything the relay sent since last frame
//! finish_tick()           death check, position/room announcements
//! ```
//!
//! Discrete key presses go through [`GameState::act`] as they happen.
//! Nothing here changes shared state the relay owns (traps, furniture,
//! inventories); it only emits the commands, and the change lands when the
//! relay echoes them back.

use squirrel_protocol::{ClientCommand, Facing, ItemSource, TrapKind};

use crate::{ARENA_HEIGHT, ARENA_WIDTH, GameState, HOUSE_WIDTH, ROOM_COUNT, RulesConfig};

/// Distance from the opposite edge a player re-enters at after a door.
const DOOR_OFFSET: f32 = 5.0;

/// Movement keys held this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub up: bool,
    pub left: bool,
    pub down: bool,
    pub right: bool,
}

/// A one-shot key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PlaceTrap(TrapKind),
    Search,
    Attack,
}

/// Which arena edge the player is pressed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Door {
    Left,
    Right,
    Top,
    Bottom,
}

impl GameState {
    /// Moves the local player, walks through doors, and springs opponent
    /// traps.
    pub fn advance(
        &mut self,
        rules: &RulesConfig,
        intent: MoveIntent,
        dt: f32,
    ) -> Vec<ClientCommand> {
        let mut out = Vec::new();
        self.walk(rules, intent, dt, &mut out);
        self.use_door(&mut out);
        self.check_traps(rules, &mut out);
        out
    }

    /// Handles one key press.
    pub fn act(&mut self, rules: &RulesConfig, action: Action) -> Vec<ClientCommand> {
        let me = self.local;
        let player = self.local_player();
        let mut out = Vec::new();

        match action {
            Action::PlaceTrap(kind) => {
                if self.trap_available(kind) {
                    out.push(ClientCommand::PlaceTrap {
                        owner: me,
                        kind,
                        room: player.room,
                        pos: player.pos,
                    });
                    self.trap_inventory[kind.slot()] = false;
                }
            }
            Action::Search => {
                let nearest = self
                    .furniture
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| f.room == player.room)
                    .filter_map(|(index, f)| {
                        let area = rules.search_area(f.kind);
                        let distance = area.centre.distance(player.pos);
                        (distance <= area.radius).then_some((index, f, distance))
                    })
                    .min_by(|a, b| a.2.total_cmp(&b.2));

                match nearest {
                    Some((index, furniture, _)) => {
                        if let Some(food) = furniture.food {
                            out.push(ClientCommand::ItemTaken {
                                player: me,
                                source: ItemSource::Furniture(index),
                                food,
                            });
                        } else {
                            tracing::debug!(index, "searched furniture is empty");
                        }
                    }
                    None => tracing::debug!("nothing to search here"),
                }
            }
            Action::Attack => {
                let other = self.opponent();
                if player.room == other.room
                    && player.pos.distance(other.pos) < rules.attack_radius
                {
                    out.push(ClientCommand::Attack {
                        target: me.other(),
                        damage: rules.attack_damage,
                    });
                }
            }
        }
        out
    }

    /// Runs after received commands are applied: handles death from
    /// damage and announces where the local player is.
    pub fn finish_tick(&mut self) -> Vec<ClientCommand> {
        let mut out = Vec::new();
        if self.local_player().health <= 0.0 {
            self.die(&mut out);
        }

        let me = self.local;
        let player = self.local_player();
        out.push(ClientCommand::Position {
            player: me,
            pos: player.pos,
        });
        if self.room_changed {
            out.push(ClientCommand::Room {
                player: me,
                room: player.room,
            });
            self.room_changed = false;
        }
        out
    }

    fn walk(
        &mut self,
        rules: &RulesConfig,
        intent: MoveIntent,
        dt: f32,
        out: &mut Vec<ClientCommand>,
    ) {
        let step = rules.speed * dt.max(0.0);
        let me = self.local;
        let player = self.local_mut();
        let old_facing = player.facing;

        if intent.up {
            player.pos.y = (player.pos.y - step).max(0.0);
            player.facing = Facing::Up;
        }
        if intent.left {
            player.pos.x = (player.pos.x - step).max(0.0);
            player.facing = Facing::Left;
        }
        if intent.down {
            player.pos.y = (player.pos.y + step).min(ARENA_HEIGHT);
            player.facing = Facing::Down;
        }
        if intent.right {
            player.pos.x = (player.pos.x + step).min(ARENA_WIDTH);
            player.facing = Facing::Right;
        }

        if player.facing != old_facing {
            out.push(ClientCommand::Facing {
                player: me,
                facing: player.facing,
            });
        }
    }

    fn use_door(&mut self, out: &mut Vec<ClientCommand>) {
        let Some(door) = self.touching_door() else {
            return;
        };

        if door == Door::Top && self.exit_unlocked && self.local_player().room == self.exit_room {
            tracing::info!(room = self.exit_room, "reached the exit");
            out.push(ClientCommand::GameOver { winner: self.local });
            return;
        }

        let player = self.local_mut();
        let before = player.room;
        match door {
            Door::Left if player.room % HOUSE_WIDTH != 0 => {
                player.room -= 1;
                player.pos.x = ARENA_WIDTH - DOOR_OFFSET;
            }
            Door::Right if player.room % HOUSE_WIDTH != HOUSE_WIDTH - 1 => {
                player.room += 1;
                player.pos.x = DOOR_OFFSET;
            }
            Door::Top if player.room >= HOUSE_WIDTH => {
                player.room -= HOUSE_WIDTH;
                player.pos.y = ARENA_HEIGHT - DOOR_OFFSET;
            }
            Door::Bottom if player.room + HOUSE_WIDTH < ROOM_COUNT => {
                player.room += HOUSE_WIDTH;
                player.pos.y = DOOR_OFFSET;
            }
            // A wall.
            _ => {}
        }

        let after = player.room;
        if after != before {
            tracing::debug!(from = before, to = after, "changed room");
            self.room_changed = true;
        }
    }

    /// Left and right take precedence over top and bottom in a corner.
    fn touching_door(&self) -> Option<Door> {
        let pos = self.local_player().pos;
        if pos.x <= 0.0 {
            Some(Door::Left)
        } else if pos.x >= ARENA_WIDTH {
            Some(Door::Right)
        } else if pos.y <= 0.0 {
            Some(Door::Top)
        } else if pos.y >= ARENA_HEIGHT {
            Some(Door::Bottom)
        } else {
            None
        }
    }

    fn check_traps(&mut self, rules: &RulesConfig, out: &mut Vec<ClientCommand>) {
        for slot in 0..self.traps.len() {
            let Some(trap) = self.traps[slot] else {
                continue;
            };
            let player = self.local_player();
            if trap.owner != self.local
                && trap.room == player.room
                && trap.pos.distance(player.pos) <= rules.trap_radius
            {
                tracing::info!(slot, kind = ?trap.kind, "stepped on a trap");
                self.die(out);
                out.push(ClientCommand::TrapActivated { slot });
            }
        }
    }

    /// Respawns the local player and hands every held food item to the
    /// opponent, locally and over the wire.
    fn die(&mut self, out: &mut Vec<ClientCommand>) {
        let me = self.local.index();
        let other = self.local.other();
        let held: Vec<_> = self.players[me].held_food().collect();

        for food in &held {
            out.push(ClientCommand::ItemTaken {
                player: other,
                source: ItemSource::Player,
                food: *food,
            });
            self.players[other.index()].inventory[food.slot()] = true;
        }

        let player = &mut self.players[me];
        player.inventory = Default::default();
        player.respawn();
        self.room_changed = true;
        tracing::info!(dropped = held.len(), "local player died");
    }
}
