//! Door records and their open/close state machine.
//!
//! The map keeps exactly one [`Door`] per door tile, created at grid
//! load. Nothing here schedules anything: an external tick driver calls
//! [`DoorMap::advance`] with the elapsed time and the current player
//! box, and the machine performs pure state transitions.

use std::collections::HashMap;

use glam::{IVec2, Vec2};
use tracing::debug;

use crate::world::grid::Grid;

pub const DOOR_OPEN: u8 = 0;
pub const DOOR_CLOSED: u8 = 10;

/// Seconds between two one-tenth steps of the door slab.
pub const DOOR_STEP_INTERVAL: f32 = 0.02;
/// Seconds a fully open door waits before trying to close itself.
pub const DOOR_RESET_DELAY: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    Opening { accum: f32 },
    Closing { accum: f32 },
    /// Fully open, counting down to the auto-close attempt.
    AutoClose { remaining: f32 },
}

#[derive(Clone, Copy, Debug)]
pub struct Door {
    pub cell: IVec2,
    /// 0 = fully open … 10 = fully closed, in tenths of the doorway.
    state: u8,
    phase: Phase,
}

impl Door {
    fn new(cell: IVec2) -> Self {
        Self {
            cell,
            state: DOOR_CLOSED,
            phase: Phase::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> u8 {
        self.state
    }

    /// A door blocks movement and sight while any part of the slab is in
    /// the doorway.
    #[inline]
    pub fn blocks(&self) -> bool {
        self.state > DOOR_OPEN
    }

    /// Fraction of the doorway the slab still covers, `0.0 ..= 1.0`.
    #[inline]
    pub fn closed_fraction(&self) -> f32 {
        self.state as f32 * 0.1
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Opening { .. } | Phase::Closing { .. })
    }

    fn advance(&mut self, dt: f32, player_box: (Vec2, Vec2)) {
        match self.phase {
            Phase::Idle => {}
            Phase::Opening { mut accum } => {
                accum += dt;
                while accum >= DOOR_STEP_INTERVAL && self.state > DOOR_OPEN {
                    accum -= DOOR_STEP_INTERVAL;
                    self.state -= 1;
                }
                self.phase = if self.state == DOOR_OPEN {
                    debug!(x = self.cell.x, y = self.cell.y, "door open");
                    Phase::AutoClose {
                        remaining: DOOR_RESET_DELAY,
                    }
                } else {
                    Phase::Opening { accum }
                };
            }
            Phase::Closing { mut accum } => {
                accum += dt;
                while accum >= DOOR_STEP_INTERVAL && self.state < DOOR_CLOSED {
                    accum -= DOOR_STEP_INTERVAL;
                    self.state += 1;
                }
                self.phase = if self.state == DOOR_CLOSED {
                    debug!(x = self.cell.x, y = self.cell.y, "door closed");
                    Phase::Idle
                } else {
                    Phase::Closing { accum }
                };
            }
            Phase::AutoClose { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = Phase::AutoClose { remaining };
                } else if self.overlaps(player_box) {
                    // somebody is standing in the doorway: re-arm the
                    // full delay and try again later
                    self.phase = Phase::AutoClose {
                        remaining: DOOR_RESET_DELAY,
                    };
                } else {
                    self.phase = Phase::Closing { accum: 0.0 };
                }
            }
        }
    }

    fn overlaps(&self, (min, max): (Vec2, Vec2)) -> bool {
        let c = self.cell.as_vec2();
        max.x > c.x && min.x < c.x + 1.0 && max.y > c.y && min.y < c.y + 1.0
    }
}

/// All doors of one level, keyed by tile coordinate.
#[derive(Default, Debug)]
pub struct DoorMap {
    doors: HashMap<IVec2, Door>,
}

impl DoorMap {
    /// Derive the map from a freshly loaded grid: one record per
    /// vertical/horizontal door tile, all starting closed.
    pub fn from_grid(grid: &Grid) -> Self {
        let doors = grid
            .iter()
            .filter(|(_, tile)| tile.is_door())
            .map(|(cell, _)| (cell, Door::new(cell)))
            .collect();
        Self { doors }
    }

    pub fn len(&self) -> usize {
        self.doors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    pub fn get(&self, cell: IVec2) -> Option<&Door> {
        self.doors.get(&cell)
    }

    /// Toggle the door at `cell`: closed (or closing target) doors start
    /// opening, fully open ones start closing. A door that is mid-slide
    /// ignores the request; returns whether anything was triggered.
    pub fn interact(&mut self, cell: IVec2) -> bool {
        let Some(door) = self.doors.get_mut(&cell) else {
            return false;
        };
        if door.is_animating() {
            return false;
        }
        door.phase = if door.state == DOOR_OPEN {
            Phase::Closing { accum: 0.0 }
        } else {
            Phase::Opening { accum: 0.0 }
        };
        true
    }

    /// Advance every door by `dt` seconds. `player_box` is the player's
    /// AABB `(min, max)`; a door never starts closing onto it.
    pub fn advance(&mut self, dt: f32, player_box: (Vec2, Vec2)) {
        for door in self.doors.values_mut() {
            door.advance(dt, player_box);
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::texture::NO_TEXTURE;
    use crate::world::tile::Tile;

    fn grid_with_door() -> Grid {
        let mut cells = vec![Tile::Free { floor: 0, ceil: 0 }; 9];
        cells[4] = Tile::VerticalDoor {
            tex: NO_TEXTURE,
            dock: NO_TEXTURE,
        };
        Grid::new(3, 3, cells).unwrap()
    }

    fn far_box() -> (Vec2, Vec2) {
        (Vec2::new(10.0, 10.0), Vec2::new(10.8, 10.8))
    }

    fn doorway_box() -> (Vec2, Vec2) {
        (Vec2::new(1.1, 1.1), Vec2::new(1.9, 1.9))
    }

    #[test]
    fn one_record_per_door_tile() {
        let doors = DoorMap::from_grid(&grid_with_door());
        assert_eq!(doors.len(), 1);
        let door = doors.get(IVec2::new(1, 1)).unwrap();
        assert_eq!(door.state(), DOOR_CLOSED);
        assert!(door.blocks());
    }

    #[test]
    fn opens_fully_then_auto_closes_when_clear() {
        let mut doors = DoorMap::from_grid(&grid_with_door());
        let cell = IVec2::new(1, 1);
        assert!(doors.interact(cell));

        // ten slab steps
        doors.advance(10.0 * DOOR_STEP_INTERVAL, far_box());
        assert_eq!(doors.get(cell).unwrap().state(), DOOR_OPEN);
        assert!(!doors.get(cell).unwrap().blocks());

        // delay elapses, closing starts and runs to completion
        doors.advance(DOOR_RESET_DELAY + 0.001, far_box());
        doors.advance(10.0 * DOOR_STEP_INTERVAL, far_box());
        assert_eq!(doors.get(cell).unwrap().state(), DOOR_CLOSED);
    }

    #[test]
    fn never_closes_onto_the_player() {
        let mut doors = DoorMap::from_grid(&grid_with_door());
        let cell = IVec2::new(1, 1);
        doors.interact(cell);
        doors.advance(10.0 * DOOR_STEP_INTERVAL, far_box());

        // the auto-close attempt finds the doorway occupied and re-arms
        for _ in 0..5 {
            doors.advance(DOOR_RESET_DELAY + 0.001, doorway_box());
            assert_eq!(doors.get(cell).unwrap().state(), DOOR_OPEN);
        }

        doors.advance(DOOR_RESET_DELAY + 0.001, far_box());
        doors.advance(10.0 * DOOR_STEP_INTERVAL, far_box());
        assert_eq!(doors.get(cell).unwrap().state(), DOOR_CLOSED);
    }

    #[test]
    fn interact_is_ignored_mid_slide() {
        let mut doors = DoorMap::from_grid(&grid_with_door());
        let cell = IVec2::new(1, 1);
        doors.interact(cell);
        doors.advance(3.0 * DOOR_STEP_INTERVAL, far_box());
        let partway = doors.get(cell).unwrap().state();
        assert!(partway > DOOR_OPEN && partway < DOOR_CLOSED);

        // re-entrant trigger must not restart or reverse the slide
        assert!(!doors.interact(cell));
        doors.advance(DOOR_STEP_INTERVAL, far_box());
        assert_eq!(doors.get(cell).unwrap().state(), partway - 1);
    }

    #[test]
    fn no_door_record_for_plain_tiles() {
        let mut doors = DoorMap::from_grid(&grid_with_door());
        assert!(doors.get(IVec2::new(0, 0)).is_none());
        assert!(!doors.interact(IVec2::new(0, 0)));
    }
}
