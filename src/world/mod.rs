//! The world aggregate: grid, doors and tuning constants.
//!
//! Everything the render and collision paths need is reachable from one
//! [`World`] value passed by reference into the core's entry points —
//! there is no module-level mutable state anywhere in the crate.

mod camera;
mod door;
mod grid;
mod loader;
pub mod texture;
mod tile;

pub use camera::Camera;
pub use door::{DOOR_CLOSED, DOOR_OPEN, DOOR_RESET_DELAY, DOOR_STEP_INTERVAL, Door, DoorMap};
pub use grid::{BOUNDARY, Grid, GridError};
pub use loader::{LevelError, PlayerStart, load_level};
pub use texture::{NO_TEXTURE, Texture, TextureBank, TextureError, TextureId};
pub use tile::{DiagFace, Freeform, SlopeAxis, ThingDef, Tile};

use glam::{IVec2, Vec2};

/// Tunables shared by the render and collision paths.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Solid-wall height in world-Z units; one tile is exactly this tall.
    pub world_h: f32,
    /// Eye height above the feet.
    pub player_h: f32,
    /// Highest floor rise the player can step onto.
    pub knee_height: f32,
    /// Extra headroom demanded on top of `player_h` when passing under
    /// a lowered ceiling.
    pub headroom: f32,
    /// Half-width of the player's axis-aligned box, in tile units.
    pub margin: f32,
    /// Maximum render distance in tile units.
    pub draw_dist: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_h: 10.0,
            player_h: 5.0,
            knee_height: 2.5,
            headroom: 1.0,
            margin: 0.4,
            draw_dist: 15.0,
        }
    }
}

/// How a blocking query treats door and freeform tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockRule {
    /// Movement and sight: doors block while their slab covers any part
    /// of the doorway, freeform tiles block.
    Movement,
    /// Pickup rays: doors always block, freeform tiles never do.
    Pickup,
}

#[derive(Debug)]
pub struct World {
    pub grid: Grid,
    pub doors: DoorMap,
    pub config: WorldConfig,
}

impl World {
    pub fn new(grid: Grid, config: WorldConfig) -> Self {
        let doors = DoorMap::from_grid(&grid);
        Self {
            grid,
            doors,
            config,
        }
    }

    /// Whether the tile at `cell` stops rays/movement under `rule`.
    /// Out-of-bounds cells count as solid.
    pub fn is_blocking(&self, cell: IVec2, rule: BlockRule) -> bool {
        match *self.grid.tile(cell) {
            Tile::Wall { .. } | Tile::DiagWall { .. } | Tile::Thing { .. } => true,
            Tile::Freeform(_) => rule == BlockRule::Movement,
            Tile::VerticalDoor { .. } | Tile::HorizontalDoor { .. } => match rule {
                BlockRule::Pickup => true,
                BlockRule::Movement => self.doors.get(cell).is_none_or(|d| d.blocks()),
            },
            Tile::Free { .. } => false,
        }
    }

    /// `is_blocking` for a world-space point.
    #[inline]
    pub fn is_blocking_at(&self, p: Vec2, rule: BlockRule) -> bool {
        self.is_blocking(p.floor().as_ivec2(), rule)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(cell: Tile) -> World {
        let mut cells = vec![Tile::Free { floor: 0, ceil: 0 }; 9];
        cells[4] = cell;
        World::new(Grid::new(3, 3, cells).unwrap(), WorldConfig::default())
    }

    #[test]
    fn walls_block_both_rules() {
        let w = world_with(BOUNDARY);
        for rule in [BlockRule::Movement, BlockRule::Pickup] {
            assert!(w.is_blocking(IVec2::new(1, 1), rule));
        }
    }

    #[test]
    fn freeform_blocks_movement_only() {
        let w = world_with(Tile::Freeform(Freeform {
            margin: Vec2::ZERO,
            extent: Vec2::ONE,
            slope_axis: SlopeAxis::X,
            upper_start: 1.0,
            upper_end: 1.0,
            lower_start: 0.0,
            lower_end: 0.0,
            wall_tex: 0,
            floor_tex: 0,
            ceil_tex: 0,
        }));
        assert!(w.is_blocking(IVec2::new(1, 1), BlockRule::Movement));
        assert!(!w.is_blocking(IVec2::new(1, 1), BlockRule::Pickup));
    }

    #[test]
    fn doors_follow_their_state_for_movement_but_always_block_pickup() {
        let mut w = world_with(Tile::VerticalDoor { tex: 0, dock: 0 });
        let cell = IVec2::new(1, 1);
        assert!(w.is_blocking(cell, BlockRule::Movement));

        w.doors.interact(cell);
        w.doors.advance(
            10.0 * DOOR_STEP_INTERVAL,
            (Vec2::splat(10.0), Vec2::splat(10.5)),
        );
        assert!(!w.is_blocking(cell, BlockRule::Movement));
        assert!(w.is_blocking(cell, BlockRule::Pickup));
    }

    #[test]
    fn outside_the_grid_is_solid() {
        let w = world_with(Tile::Free { floor: 0, ceil: 0 });
        assert!(w.is_blocking(IVec2::new(-1, -1), BlockRule::Movement));
        assert!(w.is_blocking_at(Vec2::new(3.5, 0.5), BlockRule::Movement));
    }
}
