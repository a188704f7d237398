use glam::{IVec2, Vec2};

use crate::world::texture::NO_TEXTURE;
use crate::world::tile::Tile;

/// Implicit wall surrounding the grid. Any out-of-bounds lookup resolves
/// to this tile, so neither rays nor movement can ever escape the map.
pub const BOUNDARY: Tile = Tile::Wall {
    north: NO_TEXTURE,
    east: NO_TEXTURE,
    south: NO_TEXTURE,
    west: NO_TEXTURE,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell count {got} does not match {cols}x{rows}")]
    Dimensions { cols: i32, rows: i32, got: usize },

    #[error("cell ({0}, {1}) is outside the grid")]
    OutOfBounds(i32, i32),
}

/// Row-major tile array. Pure data plus accessors; the only mutation
/// after load happens through [`set_tile`](Grid::set_tile) (pickup/drop)
/// — door state lives in the companion `DoorMap`.
#[derive(Debug)]
pub struct Grid {
    cols: i32,
    rows: i32,
    cells: Vec<Tile>,
}

impl Grid {
    pub fn new(cols: i32, rows: i32, cells: Vec<Tile>) -> Result<Self, GridError> {
        if cols <= 0 || rows <= 0 || cells.len() != (cols * rows) as usize {
            return Err(GridError::Dimensions {
                cols,
                rows,
                got: cells.len(),
            });
        }
        Ok(Self { cols, rows, cells })
    }

    #[inline]
    pub fn cols(&self) -> i32 {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    #[inline]
    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.x < self.cols && cell.y >= 0 && cell.y < self.rows
    }

    /// Tile at `cell`; out-of-bounds resolves to [`BOUNDARY`].
    #[inline]
    pub fn tile(&self, cell: IVec2) -> &Tile {
        if self.contains(cell) {
            &self.cells[(self.cols * cell.y + cell.x) as usize]
        } else {
            &BOUNDARY
        }
    }

    /// Tile under a world-space point.
    #[inline]
    pub fn tile_at(&self, p: Vec2) -> &Tile {
        self.tile(p.floor().as_ivec2())
    }

    /// Replace a tile (external pickup/drop operations, between ticks).
    /// Out-of-bounds writes are rejected.
    pub fn set_tile(&mut self, cell: IVec2, tile: Tile) -> Result<(), GridError> {
        if !self.contains(cell) {
            return Err(GridError::OutOfBounds(cell.x, cell.y));
        }
        self.cells[(self.cols * cell.y + cell.x) as usize] = tile;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec2, &Tile)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, t)| (IVec2::new(i as i32 % cols, i as i32 / cols), t))
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
