//! Per-column depth buffer: non-solid geometry crossed before the solid
//! stop, composited back-to-front (painter's algorithm).

use glam::{IVec2, Vec2};
use smallvec::SmallVec;

use crate::engine::freeform::FreeformVis;
use crate::engine::geom::line_intersect_params;
use crate::engine::ray::Ray;
use crate::world::texture::TextureId;

/// Everything the draw step needs — compositing an entry performs no
/// further grid lookups.
#[derive(Clone, Copy, Debug)]
pub enum DepthKind {
    /// Billboarded world object.
    Sprite {
        tex: TextureId,
        /// Top of the sprite in world-Z units.
        height: f32,
        /// Horizontal sampling offset in `[0, 1]`.
        u: f32,
    },
    /// Freeform slab pair.
    Freeform {
        wall_tex: TextureId,
        floor_tex: TextureId,
        ceil_tex: TextureId,
        vis: FreeformVis,
        u: f32,
        front: Vec2,
        back: Vec2,
        /// Floor/ceiling heights (world-Z) at the two intersections.
        front_floor: f32,
        front_ceil: f32,
        back_floor: f32,
        back_ceil: f32,
        pseudo_back: f32,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct DepthEntry {
    pub cell: IVec2,
    pub pseudo_dist: f32,
    pub kind: DepthKind,
}

/// Transient accumulator, cleared for every screen column.
#[derive(Default)]
pub struct DepthBuffer {
    entries: SmallVec<[DepthEntry; 8]>,
}

impl DepthBuffer {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, entry: DepthEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries at or beyond the solid stop — except those for
    /// `keep_cell`, the tile the viewer currently stands over — then
    /// order the survivors back-to-front for the painter.
    pub fn finish(&mut self, solid_pseudo: f32, keep_cell: Option<IVec2>) -> &[DepthEntry] {
        self.entries
            .retain(|e| e.pseudo_dist < solid_pseudo || Some(e.cell) == keep_cell);
        self.entries
            .sort_unstable_by(|a, b| b.pseudo_dist.total_cmp(&a.pseudo_dist));
        &self.entries
    }
}

/// Ray-vs-billboard intersection for a Thing tile.
///
/// The sprite is a unit-length segment centered in its cell, always
/// rotated perpendicular to the player's view axis. Returns the hit
/// point and the sampling offset along the segment; intersections off
/// the segment's ends do not count.
pub fn billboard_hit(ray: &Ray, cell: IVec2, view: Vec2) -> Option<(Vec2, f32)> {
    let center = cell.as_vec2() + Vec2::splat(0.5);
    let half = view.perp() * 0.5;
    let a = center - half;
    let b = center + half;
    let (t, s) = line_intersect_params(a, b, ray.origin, ray.origin + ray.dir)?;
    if !(0.0..=1.0).contains(&t) || s <= 0.0 {
        return None;
    }
    Some((a + (b - a) * t, t))
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
