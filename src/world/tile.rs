use glam::{IVec2, Vec2};

use crate::world::texture::TextureId;

/// Which diagonal of the unit cell a [`Tile::DiagWall`] occupies.
///
/// The variants mirror the four map glyphs; `endpoints` returns the two
/// cell-corner offsets defining the wall segment, *in order* — the order
/// fixes the surface normal and the texture sampling direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagFace {
    /// `#/` — runs SW→NE, solid half on the west side.
    SlashWest,
    /// `\#` — runs NW→SE, solid half on the east side.
    BackslashEast,
    /// `/#` — runs NE→SW, solid half on the east side.
    SlashEast,
    /// `#\` — runs SE→NW, solid half on the west side.
    BackslashWest,
}

impl DiagFace {
    pub fn from_index(i: u32) -> Option<Self> {
        match i {
            0 => Some(DiagFace::SlashWest),
            1 => Some(DiagFace::BackslashEast),
            2 => Some(DiagFace::SlashEast),
            3 => Some(DiagFace::BackslashWest),
            _ => None,
        }
    }

    /// Segment endpoints as cell-local 0/1 corner offsets.
    #[inline]
    pub fn endpoints(self) -> (Vec2, Vec2) {
        match self {
            DiagFace::SlashWest => (Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)),
            DiagFace::BackslashEast => (Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)),
            DiagFace::SlashEast => (Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)),
            DiagFace::BackslashWest => (Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.0)),
        }
    }
}

/// World object standing in the middle of its cell, rendered as a
/// billboard always facing the view axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThingDef {
    pub sprite: TextureId,
    /// Sprite height in world-Z units (the sprite stands on z = 0).
    pub height: f32,
    /// Item can be collected by a pickup ray.
    pub pickable: bool,
}

/// Axis along which a freeform tile's height fields are interpolated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlopeAxis {
    X,
    Y,
}

/// Cell with a sub-rectangle footprint and linearly interpolated floor
/// and ceiling height fields, used for slopes and partial-height
/// obstacles.
///
/// Heights are fractions of the world height: `lower_*` is the top of
/// the floor slab, `upper_*` the underside of the ceiling slab, both
/// measured up from z = 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Freeform {
    /// Footprint inset from the cell's NW corner, in tile units.
    pub margin: Vec2,
    /// Footprint size, in tile units.
    pub extent: Vec2,
    pub slope_axis: SlopeAxis,
    pub upper_start: f32,
    pub upper_end: f32,
    pub lower_start: f32,
    pub lower_end: f32,
    pub wall_tex: TextureId,
    pub floor_tex: TextureId,
    pub ceil_tex: TextureId,
}

impl Freeform {
    /// NW corner of the footprint for the instance living at `cell`.
    #[inline]
    pub fn rect_min(&self, cell: IVec2) -> Vec2 {
        cell.as_vec2() + self.margin
    }

    #[inline]
    pub fn rect_max(&self, cell: IVec2) -> Vec2 {
        self.rect_min(cell) + self.extent
    }

    /// Floor and ceiling heights (fractions of the world height) at `p`.
    ///
    /// The projection of `p` onto the slope axis is clamped to the
    /// footprint, so the query is total over all of world space.
    pub fn heights_at(&self, cell: IVec2, p: Vec2) -> (f32, f32) {
        let min = self.rect_min(cell);
        let t = match self.slope_axis {
            SlopeAxis::X => (p.x - min.x) / self.extent.x,
            SlopeAxis::Y => (p.y - min.y) / self.extent.y,
        }
        .clamp(0.0, 1.0);
        (
            self.lower_start + t * (self.lower_end - self.lower_start),
            self.upper_start + t * (self.upper_end - self.upper_start),
        )
    }
}

/// One grid cell. Exactly one variant per tile kind, so a field can
/// never be read for a kind it does not belong to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tile {
    Free {
        floor: TextureId,
        ceil: TextureId,
    },
    /// Full-height solid block with one texture per compass face.
    Wall {
        north: TextureId,
        east: TextureId,
        south: TextureId,
        west: TextureId,
    },
    DiagWall {
        face: DiagFace,
        tex: TextureId,
    },
    /// Door sliding in a north-south dock, hinged on the cell's
    /// x mid-line.
    VerticalDoor {
        tex: TextureId,
        /// Texture shown on neighbouring wall faces the slab docks into.
        dock: TextureId,
    },
    /// Door sliding in a west-east dock, hinged on the cell's y mid-line.
    HorizontalDoor {
        tex: TextureId,
        dock: TextureId,
    },
    Thing {
        def: ThingDef,
        floor: TextureId,
        ceil: TextureId,
    },
    Freeform(Freeform),
}

impl Tile {
    #[inline]
    pub fn is_door(&self) -> bool {
        matches!(
            self,
            Tile::VerticalDoor { .. } | Tile::HorizontalDoor { .. }
        )
    }

    /// Floor/ceiling textures for the flats pass; solid kinds expose
    /// none because their flats can never be seen.
    pub fn flats(&self) -> Option<(TextureId, TextureId)> {
        match *self {
            Tile::Free { floor, ceil } | Tile::Thing { floor, ceil, .. } => Some((floor, ceil)),
            Tile::Freeform(ref ff) => Some((ff.floor_tex, ff.ceil_tex)),
            _ => None,
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Freeform {
        Freeform {
            margin: Vec2::new(0.2, 0.1),
            extent: Vec2::new(0.6, 0.8),
            slope_axis: SlopeAxis::X,
            upper_start: 1.0,
            upper_end: 1.0,
            lower_start: 0.2,
            lower_end: 0.6,
            wall_tex: 0,
            floor_tex: 0,
            ceil_tex: 0,
        }
    }

    #[test]
    fn height_field_matches_endpoints_and_is_linear() {
        let ff = ramp();
        let cell = IVec2::new(3, 4);
        let min = ff.rect_min(cell);
        let max = ff.rect_max(cell);

        let (lo_start, _) = ff.heights_at(cell, Vec2::new(min.x, min.y));
        let (lo_end, _) = ff.heights_at(cell, Vec2::new(max.x, min.y));
        assert!((lo_start - 0.2).abs() < 1e-6);
        assert!((lo_end - 0.6).abs() < 1e-6);

        let mid = Vec2::new(min.x + ff.extent.x * 0.5, min.y);
        let (lo_mid, _) = ff.heights_at(cell, mid);
        assert!((lo_mid - 0.4).abs() < 1e-6);
    }

    #[test]
    fn height_field_clamps_outside_the_footprint() {
        let ff = ramp();
        let cell = IVec2::new(0, 0);
        let (below, _) = ff.heights_at(cell, Vec2::new(-5.0, 0.5));
        let (above, _) = ff.heights_at(cell, Vec2::new(5.0, 0.5));
        assert!((below - 0.2).abs() < 1e-6);
        assert!((above - 0.6).abs() < 1e-6);
    }

    #[test]
    fn diag_endpoints_span_opposite_corners() {
        for i in 0..4 {
            let face = DiagFace::from_index(i).unwrap();
            let (a, b) = face.endpoints();
            assert!((a - b).length_squared() > 1.0, "{face:?} is degenerate");
        }
        assert!(DiagFace::from_index(4).is_none());
    }
}
