//! Ray resolution against freeform tiles: sub-rectangle entry/exit
//! points plus the interpolated floor/ceiling height field.
//!
//! Unlike the solid resolvers this never stops the ray — the hit is
//! queued in the depth buffer and composited after the solid stop is
//! known.

use bitflags::bitflags;
use glam::{IVec2, Vec2};
use smallvec::SmallVec;

use crate::engine::geom::point_in_rect;
use crate::engine::ray::{Axis, Ray};
use crate::world::Freeform;

bitflags! {
    /// Which portions of a freeform tile the viewer can see.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FreeformVis: u8 {
        /// The front wall faces of the floor/ceiling slabs.
        const WALL = 1;
        /// The slab top/underside surfaces.
        const FLATS = 2;
    }
}

/// Footprint edge a hit point was found on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    North,
    East,
    South,
    West,
}

impl Edge {
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Edge::East | Edge::West => Axis::Vertical,
            Edge::North | Edge::South => Axis::Horizontal,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FreeformHit {
    pub cell: IVec2,
    /// Entry into and exit out of the footprint, ordered along the ray.
    pub front: Vec2,
    pub back: Vec2,
    pub vis: FreeformVis,
    /// Edge the front intersection sits on; `None` when the viewer
    /// stands inside the footprint and no wall face is visible.
    pub front_edge: Option<Edge>,
    /// Wall texture sampling offset in `[0, 1)`.
    pub u: f32,
    pub pseudo_front: f32,
    pub pseudo_back: f32,
}

/// Intersect the ray with the footprint of `tile` at `cell`.
///
/// A single straight ray meets the rectangle in at most two of its four
/// edges; fewer than two means the tile is missed entirely.
pub fn resolve(tile: &Freeform, cell: IVec2, ray: &Ray) -> Option<FreeformHit> {
    let min = tile.rect_min(cell);
    let max = tile.rect_max(cell);
    let o = ray.origin;

    let mut pts: SmallVec<[(Vec2, Edge); 4]> = SmallVec::new();
    let north_x = o.x + (min.y - o.y) * ray.inv_slope;
    if north_x.is_finite() && north_x >= min.x && north_x < max.x {
        pts.push((Vec2::new(north_x, min.y), Edge::North));
    }
    let east_y = o.y + (max.x - o.x) * ray.slope;
    if east_y.is_finite() && east_y >= min.y && east_y < max.y {
        pts.push((Vec2::new(max.x, east_y), Edge::East));
    }
    let south_x = o.x + (max.y - o.y) * ray.inv_slope;
    if south_x.is_finite() && south_x >= min.x && south_x < max.x {
        pts.push((Vec2::new(south_x, max.y), Edge::South));
    }
    let west_y = o.y + (min.x - o.x) * ray.slope;
    if west_y.is_finite() && west_y >= min.y && west_y < max.y {
        pts.push((Vec2::new(min.x, west_y), Edge::West));
    }
    if pts.len() < 2 {
        return None;
    }

    // order front/back along the ray; the line intersections above do
    // not know the ray direction, so sort by covered distance
    let d0 = o.distance_squared(pts[0].0);
    let d1 = o.distance_squared(pts[1].0);
    let (front, back, pseudo_front, pseudo_back) = if d0 <= d1 {
        (pts[0], pts[1], d0, d1)
    } else {
        (pts[1], pts[0], d1, d0)
    };

    let inside = point_in_rect(o, min, max);
    // a footprint sitting behind the viewer (possible only for the cell
    // the ray starts in) is not a hit
    if !inside && (front.0 - o).dot(ray.dir) <= 0.0 {
        return None;
    }
    let front_edge = (!inside).then_some(front.1);

    let mut vis = FreeformVis::empty();
    if pseudo_front < pseudo_back {
        vis |= FreeformVis::FLATS;
        if !inside {
            vis |= FreeformVis::WALL;
        }
    }
    if inside {
        vis |= FreeformVis::FLATS;
    }

    let u = match front.1 {
        Edge::West => (front.0.y - min.y) / tile.extent.y,
        Edge::East => (max.y - front.0.y) / tile.extent.y,
        Edge::North | Edge::South => (front.0.x - min.x) / tile.extent.x,
    };

    Some(FreeformHit {
        cell,
        front: front.0,
        back: back.0,
        vis,
        front_edge,
        u,
        pseudo_front,
        pseudo_back,
    })
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SlopeAxis;

    fn slab() -> Freeform {
        Freeform {
            margin: Vec2::new(0.2, 0.2),
            extent: Vec2::new(0.6, 0.6),
            slope_axis: SlopeAxis::X,
            upper_start: 1.0,
            upper_end: 1.0,
            lower_start: 0.3,
            lower_end: 0.3,
            wall_tex: 0,
            floor_tex: 0,
            ceil_tex: 0,
        }
    }

    #[test]
    fn ray_through_the_footprint_yields_entry_and_exit() {
        let cell = IVec2::new(2, 2);
        let ray = Ray::from_angle(Vec2::new(0.5, 2.5), 0.0);
        let hit = resolve(&slab(), cell, &ray).unwrap();

        assert!((hit.front - Vec2::new(2.2, 2.5)).length() < 1e-5);
        assert!((hit.back - Vec2::new(2.8, 2.5)).length() < 1e-5);
        assert_eq!(hit.front_edge, Some(Edge::West));
        assert_eq!(hit.front_edge.map(Edge::axis), Some(Axis::Vertical));
        assert!(hit.vis.contains(FreeformVis::WALL | FreeformVis::FLATS));
        assert!(hit.pseudo_front < hit.pseudo_back);
        // west-edge offset measures from the north corner
        assert!((hit.u - 0.5).abs() < 1e-5);
    }

    #[test]
    fn grazing_ray_misses() {
        let cell = IVec2::new(2, 2);
        // passes north of the footprint
        let ray = Ray::from_angle(Vec2::new(0.5, 2.1), 0.0);
        assert!(resolve(&slab(), cell, &ray).is_none());
    }

    #[test]
    fn viewer_inside_the_footprint_sees_flats_but_no_wall() {
        let cell = IVec2::new(2, 2);
        let ray = Ray::from_angle(Vec2::new(2.5, 2.5), 0.1);
        let hit = resolve(&slab(), cell, &ray).unwrap();
        assert!(hit.front_edge.is_none());
        assert!(hit.vis.contains(FreeformVis::FLATS));
        assert!(!hit.vis.contains(FreeformVis::WALL));
    }

    #[test]
    fn front_edge_classifies_the_sampling_axis() {
        let cell = IVec2::new(2, 2);
        let ray = Ray::from_angle(Vec2::new(2.5, 0.5), std::f32::consts::FRAC_PI_2);
        let hit = resolve(&slab(), cell, &ray).unwrap();
        assert_eq!(hit.front_edge, Some(Edge::North));
        assert_eq!(hit.front_edge.map(Edge::axis), Some(Axis::Horizontal));
        assert!((hit.u - 0.5).abs() < 1e-4);
    }

    #[test]
    fn axis_parallel_ray_is_not_degenerate() {
        // straight east: inv_slope is infinite, north/south edge tests
        // must drop out instead of producing non-finite points
        let cell = IVec2::new(2, 2);
        let ray = Ray::from_angle(Vec2::new(0.5, 2.5), 0.0);
        let hit = resolve(&slab(), cell, &ray).unwrap();
        assert!(hit.front.is_finite() && hit.back.is_finite());
    }
}
