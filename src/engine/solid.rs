//! Decides, per cell yielded by the marcher, whether the ray stops.
//!
//! Walls stop at the crossing itself; doors are advanced algebraically
//! to their mid-line plane and only count while the slab covers the hit;
//! diagonal walls run a segment intersection against the cell diagonal.

use glam::{IVec2, Vec2};

use crate::engine::geom::{line_intersect, point_in_rect};
use crate::engine::ray::{Axis, Crossing, Ray};
use crate::world::texture::TextureId;
use crate::world::{DiagFace, Tile, World};

/// Compass face struck, for texture pick and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    North,
    East,
    South,
    West,
    Diagonal,
}

#[derive(Clone, Copy, Debug)]
pub struct SolidHit {
    pub point: Vec2,
    /// Surface axis, used downstream for texture-dimension pick.
    pub axis: Axis,
    pub face: Face,
    pub tex: TextureId,
    /// Horizontal texture sampling offset in `[0, 1)`; for doors the
    /// offset is shifted by the open fraction so the slab appears to
    /// slide into its dock.
    pub u: f32,
    pub pseudo_dist: f32,
}

/// Resolve `crossing` against a potentially solid tile. `None` means
/// the ray keeps going (free tile, open doorway, missed diagonal).
pub fn resolve(world: &World, ray: &Ray, crossing: &Crossing) -> Option<SolidHit> {
    match *world.grid.tile(crossing.cell) {
        Tile::Wall {
            north,
            east,
            south,
            west,
        } => Some(wall_hit(world, ray, crossing, [north, east, south, west])),
        Tile::VerticalDoor { tex, .. } => vertical_door_hit(world, ray, crossing, tex),
        Tile::HorizontalDoor { tex, .. } => horizontal_door_hit(world, ray, crossing, tex),
        Tile::DiagWall { face, tex } => diag_hit(ray, crossing, face, tex),
        _ => None,
    }
}

fn wall_hit(world: &World, ray: &Ray, crossing: &Crossing, [n, e, s, w]: [TextureId; 4]) -> SolidHit {
    let cell = crossing.cell;
    let p = crossing.point;
    // a ray can only start inside a wall when the player is stuck in
    // one; pick the vertical face arbitrarily in that case
    let axis = crossing.axis.unwrap_or(Axis::Vertical);
    let (face, tex, u, behind) = match axis {
        Axis::Vertical => {
            let (face, tex) = if ray.sign.x < 0 {
                (Face::East, e)
            } else {
                (Face::West, w)
            };
            (
                face,
                tex,
                p.y - cell.y as f32,
                IVec2::new(cell.x - ray.sign.x, cell.y),
            )
        }
        Axis::Horizontal => {
            let (face, tex) = if ray.sign.y < 0 {
                (Face::South, s)
            } else {
                (Face::North, n)
            };
            (
                face,
                tex,
                p.x - cell.x as f32,
                IVec2::new(cell.x, cell.y - ray.sign.y),
            )
        }
    };
    // faces flanking a doorway show the dock the slab slides into
    let tex = match (axis, world.grid.tile(behind)) {
        (Axis::Vertical, Tile::HorizontalDoor { dock, .. }) => *dock,
        (Axis::Horizontal, Tile::VerticalDoor { dock, .. }) => *dock,
        _ => tex,
    };
    SolidHit {
        point: p,
        axis,
        face,
        tex,
        u,
        pseudo_dist: crossing.pseudo_dist,
    }
}

fn vertical_door_hit(
    world: &World,
    ray: &Ray,
    crossing: &Crossing,
    tex: TextureId,
) -> Option<SolidHit> {
    let cell = crossing.cell;
    let (cx, cy) = (cell.x as f32, cell.y as f32);
    // the slab lives on the cell's x mid-line, not its edge
    let plane_x = cx + 0.5;
    let y = crossing.point.y + (plane_x - crossing.point.x) * ray.slope;
    if !y.is_finite() {
        return None; // ray parallel to the door plane
    }
    let closed = world.doors.get(cell)?.closed_fraction();
    // the slab hangs from the north jamb and retracts northwards
    if y < cy || y >= cy + closed {
        return None;
    }
    let point = Vec2::new(plane_x, y);
    Some(SolidHit {
        point,
        axis: Axis::Vertical,
        face: if ray.sign.x < 0 { Face::East } else { Face::West },
        tex,
        u: y - cy + 1.0 - closed,
        pseudo_dist: ray.origin.distance_squared(point),
    })
}

fn horizontal_door_hit(
    world: &World,
    ray: &Ray,
    crossing: &Crossing,
    tex: TextureId,
) -> Option<SolidHit> {
    let cell = crossing.cell;
    let (cx, cy) = (cell.x as f32, cell.y as f32);
    let plane_y = cy + 0.5;
    let x = crossing.point.x + (plane_y - crossing.point.y) * ray.inv_slope;
    if !x.is_finite() {
        return None;
    }
    let closed = world.doors.get(cell)?.closed_fraction();
    // the slab hangs from the east jamb and retracts eastwards
    if x < cx + 1.0 - closed || x >= cx + 1.0 {
        return None;
    }
    let point = Vec2::new(x, plane_y);
    Some(SolidHit {
        point,
        axis: Axis::Horizontal,
        face: if ray.sign.y < 0 {
            Face::South
        } else {
            Face::North
        },
        tex,
        u: x - cx - (1.0 - closed),
        pseudo_dist: ray.origin.distance_squared(point),
    })
}

fn diag_hit(ray: &Ray, crossing: &Crossing, face: DiagFace, tex: TextureId) -> Option<SolidHit> {
    let base = crossing.cell.as_vec2();
    let (e0, e1) = face.endpoints();
    let a = base + e0;
    let b = base + e1;

    // degenerate branch: the ray starts inside this tile, so origin and
    // entry point coincide — re-aim through a point one step along the
    // ray instead of a zero-length segment
    let inside = crossing.axis.is_none();
    let toward = if inside {
        if ray.slope.abs() < 1.0 {
            crossing.point + Vec2::new(ray.sign.x as f32, ray.sign.x as f32 * ray.slope)
        } else {
            crossing.point + Vec2::new(ray.sign.y as f32 * ray.inv_slope, ray.sign.y as f32)
        }
    } else {
        crossing.point
    };

    let hit = line_intersect(ray.origin, toward, a, b, inside)?;
    // the intersection only counts while it sits on the diagonal segment
    if !inside && !point_in_rect(hit, a.min(b), a.max(b)) {
        return None;
    }
    Some(SolidHit {
        point: hit,
        axis: crossing.axis.unwrap_or(Axis::Vertical),
        face: Face::Diagonal,
        tex,
        u: (hit.x - a.x) / (b.x - a.x),
        pseudo_dist: ray.origin.distance_squared(hit),
    })
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ray::RayMarcher;
    use crate::world::{DOOR_STEP_INTERVAL, Grid, WorldConfig};

    /// 5×5 room with the given tile in the middle.
    fn world_with(center: Tile) -> World {
        let mut cells = vec![Tile::Free { floor: 0, ceil: 0 }; 25];
        for (i, cell) in cells.iter_mut().enumerate() {
            let (x, y) = (i % 5, i / 5);
            if x == 0 || x == 4 || y == 0 || y == 4 {
                *cell = Tile::Wall {
                    north: 1,
                    east: 2,
                    south: 3,
                    west: 4,
                };
            }
        }
        cells[12] = center;
        World::new(Grid::new(5, 5, cells).unwrap(), WorldConfig::default())
    }

    fn first_hit(world: &World, origin: Vec2, angle: f32) -> Option<SolidHit> {
        let ray = Ray::from_angle(origin, angle);
        RayMarcher::new(ray, world.grid.cols(), world.grid.rows(), 50.0)
            .find_map(|c| resolve(world, &ray, &c))
    }

    #[test]
    fn wall_face_and_offset_follow_the_hit_axis() {
        let world = world_with(Tile::Free { floor: 0, ceil: 0 });
        // eastwards into the x = 4 wall column
        let hit = first_hit(&world, Vec2::new(1.5, 2.25), 0.0).unwrap();
        assert_eq!(hit.face, Face::West);
        assert_eq!(hit.tex, 4);
        assert!((hit.u - 0.25).abs() < 1e-5);
        assert!((hit.point.x - 4.0).abs() < 1e-5);

        // southwards into the y = 4 wall row
        let hit = first_hit(&world, Vec2::new(2.25, 1.5), std::f32::consts::FRAC_PI_2).unwrap();
        assert_eq!(hit.face, Face::North);
        assert_eq!(hit.tex, 1);
        assert!((hit.u - 0.25).abs() < 1e-5);
    }

    #[test]
    fn closed_door_blocks_at_the_mid_plane() {
        let world = world_with(Tile::VerticalDoor { tex: 7, dock: 8 });
        let hit = first_hit(&world, Vec2::new(1.5, 2.5), 0.0).unwrap();
        assert_eq!(hit.tex, 7);
        assert!((hit.point.x - 2.5).abs() < 1e-5);
        let expected = Vec2::new(1.5, 2.5).distance(Vec2::new(2.5, 2.5));
        assert!((hit.pseudo_dist.sqrt() - expected).abs() < 1e-4);
    }

    #[test]
    fn door_blocks_exactly_its_closed_fraction() {
        let mut world = world_with(Tile::VerticalDoor { tex: 7, dock: 8 });
        let cell = IVec2::new(2, 2);
        let origin = Vec2::new(1.5, 2.05);

        // fully closed: blocked; after k opening steps only the closed
        // fraction keeps blocking, monotonically in k
        let mut blocked_states = Vec::new();
        for step in 0..=10u8 {
            let closed = world.doors.get(cell).unwrap().closed_fraction();
            // ray aimed at a fixed fraction of the doorway
            for frac in [0.05, 0.35, 0.65, 0.95] {
                let target = Vec2::new(2.5, 2.0 + frac);
                let angle = (target - origin).y.atan2((target - origin).x);
                let hit = first_hit(&world, origin, angle);
                let hits_door = hit.is_some_and(|h| (h.point.x - 2.5).abs() < 1e-4);
                assert_eq!(
                    hits_door,
                    frac < closed,
                    "step {step} frac {frac} closed {closed}"
                );
            }
            blocked_states.push(closed);
            if step == 0 {
                world.doors.interact(cell);
            }
            world
                .doors
                .advance(DOOR_STEP_INTERVAL, (Vec2::splat(9.0), Vec2::splat(9.5)));
        }
        assert!(blocked_states.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(*blocked_states.last().unwrap(), 0.0);
    }

    #[test]
    fn open_door_never_blocks() {
        let mut world = world_with(Tile::HorizontalDoor { tex: 7, dock: 8 });
        world.doors.interact(IVec2::new(2, 2));
        world.doors.advance(
            10.0 * DOOR_STEP_INTERVAL,
            (Vec2::splat(9.0), Vec2::splat(9.5)),
        );
        let hit = first_hit(&world, Vec2::new(2.5, 1.2), std::f32::consts::FRAC_PI_2).unwrap();
        // the ray sails through the doorway into the far wall
        assert_eq!(hit.face, Face::North);
        assert!((hit.point.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn diagonal_hits_lie_on_the_segment_from_both_sides() {
        let world = world_with(Tile::DiagWall {
            face: DiagFace::SlashWest,
            tex: 9,
        });
        // the diagonal runs (2,3) → (3,2); cast at its center from both
        // sides
        let center = Vec2::new(2.5, 2.5);
        for origin in [Vec2::new(1.2, 1.2), Vec2::new(3.8, 3.8)] {
            let d = center - origin;
            let hit = first_hit(&world, origin, d.y.atan2(d.x)).unwrap();
            assert_eq!(hit.face, Face::Diagonal);
            // on the segment: x + y == 5 for this diagonal
            assert!((hit.point.x + hit.point.y - 5.0).abs() < 1e-4, "{hit:?}");
            assert!((0.0..=1.0).contains(&hit.u));
        }
    }

    #[test]
    fn ray_starting_inside_a_diagonal_tile_still_resolves() {
        let world = world_with(Tile::DiagWall {
            face: DiagFace::SlashWest,
            tex: 9,
        });
        let origin = Vec2::new(2.2, 2.2); // north-west of the diagonal
        let hit = first_hit(&world, origin, std::f32::consts::FRAC_PI_4).unwrap();
        assert_eq!(hit.face, Face::Diagonal);
        assert!((hit.point.x + hit.point.y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn wall_behind_a_doorway_shows_the_dock() {
        let mut world = world_with(Tile::VerticalDoor { tex: 7, dock: 8 });
        // jamb wall directly south of the doorway
        world
            .grid
            .set_tile(
                IVec2::new(2, 3),
                Tile::Wall {
                    north: 1,
                    east: 2,
                    south: 3,
                    west: 4,
                },
            )
            .unwrap();
        world.doors.interact(IVec2::new(2, 2));
        world.doors.advance(
            10.0 * DOOR_STEP_INTERVAL,
            (Vec2::splat(9.0), Vec2::splat(9.5)),
        );

        // through the open doorway into the jamb: dock texture, not the
        // wall's own north face
        let hit = first_hit(&world, Vec2::new(2.5, 1.5), std::f32::consts::FRAC_PI_2).unwrap();
        assert_eq!(hit.face, Face::North);
        assert!((hit.point.y - 3.0).abs() < 1e-5);
        assert_eq!(hit.tex, 8);

        // the same wall hit from a column that never crossed the doorway
        // keeps its own texture
        let plain = first_hit(&world, Vec2::new(1.5, 2.5), std::f32::consts::FRAC_PI_2).unwrap();
        assert_eq!(plain.tex, 1);
    }
}
