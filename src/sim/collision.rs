//! Movement resolution against the grid.
//!
//! The four corners of the player's box each sweep their movement
//! segment through the same [`RayMarcher`] the renderer uses, so the
//! two paths can never disagree about what is solid. A blocking corner
//! produces a surface normal; the displacement loses its normal
//! component (sliding) and the probe repeats with the corrected goal.
//! The loop is bounded: past [`MAX_SLIDE_ITERATIONS`] the move is
//! abandoned and the caller keeps its position.

use glam::{IVec2, Vec2};
use tracing::warn;

use crate::engine::geom::{EPS, is_point_left, line_intersect, rects_overlap};
use crate::engine::ray::{Crossing, Ray, RayMarcher};
use crate::world::{BlockRule, DiagFace, Freeform, Tile, World};

/// One slide attempt per box corner; after that the move is abandoned.
pub const MAX_SLIDE_ITERATIONS: usize = 4;

/// Box corner offsets in clockwise order, scaled by the margin.
const CORNERS: [Vec2; 4] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

/// Per-mover parameters of a collision query.
#[derive(Clone, Copy, Debug)]
pub struct MoveProbe {
    /// Half-width of the mover's box.
    pub margin: f32,
    /// Current floor elevation, world-Z.
    pub feet: f32,
    /// Highest floor rise the mover can step onto.
    pub knee_height: f32,
    /// Vertical clearance the mover needs between floor and ceiling.
    pub clearance: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct MoveResult {
    pub pos: Vec2,
    /// Highest freeform floor under the resolved footprint, world-Z.
    pub floor_h: f32,
    /// The slide loop failed to converge and the move was cancelled.
    pub blocked: bool,
}

/// What a single swept segment ran into.
#[derive(Clone, Copy, Debug)]
struct GridHit {
    /// Unit normal of the struck surface.
    normal: Vec2,
    point: Vec2,
    /// Goal of the vertex that actually collided, when it is not the
    /// probed corner's own goal.
    goal: Option<Vec2>,
    /// Resolve immediately, skipping the remaining corners.
    decisive: bool,
}

/// Resolve `delta` applied to a box of half-width `probe.margin` at
/// `from`. Sliding repeats until free or the iteration bound trips.
pub fn resolve_movement(world: &World, from: Vec2, delta: Vec2, probe: &MoveProbe) -> MoveResult {
    let mut goal = from + delta;
    if delta == Vec2::ZERO {
        return MoveResult {
            pos: from,
            floor_h: footprint_floor_height(world, from, probe.margin),
            blocked: false,
        };
    }

    for _ in 0..MAX_SLIDE_ITERATIONS {
        let Some((hit, corner_goal)) = deepest_corner_hit(world, from, goal, probe) else {
            return MoveResult {
                pos: goal,
                floor_h: footprint_floor_height(world, goal, probe.margin),
                blocked: false,
            };
        };
        // sliding response: project the overshoot onto the normal and
        // pull the goal back by that amount
        let len = (hit.point - corner_goal).dot(hit.normal);
        let resolved = goal + hit.normal * len;
        if resolved.distance_squared(goal) < EPS * EPS {
            break; // no progress to be made, concave corner
        }
        goal = resolved;
    }

    warn!(?from, ?delta, "slide loop did not converge, move cancelled");
    MoveResult {
        pos: from,
        floor_h: footprint_floor_height(world, from, probe.margin),
        blocked: true,
    }
}

/// Sweep all four corners and keep the hit whose vertex trespassed the
/// deepest — the farther a vertex clipped through, the earlier it must
/// have collided.
fn deepest_corner_hit(
    world: &World,
    from: Vec2,
    goal: Vec2,
    probe: &MoveProbe,
) -> Option<(GridHit, Vec2)> {
    let delta = goal - from;
    let mut best: Option<(f32, GridHit, Vec2)> = None;
    for offset in CORNERS {
        let start = from + offset * probe.margin;
        let Some(hit) = sweep_segment(world, from, start, start + delta, probe) else {
            continue;
        };
        let corner_goal = hit.goal.unwrap_or(start + delta);
        if hit.decisive {
            return Some((hit, corner_goal));
        }
        let trespass = hit.point.distance_squared(corner_goal);
        if best.as_ref().is_none_or(|(t, _, _)| *t < trespass) {
            best = Some((trespass, hit, corner_goal));
        }
    }
    best.map(|(_, hit, corner_goal)| (hit, corner_goal))
}

/// March one corner's movement segment through the grid.
///
/// `center` is the mover's center, needed by the diagonal/freeform
/// branches which test the whole box rather than the single corner.
fn sweep_segment(
    world: &World,
    center: Vec2,
    start: Vec2,
    end: Vec2,
    probe: &MoveProbe,
) -> Option<GridHit> {
    let delta = end - start;
    let ray = Ray::between(start, end);
    let marcher = RayMarcher::new(
        ray,
        world.grid.cols(),
        world.grid.rows(),
        start.distance(end),
    )
    .with_slack(1);

    for crossing in marcher {
        match *world.grid.tile(crossing.cell) {
            Tile::DiagWall { face, .. } => {
                if let Some(hit) = diag_box_sweep(center, delta, crossing.cell, face, probe.margin)
                {
                    return Some(hit);
                }
            }
            Tile::Freeform(ref ff) => {
                if let Some(hit) = freeform_step_block(world, center, delta, crossing.cell, ff, probe)
                {
                    return Some(hit);
                }
            }
            _ => {
                if world.is_blocking(crossing.cell, BlockRule::Movement) {
                    return edge_or_corner_hit(world, center, &ray, &crossing);
                }
            }
        }
    }
    None
}

/// Normal of an axis-aligned blocking tile, with the corner tie-break:
/// a segment entering exactly through a cell corner slides along the
/// axis that is not independently blocked, falling back to its own hit
/// axis.
fn edge_or_corner_hit(
    world: &World,
    center: Vec2,
    ray: &Ray,
    crossing: &Crossing,
) -> Option<GridHit> {
    let cell = crossing.cell;
    let hit = crossing.point;
    let (cx, cy) = (cell.x as f32, cell.y as f32);
    let (sx, sy) = (ray.sign.x, ray.sign.y);

    let near = |a: f32, b: f32| (a - b).abs() < 1e-4;
    let on_vertical =
        (near(hit.x, cx) || near(hit.x, cx + 1.0)) && (center.x - hit.x) * sx as f32 <= 0.0;
    let on_horizontal =
        (near(hit.y, cy) || near(hit.y, cy + 1.0)) && (center.y - hit.y) * sy as f32 <= 0.0;

    let mut normal = Vec2::ZERO;
    if on_vertical && sx != 0 {
        if on_horizontal
            && !world.is_blocking_at(center + Vec2::new(sx as f32, 0.0), BlockRule::Movement)
        {
            normal.y -= sy as f32;
        } else {
            normal.x -= sx as f32;
        }
    } else if on_horizontal && sy != 0 {
        if on_vertical
            && !world.is_blocking_at(center + Vec2::new(0.0, sy as f32), BlockRule::Movement)
        {
            normal.x -= sx as f32;
        } else {
            normal.y -= sy as f32;
        }
    }
    // a zero normal means there is nothing to resolve after all
    (normal != Vec2::ZERO).then_some(GridHit {
        normal,
        point: hit,
        goal: None,
        decisive: false,
    })
}

/// Test all four box corners against the cell diagonal and resolve for
/// the most-penetrated one.
fn diag_box_sweep(
    center: Vec2,
    delta: Vec2,
    cell: IVec2,
    face: DiagFace,
    margin: f32,
) -> Option<GridHit> {
    let base = cell.as_vec2();
    let (e0, e1) = face.endpoints();
    let a = base + e0;
    let b = base + e1;

    let mut best: Option<(f32, Vec2, Vec2)> = None;
    for offset in CORNERS {
        let corner_goal = center + delta + offset * margin;
        // only vertices ending up on the solid side can have clipped
        // through the wall
        if !is_point_left(a, b, corner_goal) {
            continue;
        }
        let corner_start = corner_goal - delta;
        // parallel movement never intersects; skip the vertex
        let Some(isect) = line_intersect(a, b, corner_start, corner_goal, false) else {
            continue;
        };
        let trespass = isect.distance_squared(corner_goal);
        if best.as_ref().is_none_or(|(t, _, _)| *t < trespass) {
            best = Some((trespass, isect, corner_goal));
        }
    }
    let (_, point, corner_goal) = best?;
    let normal = Vec2::new(a.y - b.y, b.x - a.x) * std::f32::consts::FRAC_1_SQRT_2;
    Some(GridHit {
        normal,
        point,
        goal: Some(corner_goal),
        decisive: true,
    })
}

/// Freeform tiles block only when the box cannot step onto or duck
/// under them: floor rise above the knee, or floor-to-ceiling gap
/// tighter than the clearance.
fn freeform_step_block(
    world: &World,
    center: Vec2,
    delta: Vec2,
    cell: IVec2,
    ff: &Freeform,
    probe: &MoveProbe,
) -> Option<GridHit> {
    let m = probe.margin;
    // footprint inflated by the box margin: the box collides with the
    // expanded rectangle exactly when it overlaps the real one
    let min = ff.rect_min(cell) - Vec2::splat(m);
    let max = ff.rect_max(cell) + Vec2::splat(m);
    let goal = center + delta;
    let (sx, sy) = (sign_i(delta.x), sign_i(delta.y));

    let x_trespassing = match sx {
        1 => goal.x > min.x,
        -1 => goal.x < max.x,
        _ => goal.x > min.x && goal.x < max.x,
    };
    let y_trespassing = match sy {
        1 => goal.y > min.y,
        -1 => goal.y < max.y,
        _ => goal.y > min.y && goal.y < max.y,
    };
    if !x_trespassing || !y_trespassing {
        return None;
    }

    // leading edges of the expanded rectangle, facing the mover
    let v_x = if sx > 0 { min.x } else { max.x };
    let h_y = if sy > 0 { min.y } else { max.y };
    let v_hit = (sx != 0)
        .then(|| {
            line_intersect(
                Vec2::new(v_x, min.y),
                Vec2::new(v_x, max.y),
                center,
                goal,
                true,
            )
        })
        .flatten();
    let h_hit = (sy != 0)
        .then(|| {
            line_intersect(
                Vec2::new(min.x, h_y),
                Vec2::new(max.x, h_y),
                center,
                goal,
                true,
            )
        })
        .flatten();

    let (hit, vertical) = match (v_hit, h_hit) {
        // corner case: pick the axis whose neighbouring cell would
        // block anyway, so the slide happens along the open one
        (Some(v), Some(h)) => {
            if world.is_blocking_at(center + Vec2::new(sx as f32, 0.0), BlockRule::Movement) {
                (v, true)
            } else {
                (h, false)
            }
        }
        (Some(v), None) => (v, true),
        (None, Some(h)) => (h, false),
        (None, None) => return None,
    };

    let (floor_frac, ceil_frac) = ff.heights_at(cell, hit);
    let floor_z = floor_frac * world.config.world_h;
    let ceil_z = ceil_frac * world.config.world_h;
    if floor_z - probe.feet > probe.knee_height || probe.clearance > ceil_z - floor_z {
        let normal = if vertical {
            Vec2::new(-sx as f32, 0.0)
        } else {
            Vec2::new(0.0, -sy as f32)
        };
        return Some(GridHit {
            normal,
            point: hit,
            goal: Some(goal),
            decisive: false,
        });
    }
    None
}

/// Highest freeform floor under the box at `pos` — the caller commits
/// this as the mover's new elevation.
pub fn footprint_floor_height(world: &World, pos: Vec2, margin: f32) -> f32 {
    let box_min = pos - Vec2::splat(margin);
    let box_max = pos + Vec2::splat(margin);
    let mut max_h = 0.0f32;
    for offset in CORNERS {
        let v = pos + offset * margin;
        let cell = v.floor().as_ivec2();
        let Tile::Freeform(ff) = world.grid.tile(cell) else {
            continue;
        };
        if !rects_overlap(box_min, box_max, ff.rect_min(cell), ff.rect_max(cell)) {
            continue;
        }
        let (floor_frac, _) = ff.heights_at(cell, v);
        max_h = max_h.max(floor_frac * world.config.world_h);
    }
    max_h
}

#[inline]
fn sign_i(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
