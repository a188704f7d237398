//! Twin-tracer DDA over the tile grid.
//!
//! A [`RayMarcher`] advances two cursors — the next vertical grid-line
//! crossing and the next horizontal one — and yields whichever has
//! covered less distance. **Tie-break: the horizontal tracer wins an
//! exact tie.** Both the renderer and the collision system iterate the
//! same marcher, so the two paths can never disagree on geometry.

use glam::{IVec2, Vec2};

/// Orientation of the grid line a crossing went through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// A vertical grid line (`x` integral) was crossed.
    Vertical,
    /// A horizontal grid line (`y` integral) was crossed.
    Horizontal,
}

/// Transient per-column/per-probe ray. Recomputed for every cast, never
/// persisted.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec2,
    pub dir: Vec2,
    /// `dir.y / dir.x`; infinite for straight vertical rays.
    pub slope: f32,
    /// `dir.x / dir.y`; infinite for straight horizontal rays.
    pub inv_slope: f32,
    pub sign: IVec2,
}

impl Ray {
    pub fn new(origin: Vec2, dir: Vec2) -> Self {
        Self {
            origin,
            dir,
            slope: dir.y / dir.x,
            inv_slope: dir.x / dir.y,
            sign: IVec2::new(sign_i(dir.x), sign_i(dir.y)),
        }
    }

    pub fn from_angle(origin: Vec2, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(origin, Vec2::new(c, s))
    }

    /// Movement-probe ray between two points; `dir` keeps the full
    /// segment length so `1.0` along it is the goal.
    pub fn between(start: Vec2, end: Vec2) -> Self {
        Self::new(start, end - start)
    }
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

/// One step of the march: the cell just entered, where the grid line was
/// crossed, and on which axis.
#[derive(Clone, Copy, Debug)]
pub struct Crossing {
    pub cell: IVec2,
    /// Grid-line intersection point; the ray origin for the first item.
    pub point: Vec2,
    /// `None` only for the cell containing the ray origin.
    pub axis: Option<Axis>,
    /// Squared distance from the origin to `point` (square root deferred
    /// until a true distance is needed).
    pub pseudo_dist: f32,
}

pub struct RayMarcher {
    ray: Ray,
    cols: i32,
    rows: i32,
    /// Cells beyond the grid edge the march may enter (collision probes
    /// use 1 so the boundary wall itself gets inspected).
    slack: i32,
    max_pseudo: f32,
    cell: IVec2,
    v_trace: Vec2,
    h_trace: Vec2,
    v_step: Vec2,
    h_step: Vec2,
    started: bool,
    done: bool,
}

impl RayMarcher {
    pub fn new(ray: Ray, cols: i32, rows: i32, max_dist: f32) -> Self {
        let cell = ray.origin.floor().as_ivec2();
        let v_x = if ray.sign.x > 0 {
            (ray.origin.x + 1.0).floor()
        } else {
            cell.x as f32
        };
        let h_y = if ray.sign.y > 0 {
            (ray.origin.y + 1.0).floor()
        } else {
            cell.y as f32
        };
        Self {
            ray,
            cols,
            rows,
            slack: 0,
            max_pseudo: max_dist * max_dist,
            cell,
            v_trace: Vec2::new(v_x, ray.origin.y + (v_x - ray.origin.x) * ray.slope),
            h_trace: Vec2::new(ray.origin.x + (h_y - ray.origin.y) * ray.inv_slope, h_y),
            v_step: Vec2::new(ray.sign.x as f32, ray.sign.x as f32 * ray.slope),
            h_step: Vec2::new(ray.sign.y as f32 * ray.inv_slope, ray.sign.y as f32),
            started: false,
            done: false,
        }
    }

    /// Let the march run `cells` past the grid edge before terminating.
    pub fn with_slack(mut self, cells: i32) -> Self {
        self.slack = cells;
        self
    }

    fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= -self.slack
            && cell.x < self.cols + self.slack
            && cell.y >= -self.slack
            && cell.y < self.rows + self.slack
    }
}

impl Iterator for RayMarcher {
    type Item = Crossing;

    fn next(&mut self) -> Option<Crossing> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(Crossing {
                cell: self.cell,
                point: self.ray.origin,
                axis: None,
                pseudo_dist: 0.0,
            });
        }

        let v_d = self.ray.origin.distance_squared(self.v_trace);
        let h_d = self.ray.origin.distance_squared(self.h_trace);
        // a tracer whose distance is not finite never advances (the ray
        // runs parallel to its grid lines); if both stall, stop
        let vertical = v_d.is_finite() && (!h_d.is_finite() || v_d < h_d);
        if !vertical && !h_d.is_finite() {
            self.done = true;
            return None;
        }

        let (point, pseudo_dist) = if vertical {
            self.cell.x += self.ray.sign.x;
            let p = self.v_trace;
            self.v_trace += self.v_step;
            (p, v_d)
        } else {
            self.cell.y += self.ray.sign.y;
            let p = self.h_trace;
            self.h_trace += self.h_step;
            (p, h_d)
        };

        if pseudo_dist >= self.max_pseudo || !self.in_bounds(self.cell) {
            self.done = true;
            return None;
        }

        Some(Crossing {
            cell: self.cell,
            point,
            axis: Some(if vertical {
                Axis::Vertical
            } else {
                Axis::Horizontal
            }),
            pseudo_dist,
        })
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
