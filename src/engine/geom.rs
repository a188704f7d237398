//! Small 2-D intersection helpers shared by the render and collision
//! paths.

use glam::Vec2;

/// Tolerance soaking up float noise in on-segment and side-of-line
/// tests (the grid works in tile units, so 1e-5 is far below a texel).
pub const EPS: f32 = 1e-5;

/// Intersection parameters `(t, s)` with
/// `a0 + t·(a1−a0) == b0 + s·(b1−b0)`.
///
/// Parallel or zero-length inputs return `None` — a degenerate pair must
/// never leak `NaN`/`inf` into hit selection.
pub fn line_intersect_params(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<(f32, f32)> {
    let v = a1 - a0;
    let u = b1 - b0;
    let denom = v.perp_dot(u);
    if denom == 0.0 {
        return None;
    }
    let w = b0 - a0;
    let t = w.perp_dot(u) / denom;
    let s = w.perp_dot(v) / denom;
    (t.is_finite() && s.is_finite()).then_some((t, s))
}

/// Intersection point of the lines through `a0→a1` and `b0→b1`.
/// With `segments` set, the point must lie on both segments.
pub fn line_intersect(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2, segments: bool) -> Option<Vec2> {
    let (t, s) = line_intersect_params(a0, a1, b0, b1)?;
    if segments && !(on_unit_range(t) && on_unit_range(s)) {
        return None;
    }
    let p = a0 + (a1 - a0) * t;
    p.is_finite().then_some(p)
}

#[inline]
fn on_unit_range(t: f32) -> bool {
    (-EPS..=1.0 + EPS).contains(&t)
}

/// Half-open point-in-rectangle test, `[min, max)` on both axes.
#[inline]
pub fn point_in_rect(p: Vec2, min: Vec2, max: Vec2) -> bool {
    p.x >= min.x && p.x < max.x && p.y >= min.y && p.y < max.y
}

/// Axis-aligned rectangle overlap, exclusive at the far edges.
#[inline]
pub fn rects_overlap(min_a: Vec2, max_a: Vec2, min_b: Vec2, max_b: Vec2) -> bool {
    min_b.x < max_a.x && min_a.x < max_b.x && min_b.y < max_a.y && min_a.y < max_b.y
}

/// Is `p` strictly on the left of the directed line `a→b`?
#[inline]
pub fn is_point_left(a: Vec2, b: Vec2, p: Vec2) -> bool {
    (b - a).perp_dot(p - a) < -EPS
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect() {
        let p = line_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(2.0, 0.0),
            true,
        )
        .unwrap();
        assert!((p - Vec2::splat(1.0)).length() < 1e-6);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        assert!(
            line_intersect(
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                false,
            )
            .is_none()
        );
    }

    #[test]
    fn zero_length_segment_is_degenerate() {
        assert!(
            line_intersect(
                Vec2::new(0.5, 0.5),
                Vec2::new(0.5, 0.5),
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 1.0),
                false,
            )
            .is_none()
        );
    }

    #[test]
    fn segment_bounds_are_enforced() {
        // lines cross at (3, 3), outside both segments
        assert!(
            line_intersect(
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(6.0, 0.0),
                Vec2::new(5.0, 1.0),
                true,
            )
            .is_none()
        );
    }

    #[test]
    fn side_of_line() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        assert!(is_point_left(a, b, Vec2::new(0.5, -1.0)));
        assert!(!is_point_left(a, b, Vec2::new(0.5, 1.0)));
        assert!(!is_point_left(a, b, Vec2::new(0.5, 0.0)));
    }
}
