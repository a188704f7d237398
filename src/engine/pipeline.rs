//! The per-column render pipeline.
//!
//! For every screen column: cast one ray, march the grid, stop at the
//! first solid hit, queue the non-solid geometry crossed on the way, and
//! emit ordered draw instructions — flats, the solid wall, then the
//! depth buffer back-to-front.

use glam::Vec2;

use crate::engine::depth::{DepthBuffer, DepthEntry, DepthKind, billboard_hit};
use crate::engine::freeform::{self, FreeformVis};
use crate::engine::ray::{Ray, RayMarcher};
use crate::engine::solid::{self, SolidHit};
use crate::renderer::{ColumnSink, DrawCmd, FlatKind};
use crate::world::texture::NO_TEXTURE;
use crate::world::{Camera, Tile, World};

/// Screen projection shared by the pipeline and the flats rasteriser.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    /// Focal length in pixels.
    pub focal: f32,
    /// Screen row of the eye level, pitch shear included.
    pub horizon: f32,
    /// Eye elevation in world-Z units.
    pub eye: f32,
    /// World-Z units per tile of wall height.
    pub world_h: f32,
}

impl Projection {
    pub fn new(camera: &Camera, world_h: f32, width: usize, height: usize) -> Self {
        Self {
            focal: camera.focal(width),
            horizon: height as f32 * 0.5 + camera.pitch,
            eye: camera.eye,
            world_h,
        }
    }

    /// Screen row where world height `z` lands at view-corrected
    /// distance `dist`.
    #[inline]
    pub fn row(&self, z: f32, dist: f32) -> f32 {
        self.horizon + self.focal * (self.eye - z) / (self.world_h * dist)
    }

    /// Inverse of [`row`](Self::row): the corrected distance at which
    /// world height `z` projects onto screen row `y`.
    #[inline]
    pub fn dist_for_row(&self, z: f32, y: f32) -> f32 {
        self.focal * (self.eye - z) / (self.world_h * (y - self.horizon))
    }
}

/// Render one frame into `sink`, one ray per screen column.
pub fn render_frame<S: ColumnSink>(
    world: &World,
    camera: &Camera,
    width: usize,
    height: usize,
    sink: &mut S,
) {
    let proj = Projection::new(camera, world.config.world_h, width, height);
    let draw_dist = world.config.draw_dist;
    let view = camera.forward();

    // the freeform tile underfoot stays in the depth buffer even when
    // the solid stop is nearer, so its flats never vanish under the
    // player
    let player_cell = camera.pos.floor().as_ivec2();
    let keep_cell =
        matches!(world.grid.tile(player_cell), Tile::Freeform(_)).then_some(player_cell);

    let mut depth = DepthBuffer::default();

    for col in 0..width {
        let angle = camera.column_angle(col, width);
        let ray = Ray::from_angle(camera.pos, angle);
        sink.begin_column(col, angle);
        depth.clear();

        let mut solid: Option<SolidHit> = None;
        for crossing in RayMarcher::new(ray, world.grid.cols(), world.grid.rows(), draw_dist) {
            match *world.grid.tile(crossing.cell) {
                Tile::Free { .. } => {}
                Tile::Thing { ref def, .. } => {
                    if let Some((hit, u)) = billboard_hit(&ray, crossing.cell, view) {
                        depth.push(DepthEntry {
                            cell: crossing.cell,
                            pseudo_dist: ray.origin.distance_squared(hit),
                            kind: DepthKind::Sprite {
                                tex: def.sprite,
                                height: def.height,
                                u,
                            },
                        });
                    }
                }
                Tile::Freeform(ref ff) => {
                    if let Some(hit) = freeform::resolve(ff, crossing.cell, &ray) {
                        let (ffl, ffc) = ff.heights_at(crossing.cell, hit.front);
                        let (bfl, bfc) = ff.heights_at(crossing.cell, hit.back);
                        depth.push(DepthEntry {
                            cell: crossing.cell,
                            pseudo_dist: hit.pseudo_front,
                            kind: DepthKind::Freeform {
                                wall_tex: ff.wall_tex,
                                floor_tex: ff.floor_tex,
                                ceil_tex: ff.ceil_tex,
                                vis: hit.vis,
                                u: hit.u,
                                front: hit.front,
                                back: hit.back,
                                front_floor: ffl * proj.world_h,
                                front_ceil: ffc * proj.world_h,
                                back_floor: bfl * proj.world_h,
                                back_ceil: bfc * proj.world_h,
                                pseudo_back: hit.pseudo_back,
                            },
                        });
                    }
                }
                _ => {
                    if let Some(hit) = solid::resolve(world, &ray, &crossing) {
                        solid = Some(hit);
                        break;
                    }
                }
            }
        }

        let rel_cos = (angle - camera.yaw).cos();
        let true_dist = solid
            .map(|h| h.pseudo_dist.sqrt())
            .unwrap_or(draw_dist)
            .min(draw_dist);
        let corrected = (true_dist * rel_cos).max(1e-4); // fish-eye fix
        let top = proj.row(proj.world_h, corrected);
        let bottom = proj.row(0.0, corrected);

        sink.draw(DrawCmd::Flat {
            which: FlatKind::Ceiling,
            top: 0.0,
            bottom: top,
            world_z: proj.world_h,
        });
        sink.draw(DrawCmd::Flat {
            which: FlatKind::Floor,
            top: bottom,
            bottom: height as f32,
            world_z: 0.0,
        });
        match solid {
            Some(hit) => sink.draw(DrawCmd::Wall {
                tex: hit.tex,
                u: hit.u,
                top,
                bottom,
                shade: true_dist / draw_dist,
                alpha: 1.0,
            }),
            // max draw distance exceeded: a column of darkness
            None => sink.draw(DrawCmd::Wall {
                tex: NO_TEXTURE,
                u: 0.0,
                top,
                bottom,
                shade: 1.0,
                alpha: 1.0,
            }),
        }

        let solid_pseudo = solid
            .map(|h| h.pseudo_dist)
            .unwrap_or(draw_dist * draw_dist);
        for entry in depth.finish(solid_pseudo, keep_cell) {
            draw_depth_entry(entry, &proj, rel_cos, draw_dist, sink);
        }
    }
}

fn draw_depth_entry<S: ColumnSink>(
    entry: &DepthEntry,
    proj: &Projection,
    rel_cos: f32,
    draw_dist: f32,
    sink: &mut S,
) {
    match entry.kind {
        DepthKind::Sprite { tex, height, u } => {
            let dist = (entry.pseudo_dist.sqrt() * rel_cos).max(1e-4);
            sink.draw(DrawCmd::Sprite {
                tex,
                u,
                top: proj.row(height, dist),
                bottom: proj.row(0.0, dist),
                shade: entry.pseudo_dist.sqrt() / draw_dist,
                alpha: 1.0,
            });
        }
        DepthKind::Freeform {
            wall_tex,
            floor_tex,
            ceil_tex,
            vis,
            u,
            front,
            back,
            front_floor,
            front_ceil,
            back_floor,
            back_ceil,
            pseudo_back,
        } => {
            let df = (entry.pseudo_dist.sqrt() * rel_cos).max(1e-4);
            let db = (pseudo_back.sqrt() * rel_cos).max(1e-4);
            let shade = entry.pseudo_dist.sqrt() / draw_dist;

            if vis.contains(FreeformVis::WALL) {
                // floor slab face, footprint bottom up to the slab top
                sink.draw(DrawCmd::Wall {
                    tex: wall_tex,
                    u,
                    top: proj.row(front_floor, df),
                    bottom: proj.row(0.0, df),
                    shade,
                    alpha: 1.0,
                });
                // ceiling slab face, slab underside up to the world top
                sink.draw(DrawCmd::Wall {
                    tex: wall_tex,
                    u,
                    top: proj.row(proj.world_h, df),
                    bottom: proj.row(front_ceil, df),
                    shade,
                    alpha: 1.0,
                });
            }
            if vis.contains(FreeformVis::FLATS) {
                // slab top surface: visible only when a floor slab
                // exists and the eye is above it
                if front_floor.max(back_floor) > 0.0 && proj.eye > front_floor.max(back_floor) {
                    sink.draw(DrawCmd::Span {
                        tex: floor_tex,
                        top: proj.row(back_floor, db),
                        bottom: proj.row(front_floor, df),
                        w0: back,
                        w1: front,
                        shade,
                    });
                }
                // ceiling slab underside, likewise
                if front_ceil.min(back_ceil) < proj.world_h
                    && proj.eye < front_ceil.min(back_ceil)
                {
                    sink.draw(DrawCmd::Span {
                        tex: ceil_tex,
                        top: proj.row(front_ceil, df),
                        bottom: proj.row(back_ceil, db),
                        w0: front,
                        w1: back,
                        shade,
                    });
                }
            }
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
