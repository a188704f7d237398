//! Software rasteriser: turns the pipeline's per-column draw
//! instructions into pixels in a `u32` frame buffer.
//!
//! Shading is a light multiplier `1 − shade`; translucency is
//! source-over blending against what is already in the buffer.

use glam::Vec2;

use crate::engine::pipeline::{Projection, render_frame};
use crate::renderer::{ColumnSink, DrawCmd, FlatKind, Rgba};
use crate::world::texture::{Texture, TextureBank};
use crate::world::{Camera, World};

const CLEAR_COLOR: Rgba = 0xFF_10_10_10;

pub struct SoftwareRenderer {
    frame: Vec<Rgba>,
    width: usize,
    height: usize,
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self {
            frame: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    /// Render one full frame; the buffer is resized lazily.
    pub fn render(
        &mut self,
        world: &World,
        bank: &TextureBank,
        camera: &Camera,
        width: usize,
        height: usize,
    ) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.frame.resize(width * height, 0);
        }
        self.frame.fill(CLEAR_COLOR);

        let mut pass = FramePass {
            frame: &mut self.frame,
            width,
            height,
            world,
            bank,
            proj: Projection::new(camera, world.config.world_h, width, height),
            cam_pos: camera.pos,
            cam_yaw: camera.yaw,
            draw_dist: world.config.draw_dist,
            col: 0,
            ray_angle: 0.0,
        };
        render_frame(world, camera, width, height, &mut pass);
    }

    pub fn frame(&self) -> &[Rgba] {
        &self.frame
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

struct FramePass<'a> {
    frame: &'a mut [Rgba],
    width: usize,
    height: usize,
    world: &'a World,
    bank: &'a TextureBank,
    proj: Projection,
    cam_pos: Vec2,
    cam_yaw: f32,
    draw_dist: f32,
    col: usize,
    ray_angle: f32,
}

impl ColumnSink for FramePass<'_> {
    fn begin_column(&mut self, col: usize, ray_angle: f32) {
        self.col = col;
        self.ray_angle = ray_angle;
    }

    fn draw(&mut self, cmd: DrawCmd) {
        match cmd {
            DrawCmd::Wall {
                tex,
                u,
                top,
                bottom,
                shade,
                alpha,
            } => self.textured_column(tex, u, top, bottom, shade, alpha),
            DrawCmd::Sprite {
                tex,
                u,
                top,
                bottom,
                shade,
                alpha,
            } => self.textured_column(tex, u, top, bottom, shade, alpha),
            DrawCmd::Flat {
                which,
                top,
                bottom,
                world_z,
            } => self.flat_rows(which, top, bottom, world_z),
            DrawCmd::Span {
                tex,
                top,
                bottom,
                w0,
                w1,
                shade,
            } => self.span_rows(tex, top, bottom, w0, w1, shade),
        }
    }
}

impl FramePass<'_> {
    fn clip_rows(&self, top: f32, bottom: f32) -> Option<(usize, usize)> {
        let y0 = top.max(0.0) as usize;
        let y1 = (bottom.min(self.height as f32)).ceil() as usize;
        (y0 < y1).then_some((y0, y1.min(self.height)))
    }

    fn textured_column(&mut self, tex: u16, u: f32, top: f32, bottom: f32, shade: f32, alpha: f32) {
        let Some((y0, y1)) = self.clip_rows(top, bottom) else {
            return;
        };
        let span = bottom - top;
        if span <= 0.0 {
            return;
        }
        let texture = self.bank.texture_or_missing(tex);
        let light = (1.0 - shade).clamp(0.0, 1.0);
        for y in y0..y1 {
            let v = (y as f32 + 0.5 - top) / span;
            let texel = texture.sample(u, v.clamp(0.0, 1.0));
            self.put(y, texel, light, alpha);
        }
    }

    /// Per-row back-projection at constant world height: screen row →
    /// corrected distance → world point → texel.
    fn flat_rows(&mut self, which: FlatKind, top: f32, bottom: f32, world_z: f32) {
        let Some((y0, y1)) = self.clip_rows(top, bottom) else {
            return;
        };
        let rel_cos = (self.ray_angle - self.cam_yaw).cos();
        let (dx, dy) = (self.ray_angle.cos(), self.ray_angle.sin());
        for y in y0..y1 {
            let corrected = self.proj.dist_for_row(world_z, y as f32 + 0.5);
            if !corrected.is_finite() || corrected <= 0.0 {
                continue;
            }
            let along = corrected / rel_cos;
            let p = self.cam_pos + Vec2::new(dx, dy) * along;
            let Some((floor_tex, ceil_tex)) = self.world.grid.tile_at(p).flats() else {
                continue;
            };
            let tex = self.bank.texture_or_missing(match which {
                FlatKind::Floor => floor_tex,
                FlatKind::Ceiling => ceil_tex,
            });
            let texel = sample_world(tex, p);
            let light = (1.0 - corrected / self.draw_dist).clamp(0.0, 1.0);
            self.put(y, texel, light, 1.0);
        }
    }

    /// Slab surface between two world anchors, texture walked linearly
    /// from `w0` (top row) to `w1` (bottom row).
    fn span_rows(&mut self, tex: u16, top: f32, bottom: f32, w0: Vec2, w1: Vec2, shade: f32) {
        let Some((y0, y1)) = self.clip_rows(top, bottom) else {
            return;
        };
        let span = bottom - top;
        if span <= 0.0 {
            return;
        }
        let texture = self.bank.texture_or_missing(tex);
        let light = (1.0 - shade).clamp(0.0, 1.0);
        for y in y0..y1 {
            let t = ((y as f32 + 0.5 - top) / span).clamp(0.0, 1.0);
            let texel = sample_world(texture, w0.lerp(w1, t));
            self.put(y, texel, light, 1.0);
        }
    }

    /// Source-over blend of `texel` into the current column at row `y`.
    #[inline]
    fn put(&mut self, y: usize, texel: Rgba, light: f32, alpha: f32) {
        let src_a = ((texel >> 24) & 0xFF) as f32 / 255.0 * alpha;
        if src_a <= 0.0 {
            return;
        }
        let idx = y * self.width + self.col;
        let dst = self.frame[idx];
        let blend = |s: u32, d: u32| -> u32 {
            let s = s as f32 * light * src_a;
            let d = d as f32 * (1.0 - src_a);
            (s + d).min(255.0) as u32
        };
        let r = blend((texel >> 16) & 0xFF, (dst >> 16) & 0xFF);
        let g = blend((texel >> 8) & 0xFF, (dst >> 8) & 0xFF);
        let b = blend(texel & 0xFF, dst & 0xFF);
        self.frame[idx] = 0xFF00_0000 | (r << 16) | (g << 8) | b;
    }
}

#[inline]
fn sample_world(tex: &Texture, p: Vec2) -> Rgba {
    tex.sample(p.x, p.y) // sampling wraps
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::texgen;
    use crate::world::{Grid, Tile, WorldConfig};

    fn tiny_world(bank: &TextureBank) -> World {
        let wall = bank.id("brick").unwrap();
        let floor = bank.id("hexstone").unwrap();
        let ceil = bank.id("lights").unwrap();
        let mut cells = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                cells.push(if x == 0 || x == 4 || y == 0 || y == 4 {
                    Tile::Wall {
                        north: wall,
                        east: wall,
                        south: wall,
                        west: wall,
                    }
                } else {
                    Tile::Free { floor, ceil }
                });
            }
        }
        World::new(Grid::new(5, 5, cells).unwrap(), WorldConfig::default())
    }

    #[test]
    fn a_frame_comes_out_fully_painted() {
        let mut bank = TextureBank::default_with_checker();
        texgen::install_default_set(&mut bank).unwrap();
        let world = tiny_world(&bank);
        let camera = Camera::new(
            Vec2::new(2.5, 2.5),
            world.config.player_h,
            0.7,
            std::f32::consts::FRAC_PI_3,
        );

        let mut renderer = SoftwareRenderer::new();
        renderer.render(&world, &bank, &camera, 80, 60);

        assert_eq!(renderer.frame().len(), 80 * 60);
        // every pixel was touched: nothing is left at the clear colour
        // in a closed room
        let untouched = renderer
            .frame()
            .iter()
            .filter(|&&p| p == CLEAR_COLOR)
            .count();
        assert!(
            untouched < 80 * 60 / 10,
            "{untouched} pixels never painted"
        );
    }

    #[test]
    fn resize_between_frames_is_safe() {
        let mut bank = TextureBank::default_with_checker();
        texgen::install_default_set(&mut bank).unwrap();
        let world = tiny_world(&bank);
        let camera = Camera::new(
            Vec2::new(2.5, 2.5),
            world.config.player_h,
            0.0,
            std::f32::consts::FRAC_PI_3,
        );
        let mut renderer = SoftwareRenderer::new();
        renderer.render(&world, &bank, &camera, 40, 30);
        renderer.render(&world, &bank, &camera, 64, 48);
        assert_eq!(renderer.size(), (64, 48));
        assert_eq!(renderer.frame().len(), 64 * 48);
    }
}
