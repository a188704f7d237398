//! Presentation boundary.
//!
//! The engine never touches a pixel. Per screen column it emits a small
//! ordered list of [`DrawCmd`]s into a [`ColumnSink`]; what a command
//! turns into — software rasterisation, GPU quads, a test log — is the
//! sink's business. Pixel formats and blending math live entirely on
//! that side of the line (the software backend blends source-over with
//! a per-pixel light multiplier).

use glam::Vec2;

use crate::world::texture::TextureId;

/// Pixel format of the software frame-buffer (0xAARRGGBB).
pub type Rgba = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlatKind {
    Floor,
    Ceiling,
}

/// One draw instruction for the current column. Screen extents are
/// fractional rows; the sink clips them to the viewport.
#[derive(Clone, Copy, Debug)]
pub enum DrawCmd {
    /// Sample wall texture column `tex` at horizontal offset `u` over
    /// rows `top..bottom`, shaded by `shade` (0 = full light, 1 = black).
    Wall {
        tex: TextureId,
        u: f32,
        top: f32,
        bottom: f32,
        shade: f32,
        alpha: f32,
    },
    /// Floor/ceiling rows resolved per screen row via world-point
    /// back-projection at constant `world_z`; the texture comes from
    /// the grid tile under each back-projected point.
    Flat {
        which: FlatKind,
        top: f32,
        bottom: f32,
        world_z: f32,
    },
    /// Textured span interpolated between two world anchor points
    /// (sloped freeform slab surfaces). `w0` pairs with `top`, `w1`
    /// with `bottom`.
    Span {
        tex: TextureId,
        top: f32,
        bottom: f32,
        w0: Vec2,
        w1: Vec2,
        shade: f32,
    },
    /// Billboard sprite column; texels with zero alpha are skipped.
    Sprite {
        tex: TextureId,
        u: f32,
        top: f32,
        bottom: f32,
        shade: f32,
        alpha: f32,
    },
}

/// Receiver for one frame's worth of per-column draw instructions,
/// delivered strictly in painter order within each column.
pub trait ColumnSink {
    fn begin_column(&mut self, col: usize, ray_angle: f32);
    fn draw(&mut self, cmd: DrawCmd);
}

mod software;
pub mod texgen;

pub use software::SoftwareRenderer;
