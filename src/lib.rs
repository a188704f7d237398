//! Wolfenstein-style software ray-caster over a 2-D tile grid.
//!
//! One ray per screen column reconstructs a pseudo-3-D view of the
//! grid: constant-Z walls, sliding doors, diagonal walls, billboard
//! sprites and height-fielded "freeform" tiles. The companion collision
//! system shares the same grid march, so rendering and movement can
//! never disagree about what is solid.
//!
//! * [`world`] — grid, tiles, doors, camera, textures, level loading
//! * [`engine`] — DDA marcher, hit resolvers, depth compositing, the
//!   per-column pipeline
//! * [`sim`] — fixed-rate ticking, player movement, collision response
//! * [`renderer`] — draw-instruction boundary and the software backend

pub mod engine;
pub mod renderer;
pub mod sim;
pub mod world;
