//! Text level format.
//!
//! A level file is a header block of `key = value` lines followed by a
//! `map:` marker and one line per grid row. Cells are `/`-separated
//! integer fields, the first being the tile kind:
//!
//! ```text
//! walls  = brick stone tech
//! doors  = door dock
//! floors = hexstone manhole
//! ceils  = lights sky
//! sprites = barrel
//! player = 2.5 2.5 0.0
//!
//! map:
//! 1/0/0/0/0 0/0/0 3/0/1 ...
//! ```
//!
//! | kind | fields |
//! |------|--------|
//! | 0 free     | `0/floor/ceil` |
//! | 1 wall     | `1/n/e/s/w` |
//! | 2 diagonal | `2/face/wall` |
//! | 3 v-door   | `3/door/dock` |
//! | 4 h-door   | `4/door/dock` |
//! | 5 thing    | `5/sprite/height⑩/pickable/floor/ceil` |
//! | 6 freeform | `6/mx⑩/my⑩/lx⑩/ly⑩/axis/us⑩/ue⑩/ls⑩/le⑩/wall/floor/ceil` |
//!
//! Fields marked ⑩ are tenths of a tile / of the world height. Texture
//! fields index the matching header list and are resolved against the
//! `TextureBank` up front: an unknown name fails the load, so the render
//! path never meets a missing texture.

use glam::Vec2;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::world::grid::{Grid, GridError};
use crate::world::texture::{TextureBank, TextureError, TextureId};
use crate::world::tile::{DiagFace, Freeform, SlopeAxis, ThingDef, Tile};
use crate::world::{World, WorldConfig};

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([a-z_]+)\s*=\s*(.+?)\s*$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("header `{0}` is missing")]
    MissingHeader(&'static str),

    #[error("line {line}: `{text}` is not a header or map row")]
    BadLine { line: usize, text: String },

    #[error("cell ({col}, {row}): {reason}")]
    BadCell {
        col: usize,
        row: usize,
        reason: String,
    },

    #[error("map rows have differing lengths")]
    Ragged,

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Spawn data the level defines for the player; owned by the game loop,
/// not by the core.
#[derive(Clone, Copy, Debug)]
pub struct PlayerStart {
    pub pos: Vec2,
    pub yaw: f32,
}

struct Header {
    walls: Vec<TextureId>,
    doors: Vec<TextureId>,
    floors: Vec<TextureId>,
    ceils: Vec<TextureId>,
    sprites: Vec<TextureId>,
    player: Option<PlayerStart>,
}

/// Parse `src` and build the world plus the player spawn.
pub fn load_level(
    src: &str,
    bank: &TextureBank,
    config: WorldConfig,
) -> Result<(World, PlayerStart), LevelError> {
    let mut header = Header {
        walls: Vec::new(),
        doors: Vec::new(),
        floors: Vec::new(),
        ceils: Vec::new(),
        sprites: Vec::new(),
        player: None,
    };
    let mut rows: Vec<Vec<Tile>> = Vec::new();
    let mut in_map = false;

    for (idx, raw) in src.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "map:" {
            in_map = true;
            continue;
        }
        if in_map {
            let y = rows.len();
            let row = line
                .split_whitespace()
                .enumerate()
                .map(|(x, cell)| parse_cell(cell, x, y, &header, config.world_h))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        } else {
            let caps = HEADER_RE.captures(line).ok_or_else(|| LevelError::BadLine {
                line: idx + 1,
                text: line.to_string(),
            })?;
            parse_header(&mut header, &caps[1], &caps[2], idx + 1, bank)?;
        }
    }

    let rows_n = rows.len();
    let cols_n = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != cols_n) {
        return Err(LevelError::Ragged);
    }
    let cells: Vec<Tile> = rows.into_iter().flatten().collect();
    let grid = Grid::new(cols_n as i32, rows_n as i32, cells)?;
    let start = header.player.ok_or(LevelError::MissingHeader("player"))?;

    let world = World::new(grid, config);
    info!(
        cols = cols_n,
        rows = rows_n,
        doors = world.doors.len(),
        "level loaded"
    );
    Ok((world, start))
}

fn parse_header(
    header: &mut Header,
    key: &str,
    value: &str,
    line: usize,
    bank: &TextureBank,
) -> Result<(), LevelError> {
    let resolve = |names: &str| -> Result<Vec<TextureId>, TextureError> {
        names
            .split_whitespace()
            .map(|name| bank.require(name))
            .collect()
    };
    match key {
        "walls" => header.walls = resolve(value)?,
        "doors" => header.doors = resolve(value)?,
        "floors" => header.floors = resolve(value)?,
        "ceils" => header.ceils = resolve(value)?,
        "sprites" => header.sprites = resolve(value)?,
        "player" => {
            let nums: Vec<f32> = value
                .split_whitespace()
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|_| LevelError::BadLine {
                    line,
                    text: value.to_string(),
                })?;
            if nums.len() != 3 {
                return Err(LevelError::BadLine {
                    line,
                    text: value.to_string(),
                });
            }
            header.player = Some(PlayerStart {
                pos: Vec2::new(nums[0], nums[1]),
                yaw: nums[2],
            });
        }
        _ => {
            return Err(LevelError::BadLine {
                line,
                text: key.to_string(),
            });
        }
    }
    Ok(())
}

fn parse_cell(
    cell: &str,
    col: usize,
    row: usize,
    header: &Header,
    world_h: f32,
) -> Result<Tile, LevelError> {
    let bad = |reason: String| LevelError::BadCell { col, row, reason };

    let fields: Vec<u32> = cell
        .split('/')
        .map(|f| f.parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| bad(format!("`{cell}`: {e}")))?;

    let want = |n: usize| -> Result<(), LevelError> {
        if fields.len() == n {
            Ok(())
        } else {
            Err(bad(format!(
                "kind {} takes {} fields, got {}",
                fields[0],
                n,
                fields.len()
            )))
        }
    };
    let pick = |table: &[TextureId], i: u32, what: &str| -> Result<TextureId, LevelError> {
        table
            .get(i as usize)
            .copied()
            .ok_or_else(|| bad(format!("{what} index {i} out of range")))
    };

    match fields.first() {
        Some(0) => {
            want(3)?;
            Ok(Tile::Free {
                floor: pick(&header.floors, fields[1], "floor")?,
                ceil: pick(&header.ceils, fields[2], "ceil")?,
            })
        }
        Some(1) => {
            want(5)?;
            Ok(Tile::Wall {
                north: pick(&header.walls, fields[1], "wall")?,
                east: pick(&header.walls, fields[2], "wall")?,
                south: pick(&header.walls, fields[3], "wall")?,
                west: pick(&header.walls, fields[4], "wall")?,
            })
        }
        Some(2) => {
            want(3)?;
            let face = DiagFace::from_index(fields[1])
                .ok_or_else(|| bad(format!("diagonal face {} out of range", fields[1])))?;
            Ok(Tile::DiagWall {
                face,
                tex: pick(&header.walls, fields[2], "wall")?,
            })
        }
        Some(kind @ (3 | 4)) => {
            want(3)?;
            let tex = pick(&header.doors, fields[1], "door")?;
            let dock = pick(&header.doors, fields[2], "door")?;
            Ok(if *kind == 3 {
                Tile::VerticalDoor { tex, dock }
            } else {
                Tile::HorizontalDoor { tex, dock }
            })
        }
        Some(5) => {
            want(6)?;
            Ok(Tile::Thing {
                def: ThingDef {
                    sprite: pick(&header.sprites, fields[1], "sprite")?,
                    height: fields[2] as f32 * 0.1 * world_h,
                    pickable: fields[3] != 0,
                },
                floor: pick(&header.floors, fields[4], "floor")?,
                ceil: pick(&header.ceils, fields[5], "ceil")?,
            })
        }
        Some(6) => {
            want(13)?;
            let tenth = |i: usize| fields[i] as f32 * 0.1;
            let extent = Vec2::new(tenth(3), tenth(4));
            if extent.x <= 0.0 || extent.y <= 0.0 {
                return Err(bad("freeform extent must be positive".into()));
            }
            Ok(Tile::Freeform(Freeform {
                margin: Vec2::new(tenth(1), tenth(2)),
                extent,
                slope_axis: if fields[5] == 0 {
                    SlopeAxis::X
                } else {
                    SlopeAxis::Y
                },
                upper_start: tenth(6),
                upper_end: tenth(7),
                lower_start: tenth(8),
                lower_end: tenth(9),
                wall_tex: pick(&header.walls, fields[10], "wall")?,
                floor_tex: pick(&header.floors, fields[11], "floor")?,
                ceil_tex: pick(&header.ceils, fields[12], "ceil")?,
            }))
        }
        Some(k) => Err(bad(format!("unknown tile kind {k}"))),
        None => Err(bad("empty cell".into())),
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::texture::Texture;
    use glam::IVec2;

    fn bank() -> TextureBank {
        let mut bank = TextureBank::default_with_checker();
        for name in ["brick", "door", "dock", "stone", "lights", "barrel"] {
            bank.insert(name, Texture::default()).unwrap();
        }
        bank
    }

    const SRC: &str = "\
# tiny room with one door and a ramp
walls  = brick
doors  = door dock
floors = stone
ceils  = lights
sprites = barrel
player = 1.5 1.5 0.0

map:
1/0/0/0/0 1/0/0/0/0 1/0/0/0/0 1/0/0/0/0
1/0/0/0/0 0/0/0     3/0/1     1/0/0/0/0
1/0/0/0/0 6/2/2/6/6/0/10/10/0/4/0/0/0 5/0/6/1/0/0 1/0/0/0/0
1/0/0/0/0 1/0/0/0/0 1/0/0/0/0 1/0/0/0/0
";

    #[test]
    fn parses_every_kind_and_builds_doors() {
        let (world, start) = load_level(SRC, &bank(), WorldConfig::default()).unwrap();
        assert_eq!(world.grid.cols(), 4);
        assert_eq!(world.grid.rows(), 4);
        assert_eq!(world.doors.len(), 1);
        assert!(world.doors.get(IVec2::new(2, 1)).is_some());
        assert_eq!(start.pos, Vec2::new(1.5, 1.5));

        match world.grid.tile(IVec2::new(1, 2)) {
            Tile::Freeform(ff) => {
                assert_eq!(ff.slope_axis, SlopeAxis::X);
                assert!((ff.lower_end - 0.4).abs() < 1e-6);
            }
            other => panic!("expected freeform, got {other:?}"),
        }
        match world.grid.tile(IVec2::new(2, 2)) {
            Tile::Thing { def, .. } => {
                assert!(def.pickable);
                assert!((def.height - 6.0).abs() < 1e-6);
            }
            other => panic!("expected thing, got {other:?}"),
        }
    }

    #[test]
    fn unknown_texture_fails_the_load() {
        let src = SRC.replace("walls  = brick", "walls  = granite");
        let err = load_level(&src, &bank(), WorldConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            LevelError::Texture(TextureError::Missing(ref n)) if n == "granite"
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let src = format!("{SRC}1/0/0/0/0\n");
        assert!(matches!(
            load_level(&src, &bank(), WorldConfig::default()),
            Err(LevelError::Ragged)
        ));
    }

    #[test]
    fn missing_player_is_an_error() {
        let src = SRC.replace("player = 1.5 1.5 0.0", "");
        assert!(matches!(
            load_level(&src, &bank(), WorldConfig::default()),
            Err(LevelError::MissingHeader("player"))
        ));
    }
}
