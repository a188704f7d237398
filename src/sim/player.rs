//! Per-tick player update: input → displacement → collision-resolved
//! position, plus the door-interaction probe.

use glam::{IVec2, Vec2};

use crate::sim::collision::{MoveProbe, resolve_movement};
use crate::world::{Camera, PlayerStart, World};

/// Tiles covered per tick at full input.
pub const STEP_SIZE: f32 = 0.15;
/// Radians turned per tick at full input.
pub const TURN_SPEED: f32 = 0.075;
/// Vertical shear clamp, in screen rows.
pub const MAX_PITCH: f32 = 80.0;
/// Rows of shear added per tick at full input.
pub const PITCH_SPEED: f32 = 5.0;

/// One tick's worth of player input, already mapped from whatever
/// device produced it.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputCmd {
    /// −1 .. 1, positive forward.
    pub forward: f32,
    /// −1 .. 1, positive to the right.
    pub strafe: f32,
    /// −1 .. 1, positive turns clockwise (screen-right).
    pub turn: f32,
    /// −1 .. 1, positive looks up.
    pub pitch: f32,
    /// Edge-triggered door interaction.
    pub interact: bool,
}

/// The player volume: a point plus the world's box margin, owned by the
/// game loop and mutated once per tick.
#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub yaw: f32,
    pub pitch: f32,
    /// Floor elevation under the feet, world-Z.
    pub feet: f32,
}

impl Player {
    pub fn new(start: PlayerStart) -> Self {
        Self {
            pos: start.pos,
            yaw: start.yaw,
            pitch: 0.0,
            feet: 0.0,
        }
    }

    /// Axis-aligned box `(min, max)` for the world's margin.
    pub fn aabb(&self, margin: f32) -> (Vec2, Vec2) {
        (self.pos - Vec2::splat(margin), self.pos + Vec2::splat(margin))
    }

    /// Camera for the current pose.
    pub fn camera(&self, world: &World, fov: f32) -> Camera {
        let mut cam = Camera::new(self.pos, self.feet + world.config.player_h, self.yaw, fov);
        cam.pitch = self.pitch;
        cam
    }

    /// Advance one tick. `scale` stretches the per-tick magnitudes for
    /// variable tick rates (1.0 = nominal).
    pub fn update(&mut self, world: &mut World, cmd: &InputCmd, scale: f32) {
        self.yaw += cmd.turn * TURN_SPEED * scale;
        self.pitch = (self.pitch + cmd.pitch * PITCH_SPEED * scale).clamp(-MAX_PITCH, MAX_PITCH);

        let (s, c) = self.yaw.sin_cos();
        let dir = Vec2::new(c, s);
        let wish = dir * cmd.forward + dir.perp() * cmd.strafe;
        if wish != Vec2::ZERO {
            let probe = MoveProbe {
                margin: world.config.margin,
                feet: self.feet,
                knee_height: world.config.knee_height,
                clearance: world.config.player_h + world.config.headroom,
            };
            let res = resolve_movement(world, self.pos, wish * STEP_SIZE * scale, &probe);
            self.pos = res.pos;
            self.feet = res.floor_h;
        }

        if cmd.interact {
            self.interact_door(world);
        }
    }

    /// Toggle the first door across the grid line the player faces,
    /// checking the vertical crossing first, then the horizontal one.
    fn interact_door(&self, world: &mut World) {
        let (s, c) = self.yaw.sin_cos();
        let slope = s / c;

        let looking_east = c > 0.0;
        let v_x = if looking_east {
            self.pos.x.ceil()
        } else {
            self.pos.x.floor()
        };
        let v_y = self.pos.y + (v_x - self.pos.x) * slope;
        let v_cell = IVec2::new(
            (v_x - if looking_east { 0.0 } else { 1.0 }).floor() as i32,
            v_y.floor() as i32,
        );

        let looking_north = s < 0.0;
        let h_y = if looking_north {
            self.pos.y.floor()
        } else {
            self.pos.y.ceil()
        };
        let h_x = self.pos.x + (h_y - self.pos.y) / slope;
        let h_cell = IVec2::new(
            h_x.floor() as i32,
            (h_y - if looking_north { 1.0 } else { 0.0 }).floor() as i32,
        );

        if !world.doors.interact(v_cell) {
            world.doors.interact(h_cell);
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
