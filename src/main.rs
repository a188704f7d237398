//! Interactive viewer for the tile ray-caster.
//!
//! ```bash
//! cargo run --release -- [level.map]
//! ```
//!
//! WASD moves, ←/→ turn, ↑/↓ look, E uses doors, Escape quits.

use std::time::{Duration, Instant};

use clap::Parser;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use tracing::info;

use tilecast::renderer::{SoftwareRenderer, texgen};
use tilecast::sim::{InputCmd, Player, TickRunner};
use tilecast::world::{TextureBank, WorldConfig, load_level};

const DEMO_MAP: &str = include_str!("../maps/demo.map");

#[derive(Parser)]
#[command(about = "Wolfenstein-style software ray-caster")]
struct Args {
    /// Level file; the bundled demo map when omitted.
    map: Option<std::path::PathBuf>,

    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Horizontal field of view, degrees.
    #[arg(long, default_value_t = 60.0)]
    fov: f32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut bank = TextureBank::default_with_checker();
    texgen::install_default_set(&mut bank)?;

    let source = match &args.map {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEMO_MAP.to_string(),
    };
    let (mut world, start) = load_level(&source, &bank, WorldConfig::default())?;
    let mut player = Player::new(start);
    let fov = args.fov.to_radians();

    let mut renderer = SoftwareRenderer::new();
    let mut ticks = TickRunner::new();
    let mut win = Window::new(
        "tilecast",
        args.width,
        args.height,
        WindowOptions::default(),
    )?;
    win.set_target_fps(60);

    // ────────────────── frame-time reporting state ──────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        /* ---------------- one InputCmd per frame --------------------- */
        let mut cmd = InputCmd::default();
        if win.is_key_down(Key::W) {
            cmd.forward += 1.0;
        }
        if win.is_key_down(Key::S) {
            cmd.forward -= 1.0;
        }
        if win.is_key_down(Key::A) {
            cmd.strafe -= 1.0;
        }
        if win.is_key_down(Key::D) {
            cmd.strafe += 1.0;
        }
        if win.is_key_down(Key::Right) {
            cmd.turn += 1.0;
        }
        if win.is_key_down(Key::Left) {
            cmd.turn -= 1.0;
        }
        if win.is_key_down(Key::Up) {
            cmd.pitch += 1.0;
        }
        if win.is_key_down(Key::Down) {
            cmd.pitch -= 1.0;
        }
        cmd.interact = win.is_key_pressed(Key::E, KeyRepeat::No); // edge-trigger

        /* ---------------- fixed-rate simulation --------------------- */
        let margin = world.config.margin;
        ticks.pump(|dt| {
            player.update(&mut world, &cmd, 1.0);
            world.doors.advance(dt, player.aabb(margin));
            cmd.interact = false; // one toggle per key press
        });

        /* ---------------- draw & present ---------------------------- */
        let camera = player.camera(&world, fov);
        renderer.render(&world, &bank, &camera, args.width, args.height);
        acc_time += t0.elapsed();
        acc_frames += 1;
        win.update_with_buffer(renderer.frame(), args.width, args.height)?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            info!("avg render: {:.2} ms ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
