//! Tether - headless movement sandbox
//!
//! Builds a small physics scene, drives the player controller with a
//! scripted input timeline at a fixed tick and logs what happens.

mod settings;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tether_core::{GameTime, TimeConfig, Vec2, Vec3};
use tether_game::{InputHandler, MovementMode, PlayerController};
use tether_physics::{LayerMask, PhysicsConfig, PhysicsWorld};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use winit::event::{ElementState, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Render-rate frame length fed to the fixed-step clock
const FRAME_DT: f32 = 1.0 / 144.0;
/// Length of the scripted run in seconds
const RUN_TIME: f32 = 10.0;

/// A raw input event at a point in the script
#[derive(Debug, Clone, Copy)]
enum ScriptEvent {
    Key(KeyCode, ElementState),
    Mouse(MouseButton, ElementState),
    Look(f64, f64),
}

use self::ScriptEvent::{Key, Look, Mouse};
use winit::event::ElementState::{Pressed, Released};

/// Sprint, grapple onto the pillar, crouch, then swing from the tower
fn script() -> Vec<(f32, ScriptEvent)> {
    vec![
        (0.2, Key(KeyCode::KeyW, Pressed)),
        (0.2, Key(KeyCode::ShiftLeft, Pressed)),
        (1.0, Key(KeyCode::ShiftLeft, Released)),
        (1.0, Key(KeyCode::KeyW, Released)),
        (1.3, Mouse(MouseButton::Left, Pressed)),
        (1.35, Mouse(MouseButton::Left, Released)),
        (4.0, Key(KeyCode::KeyC, Pressed)),
        (5.0, Key(KeyCode::KeyC, Released)),
        (5.5, Look(0.0, -80.0)),
        (5.8, Mouse(MouseButton::Right, Pressed)),
        (5.8, Key(KeyCode::KeyW, Pressed)),
        (7.0, Key(KeyCode::Space, Pressed)),
        (7.5, Key(KeyCode::Space, Released)),
        (8.2, Mouse(MouseButton::Right, Released)),
        (8.2, Key(KeyCode::KeyW, Released)),
    ]
}

/// Command line options
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    write_config: bool,
    overrides: Vec<(String, f32)>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--write-config" => args.write_config = true,
            "--set" => {
                let pair = iter.next().context("--set needs name=value")?;
                let (name, value) = pair
                    .split_once('=')
                    .with_context(|| format!("expected name=value, got {pair}"))?;
                let value: f32 = value
                    .parse()
                    .with_context(|| format!("{value} is not a number"))?;
                args.overrides.push((name.to_string(), value));
            }
            other => bail!("unknown argument {other}"),
        }
    }
    Ok(args)
}

fn build_scene(physics: &mut PhysicsWorld) {
    physics.create_ground(0.0);
    // Grapple target straight ahead
    physics.create_static_box_on_layer(
        Vec3::new(1.0, 5.0, 1.0),
        Vec3::new(0.0, 5.0, -20.0),
        LayerMask::GRAPPLEABLE,
    );
    // Swing tower further on
    physics.create_static_box_on_layer(
        Vec3::new(2.0, 8.0, 2.0),
        Vec3::new(0.0, 8.0, -35.0),
        LayerMask::GRAPPLEABLE,
    );
    // Low wall off to the side
    physics.create_static_box(Vec3::new(0.5, 1.0, 6.0), Vec3::new(6.0, 1.0, -10.0));
    physics.refresh_queries();
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let args = parse_args()?;
    let mut config = settings::load(args.config.as_deref());
    for (name, value) in &args.overrides {
        config
            .set_option(name, *value)
            .with_context(|| format!("Failed to set {name}"))?;
        info!("Set {} = {}", name, value);
    }
    if args.write_config {
        settings::save(&config, args.config.as_deref())?;
    }

    info!("Starting Tether movement sandbox...");

    let time_config = TimeConfig::default();
    let fixed_dt = time_config.fixed_timestep;
    let mut time = GameTime::new(time_config);
    let mut physics = PhysicsWorld::with_config(PhysicsConfig {
        gravity: Vec3::NEG_Y * config.locomotion.gravity,
        timestep: fixed_dt,
    });
    build_scene(&mut physics);

    let mut player = PlayerController::with_config(config, fixed_dt);
    player.spawn(&mut physics, Vec3::new(0.0, 0.05, 0.0));

    let mut input = InputHandler::new();
    input.set_cursor_captured(true);

    let mut events = script().into_iter().peekable();
    let mut last_mode = player.mode();
    let mut top_speed: f32 = 0.0;

    while time.total_time < f64::from(RUN_TIME) {
        time.update(FRAME_DT);
        let now = time.total_time as f32;

        while let Some((_, event)) = events.next_if(|(at, _)| *at <= now) {
            debug!("{:.2}s input {:?}", now, event);
            match event {
                Key(key, state) => input.handle_keyboard(PhysicalKey::Code(key), state),
                Mouse(button, state) => input.handle_mouse_button(button, state),
                Look(dx, dy) => input.handle_mouse_motion((dx, dy)),
            }
        }

        // Looking runs at frame rate
        player.apply_look(input.state.mouse_delta);
        input.state.mouse_delta = Vec2::ZERO;

        for _ in 0..time.fixed_steps() {
            let tick_input = input.movement_input();
            // Press and release edges belong to exactly one tick
            input.end_frame();

            player.fixed_update(&mut physics, &tick_input, fixed_dt);
            physics.step();

            let mode = player.mode();
            if mode != last_mode {
                info!(
                    "{:>6.2}s  {:<9} -> {:<9} at {:.2}",
                    now,
                    last_mode.to_string(),
                    mode.to_string(),
                    player.position()
                );
                last_mode = mode;
            }
            if mode == MovementMode::Swinging {
                if let Some(session) = player.swing_session() {
                    debug!(
                        "cable [{:.2}, {:.2}] to {:.2}",
                        session.min_distance, session.max_distance, session.anchor
                    );
                }
            }
            top_speed = top_speed.max(player.velocity().length());
        }
    }

    info!(
        "Finished after {} ticks: {} at {:.2}, top controller speed {:.1} m/s",
        player.tick_count(),
        player.mode(),
        player.position(),
        top_speed
    );
    if let Some(prediction) = player.swing_prediction() {
        info!("Swing prediction at {:.2} ({:.1}m)", prediction.point, prediction.distance);
    }
    info!("Grapple cooldown {:.2}s", player.grapple().cooldown_remaining());

    Ok(())
}
