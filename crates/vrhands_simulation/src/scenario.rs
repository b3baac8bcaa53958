//! Scripted two-hand сценарий (headless)
//!
//! Таймлайн (ticks):
//! - 0: мяч в grab volume левой руки
//! - 5: левая сжимает grip → grab
//! - 5..20: левая несёт мяч
//! - 15: мяч в grab volume правой руки
//! - 20: правая сжимает grip → отбирает мяч у левой (offhand grab)
//! - 20..40: правая замахивается вперёд
//! - 40: правая отпускает → бросок
//! - 45: левая отпускает grip (volumes обратно)
//! - 50: thumbstick левой вправо → snap turn rig'а
//!
//! Tracking noise из `DeterministicRng`: одинаковый seed → одинаковый мир.

use bevy::prelude::*;
use rand::Rng;

use crate::grab::{
    spawn_grabbable, spawn_hand, spawn_player, GrabConfigError, GrabOverlap, Grabbable, GrabberSettings,
    GrabStats, HandSide, HandSpawnConfig, HandTracking,
};
use crate::shared::{GrabPoint, Pose};
use crate::{create_headless_app, log_info, run_fixed_tick, DeterministicRng, SimulationPlugin};

pub const SCENARIO_TICKS: u32 = 60;

const LEFT_GRIP_TICK: u32 = 5;
const RIGHT_OVERLAP_TICK: u32 = 15;
const STEAL_TICK: u32 = 20;
const THROW_TICK: u32 = 40;
const LEFT_RELEASE_TICK: u32 = 45;
const SNAP_TURN_TICK: u32 = 50;

/// Скорость замаха правой руки (tracking space, вперёд = -Z)
pub const THROW_VELOCITY: Vec3 = Vec3::new(0.0, 1.0, -4.0);

/// Entities сценария
#[derive(Debug, Clone, Copy)]
pub struct ScenarioActors {
    pub rig: Entity,
    pub body: Entity,
    pub left: Entity,
    pub right: Entity,
    pub ball: Entity,
}

/// Итог прогона
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub grabs: usize,
    pub releases: usize,
    pub forced_releases: usize,
    pub snap_turns: usize,
    pub ball_pose: Pose,
    pub ball_holder: Option<Entity>,
}

/// Спавнит игрока, две руки и мяч
pub fn spawn_actors(world: &mut World) -> Result<ScenarioActors, GrabConfigError> {
    let (rig, body) = spawn_player(world, Vec3::ZERO);

    let mut left = HandSpawnConfig::new(GrabberSettings::for_hand(HandSide::Left));
    left.player_body = Some(body);
    left.player_rig = Some(rig);
    let left = spawn_hand(world, left)?;

    let mut right = HandSpawnConfig::new(GrabberSettings::for_hand(HandSide::Right));
    right.player_body = Some(body);
    right.player_rig = Some(rig);
    let right = spawn_hand(world, right)?;

    let ball = spawn_grabbable(
        world,
        Pose::from_position(Vec3::new(-0.2, 1.0, -0.3)),
        Grabbable::with_grab_points(vec![GrabPoint::new(Vec3::ZERO, Vec3::splat(0.05))]),
    );

    Ok(ScenarioActors {
        rig,
        body,
        left,
        right,
        ball,
    })
}

/// Sample левой руки на tick
fn left_sample(tick: u32, noise: Vec3) -> HandTracking {
    let mut tracking = HandTracking::default();
    tracking.sample.local_position = Vec3::new(-0.2, 1.0, -0.3) + noise;
    tracking.sample.grip = if (LEFT_GRIP_TICK..LEFT_RELEASE_TICK).contains(&tick) {
        0.9
    } else {
        0.1
    };
    if tick == SNAP_TURN_TICK {
        tracking.sample.thumbstick = Vec2::new(1.0, 0.0);
    }
    tracking
}

/// Sample правой руки на tick
fn right_sample(tick: u32, noise: Vec3) -> HandTracking {
    let mut tracking = HandTracking::default();
    let swing = tick.saturating_sub(STEAL_TICK).min(THROW_TICK - STEAL_TICK) as f32;
    tracking.sample.local_position =
        Vec3::new(-0.15, 1.0, -0.3) + THROW_VELOCITY * swing / crate::SIMULATION_HZ as f32 + noise;
    if (STEAL_TICK..=THROW_TICK).contains(&tick) {
        tracking.sample.local_linear_velocity = THROW_VELOCITY;
    }
    tracking.sample.grip = if (STEAL_TICK..THROW_TICK).contains(&tick) {
        0.9
    } else {
        0.1
    };
    tracking
}

/// Прогоняет сценарий в `app` (actors уже заспавнены)
pub fn run_script(app: &mut App, actors: &ScenarioActors, ticks: u32) {
    for tick in 0..ticks {
        let world = app.world_mut();

        let (left_noise, right_noise) = {
            let mut rng = world.resource_mut::<DeterministicRng>();
            let mut noise = || {
                Vec3::new(
                    rng.rng.gen_range(-0.002..0.002),
                    rng.rng.gen_range(-0.002..0.002),
                    rng.rng.gen_range(-0.002..0.002),
                )
            };
            (noise(), noise())
        };

        if let Some(mut tracking) = world.get_mut::<HandTracking>(actors.left) {
            *tracking = left_sample(tick, left_noise);
        }
        if let Some(mut tracking) = world.get_mut::<HandTracking>(actors.right) {
            *tracking = right_sample(tick, right_noise);
        }

        // Headless без Rapier: overlaps шлём сами
        if tick == 0 {
            world.send_event(GrabOverlap::Entered {
                hand: actors.left,
                grabbable: Some(actors.ball),
            });
        }
        if tick == RIGHT_OVERLAP_TICK {
            world.send_event(GrabOverlap::Entered {
                hand: actors.right,
                grabbable: Some(actors.ball),
            });
        }

        run_fixed_tick(app);
    }
}

/// Собирает итог из GrabStats и мира
pub fn report(world: &World, actors: &ScenarioActors) -> ScenarioReport {
    let ball = world.get::<Grabbable>(actors.ball);
    let stats = world.get_resource::<GrabStats>().copied().unwrap_or_default();

    ScenarioReport {
        grabs: stats.grabs,
        releases: stats.releases,
        forced_releases: stats.forced_releases,
        snap_turns: stats.snap_turns,
        ball_pose: world
            .get::<Transform>(actors.ball)
            .map(Pose::from)
            .unwrap_or_default(),
        ball_holder: ball.and_then(|ball| ball.grabbed_by),
    }
}

/// Полный прогон: app + actors + script
pub fn run_two_hand_scenario(seed: u64, ticks: u32) -> Result<(App, ScenarioActors, ScenarioReport), GrabConfigError> {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let actors = spawn_actors(app.world_mut())?;
    run_script(&mut app, &actors, ticks);

    let summary = report(app.world(), &actors);
    log_info(&format!("Scenario (seed {}) finished: {:?}", seed, summary));

    Ok((app, actors, summary))
}
