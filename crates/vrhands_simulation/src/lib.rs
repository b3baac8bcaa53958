//! VRHANDS Simulation Core
//!
//! Hand grab interaction на Bevy 0.16 + Rapier:
//! - `grab`: engine-agnostic grab controller + ECS plugin
//! - `shared`: Pose / grab point bounds math
//! - `collision_layers`: Rapier collision groups рук, объектов и игрока
//! - `scenario`: scripted headless сценарий (бинарник + тесты детерминизма)

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod collision_layers;
pub mod grab;
pub mod logger;
pub mod scenario;
pub mod shared;

// Re-export для удобства
pub use grab::{
    GrabConfigError, GrabController, GrabEffect, GrabPhase, GrabPlugin, GrabStats, GrabVolume, Grabbable, GrabberRig,
    GrabberSettings, HandGrabber, HandSample, HandSide, HandTracking, HeldBy, Holdable, HoldableStore, PlayerBody,
    PlayerRig,
};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter,
};
pub use shared::{GrabPoint, Pose, WorldBounds};

/// Fixed timestep симуляции (tracking 60Hz)
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            .add_plugins(GrabPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
///
/// Используется scripted сценариями для tracking noise.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается ровно на один fixed step за `app.update()`
/// (кроме самого первого update, см. `run_fixed_tick`).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / SIMULATION_HZ,
        )));

    app
}

/// Один simulation tick через полный `app.update()`
///
/// First/Last schedules тоже крутятся, так что Events<T> обновляются как в игре.
/// Самый первый update только стартует Time<Real> (delta = 0) и fixed step
/// не набирает: тогда делаем ещё один update.
pub fn run_fixed_tick(app: &mut App) {
    let fixed_elapsed = |app: &App| app.world().get_resource::<Time<Fixed>>().map(Time::elapsed);

    let before = fixed_elapsed(app);
    app.update();
    if before.is_some() && fixed_elapsed(app) == before {
        app.update();
    }
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
