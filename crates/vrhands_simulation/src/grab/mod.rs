//! Hand grab module
//!
//! Ядро (engine-agnostic, без ECS):
//! - `GrabController`: state machine одной руки (hysteresis, candidates, grab/release)
//! - `Holdable` / `HoldableStore`: контракт объекта, который можно взять
//! - `GrabberSettings` / `GrabberRig`: конфиг + scene wiring (fail fast)
//!
//! ECS слой:
//! - Components: HandGrabber, HandTracking, Grabbable, GrabVolume, PlayerBody, PlayerRig, HeldBy
//! - Events: GrabOverlap, DetachHandIntent → ObjectGrabbed, ObjectReleased, ObjectForciblyReleased, SnapTurned
//! - Rapier: ColliderDisabled для grab volumes, CollisionGroups для player ignore,
//!   kinematic body пока объект в руке

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionEvent;

pub mod candidates;
pub mod components;
pub mod controller;
pub mod events;
pub mod holdable;
pub mod hysteresis;
pub mod settings;
pub mod spawn;
pub mod systems;

#[cfg(test)]
mod candidates_tests;
#[cfg(test)]
mod settings_tests;

pub use candidates::GrabCandidates;
pub use components::{
    GrabVolume, Grabbable, HandGrabber, HandTracking, HeldBy, PlayerBody, PlayerRig, ReleaseVelocity,
};
pub use controller::{
    resolve_displacements, GrabController, GrabEffect, GrabPhase, HandSample, HeldObject, OverlapEvent,
};
pub use events::{
    DetachHandIntent, GrabOverlap, GrabStats, ObjectForciblyReleased, ObjectGrabbed, ObjectReleased, SnapTurned,
};
pub use holdable::{GrabKey, GrabProfile, Holdable, HoldableStore};
pub use hysteresis::{grip_edge, GripEdge};
pub use settings::{GrabConfigError, GrabberRig, GrabberSettings, HandSide};
pub use spawn::{spawn_grabbable, spawn_hand, spawn_player, GrabVolumeShape, HandSpawnConfig};
pub use systems::{RemovedHand, RemovedHands};

/// Grab Plugin
///
/// Регистрирует grab системы в FixedUpdate, до Rapier physics step.
///
/// Порядок выполнения:
/// 1. collect_rapier_overlaps: CollisionEvent → GrabOverlap
/// 2. sync_grabbable_poses: Transform → Grabbable.pose
/// 3. process_hand_detach: DetachHandIntent → release + remove HandGrabber
/// 4. apply_removed_hand_effects: руки, снятые despawn'ом (hook на HandGrabber)
/// 5. tick_hand_grabbers: tick рук (Entity order) + эффекты
/// 6. sync_grabbable_bodies: RigidBody/Velocity held и брошенных объектов
/// 7. count_grab_events: GrabStats
///
/// Без RapierPhysicsPlugin (headless) overlap события шлются напрямую как GrabOverlap.
pub struct GrabPlugin;

impl Plugin for GrabPlugin {
    fn build(&self, app: &mut App) {
        use bevy_rapier3d::plugin::PhysicsSet;

        // Регистрация событий (CollisionEvent: на случай запуска без Rapier plugin)
        app.add_event::<CollisionEvent>()
            .add_event::<GrabOverlap>()
            .add_event::<DetachHandIntent>()
            .add_event::<ObjectGrabbed>()
            .add_event::<ObjectReleased>()
            .add_event::<ObjectForciblyReleased>()
            .add_event::<SnapTurned>();

        app.init_resource::<GrabStats>().init_resource::<systems::RemovedHands>();

        app.register_type::<GrabVolume>()
            .register_type::<PlayerBody>()
            .register_type::<PlayerRig>()
            .register_type::<HeldBy>();

        app.add_systems(
            FixedUpdate,
            (
                systems::collect_rapier_overlaps,
                systems::sync_grabbable_poses,
                systems::process_hand_detach,
                systems::apply_removed_hand_effects,
                systems::tick_hand_grabbers,
                systems::sync_grabbable_bodies,
                systems::count_grab_events,
            )
                .chain()
                .before(PhysicsSet::SyncBackend),
        );
    }
}
