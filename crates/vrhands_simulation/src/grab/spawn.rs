//! Spawn helpers: рука с grab volumes, grabbable объект, player rig

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::components::{GrabVolume, Grabbable, HandGrabber, HandTracking, PlayerBody, PlayerRig};
use super::controller::GrabController;
use super::settings::{GrabConfigError, GrabberRig, GrabberSettings};
use crate::collision_layers::{grab_volume_groups, grabbable_groups, player_groups};
use crate::shared::Pose;

/// Sensor box grab volume в локальных координатах руки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabVolumeShape {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Default for GrabVolumeShape {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(0.06),
        }
    }
}

/// Параметры руки для `spawn_hand`
#[derive(Debug, Clone)]
pub struct HandSpawnConfig {
    pub settings: GrabberSettings,
    pub grip_anchor: Option<Pose>,
    pub grab_volumes: Vec<GrabVolumeShape>,
    pub anchor_offset: Pose,
    pub player_body: Option<Entity>,
    pub player_rig: Option<Entity>,
}

impl HandSpawnConfig {
    pub fn new(settings: GrabberSettings) -> Self {
        Self {
            settings,
            grip_anchor: Some(Pose::IDENTITY),
            grab_volumes: vec![GrabVolumeShape::default()],
            anchor_offset: Pose::IDENTITY,
            player_body: None,
            player_rig: None,
        }
    }
}

/// Spawn руки: kinematic тело + sensor grab volumes (children) + HandGrabber
///
/// Конфиг проверяется до того, как рука попадёт в мир: при ошибке
/// всё заспавненное удаляется.
pub fn spawn_hand(world: &mut World, config: HandSpawnConfig) -> Result<Entity, GrabConfigError> {
    let hand = world
        .spawn((
            config.anchor_offset.to_transform(),
            HandTracking::default(),
            RigidBody::KinematicPositionBased,
        ))
        .id();

    let volumes: Vec<Entity> = config
        .grab_volumes
        .iter()
        .map(|shape| {
            world
                .spawn((
                    GrabVolume { hand },
                    Transform::from_translation(shape.center),
                    Collider::cuboid(shape.half_extents.x, shape.half_extents.y, shape.half_extents.z),
                    Sensor,
                    ActiveEvents::COLLISION_EVENTS,
                    ActiveCollisionTypes::all(),
                    grab_volume_groups(),
                    ChildOf(hand),
                ))
                .id()
        })
        .collect();

    let rig = GrabberRig {
        grip_anchor: config.grip_anchor,
        grab_volumes: volumes,
        anchor_offset: config.anchor_offset,
        player_body: config.player_body,
        player_rig: config.player_rig,
    };

    match GrabController::new(hand, config.settings, rig) {
        Ok(controller) => {
            world.entity_mut(hand).insert(HandGrabber { controller });
            Ok(hand)
        }
        Err(err) => {
            crate::log_error(&format!("spawn_hand: invalid config: {}", err));
            world.entity_mut(hand).despawn();
            Err(err)
        }
    }
}

/// Spawn grabbable: dynamic тело + compound collider из grab points
pub fn spawn_grabbable(world: &mut World, pose: Pose, grabbable: Grabbable) -> Entity {
    let shapes: Vec<(Vec3, Quat, Collider)> = grabbable
        .grab_points
        .iter()
        .map(|point| {
            (
                point.center,
                Quat::IDENTITY,
                Collider::cuboid(point.half_extents.x, point.half_extents.y, point.half_extents.z),
            )
        })
        .collect();

    let mut grabbable = grabbable;
    grabbable.pose = pose;

    world
        .spawn((
            grabbable,
            pose.to_transform(),
            RigidBody::Dynamic,
            Velocity::zero(),
            Collider::compound(shapes),
            grabbable_groups(),
        ))
        .id()
}

/// Spawn player: rig (tracking space) + body (capsule)
///
/// Возвращает (rig, body).
pub fn spawn_player(world: &mut World, position: Vec3) -> (Entity, Entity) {
    let rig = world.spawn((PlayerRig, Transform::from_translation(position))).id();
    let body = world
        .spawn((
            PlayerBody,
            Transform::from_xyz(0.0, 0.9, 0.0),
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(0.6, 0.3),
            player_groups(),
            ChildOf(rig),
        ))
        .id();
    (rig, body)
}
