//! Grab ECS systems
//!
//! Порядок в FixedUpdate (chain):
//! 1. collect_rapier_overlaps: Rapier `CollisionEvent` → `GrabOverlap`
//! 2. sync_grabbable_poses: Transform → Grabbable.pose
//! 3. process_hand_detach: `DetachHandIntent` → shutdown + remove HandGrabber
//! 4. apply_removed_hand_effects: эффекты рук, у которых сняли HandGrabber (despawn)
//! 5. tick_hand_grabbers: controller tick + применение эффектов
//! 6. sync_grabbable_bodies: held → kinematic, release → velocity броска
//! 7. count_grab_events: исходящие события → GrabStats

use std::collections::BTreeMap;

use bevy::ecs::component::HookContext;
use bevy::ecs::system::SystemParam;
use bevy::ecs::world::DeferredWorld;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::components::{GrabVolume, Grabbable, HandGrabber, HandTracking, HeldBy};
use super::controller::{resolve_displacements, GrabEffect, OverlapEvent};
use super::events::{
    DetachHandIntent, GrabOverlap, GrabStats, ObjectForciblyReleased, ObjectGrabbed, ObjectReleased, SnapTurned,
};
use super::holdable::{Holdable, HoldableStore};
use crate::collision_layers::{get_group_name, GROUP_PLAYER};
use crate::shared::Pose;
use crate::{log, log_error, log_warning};

/// `HoldableStore` поверх ECS query
pub struct GrabbableStore<'a, 'w, 's, 'q> {
    query: &'a mut Query<'w, 's, &'q mut Grabbable>,
}

impl<'a, 'w, 's, 'q> GrabbableStore<'a, 'w, 's, 'q> {
    pub fn new(query: &'a mut Query<'w, 's, &'q mut Grabbable>) -> Self {
        Self { query }
    }
}

impl HoldableStore<Entity> for GrabbableStore<'_, '_, '_, '_> {
    type Item = Grabbable;

    fn holdable(&self, key: Entity) -> Option<&Grabbable> {
        self.query.get(key).ok()
    }

    fn holdable_mut(&mut self, key: Entity) -> Option<&mut Grabbable> {
        self.query.get_mut(key).ok().map(Mut::into_inner)
    }
}

/// `HoldableStore` поверх DeferredWorld (component hooks)
struct DeferredGrabbableStore<'a, 'w> {
    world: &'a mut DeferredWorld<'w>,
}

impl HoldableStore<Entity> for DeferredGrabbableStore<'_, '_> {
    type Item = Grabbable;

    fn holdable(&self, key: Entity) -> Option<&Grabbable> {
        self.world.get::<Grabbable>(key)
    }

    fn holdable_mut(&mut self, key: Entity) -> Option<&mut Grabbable> {
        self.world.get_mut::<Grabbable>(key).map(Mut::into_inner)
    }
}

/// Эффекты shutdown'а рук, снятых вне grab систем (despawn, remove::<HandGrabber>)
#[derive(Debug, Clone)]
pub struct RemovedHand {
    pub hand: Entity,
    pub grab_volumes: Vec<Entity>,
    pub effects: Vec<GrabEffect<Entity>>,
}

/// Очередь `RemovedHand`: hook пишет, `apply_removed_hand_effects` применяет
#[derive(Resource, Debug, Default)]
pub struct RemovedHands(pub Vec<RemovedHand>);

/// Hook на remove `HandGrabber`: отпускает held object сразу
///
/// Grabbable освобождается в hook'е (другая рука может взять его в том же tick),
/// остальные эффекты (события, collision groups, unparent) ждут в `RemovedHands`.
/// Если рука держала объект в parenting mode, despawn руки уносит и его (children).
pub fn release_on_hand_removed(mut world: DeferredWorld, context: HookContext) {
    let hand = context.entity;
    let Some(mut controller) = world.get::<HandGrabber>(hand).map(|grabber| grabber.controller.clone()) else {
        return;
    };
    if controller.held_object().is_none() {
        return;
    }

    let grab_volumes = controller.rig().grab_volumes.clone();
    let effects = controller.shutdown(&mut DeferredGrabbableStore { world: &mut world });

    match world.get_resource_mut::<RemovedHands>() {
        Some(mut removed) => removed.0.push(RemovedHand {
            hand,
            grab_volumes,
            effects,
        }),
        None => log_warning(&format!(
            "Hand {:?} removed without GrabPlugin: {} effects dropped",
            hand,
            effects.len()
        )),
    }
}

/// Всё, что нужно для применения `GrabEffect` к миру
#[derive(SystemParam)]
pub struct GrabEffectContext<'w, 's> {
    commands: Commands<'w, 's>,
    transforms: Query<'w, 's, &'static mut Transform>,
    velocities: Query<'w, 's, &'static mut Velocity>,
    collision_groups: Query<'w, 's, &'static mut CollisionGroups>,
    grabbed_events: EventWriter<'w, ObjectGrabbed>,
    released_events: EventWriter<'w, ObjectReleased>,
    displaced_events: EventWriter<'w, ObjectForciblyReleased>,
    snap_turn_events: EventWriter<'w, SnapTurned>,
}

impl GrabEffectContext<'_, '_> {
    /// World pose tracking space (rig игрока), если rig есть и у него Transform
    fn rig_pose(&self, rig: Option<Entity>) -> Option<Pose> {
        let rig = rig?;
        self.transforms.get(rig).ok().map(Pose::from)
    }

    /// Применяет эффекты руки `hand` в порядке списка
    pub fn apply(&mut self, hand: Entity, grab_volumes: &[Entity], effects: Vec<GrabEffect<Entity>>) {
        for effect in effects {
            match effect {
                GrabEffect::MoveHand { pose } => {
                    if let Ok(mut transform) = self.transforms.get_mut(hand) {
                        *transform = pose.to_transform();
                    }
                }
                GrabEffect::MoveHeld { object, pose, teleport } => {
                    let Ok(mut transform) = self.transforms.get_mut(object) else {
                        log_warning(&format!("MoveHeld: object {:?} has no Transform", object));
                        continue;
                    };
                    *transform = pose.to_transform();

                    // Teleport: никакой накопленной скорости после переноса в руку
                    if teleport {
                        if let Ok(mut velocity) = self.velocities.get_mut(object) {
                            *velocity = Velocity::zero();
                        }
                    }
                }
                GrabEffect::Grabbed { object, grab_point } => {
                    if let Ok(mut entity) = self.commands.get_entity(object) {
                        entity.insert(HeldBy { hand });
                    }
                    self.grabbed_events.write(ObjectGrabbed { hand, object, grab_point });
                }
                GrabEffect::Released {
                    object,
                    linear_velocity,
                    angular_velocity,
                } => {
                    if let Ok(mut entity) = self.commands.get_entity(object) {
                        entity.remove::<HeldBy>();
                    }
                    self.released_events.write(ObjectReleased {
                        hand,
                        object,
                        linear_velocity,
                        angular_velocity,
                    });
                }
                GrabEffect::ForciblyReleased { object, previous_holder } => {
                    self.displaced_events.write(ObjectForciblyReleased {
                        object,
                        previous_hand: previous_holder,
                        new_hand: hand,
                    });
                }
                GrabEffect::PlayerCollision { object, player, ignore } => {
                    let Ok(mut groups) = self.collision_groups.get_mut(object) else {
                        log(&format!(
                            "PlayerCollision: object {:?} has no CollisionGroups (player {:?})",
                            object, player
                        ));
                        continue;
                    };
                    if ignore {
                        groups.filters.remove(GROUP_PLAYER);
                    } else {
                        groups.filters.insert(GROUP_PLAYER);
                    }
                    log(&format!(
                        "{:?} ↔ {} ({:?}): collision {}",
                        object,
                        get_group_name(GROUP_PLAYER),
                        player,
                        if ignore { "ignored" } else { "restored" }
                    ));
                }
                GrabEffect::SetGrabVolumes { enabled } => {
                    for volume in grab_volumes {
                        let Ok(mut entity) = self.commands.get_entity(*volume) else {
                            continue;
                        };
                        if enabled {
                            entity.remove::<ColliderDisabled>();
                        } else {
                            entity.insert(ColliderDisabled);
                        }
                    }
                }
                GrabEffect::Parent { object, local } => {
                    if let Ok(mut entity) = self.commands.get_entity(object) {
                        entity.insert(ChildOf(hand));
                    }
                    if let Ok(mut transform) = self.transforms.get_mut(object) {
                        *transform = local.to_transform();
                    }
                }
                GrabEffect::Unparent { object, pose } => {
                    if let Ok(mut entity) = self.commands.get_entity(object) {
                        entity.remove::<ChildOf>();
                    }
                    if let Ok(mut transform) = self.transforms.get_mut(object) {
                        *transform = pose.to_transform();
                    }
                }
                GrabEffect::SnapTurn { rig, yaw } => {
                    if let Some(rig) = rig {
                        // Поворот вокруг world up через позицию rig'а
                        if let Ok(mut transform) = self.transforms.get_mut(rig) {
                            transform.rotate_y(yaw);
                        }
                    }
                    self.snap_turn_events.write(SnapTurned { hand, rig, yaw });
                }
            }
        }
    }
}

/// Поднимается по ChildOf до entity с Grabbable (коллайдер может быть child'ом объекта)
fn resolve_grabbable(
    collider: Entity,
    grabbables: &Query<(), With<Grabbable>>,
    parents: &Query<&ChildOf>,
) -> Option<Entity> {
    let mut current = collider;
    loop {
        if grabbables.contains(current) {
            return Some(current);
        }
        current = parents.get(current).ok()?.parent();
    }
}

/// System: Rapier collision events с grab volumes → GrabOverlap
///
/// Rapier шлёт Stopped при ColliderDisabled/despawn: это нормально,
/// контроллер игнорирует End пока volumes выключены.
pub fn collect_rapier_overlaps(
    mut collisions: EventReader<CollisionEvent>,
    volumes: Query<&GrabVolume>,
    grabbables: Query<(), With<Grabbable>>,
    parents: Query<&ChildOf>,
    mut overlaps: EventWriter<GrabOverlap>,
) {
    for collision in collisions.read() {
        let (a, b, started) = match collision {
            CollisionEvent::Started(a, b, _) => (*a, *b, true),
            CollisionEvent::Stopped(a, b, _) => (*a, *b, false),
        };

        let (volume, other) = match (volumes.get(a), volumes.get(b)) {
            (Ok(volume), _) => (volume, b),
            (_, Ok(volume)) => (volume, a),
            _ => continue,
        };

        let grabbable = resolve_grabbable(other, &grabbables, &parents);
        let hand = volume.hand;

        overlaps.write(if started {
            GrabOverlap::Entered { hand, grabbable }
        } else {
            GrabOverlap::Exited { hand, grabbable }
        });
    }
}

/// System: кэш world pose grabbable объектов для distance/offset расчётов
///
/// У parented объекта (parenting mode) Transform локальный относительно руки.
pub fn sync_grabbable_poses(
    mut grabbables: Query<(&Transform, Option<&ChildOf>, &mut Grabbable)>,
    parents: Query<&Transform, Without<Grabbable>>,
) {
    for (transform, child_of, mut grabbable) in grabbables.iter_mut() {
        let local = Pose::from(transform);
        let pose = match child_of.and_then(|child_of| parents.get(child_of.parent()).ok()) {
            Some(parent) => Pose::from(parent) * local,
            None => local,
        };
        if grabbable.pose != pose {
            grabbable.pose = pose;
        }
    }
}

/// System: DetachHandIntent → отпустить held object, снять HandGrabber
pub fn process_hand_detach(
    mut intents: EventReader<DetachHandIntent>,
    mut hands: Query<&mut HandGrabber>,
    mut grabbables: Query<&mut Grabbable>,
    mut ctx: GrabEffectContext,
) {
    for intent in intents.read() {
        let Ok(mut grabber) = hands.get_mut(intent.hand) else {
            log_error(&format!("DetachHandIntent: hand {:?} has no HandGrabber", intent.hand));
            continue;
        };

        let grab_volumes = grabber.controller.rig().grab_volumes.clone();
        let effects = grabber.controller.shutdown(&mut GrabbableStore::new(&mut grabbables));
        ctx.apply(intent.hand, &grab_volumes, effects);

        if let Ok(mut entity) = ctx.commands.get_entity(intent.hand) {
            entity.remove::<HandGrabber>();
        }
        log(&format!("Hand {:?} detached", intent.hand));
    }
}

/// System: эффекты shutdown'а рук, снятых через hook
pub fn apply_removed_hand_effects(mut removed: ResMut<RemovedHands>, mut ctx: GrabEffectContext) {
    for RemovedHand {
        hand,
        grab_volumes,
        effects,
    } in removed.0.drain(..)
    {
        ctx.apply(hand, &grab_volumes, effects);
        log(&format!("Hand {:?} removed while holding, object released", hand));
    }
}

/// System: tick всех рук + применение эффектов
///
/// Руки обрабатываются в порядке Entity (детерминизм при offhand grab:
/// какая рука первой нажала grip в одном tick: та и берёт).
pub fn tick_hand_grabbers(
    mut overlaps: EventReader<GrabOverlap>,
    mut hands: Query<(Entity, &mut HandGrabber, &HandTracking)>,
    mut grabbables: Query<&mut Grabbable>,
    mut ctx: GrabEffectContext,
) {
    let mut batches: BTreeMap<Entity, Vec<OverlapEvent<Entity>>> = BTreeMap::new();
    for overlap in overlaps.read() {
        batches.entry(overlap.hand()).or_default().push(overlap.to_overlap_event());
    }

    let mut order: Vec<Entity> = hands.iter().map(|(entity, _, _)| entity).collect();
    order.sort();

    for hand in order {
        let batch = batches.remove(&hand).unwrap_or_default();

        let (grab_volumes, effects) = {
            let Ok((_, mut grabber, tracking)) = hands.get_mut(hand) else {
                continue;
            };

            let mut sample = tracking.sample;
            // Tracking space = rig игрока (snap turn поворачивает его)
            if let Some(origin) = ctx.rig_pose(grabber.controller.rig().player_rig) {
                sample.tracking_origin = origin;
            }

            let grab_volumes = grabber.controller.rig().grab_volumes.clone();
            let effects = grabber
                .controller
                .tick(&sample, &batch, &mut GrabbableStore::new(&mut grabbables));
            (grab_volumes, effects)
        };

        let effects = resolve_displacements(effects, |previous, object| match hands.get_mut(previous) {
            Ok((_, mut other, _)) => other.controller.offhand_grabbed(object),
            Err(_) => {
                log_warning(&format!(
                    "Offhand grab: previous holder {:?} of {:?} is not a hand",
                    previous, object
                ));
                Vec::new()
            }
        });

        ctx.apply(hand, &grab_volumes, effects);
    }

    for (hand, dropped) in batches {
        log_warning(&format!("{} overlap events for unknown hand {:?}", dropped.len(), hand));
    }
}

/// System: held object → kinematic, после release: исходный тип тела + velocity броска
///
/// В tick grab'а тело Fixed: Rapier применяет Transform fixed тела через set_position,
/// без kinematic sweep от старой позиции к руке. Со следующего tick: kinematic.
pub fn sync_grabbable_bodies(
    mut grabbables: Query<(&mut Grabbable, Option<&mut RigidBody>, Option<&mut Velocity>)>,
) {
    for (mut grabbable, body, velocity) in grabbables.iter_mut() {
        let Some(mut body) = body else {
            continue;
        };

        if grabbable.is_held() {
            if grabbable.original_body.is_none() {
                grabbable.original_body = Some(*body);
            }
            let target = if std::mem::take(&mut grabbable.teleport_pending) {
                RigidBody::Fixed
            } else {
                RigidBody::KinematicPositionBased
            };
            if *body != target {
                *body = target;
            }
            continue;
        }

        let Some(release) = grabbable.pending_release.take() else {
            continue;
        };

        grabbable.teleport_pending = false;
        *body = grabbable.original_body.take().unwrap_or(RigidBody::Dynamic);
        if let Some(mut velocity) = velocity {
            velocity.linvel = release.linear;
            velocity.angvel = release.angular;
        }
    }
}

/// System: накопление исходящих grab событий в GrabStats
pub fn count_grab_events(
    mut stats: ResMut<GrabStats>,
    mut grabbed: EventReader<ObjectGrabbed>,
    mut released: EventReader<ObjectReleased>,
    mut displaced: EventReader<ObjectForciblyReleased>,
    mut snap_turns: EventReader<SnapTurned>,
) {
    stats.grabs += grabbed.read().count();
    stats.releases += released.read().count();
    stats.forced_releases += displaced.read().count();
    stats.snap_turns += snap_turns.read().count();
}
