//! Grab Interaction Controller: engine-agnostic state machine одной руки
//!
//! Фазы: Idle → Tracking (есть кандидаты) → Holding → (release) → Idle.
//!
//! `tick`: чистая функция перехода: на входе hand sample + batch overlap
//! событий, на выходе упорядоченный список `GrabEffect`. Scheduler (ECS система,
//! тест, другой движок) применяет эффекты к своему миру.
//!
//! Порядок внутри tick:
//! 1. overlap события → candidate set
//! 2. hand pose из tracking → `MoveHand`
//! 3. held object → target pose (kinematic move), если не parented
//! 4. grip hysteresis → grab / release
//! 5. thumbstick → snap turn
//!
//! Отбор у другой руки (offhand grab): объект-side release выполняется прямо в
//! tick новой руки (до её `grab_begin`), а контроллер старой руки получает
//! `offhand_grabbed` через `resolve_displacements`.

use bevy::prelude::*;

use super::candidates::GrabCandidates;
use super::holdable::{GrabKey, Holdable, HoldableStore};
use super::hysteresis::{grip_edge, GripEdge};
use super::settings::{GrabConfigError, GrabberRig, GrabberSettings, HandSide};
use crate::shared::Pose;
use crate::{log, log_info, log_warning};

/// Input одной руки за tick (от tracking слоя)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandSample {
    /// World pose tracking space (rig игрока)
    pub tracking_origin: Pose,
    /// Controller pose внутри tracking space
    pub local_position: Vec3,
    pub local_orientation: Quat,
    /// Controller velocity внутри tracking space
    pub local_linear_velocity: Vec3,
    pub local_angular_velocity: Vec3,
    /// Grip trigger [0, 1]
    pub grip: f32,
    /// Thumbstick [-1, 1]²
    pub thumbstick: Vec2,
}

/// Overlap событие grab volume (None: коллайдер без grabbable, игнорируется)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapEvent<K> {
    Begin(Option<K>),
    End(Option<K>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabPhase {
    Idle,
    Tracking,
    Holding,
}

/// Эффекты tick'а в порядке применения
#[derive(Debug, Clone, PartialEq)]
pub enum GrabEffect<K> {
    /// Рука следует за tracking (kinematic move тела руки)
    MoveHand { pose: Pose },
    /// Held object → target pose. `teleport` только в момент grab
    MoveHeld { object: K, pose: Pose, teleport: bool },
    Grabbed { object: K, grab_point: usize },
    Released {
        object: K,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
    },
    /// Объект отобран у `previous_holder` (object-side release уже выполнен)
    ForciblyReleased { object: K, previous_holder: K },
    /// Игнорировать коллизии object ↔ player body
    PlayerCollision { object: K, player: K, ignore: bool },
    SetGrabVolumes { enabled: bool },
    /// Parenting mode: object становится child руки с локальной позой `local`
    Parent { object: K, local: Pose },
    Unparent { object: K, pose: Pose },
    /// Поворот rig'а игрока вокруг world up (радианы, right-handed: минус = вправо)
    SnapTurn { rig: Option<K>, yaw: f32 },
}

/// Held state: объект + offsets в системе координат руки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeldObject<K> {
    pub object: K,
    pub grab_point: usize,
    pub position_offset: Vec3,
    pub rotation_offset: Quat,
}

impl<K> HeldObject<K> {
    pub fn local_pose(&self) -> Pose {
        Pose::new(self.position_offset, self.rotation_offset)
    }

    /// Target world pose объекта для руки в позе `hand`
    pub fn target_pose(&self, hand: &Pose) -> Pose {
        *hand * self.local_pose()
    }
}

#[derive(Debug, Clone)]
pub struct GrabController<K> {
    id: K,
    settings: GrabberSettings,
    rig: GrabberRig<K>,
    grip_anchor: Pose,
    candidates: GrabCandidates<K>,
    held: Option<HeldObject<K>>,
    prev_flex: f32,
    grab_volumes_enabled: bool,
    hand_pose: Pose,
    last_sample: HandSample,
    turning: bool,
}

impl<K: GrabKey> GrabController<K> {
    /// Создаёт контроллер. Неполный rig или кривые thresholds → ошибка сразу.
    pub fn new(id: K, settings: GrabberSettings, rig: GrabberRig<K>) -> Result<Self, GrabConfigError> {
        settings.validate()?;
        let grip_anchor = rig.validate()?;
        let hand_pose = rig.anchor_offset;

        Ok(Self {
            id,
            settings,
            rig,
            grip_anchor,
            candidates: GrabCandidates::new(),
            held: None,
            prev_flex: 0.0,
            grab_volumes_enabled: true,
            hand_pose,
            last_sample: HandSample::default(),
            turning: false,
        })
    }

    pub fn id(&self) -> K {
        self.id
    }

    pub fn settings(&self) -> &GrabberSettings {
        &self.settings
    }

    pub fn rig(&self) -> &GrabberRig<K> {
        &self.rig
    }

    pub fn candidates(&self) -> &GrabCandidates<K> {
        &self.candidates
    }

    pub fn held(&self) -> Option<&HeldObject<K>> {
        self.held.as_ref()
    }

    pub fn held_object(&self) -> Option<K> {
        self.held.map(|held| held.object)
    }

    pub fn grab_volumes_enabled(&self) -> bool {
        self.grab_volumes_enabled
    }

    pub fn hand_pose(&self) -> Pose {
        self.hand_pose
    }

    pub fn prev_flex(&self) -> f32 {
        self.prev_flex
    }

    pub fn phase(&self) -> GrabPhase {
        if self.held.is_some() {
            GrabPhase::Holding
        } else if !self.candidates.is_empty() {
            GrabPhase::Tracking
        } else {
            GrabPhase::Idle
        }
    }

    /// Один tick руки
    pub fn tick<S>(
        &mut self,
        sample: &HandSample,
        overlaps: &[OverlapEvent<K>],
        store: &mut S,
    ) -> Vec<GrabEffect<K>>
    where
        S: HoldableStore<K>,
    {
        let mut effects = Vec::new();

        for event in overlaps {
            self.apply_overlap(*event);
        }

        self.last_sample = *sample;
        self.hand_pose = self.compute_hand_pose(sample);
        effects.push(GrabEffect::MoveHand { pose: self.hand_pose });

        if !self.settings.parent_held_object {
            if let Some(held) = &self.held {
                effects.push(GrabEffect::MoveHeld {
                    object: held.object,
                    pose: held.target_pose(&self.hand_pose),
                    teleport: false,
                });
            }
        }

        let prev_flex = self.prev_flex;
        self.prev_flex = sample.grip;

        match grip_edge(prev_flex, sample.grip, self.settings.grab_begin, self.settings.grab_end) {
            Some(GripEdge::Pressed) if self.held.is_none() => self.grab_begin(store, &mut effects),
            // Release edge всегда возвращает grab volumes (даже если ничего не взяли)
            Some(GripEdge::Released) => self.grab_end(store, &mut effects),
            _ => {}
        }

        self.update_snap_turn(sample.thumbstick, &mut effects);

        effects
    }

    /// Отпустить `object` по запросу извне. No-op, если держим не его.
    pub fn force_release<S>(&mut self, object: K, store: &mut S) -> Vec<GrabEffect<K>>
    where
        S: HoldableStore<K>,
    {
        let mut effects = Vec::new();
        if self.held_object() == Some(object) {
            self.grab_end(store, &mut effects);
        }
        effects
    }

    /// Другая рука забрала `object`: сбрасываем свою ссылку.
    ///
    /// Object-side release уже сделан забравшей рукой, здесь только наши
    /// parenting/player collision эффекты. Grab volumes остаются выключенными
    /// до следующего release edge.
    pub fn offhand_grabbed(&mut self, object: K) -> Vec<GrabEffect<K>> {
        let mut effects = Vec::new();
        let Some(held) = self.held else {
            return effects;
        };
        if held.object != object {
            return effects;
        }

        self.held = None;
        if self.settings.parent_held_object {
            effects.push(GrabEffect::Unparent {
                object,
                pose: held.target_pose(&self.hand_pose),
            });
        }
        if let Some(player) = self.rig.player_body {
            effects.push(GrabEffect::PlayerCollision { object, player, ignore: false });
        }

        log_info(&format!("✋ Hand {:?} lost {:?} to offhand grab", self.id, object));
        effects
    }

    /// Рука уничтожается/отключается: отпускаем held object как обычно
    pub fn shutdown<S>(&mut self, store: &mut S) -> Vec<GrabEffect<K>>
    where
        S: HoldableStore<K>,
    {
        let mut effects = Vec::new();
        if self.held.is_some() {
            self.grab_end(store, &mut effects);
        }
        effects
    }

    /// Linear/angular velocity руки в world space (из последнего sample)
    pub fn release_velocities(&self) -> (Vec3, Vec3) {
        let sample = &self.last_sample;
        let local = Pose::new(sample.local_position, sample.local_orientation) * self.rig.anchor_offset;
        let tracking_space = self.hand_pose * local.inverse();

        (
            tracking_space.orientation * sample.local_linear_velocity,
            tracking_space.orientation * sample.local_angular_velocity,
        )
    }

    fn compute_hand_pose(&self, sample: &HandSample) -> Pose {
        let anchor = self.rig.anchor_offset;
        sample.tracking_origin
            * Pose::new(
                anchor.position + sample.local_position,
                sample.local_orientation * anchor.orientation,
            )
    }

    fn apply_overlap(&mut self, event: OverlapEvent<K>) {
        match event {
            OverlapEvent::Begin(None) | OverlapEvent::End(None) => {}
            OverlapEvent::Begin(Some(object)) => {
                if !self.grab_volumes_enabled {
                    log(&format!("Hand {:?}: overlap {:?} dropped (grab volumes disabled)", self.id, object));
                    return;
                }
                self.candidates.enter(object);
            }
            OverlapEvent::End(Some(object)) => {
                if self.grab_volumes_enabled {
                    self.candidates.exit(object);
                }
            }
        }
    }

    fn grab_begin<S>(&mut self, store: &mut S, effects: &mut Vec<GrabEffect<K>>)
    where
        S: HoldableStore<K>,
    {
        let grip_world = self.hand_pose.transform_point(self.grip_anchor.position);

        // Ближайший grab point среди кандидатов (строгое <, первый выигрывает при равенстве)
        let mut closest: Option<(K, usize, f32)> = None;
        for object in self.candidates.iter() {
            let Some(item) = store.holdable(object) else {
                continue;
            };
            let held_by_other = item.holder().is_some_and(|holder| holder != self.id);
            if held_by_other && !item.profile().allow_offhand_grab {
                continue;
            }

            let pose = item.pose();
            for (index, point) in item.grab_points().iter().enumerate() {
                let distance_sq = point.world_bounds(&pose).distance_squared(grip_world);
                if closest.map_or(true, |(_, _, best)| distance_sq < best) {
                    closest = Some((object, index, distance_sq));
                }
            }
        }

        // Volumes выключаем в любом случае, чтобы не ловить overlap с held object
        self.set_grab_volumes(false, effects);

        let Some((object, grab_point, _)) = closest else {
            log(&format!("Hand {:?}: grab with no eligible candidates", self.id));
            return;
        };
        let Some(item) = store.holdable_mut(object) else {
            return;
        };

        if let Some(previous_holder) = item.holder() {
            if previous_holder != self.id {
                item.grab_end(Vec3::ZERO, Vec3::ZERO);
                item.on_forcibly_released();
                effects.push(GrabEffect::ForciblyReleased { object, previous_holder });
            }
        }

        item.grab_begin(self.id, grab_point);
        let profile = item.profile();
        // Текущая поза объекта в системе координат руки (offset для non-snap grab)
        let relative = self.hand_pose.relative(&item.pose());

        let position_offset = if profile.snap_position {
            let mut offset = self.grip_anchor.position;
            if let Some(snap) = profile.snap_offset {
                let mut snap_position = snap.position;
                if self.settings.hand == HandSide::Left {
                    snap_position.x = -snap_position.x;
                }
                offset += snap_position;
            }
            offset
        } else {
            relative.position
        };

        let rotation_offset = if profile.snap_orientation {
            match profile.snap_offset {
                Some(snap) => snap.orientation * self.grip_anchor.orientation,
                None => self.grip_anchor.orientation,
            }
        } else {
            relative.orientation
        };

        let held = HeldObject {
            object,
            grab_point,
            position_offset,
            rotation_offset,
        };
        self.held = Some(held);

        effects.push(GrabEffect::Grabbed { object, grab_point });
        // Teleport при grab: kinematic move с большой скоростью раскидал бы всё по пути
        effects.push(GrabEffect::MoveHeld {
            object,
            pose: held.target_pose(&self.hand_pose),
            teleport: true,
        });
        if let Some(player) = self.rig.player_body {
            effects.push(GrabEffect::PlayerCollision { object, player, ignore: true });
        }
        if self.settings.parent_held_object {
            effects.push(GrabEffect::Parent {
                object,
                local: held.local_pose(),
            });
        }

        log_info(&format!("✊ Hand {:?} grabbed {:?} (grab point {})", self.id, object, grab_point));
    }

    fn grab_end<S>(&mut self, store: &mut S, effects: &mut Vec<GrabEffect<K>>)
    where
        S: HoldableStore<K>,
    {
        if let Some(held) = self.held.take() {
            let (linear_velocity, angular_velocity) = self.release_velocities();

            match store.holdable_mut(held.object) {
                Some(item) => item.grab_end(linear_velocity, angular_velocity),
                None => log_warning(&format!(
                    "Hand {:?}: held object {:?} no longer exists",
                    self.id, held.object
                )),
            }

            if self.settings.parent_held_object {
                effects.push(GrabEffect::Unparent {
                    object: held.object,
                    pose: held.target_pose(&self.hand_pose),
                });
            }
            if let Some(player) = self.rig.player_body {
                effects.push(GrabEffect::PlayerCollision {
                    object: held.object,
                    player,
                    ignore: false,
                });
            }
            effects.push(GrabEffect::Released {
                object: held.object,
                linear_velocity,
                angular_velocity,
            });

            log_info(&format!(
                "🖐 Hand {:?} released {:?} (v = {:?})",
                self.id, held.object, linear_velocity
            ));
        }

        self.set_grab_volumes(true, effects);
    }

    fn set_grab_volumes(&mut self, enabled: bool, effects: &mut Vec<GrabEffect<K>>) {
        if self.grab_volumes_enabled == enabled {
            return;
        }

        self.grab_volumes_enabled = enabled;
        if !enabled {
            // Stale overlaps не переживают выключение volumes
            self.candidates.clear();
        }
        effects.push(GrabEffect::SetGrabVolumes { enabled });
    }

    fn update_snap_turn(&mut self, thumbstick: Vec2, effects: &mut Vec<GrabEffect<K>>) {
        let deadzone = self.settings.turn_deadzone;
        let step = self.settings.snap_turn_degrees.to_radians();

        if thumbstick.x > deadzone && !self.turning {
            // Stick вправо → поворот по часовой (вид сверху) → отрицательный yaw
            effects.push(GrabEffect::SnapTurn { rig: self.rig.player_rig, yaw: -step });
            self.turning = true;
        } else if thumbstick.x < -deadzone && !self.turning {
            effects.push(GrabEffect::SnapTurn { rig: self.rig.player_rig, yaw: step });
            self.turning = true;
        }

        if thumbstick.x == 0.0 {
            self.turning = false;
        }
    }
}

/// Разворачивает `ForciblyReleased` эффекты: сразу после каждого вставляет
/// эффекты `offhand_grabbed` предыдущей руки.
///
/// `displaced(previous_holder, object)` должен вызвать `offhand_grabbed` на
/// контроллере `previous_holder`.
pub fn resolve_displacements<K, F>(effects: Vec<GrabEffect<K>>, mut displaced: F) -> Vec<GrabEffect<K>>
where
    K: GrabKey,
    F: FnMut(K, K) -> Vec<GrabEffect<K>>,
{
    let mut resolved = Vec::with_capacity(effects.len());
    for effect in effects {
        let displacement = match &effect {
            GrabEffect::ForciblyReleased { object, previous_holder } => Some((*previous_holder, *object)),
            _ => None,
        };
        resolved.push(effect);
        if let Some((previous_holder, object)) = displacement {
            resolved.extend(displaced(previous_holder, object));
        }
    }
    resolved
}
