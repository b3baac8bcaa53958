//! Grab ECS компоненты: руки, grabbable объекты, grab volumes

use bevy::prelude::*;
use bevy_rapier3d::prelude::RigidBody;

use super::controller::{GrabController, HandSample};
use super::holdable::{GrabProfile, Holdable};
use crate::shared::{GrabPoint, Pose};

/// Рука с grab controller'ом
///
/// Entity руки = holder id для grabbable объектов.
/// Снятие компонента (remove/despawn руки) отпускает held object.
#[derive(Component, Debug)]
#[component(on_remove = super::systems::release_on_hand_removed)]
pub struct HandGrabber {
    pub controller: GrabController<Entity>,
}

/// Входные данные руки за tick (tracking + controller axes)
///
/// Для headless тестов: mock input через этот компонент.
/// Для игры: заполняется input слоем (OpenXR/Godot bridge).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct HandTracking {
    pub sample: HandSample,
}

/// Sensor коллайдер руки, через который приходят overlap события
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct GrabVolume {
    pub hand: Entity,
}

/// Marker: тело игрока (held objects с ним не коллайдят)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PlayerBody;

/// Marker: корень tracking space игрока (snap turn крутит его)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PlayerRig;

/// Marker на held object: какая рука держит
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct HeldBy {
    pub hand: Entity,
}

/// Скорость, с которой объект отпустили (применяется к Rapier Velocity)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReleaseVelocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

/// Объект, который можно взять рукой
#[derive(Component, Debug, Clone)]
pub struct Grabbable {
    pub grab_points: Vec<GrabPoint>,
    pub snap_position: bool,
    pub snap_orientation: bool,
    pub snap_offset: Option<Pose>,
    pub allow_offhand_grab: bool,

    /// Holder (пишут только grab controllers)
    pub grabbed_by: Option<Entity>,
    pub grabbed_point: Option<usize>,

    /// World pose (синхронизируется из Transform перед tick)
    pub pose: Pose,

    /// Тип тела до grab (held object временно kinematic)
    pub original_body: Option<RigidBody>,
    /// Grab только что перенёс объект в руку, Rapier ещё не видел новую позу
    pub teleport_pending: bool,
    /// Velocity броска, ждёт применения к Rapier
    pub pending_release: Option<ReleaseVelocity>,
    /// Сколько раз объект отбирали у руки
    pub forced_releases: u32,
}

impl Default for Grabbable {
    fn default() -> Self {
        Self {
            grab_points: vec![GrabPoint::default()],
            snap_position: false,
            snap_orientation: false,
            snap_offset: None,
            allow_offhand_grab: true,
            grabbed_by: None,
            grabbed_point: None,
            pose: Pose::IDENTITY,
            original_body: None,
            teleport_pending: false,
            pending_release: None,
            forced_releases: 0,
        }
    }
}

impl Grabbable {
    pub fn with_grab_points(grab_points: Vec<GrabPoint>) -> Self {
        Self {
            grab_points,
            ..Default::default()
        }
    }

    pub fn snapped(mut self, snap_offset: Option<Pose>) -> Self {
        self.snap_position = true;
        self.snap_orientation = true;
        self.snap_offset = snap_offset;
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.allow_offhand_grab = false;
        self
    }
}

impl Holdable<Entity> for Grabbable {
    fn profile(&self) -> GrabProfile {
        GrabProfile {
            snap_position: self.snap_position,
            snap_orientation: self.snap_orientation,
            snap_offset: self.snap_offset,
            allow_offhand_grab: self.allow_offhand_grab,
        }
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn grab_points(&self) -> &[GrabPoint] {
        &self.grab_points
    }

    fn holder(&self) -> Option<Entity> {
        self.grabbed_by
    }

    fn grab_begin(&mut self, holder: Entity, grab_point: usize) {
        self.grabbed_by = Some(holder);
        self.grabbed_point = Some(grab_point);
        // Повторный grab в том же tick (offhand) отменяет бросок
        self.pending_release = None;
        // За grab всегда следует teleport в руку
        self.teleport_pending = true;
    }

    fn grab_end(&mut self, linear_velocity: Vec3, angular_velocity: Vec3) {
        self.grabbed_by = None;
        self.grabbed_point = None;
        self.pending_release = Some(ReleaseVelocity {
            linear: linear_velocity,
            angular: angular_velocity,
        });
    }

    fn on_forcibly_released(&mut self) {
        self.forced_releases += 1;
    }
}
