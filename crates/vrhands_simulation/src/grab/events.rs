//! Grab events
//!
//! Входящие:
//! - `GrabOverlap`: grab volume руки начал/закончил касаться коллайдера
//!   (из Rapier `CollisionEvent` или напрямую от host физики)
//! - `DetachHandIntent`: рука отключается (держимое отпускается)
//!
//! Исходящие (для звука/haptics/UI):
//! - `ObjectGrabbed`, `ObjectReleased`, `ObjectForciblyReleased`, `SnapTurned`

use bevy::prelude::*;

use super::controller::OverlapEvent;

/// Overlap grab volume ↔ коллайдер
///
/// `grabbable: None`: коллайдер без Grabbable (стена, пол), игнорируется контроллером.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOverlap {
    Entered { hand: Entity, grabbable: Option<Entity> },
    Exited { hand: Entity, grabbable: Option<Entity> },
}

impl GrabOverlap {
    pub fn hand(&self) -> Entity {
        match self {
            GrabOverlap::Entered { hand, .. } | GrabOverlap::Exited { hand, .. } => *hand,
        }
    }

    pub fn to_overlap_event(&self) -> OverlapEvent<Entity> {
        match self {
            GrabOverlap::Entered { grabbable, .. } => OverlapEvent::Begin(*grabbable),
            GrabOverlap::Exited { grabbable, .. } => OverlapEvent::End(*grabbable),
        }
    }
}

/// Отключить руку: отпустить held object и снять HandGrabber
#[derive(Event, Debug, Clone)]
pub struct DetachHandIntent {
    pub hand: Entity,
}

#[derive(Event, Debug, Clone)]
pub struct ObjectGrabbed {
    pub hand: Entity,
    pub object: Entity,
    pub grab_point: usize,
}

#[derive(Event, Debug, Clone)]
pub struct ObjectReleased {
    pub hand: Entity,
    pub object: Entity,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Объект отобрала другая рука (offhand grab)
#[derive(Event, Debug, Clone)]
pub struct ObjectForciblyReleased {
    pub object: Entity,
    pub previous_hand: Entity,
    pub new_hand: Entity,
}

#[derive(Event, Debug, Clone)]
pub struct SnapTurned {
    pub hand: Entity,
    pub rig: Option<Entity>,
    /// Радианы вокруг world up
    pub yaw: f32,
}

/// Счётчики исходящих событий за всё время жизни app
///
/// Events<T> живут два update'а, так что итоги прогона считаем здесь.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrabStats {
    pub grabs: usize,
    pub releases: usize,
    pub forced_releases: usize,
    pub snap_turns: usize,
}
