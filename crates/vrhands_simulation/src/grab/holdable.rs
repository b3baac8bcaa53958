//! Holdable capability: контракт объекта, который можно взять рукой
//!
//! Grab controller не знает, чем представлен объект (ECS component, scene node,
//! тестовая структура). Он видит только этот trait через `HoldableStore`.
//!
//! Holder reference меняют только grab controllers:
//! - `grab_begin`: объект взят (holder = controller id)
//! - `grab_end`: объект отпущен/брошен (holder = None, выходная velocity)
//! - `on_forcibly_released`: объект отобрала другая рука (вызывается после `grab_end`)

use std::collections::BTreeMap;
use std::fmt::Debug;

use bevy::prelude::*;

use crate::shared::{GrabPoint, Pose};

/// Id объекта сцены для grab core (Entity в ECS, u32 в тестах)
pub trait GrabKey: Copy + Ord + Debug {}

impl<T: Copy + Ord + Debug> GrabKey for T {}

/// Snap/offhand флаги объекта
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrabProfile {
    /// Held pose выравнивается по grip anchor (иначе сохраняется offset на момент grab)
    pub snap_position: bool,
    pub snap_orientation: bool,
    /// Доп. offset при snap (X зеркалится для левой руки)
    pub snap_offset: Option<Pose>,
    /// Можно отобрать у другой руки
    pub allow_offhand_grab: bool,
}

pub trait Holdable<K> {
    fn profile(&self) -> GrabProfile;

    /// Текущая world pose объекта
    fn pose(&self) -> Pose;

    /// Grab point boxes (локальные координаты объекта)
    fn grab_points(&self) -> &[GrabPoint];

    fn holder(&self) -> Option<K>;

    fn grab_begin(&mut self, holder: K, grab_point: usize);

    fn grab_end(&mut self, linear_velocity: Vec3, angular_velocity: Vec3);

    fn on_forcibly_released(&mut self) {}

    fn is_held(&self) -> bool {
        self.holder().is_some()
    }
}

/// Доступ к holdable объектам по id
pub trait HoldableStore<K> {
    type Item: Holdable<K>;

    fn holdable(&self, key: K) -> Option<&Self::Item>;

    fn holdable_mut(&mut self, key: K) -> Option<&mut Self::Item>;
}

impl<K: GrabKey, H: Holdable<K>> HoldableStore<K> for BTreeMap<K, H> {
    type Item = H;

    fn holdable(&self, key: K) -> Option<&H> {
        self.get(&key)
    }

    fn holdable_mut(&mut self, key: K) -> Option<&mut H> {
        self.get_mut(&key)
    }
}
