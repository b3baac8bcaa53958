//! Grabber configuration: static per-instance settings + scene wiring
//!
//! - `GrabberSettings`: authoring-time параметры (thresholds, hand side, parenting).
//!   Можно читать из TOML, отсутствующие ключи берут defaults.
//! - `GrabberRig`: ссылки на объекты сцены (grip anchor, grab volumes, player).
//!   Инжектятся при создании контроллера вместо поиска по имени в сцене.
//!
//! Ошибки конфигурации ловим при создании контроллера (fail fast),
//! а не в момент grab.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::Pose;

/// Сторона руки (зеркалим snap offset по X для левой)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    #[default]
    Left,
    Right,
}

/// Ошибки конфигурации grabber'а
#[derive(Debug, Error)]
pub enum GrabConfigError {
    #[error("grip anchor is not configured")]
    MissingGripAnchor,

    #[error("no grab volumes configured")]
    NoGrabVolumes,

    #[error("invalid grip thresholds: grab_end ({end}) must be below grab_begin ({begin}), both within [0, 1]")]
    InvalidThresholds { begin: f32, end: f32 },

    #[error("invalid turn deadzone {0}: expected [0, 1)")]
    InvalidDeadzone(f32),

    #[error("invalid snap turn angle {0}: expected finite degrees within [-360, 360]")]
    InvalidSnapTurn(f32),

    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Authoring-time параметры grabber'а
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabberSettings {
    /// Grip выше этого значения (переход снизу) → grab
    pub grab_begin: f32,
    /// Grip ниже этого значения (переход сверху) → release
    pub grab_end: f32,
    pub hand: HandSide,
    /// true: held object становится child руки вместо kinematic move каждый tick
    pub parent_held_object: bool,
    /// Thumbstick X за пределами deadzone → snap turn
    pub turn_deadzone: f32,
    /// Угол snap turn (градусы)
    pub snap_turn_degrees: f32,
}

impl Default for GrabberSettings {
    fn default() -> Self {
        Self {
            grab_begin: 0.55,
            grab_end: 0.35,
            hand: HandSide::Left,
            parent_held_object: false,
            turn_deadzone: 0.4,
            snap_turn_degrees: 45.0,
        }
    }
}

impl GrabberSettings {
    pub fn for_hand(hand: HandSide) -> Self {
        Self { hand, ..Self::default() }
    }

    /// Проверка hysteresis band, deadzone и угла snap turn
    pub fn validate(&self) -> Result<(), GrabConfigError> {
        let band_ok = (0.0..=1.0).contains(&self.grab_end)
            && (0.0..=1.0).contains(&self.grab_begin)
            && self.grab_end < self.grab_begin;
        if !band_ok {
            return Err(GrabConfigError::InvalidThresholds {
                begin: self.grab_begin,
                end: self.grab_end,
            });
        }

        if !(0.0..1.0).contains(&self.turn_deadzone) {
            return Err(GrabConfigError::InvalidDeadzone(self.turn_deadzone));
        }

        // NaN/inf иначе попадает в Transform rig'а при первом snap turn
        if !(-360.0..=360.0).contains(&self.snap_turn_degrees) {
            return Err(GrabConfigError::InvalidSnapTurn(self.snap_turn_degrees));
        }

        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, GrabConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, GrabConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        crate::log_info(&format!("Grabber settings loaded from {}", path.display()));
        Ok(settings)
    }
}

/// Scene wiring одного grabber'а
///
/// `K`: id объекта сцены (Entity в ECS, u32 в тестах).
#[derive(Debug, Clone)]
pub struct GrabberRig<K> {
    /// Локальная поза grip anchor относительно руки (точка ранжирования и snap)
    pub grip_anchor: Option<Pose>,
    /// Sensor коллайдеры, через которые приходят overlap события
    pub grab_volumes: Vec<K>,
    /// Локальная поза руки внутри tracking space (offset от controller pose)
    pub anchor_offset: Pose,
    /// Тело игрока: held object не должен с ним коллайдить
    pub player_body: Option<K>,
    /// Корень rig'а игрока (цель snap turn)
    pub player_rig: Option<K>,
}

impl<K> Default for GrabberRig<K> {
    fn default() -> Self {
        Self {
            grip_anchor: None,
            grab_volumes: Vec::new(),
            anchor_offset: Pose::IDENTITY,
            player_body: None,
            player_rig: None,
        }
    }
}

impl<K> GrabberRig<K> {
    pub fn new(grip_anchor: Pose, grab_volumes: Vec<K>) -> Self {
        Self {
            grip_anchor: Some(grip_anchor),
            grab_volumes,
            ..Self::default()
        }
    }

    pub fn with_anchor_offset(mut self, anchor_offset: Pose) -> Self {
        self.anchor_offset = anchor_offset;
        self
    }

    pub fn with_player_body(mut self, player_body: K) -> Self {
        self.player_body = Some(player_body);
        self
    }

    pub fn with_player_rig(mut self, player_rig: K) -> Self {
        self.player_rig = Some(player_rig);
        self
    }

    /// Возвращает grip anchor или ошибку, если rig собран не полностью
    pub fn validate(&self) -> Result<Pose, GrabConfigError> {
        let grip_anchor = self.grip_anchor.ok_or(GrabConfigError::MissingGripAnchor)?;
        if self.grab_volumes.is_empty() {
            return Err(GrabConfigError::NoGrabVolumes);
        }
        Ok(grip_anchor)
    }
}
