//! Collision Layers Constants
//!
//! Rapier collision groups: centralised constants для рук, grabbable объектов и игрока.
//!
//! ## Архитектура:
//! - **Memberships:** в каких группах объект
//! - **Filters:** с какими группами объект коллидирует
//!
//! ## Группы:
//! - GROUP_1: Hands (sensor grab volumes)
//! - GROUP_2: Grabbables
//! - GROUP_3: Player body
//! - GROUP_4: Environment
//!
//! Held object на время grab убирает `GROUP_PLAYER` из своих filters
//! (иначе рука толкает игрока его же предметом).

use bevy_rapier3d::prelude::{CollisionGroups, Group};

// ============================================================================
// Memberships
// ============================================================================

pub const GROUP_HANDS: Group = Group::GROUP_1;

pub const GROUP_GRABBABLES: Group = Group::GROUP_2;

pub const GROUP_PLAYER: Group = Group::GROUP_3;

pub const GROUP_ENVIRONMENT: Group = Group::GROUP_4;

// ============================================================================
// Filters
// ============================================================================

/// Grab volumes видят только grabbables
pub const FILTER_HANDS: Group = GROUP_GRABBABLES;

/// Grabbables: руки + игрок + окружение + друг друга
pub const FILTER_GRABBABLES: Group = GROUP_HANDS
    .union(GROUP_GRABBABLES)
    .union(GROUP_PLAYER)
    .union(GROUP_ENVIRONMENT);

/// Игрок: окружение + grabbables (руки: sensors, не толкают)
pub const FILTER_PLAYER: Group = GROUP_GRABBABLES.union(GROUP_ENVIRONMENT);

// ============================================================================
// Helper Functions
// ============================================================================

pub fn grab_volume_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_HANDS, FILTER_HANDS)
}

pub fn grabbable_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_GRABBABLES, FILTER_GRABBABLES)
}

pub fn player_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PLAYER, FILTER_PLAYER)
}

/// Получить название группы для debug логов
pub fn get_group_name(group: Group) -> &'static str {
    if group == GROUP_HANDS {
        "Hands"
    } else if group == GROUP_GRABBABLES {
        "Grabbables"
    } else if group == GROUP_PLAYER {
        "Player"
    } else if group == GROUP_ENVIRONMENT {
        "Environment"
    } else {
        "Unknown"
    }
}
