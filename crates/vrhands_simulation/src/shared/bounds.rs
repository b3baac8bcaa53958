//! Axis-aligned bounds для grab points
//!
//! Ранжирование кандидатов идёт по ближайшей точке на world-space AABB
//! коллайдера (как `ClosestPointOnBounds` у физ. движков).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::pose::Pose;

/// World-space AABB
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl WorldBounds {
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Ближайшая к `point` точка на (или внутри) bounds
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    pub fn distance_squared(&self, point: Vec3) -> f32 {
        (point - self.closest_point(point)).length_squared()
    }
}

/// Grab point: box коллайдер в локальных координатах grabbable
///
/// `center` и `half_extents` заданы относительно pose объекта.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrabPoint {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Default for GrabPoint {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(0.05),
        }
    }
}

impl GrabPoint {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self { center, half_extents }
    }

    /// Мировой AABB повёрнутого box (по 8 углам)
    pub fn world_bounds(&self, owner: &Pose) -> WorldBounds {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for corner in 0..8 {
            let sign = Vec3::new(
                if corner & 1 == 0 { -1.0 } else { 1.0 },
                if corner & 2 == 0 { -1.0 } else { 1.0 },
                if corner & 4 == 0 { -1.0 } else { 1.0 },
            );
            let world = owner.transform_point(self.center + self.half_extents * sign);
            min = min.min(world);
            max = max.max(world);
        }

        WorldBounds { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_closest_point_inside_is_point_itself() {
        let bounds = WorldBounds::from_center_half_extents(Vec3::ZERO, Vec3::ONE);

        assert_eq!(bounds.closest_point(Vec3::new(0.5, -0.5, 0.0)), Vec3::new(0.5, -0.5, 0.0));
        assert_eq!(bounds.distance_squared(Vec3::new(0.5, -0.5, 0.0)), 0.0);
    }

    #[test]
    fn test_distance_squared_outside() {
        let bounds = WorldBounds::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));

        // 2.0 по X от центра → 1.5 от грани
        let distance_sq = bounds.distance_squared(Vec3::new(2.0, 0.0, 0.0));
        assert!((distance_sq - 2.25).abs() < 1e-6, "distance_sq = {}", distance_sq);
    }

    #[test]
    fn test_rotated_grab_point_grows_aabb() {
        let point = GrabPoint::new(Vec3::ZERO, Vec3::new(1.0, 0.1, 1.0));
        let owner = Pose::new(Vec3::new(0.0, 2.0, 0.0), Quat::from_rotation_y(FRAC_PI_4));

        let bounds = point.world_bounds(&owner);

        // Диагональ квадрата 2x2 → полуширина sqrt(2)
        assert!((bounds.max.x - std::f32::consts::SQRT_2).abs() < 1e-4, "{:?}", bounds);
        assert!((bounds.min.y - 1.9).abs() < 1e-5);
    }
}
