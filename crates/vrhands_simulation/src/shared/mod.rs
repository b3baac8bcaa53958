//! Shared math: Pose (rigid transform) и bounds для grab points

pub mod bounds;
pub mod pose;

pub use bounds::{GrabPoint, WorldBounds};
pub use pose::Pose;
