//! Light types for the scene

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

/// Radius the demo scenes give every light.
pub const DEFAULT_LIGHT_RADIUS: f32 = 5.0;

/// Sphere-bounded point light.
///
/// The light's index in the frame's light slice is the value written into
/// cluster lists, so the slice order must match the shading stage's light table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World-space position
    pub position: Vec3,
    /// Influence radius
    pub radius: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 10.0,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }

    /// A light that can never touch a cluster: non-positive or NaN radius, or
    /// a non-finite position.
    pub fn is_degenerate(&self) -> bool {
        !(self.radius.is_finite() && self.radius > 0.0) || !self.position.is_finite()
    }

    /// Convert to GPU data format
    pub fn to_gpu_data(&self) -> GpuPointLight {
        GpuPointLight {
            position_radius: self.position.extend(self.radius),
        }
    }
}

/// GPU-friendly light record, one per entry of the light table
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    /// xyz = position, w = radius
    pub position_radius: Vec4,
}
