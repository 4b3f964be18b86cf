//! Frustum measurements shared by every light in a frame

use crate::cluster::bounds::{Axis, AxisRange, SlicePlanes};
use crate::cluster::grid::ClusterGrid;
use crate::scene::Perspective;

/// Frustum extents at unit view depth and per-axis slice sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumMetrics {
    pub half_width: f32,
    pub half_height: f32,
    pub near: f32,
    /// far - near
    pub depth: f32,
    pub slice_x: f32,
    pub slice_y: f32,
    pub slice_z: f32,
    z_slices: u32,
}

impl FrustumMetrics {
    pub fn new(projection: &Perspective, grid: &ClusterGrid) -> Self {
        let half_height = (projection.fov_y_radians() * 0.5).tan();
        let half_width = (projection.aspect * half_height).abs();
        let depth = projection.depth();

        Self {
            half_width,
            half_height,
            near: projection.near,
            depth,
            slice_x: half_width * 2.0 / grid.x_slices() as f32,
            slice_y: half_height * 2.0 / grid.y_slices() as f32,
            slice_z: depth / grid.z_slices() as f32,
            z_slices: grid.z_slices(),
        }
    }

    pub fn half_extent(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.half_width,
            Axis::Y => self.half_height,
        }
    }

    pub fn slice_depth(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.slice_x,
            Axis::Y => self.slice_y,
        }
    }

    pub fn planes(&self, axis: Axis) -> SlicePlanes {
        SlicePlanes {
            axis,
            half_extent: self.half_extent(axis),
            slice_depth: self.slice_depth(axis),
        }
    }

    /// Depth slices a sphere at view depth `view_z` may touch, clamped to
    /// the grid. Lower ends past the far slice and upper ends before the
    /// first slice are left unclamped so the range reads as outside.
    pub fn depth_range(&self, view_z: f32, radius: f32) -> AxisRange {
        let center = view_z - self.near;
        let min = ((center - radius) / self.slice_z).floor() as i32;
        let max = ((center + radius) / self.slice_z).floor() as i32;
        AxisRange::new(min.max(0), max.min(self.z_slices as i32 - 1))
    }
}
