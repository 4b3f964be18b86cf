//! Cluster grid dimensions and index flattening

use crate::cluster::bounds::Axis;
use crate::error::{ClusterError, ClusterResult};

/// Uniform x/y/z subdivision of the view frustum.
///
/// Dimensions are fixed at construction. Cluster `(x, y, z)` flattens to
/// `x + y * x_slices + z * x_slices * y_slices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterGrid {
    x_slices: u32,
    y_slices: u32,
    z_slices: u32,
}

impl ClusterGrid {
    pub fn new(x_slices: u32, y_slices: u32, z_slices: u32) -> ClusterResult<Self> {
        for (axis, slices) in [('x', x_slices), ('y', y_slices), ('z', z_slices)] {
            if slices == 0 {
                return Err(ClusterError::ZeroSlices { axis });
            }
        }

        // Coordinates are carried as i32 while bounds are refined.
        let total = x_slices as u64 * y_slices as u64 * z_slices as u64;
        if total > i32::MAX as u64 {
            return Err(ClusterError::TooManyClusters {
                x: x_slices,
                y: y_slices,
                z: z_slices,
            });
        }

        Ok(Self {
            x_slices,
            y_slices,
            z_slices,
        })
    }

    pub fn x_slices(&self) -> u32 {
        self.x_slices
    }

    pub fn y_slices(&self) -> u32 {
        self.y_slices
    }

    pub fn z_slices(&self) -> u32 {
        self.z_slices
    }

    /// Slice count along one of the refined screen axes
    pub fn slices(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.x_slices,
            Axis::Y => self.y_slices,
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.x_slices as usize * self.y_slices as usize * self.z_slices as usize
    }

    /// Flattened index of cluster `(x, y, z)`
    #[inline]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(x < self.x_slices && y < self.y_slices && z < self.z_slices);
        let xs = self.x_slices as usize;
        let ys = self.y_slices as usize;
        x as usize + y as usize * xs + z as usize * xs * ys
    }

    /// Inverse of [`index`](Self::index)
    pub fn coords(&self, index: usize) -> (u32, u32, u32) {
        let xs = self.x_slices as usize;
        let ys = self.y_slices as usize;
        let x = index % xs;
        let y = (index / xs) % ys;
        let z = index / (xs * ys);
        (x as u32, y as u32, z as u32)
    }
}
