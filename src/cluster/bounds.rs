//! Per-light cluster bounds and plane-distance refinement.
//!
//! Along x and y, cluster boundary `i` is the plane through the eye that
//! contains the direction `(t, 0, 1)` (or `(0, t, 1)` for y), with
//! `t = -half_extent + i * slice_depth` measured at unit view depth. A light
//! is refined to the run of boundary planes its sphere crosses.

use glam::Vec3;

/// Screen axis refined by plane distance. Depth is bounded directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// Inclusive range of cluster coordinates along one axis.
///
/// Coordinates are signed so a range can sit partly or wholly outside the
/// grid before it is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Every slice of an axis with `slices` subdivisions
    pub const fn full(slices: u32) -> Self {
        Self::new(0, slices as i32 - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// True when no part of the range lands on the grid
    pub fn is_outside(&self, slices: u32) -> bool {
        self.min >= slices as i32 || self.max < 0
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max - self.min + 1) as usize
        }
    }

    pub fn cells(&self) -> std::ops::RangeInclusive<i32> {
        self.min..=self.max
    }
}

/// Clusters a single light may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterBounds {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

impl ClusterBounds {
    /// Number of clusters covered
    pub fn cluster_count(&self) -> usize {
        self.x.len() * self.y.len() * self.z.len()
    }
}

/// Signed distance from `point` to the boundary plane with slope `t` on `axis`.
///
/// Positive when the point lies on the side of increasing cluster index.
#[inline]
pub fn plane_distance(axis: Axis, point: Vec3, t: f32) -> f32 {
    let inv = 1.0 / (t * t + 1.0).sqrt();
    let normal = match axis {
        Axis::X => Vec3::new(inv, 0.0, -t * inv),
        Axis::Y => Vec3::new(0.0, inv, -t * inv),
    };
    point.dot(normal)
}

/// Boundary planes of one axis of the frustum grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicePlanes {
    pub axis: Axis,
    /// Half width (x) or half height (y) of the frustum at unit depth
    pub half_extent: f32,
    /// Width of one slice at unit depth
    pub slice_depth: f32,
}

impl SlicePlanes {
    /// Slope of boundary plane `index`
    #[inline]
    pub fn slope(&self, index: i32) -> f32 {
        -self.half_extent + index as f32 * self.slice_depth
    }

    #[inline]
    pub fn distance(&self, point: Vec3, index: i32) -> f32 {
        plane_distance(self.axis, point, self.slope(index))
    }

    fn crosses(&self, point: Vec3, radius: f32, index: i32) -> bool {
        self.distance(point, index).abs() < radius
    }

    /// First plane in `start..=max_inc` the sphere crosses, or one past the
    /// last plane searched.
    pub fn tune_plus(&self, point: Vec3, radius: f32, start: i32, max_inc: i32) -> i32 {
        let mut i = start;
        while i <= max_inc {
            if self.crosses(point, radius, i) {
                return i;
            }
            i += 1;
        }
        i
    }

    /// Last plane in `min_inc..=start` the sphere crosses, searching
    /// downwards, or one before the last plane searched.
    pub fn tune_minus(&self, point: Vec3, radius: f32, start: i32, min_inc: i32) -> i32 {
        let mut i = start;
        while i >= min_inc {
            if self.crosses(point, radius, i) {
                return i;
            }
            i -= 1;
        }
        i
    }

    /// Slice in `within` that holds a sphere crossing none of the searched
    /// planes: its center lies past the slice's lower plane and the sphere
    /// stays short of the upper plane's far side.
    pub fn locate_slab(&self, point: Vec3, radius: f32, within: AxisRange) -> Option<i32> {
        within.cells().find(|&k| {
            self.distance(point, k) >= 0.0 && self.distance(point, k + 1) < radius
        })
    }

    /// Tighten `permissive` to the planes the sphere crosses.
    ///
    /// A sphere that crosses none of them is either wholly inside one slice,
    /// which becomes the range, or outside the axis, which leaves it empty.
    pub fn refine(&self, point: Vec3, radius: f32, permissive: AxisRange) -> AxisRange {
        let min = self.tune_plus(point, radius, permissive.min, permissive.max);
        let max = self.tune_minus(point, radius, permissive.max, min);
        let refined = AxisRange::new(min, max);
        if !refined.is_empty() {
            return refined;
        }

        match self.locate_slab(point, radius, permissive) {
            Some(slice) => AxisRange::new(slice, slice),
            None => refined,
        }
    }
}
