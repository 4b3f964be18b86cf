//! Per-frame light-to-cluster assignment.
//!
//! Each frame runs as one pass over the light slice:
//! 1. Reset every cluster's light count
//! 2. Measure the frustum for the frame's projection
//! 3. For each light, bound its sphere in cluster coordinates and append its
//!    index to every cluster in the bounds that still has room
//! 4. Publish the storage
//!
//! Nothing is reported as an error. A light outside the frustum, or a
//! light/cluster pair that does not fit, is simply left out of the lists.

use glam::{Mat4, Vec4};

use crate::cluster::bounds::{Axis, AxisRange, ClusterBounds};
use crate::cluster::frustum::FrustumMetrics;
use crate::cluster::grid::ClusterGrid;
use crate::cluster::storage::{ClusterSink, ClusterStorage, DiscardSink};
use crate::error::ClusterResult;
use crate::scene::{Perspective, PointLight};
use crate::ClusterConfig;

/// Summary of one assignment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Lights submitted
    pub lights: usize,
    /// Lights that touched no cluster
    pub culled: usize,
    /// Light indices written
    pub assignments: usize,
    /// Light/cluster pairs skipped because a cluster was full
    pub dropped: usize,
}

impl FrameStats {
    pub fn visible(&self) -> usize {
        self.lights - self.culled
    }
}

/// Builds per-cluster light lists into a [`ClusterStorage`].
///
/// Light indices are stored as `f32`, so they are exact up to 2^24.
#[derive(Debug)]
pub struct ClusterAssigner {
    config: ClusterConfig,
    grid: ClusterGrid,
    storage: ClusterStorage,
    overflow_reported: bool,
}

impl ClusterAssigner {
    /// Create an assigner whose published frames are discarded.
    pub fn new(config: ClusterConfig) -> ClusterResult<Self> {
        Self::with_sink(config, Box::new(DiscardSink))
    }

    /// Create an assigner publishing every frame to `sink`.
    pub fn with_sink(config: ClusterConfig, sink: Box<dyn ClusterSink>) -> ClusterResult<Self> {
        config.validate()?;
        let grid = ClusterGrid::new(config.x_slices, config.y_slices, config.z_slices)?;
        let storage = ClusterStorage::new(&grid, config.max_lights_per_cluster, sink)?;

        log::debug!(
            "Cluster grid {}x{}x{} ({} clusters, up to {} lights each)",
            grid.x_slices(),
            grid.y_slices(),
            grid.z_slices(),
            grid.num_clusters(),
            config.max_lights_per_cluster
        );

        Ok(Self {
            config,
            grid,
            storage,
            overflow_reported: false,
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn grid(&self) -> &ClusterGrid {
        &self.grid
    }

    pub fn storage(&self) -> &ClusterStorage {
        &self.storage
    }

    /// Rebuild every cluster list for this frame and publish the result.
    ///
    /// `lights[i]` is written into cluster lists as index `i`.
    pub fn update_clusters(
        &mut self,
        projection: &Perspective,
        view: &Mat4,
        lights: &[PointLight],
    ) -> FrameStats {
        self.storage.reset();

        let metrics = FrustumMetrics::new(projection, &self.grid);
        let mut stats = FrameStats {
            lights: lights.len(),
            ..Default::default()
        };

        for (index, light) in lights.iter().enumerate() {
            let Some(bounds) = self.bounds_with(&metrics, view, light) else {
                log::trace!("Light {} touches no cluster", index);
                stats.culled += 1;
                continue;
            };
            self.scatter(index as u32, &bounds, &mut stats);
        }

        if stats.dropped > 0 && !self.overflow_reported {
            log::warn!(
                "Cluster capacity of {} lights exceeded, {} assignments dropped",
                self.storage.capacity(),
                stats.dropped
            );
            self.overflow_reported = true;
        }

        log::debug!(
            "Clustered {} of {} lights: {} assignments, {} dropped",
            stats.visible(),
            stats.lights,
            stats.assignments,
            stats.dropped
        );

        self.storage.publish();
        stats
    }

    /// Clusters `light` may touch under `projection` and `view`, or `None`
    /// when it touches none.
    pub fn light_bounds(
        &self,
        projection: &Perspective,
        view: &Mat4,
        light: &PointLight,
    ) -> Option<ClusterBounds> {
        let metrics = FrustumMetrics::new(projection, &self.grid);
        self.bounds_with(&metrics, view, light)
    }

    fn bounds_with(
        &self,
        metrics: &FrustumMetrics,
        view: &Mat4,
        light: &PointLight,
    ) -> Option<ClusterBounds> {
        if light.is_degenerate() {
            return None;
        }

        // World z is mirrored before the view transform so lights in front of
        // the eye come out with positive view depth.
        let world = light.position;
        let position = (*view * Vec4::new(world.x, world.y, -world.z, 1.0)).truncate();
        if !position.is_finite() {
            return None;
        }
        let radius = light.radius;

        let z = metrics.depth_range(position.z, radius);
        let x = AxisRange::full(self.grid.slices(Axis::X));
        let y = AxisRange::full(self.grid.slices(Axis::Y));
        if z.is_outside(self.grid.z_slices())
            || x.is_outside(self.grid.slices(Axis::X))
            || y.is_outside(self.grid.slices(Axis::Y))
        {
            return None;
        }

        let x = metrics.planes(Axis::X).refine(position, radius, x);
        let y = metrics.planes(Axis::Y).refine(position, radius, y);
        if x.is_empty() || y.is_empty() {
            return None;
        }

        Some(ClusterBounds { x, y, z })
    }

    fn scatter(&mut self, light: u32, bounds: &ClusterBounds, stats: &mut FrameStats) {
        let capacity = self.storage.capacity();

        for x in bounds.x.cells() {
            for y in bounds.y.cells() {
                for z in bounds.z.cells() {
                    let cluster = self.grid.index(x as u32, y as u32, z as u32);
                    let count_at = self.storage.address_of(cluster, 0);
                    let count = self.storage.read(count_at) as usize + 1;

                    if count > capacity {
                        // Only the rest of this depth run is skipped.
                        stats.dropped += (bounds.z.max - z + 1) as usize;
                        break;
                    }

                    let at = self.storage.slot_address(cluster, count);
                    self.storage.write(at, light as f32);
                    self.storage.write(count_at, count as f32);
                    stats.assignments += 1;
                }
            }
        }
    }
}
