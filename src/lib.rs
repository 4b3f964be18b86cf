//! Cluster Lighting - CPU light clustering for clustered forward rendering
//!
//! The view frustum is divided into a 3D grid of clusters. Each frame the
//! point lights are bounded against the grid and every cluster receives a
//! compact list of the lights that may reach it, packed four values per texel
//! so a shading pass can read it as a texture.
//!
//! # Features
//! - Uniform x/y/z frustum grid with configurable resolution
//! - Plane-distance refinement of each light's screen-space cluster range
//! - Fixed-capacity per-cluster lists with lossy overflow
//! - Pluggable publish target for handing the buffer to a renderer
//!
//! # Example
//!
//! ```
//! use cluster_lighting::{ClusterAssigner, ClusterConfig, Perspective, PointLight};
//! use glam::{Mat4, Vec3};
//!
//! let mut assigner = ClusterAssigner::new(ClusterConfig::default()).unwrap();
//! let projection = Perspective::new(60.0, 16.0 / 9.0, 0.1, 100.0);
//! let lights = [PointLight::new(Vec3::new(0.0, 0.0, -10.0), 2.0)];
//!
//! let stats = assigner.update_clusters(&projection, &Mat4::IDENTITY, &lights);
//! assert_eq!(stats.culled, 0);
//! ```

pub mod cluster;
pub mod error;
pub mod scene;

pub use cluster::{
    ClusterAssigner, ClusterBounds, ClusterGrid, ClusterSink, ClusterStorage, FrameStats,
    SnapshotSink,
};
pub use error::{ClusterError, ClusterResult};
pub use scene::{Camera, Perspective, PointLight};

/// Default number of light indices a cluster can hold
pub const MAX_LIGHTS_PER_CLUSTER: usize = 100;

/// Configuration for the cluster grid and its storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Slices across the screen width
    pub x_slices: u32,
    /// Slices across the screen height
    pub y_slices: u32,
    /// Slices between the near and far planes
    pub z_slices: u32,
    /// Light indices stored per cluster before further lights are dropped
    pub max_lights_per_cluster: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            x_slices: 15,
            y_slices: 15,
            z_slices: 15,
            max_lights_per_cluster: MAX_LIGHTS_PER_CLUSTER,
        }
    }
}

impl ClusterConfig {
    pub fn with_slices(mut self, x_slices: u32, y_slices: u32, z_slices: u32) -> Self {
        self.x_slices = x_slices;
        self.y_slices = y_slices;
        self.z_slices = z_slices;
        self
    }

    pub fn with_max_lights_per_cluster(mut self, max_lights_per_cluster: usize) -> Self {
        self.max_lights_per_cluster = max_lights_per_cluster;
        self
    }

    pub fn num_clusters(&self) -> usize {
        self.x_slices as usize * self.y_slices as usize * self.z_slices as usize
    }

    /// Check the grid and capacity are usable
    pub fn validate(&self) -> ClusterResult<()> {
        ClusterGrid::new(self.x_slices, self.y_slices, self.z_slices)?;
        if self.max_lights_per_cluster == 0 {
            return Err(ClusterError::ZeroCapacity);
        }
        Ok(())
    }
}
