//! Clustered light assignment
//!
//! The frustum is cut into a uniform x/y/z grid of clusters. Every frame the
//! [`ClusterAssigner`] works out which point lights can reach each cluster and
//! packs the answer into a [`ClusterStorage`] for the shading stage.

pub mod assign;
pub mod bounds;
pub mod frustum;
pub mod grid;
pub mod storage;

pub use assign::{ClusterAssigner, FrameStats};
pub use bounds::{plane_distance, Axis, AxisRange, ClusterBounds, SlicePlanes};
pub use frustum::FrustumMetrics;
pub use grid::ClusterGrid;
pub use storage::{
    ClusterSink, ClusterStorage, ClusterUpload, DiscardSink, PublishedClusters, SnapshotSink,
    SLOTS_PER_GROUP,
};
