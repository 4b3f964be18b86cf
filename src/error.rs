//! Cluster error types

use thiserror::Error;

/// Errors raised while building a cluster grid or its storage.
///
/// The per-frame assignment pass never fails; only construction is validated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("Cluster grid needs at least one slice along {axis}")]
    ZeroSlices { axis: char },
    #[error("Per-cluster light capacity must be positive")]
    ZeroCapacity,
    #[error("Cluster grid {x}x{y}x{z} is too large to address")]
    TooManyClusters { x: u32, y: u32, z: u32 },
}

pub type ClusterResult<T> = Result<T, ClusterError>;
