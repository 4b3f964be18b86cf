//! Packed per-cluster light lists.
//!
//! The storage mirrors an RGBA32F texture: every cluster owns one row of
//! `groups_per_row` texels and every texel holds four scalar slots. Slot 0 of
//! a row is the cluster's light count, slots `1..=count` are light indices.
//!
//! ```text
//! row c: [count, l0, l1, l2] [l3, l4, l5, l6] ... [.., .., .., ..]
//!         group 0            group 1               group groups_per_row-1
//! ```
//!
//! Writes are unchecked beyond slice bounds; the assignment pass is
//! responsible for respecting the per-cluster capacity. Nothing is visible to
//! the consumer until [`ClusterStorage::publish`] hands the buffer to the
//! storage's [`ClusterSink`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cluster::grid::ClusterGrid;
use crate::error::{ClusterError, ClusterResult};

/// Scalar slots per texel
pub const SLOTS_PER_GROUP: usize = 4;

/// Borrowed view of a published cluster buffer
#[derive(Debug, Clone, Copy)]
pub struct ClusterUpload<'a> {
    /// Texels per row
    pub width: u32,
    /// Rows, one per cluster
    pub height: u32,
    /// Publish counter, starting at 1 for the first frame
    pub generation: u64,
    pub data: &'a [f32],
}

/// Receiver of published cluster buffers (a texture upload in a renderer).
pub trait ClusterSink: Send {
    fn upload(&mut self, upload: &ClusterUpload<'_>);
}

/// Sink that drops every upload.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl ClusterSink for DiscardSink {
    fn upload(&mut self, _upload: &ClusterUpload<'_>) {}
}

/// Owned copy of a published cluster buffer
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedClusters {
    pub width: u32,
    pub height: u32,
    pub generation: u64,
    pub data: Vec<f32>,
}

/// Sink keeping the most recent upload.
///
/// Clones share the same slot, so one handle can be given to the storage and
/// another kept by the consumer.
#[derive(Debug, Default, Clone)]
pub struct SnapshotSink {
    latest: Arc<Mutex<Option<PublishedClusters>>>,
}

impl SnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the last published frame, if any
    pub fn latest(&self) -> Option<PublishedClusters> {
        self.latest.lock().clone()
    }

    /// Take the last published frame, leaving the slot empty
    pub fn take(&self) -> Option<PublishedClusters> {
        self.latest.lock().take()
    }
}

impl ClusterSink for SnapshotSink {
    fn upload(&mut self, upload: &ClusterUpload<'_>) {
        let mut latest = self.latest.lock();
        match latest.as_mut() {
            // Reuse the allocation across frames.
            Some(frame) if frame.data.len() == upload.data.len() => {
                frame.width = upload.width;
                frame.height = upload.height;
                frame.generation = upload.generation;
                frame.data.copy_from_slice(upload.data);
            }
            _ => {
                *latest = Some(PublishedClusters {
                    width: upload.width,
                    height: upload.height,
                    generation: upload.generation,
                    data: upload.data.to_vec(),
                });
            }
        }
    }
}

/// Fixed-capacity table of per-cluster light lists.
pub struct ClusterStorage {
    buffer: Vec<f32>,
    num_clusters: usize,
    capacity: usize,
    groups_per_row: usize,
    generation: u64,
    sink: Box<dyn ClusterSink>,
}

impl ClusterStorage {
    /// Create storage for every cluster of `grid`, holding up to `capacity`
    /// light indices per cluster.
    pub fn new(
        grid: &ClusterGrid,
        capacity: usize,
        sink: Box<dyn ClusterSink>,
    ) -> ClusterResult<Self> {
        if capacity == 0 {
            return Err(ClusterError::ZeroCapacity);
        }

        let num_clusters = grid.num_clusters();
        let groups_per_row = (capacity + 1).div_ceil(SLOTS_PER_GROUP);

        Ok(Self {
            buffer: vec![0.0; num_clusters * groups_per_row * SLOTS_PER_GROUP],
            num_clusters,
            capacity,
            groups_per_row,
            generation: 0,
            sink,
        })
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// Maximum light indices per cluster
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn groups_per_row(&self) -> usize {
        self.groups_per_row
    }

    /// Number of publishes so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Texture size in RGBA texels: (width = groups per row, height = clusters)
    pub fn texel_dimensions(&self) -> (u32, u32) {
        (self.groups_per_row as u32, self.num_clusters as u32)
    }

    /// Zero the light count of every cluster.
    ///
    /// Index slots keep their stale values; readers only trust `1..=count`.
    pub fn reset(&mut self) {
        for cluster in 0..self.num_clusters {
            let at = self.address_of(cluster, 0);
            self.buffer[at] = 0.0;
        }
    }

    /// Offset of slot group `group` within the row of `cluster`
    #[inline]
    pub fn address_of(&self, cluster: usize, group: usize) -> usize {
        (cluster * self.groups_per_row + group) * SLOTS_PER_GROUP
    }

    /// Offset of scalar slot `slot` (0 = count) within the row of `cluster`
    #[inline]
    pub fn slot_address(&self, cluster: usize, slot: usize) -> usize {
        self.address_of(cluster, slot / SLOTS_PER_GROUP) + slot % SLOTS_PER_GROUP
    }

    #[inline]
    pub fn write(&mut self, offset: usize, value: f32) {
        self.buffer[offset] = value;
    }

    #[inline]
    pub fn read(&self, offset: usize) -> f32 {
        self.buffer[offset]
    }

    /// Stored light count of `cluster`
    pub fn light_count(&self, cluster: usize) -> usize {
        self.read(self.address_of(cluster, 0)) as usize
    }

    /// Light indices of `cluster`, in the order they were written
    pub fn light_indices(&self, cluster: usize) -> Vec<u32> {
        (1..=self.light_count(cluster))
            .map(|slot| self.read(self.slot_address(cluster, slot)) as u32)
            .collect()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buffer)
    }

    /// Hand the current contents to the sink. Call once per frame, after the
    /// last write.
    pub fn publish(&mut self) {
        self.generation += 1;
        let (width, height) = self.texel_dimensions();
        log::trace!(
            "Publishing cluster buffer #{} ({}x{} texels)",
            self.generation,
            width,
            height
        );
        self.sink.upload(&ClusterUpload {
            width,
            height,
            generation: self.generation,
            data: &self.buffer,
        });
    }
}

impl std::fmt::Debug for ClusterStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterStorage")
            .field("num_clusters", &self.num_clusters)
            .field("capacity", &self.capacity)
            .field("groups_per_row", &self.groups_per_row)
            .field("generation", &self.generation)
            .finish()
    }
}
