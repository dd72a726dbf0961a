//! Sharded output: capacity planning and the shard writer.
//!
//! Given `N` records and a requested shard count `S`, every shard holds
//! `ceil(N / S)` records except possibly the last, which holds the rest.
//! Records are assigned strictly in arrival order.

mod writer;

pub use writer::{CloseReason, ShardState, ShardSummary, ShardWriter};

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::FacerecordsError;

/// File name of the shard with the given index, e.g. `shard-0007.tfrecords`.
pub fn shard_file_name(index: usize) -> String {
    format!("shard-{index:04}.tfrecords")
}

/// Deletes `path` with everything under it, then creates it again empty.
///
/// **Destructive.** Any existing directory tree at `path` is removed in full,
/// whatever it contains. This is the idempotent reset used before every
/// conversion run, not an incremental update.
pub fn reset_output_directory(path: &Path) -> Result<(), FacerecordsError> {
    if path.exists() {
        tracing::info!(path = %path.display(), "removing existing output directory");
        fs::remove_dir_all(path).map_err(|source| FacerecordsError::WriteFile {
            path: path.to_path_buf(),
            source,
        })?;
    }

    fs::create_dir_all(path).map_err(|source| FacerecordsError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

/// How `total` records are split across shards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ShardPlan {
    /// Number of records that will be written.
    pub total: usize,
    /// Number of shards the caller asked for.
    pub requested_shards: usize,
    /// Records per shard: `ceil(total / requested_shards)`.
    pub capacity: usize,
}

impl ShardPlan {
    /// Plans `total` records over `num_shards` shards.
    ///
    /// # Errors
    /// [`FacerecordsError::InvalidShardCount`] if `num_shards` is zero.
    pub fn new(total: usize, num_shards: usize) -> Result<Self, FacerecordsError> {
        if num_shards == 0 {
            return Err(FacerecordsError::InvalidShardCount { num_shards });
        }

        Ok(Self {
            total,
            requested_shards: num_shards,
            capacity: total.div_ceil(num_shards),
        })
    }

    /// Number of shard files that will actually be written.
    ///
    /// Can be lower than `requested_shards`: 10 records over 6 shards gives
    /// capacity 2 and therefore only 5 files.
    pub fn shard_count(&self) -> usize {
        if self.capacity == 0 {
            0
        } else {
            self.total.div_ceil(self.capacity)
        }
    }

    /// Index of the shard that receives the record at `position` (0-based).
    pub fn shard_for(&self, position: usize) -> Option<usize> {
        (position < self.total).then(|| position / self.capacity)
    }

    /// Expected number of records in each shard, in index order.
    pub fn shard_sizes(&self) -> Vec<usize> {
        (0..self.shard_count())
            .map(|index| {
                let start = index * self.capacity;
                self.capacity.min(self.total - start)
            })
            .collect()
    }
}
