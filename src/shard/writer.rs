//! The shard writer.
//!
//! Owns at most one open shard file at a time. A shard goes through
//! `Idle -> Open -> Closed(Full | Drained)` exactly once:
//!
//! - it is opened lazily when the first record destined for it arrives,
//! - it is closed as `Full` the moment it reaches capacity,
//! - the last shard is closed as `Drained` by [`ShardWriter::finish`].
//!
//! If the writer is dropped with a shard still open (an aborted run), the
//! open file is flushed and closed on drop.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use serde::Serialize;

use super::{shard_file_name, ShardPlan};
use crate::error::FacerecordsError;
use crate::ir::Record;
use crate::tfrecord::{encode_record, TfRecordWriter};

/// Why a shard was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The shard reached capacity.
    Full,
    /// Input ended before the shard reached capacity.
    Drained,
}

/// Lifecycle state of a single shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShardState {
    Idle,
    Open,
    Closed(CloseReason),
}

/// What ended up in one finished shard file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShardSummary {
    pub index: usize,
    pub file_name: String,
    pub records: usize,
    pub bytes: u64,
    pub reason: CloseReason,
}

struct OpenShard {
    index: usize,
    path: PathBuf,
    writer: TfRecordWriter<BufWriter<File>>,
    records: usize,
}

/// Writes records into shard files according to a [`ShardPlan`].
pub struct ShardWriter {
    output_dir: PathBuf,
    plan: ShardPlan,
    current: Option<OpenShard>,
    next_index: usize,
    written: usize,
    closed: Vec<ShardSummary>,
}

impl ShardWriter {
    /// Creates a writer. No file is created until the first record arrives.
    ///
    /// `output_dir` must already exist; see
    /// [`super::reset_output_directory`].
    pub fn new(output_dir: impl Into<PathBuf>, plan: ShardPlan) -> Self {
        Self {
            output_dir: output_dir.into(),
            plan,
            current: None,
            next_index: 0,
            written: 0,
            closed: Vec::new(),
        }
    }

    /// Current lifecycle state of shard `index`.
    pub fn shard_state(&self, index: usize) -> ShardState {
        if let Some(summary) = self.closed.iter().find(|s| s.index == index) {
            return ShardState::Closed(summary.reason);
        }
        match &self.current {
            Some(open) if open.index == index => ShardState::Open,
            _ => ShardState::Idle,
        }
    }

    /// Appends one record, returning the index of the shard it went to.
    ///
    /// # Errors
    /// [`FacerecordsError::ShardOverflow`] if the plan's total is already
    /// reached, or a write error from the shard file.
    pub fn write(&mut self, record: &Record) -> Result<usize, FacerecordsError> {
        if self.written >= self.plan.total {
            return Err(FacerecordsError::ShardOverflow {
                planned: self.plan.total,
            });
        }

        let capacity = self.plan.capacity;
        let shard = match self.current.take() {
            Some(shard) => shard,
            None => self.open_next()?,
        };
        let shard = self.current.insert(shard);

        let payload = encode_record(record);
        shard
            .writer
            .write_record(&payload)
            .map_err(|source| FacerecordsError::WriteFile {
                path: shard.path.clone(),
                source,
            })?;
        shard.records += 1;
        self.written += 1;

        let index = shard.index;
        tracing::debug!(shard = index, position = self.written - 1, "record written");

        if shard.records == capacity {
            self.close_current(CloseReason::Full)?;
        }

        Ok(index)
    }

    /// Closes the last open shard and returns a summary of every shard.
    ///
    /// # Errors
    /// [`FacerecordsError::ShardUnderflow`] if fewer records arrived than
    /// the plan promised. The open shard is still closed first.
    pub fn finish(mut self) -> Result<Vec<ShardSummary>, FacerecordsError> {
        if self.current.is_some() {
            self.close_current(CloseReason::Drained)?;
        }

        if self.written != self.plan.total {
            return Err(FacerecordsError::ShardUnderflow {
                planned: self.plan.total,
                written: self.written,
            });
        }

        Ok(std::mem::take(&mut self.closed))
    }

    fn open_next(&mut self) -> Result<OpenShard, FacerecordsError> {
        let index = self.next_index;
        let path = self.output_dir.join(shard_file_name(index));
        let file = File::create(&path).map_err(|source| FacerecordsError::WriteFile {
            path: path.clone(),
            source,
        })?;
        self.next_index += 1;

        tracing::debug!(shard = index, path = %path.display(), "shard opened");
        Ok(OpenShard {
            index,
            path,
            writer: TfRecordWriter::new(BufWriter::new(file)),
            records: 0,
        })
    }

    fn close_current(&mut self, reason: CloseReason) -> Result<(), FacerecordsError> {
        let Some(mut shard) = self.current.take() else {
            return Ok(());
        };

        shard
            .writer
            .flush()
            .map_err(|source| FacerecordsError::WriteFile {
                path: shard.path.clone(),
                source,
            })?;

        tracing::info!(
            shard = shard.index,
            records = shard.records,
            reason = ?reason,
            "shard finalized"
        );
        self.closed.push(ShardSummary {
            index: shard.index,
            file_name: shard_file_name(shard.index),
            records: shard.records,
            bytes: shard.writer.bytes_written(),
            reason,
        });
        Ok(())
    }
}

impl Drop for ShardWriter {
    fn drop(&mut self) {
        if let Some(mut shard) = self.current.take() {
            tracing::warn!(
                shard = shard.index,
                records = shard.records,
                "shard writer dropped with an open shard; output is incomplete"
            );
            if let Err(err) = shard.writer.flush() {
                tracing::warn!(path = %shard.path.display(), error = %err, "failed to flush shard");
            }
        }
    }
}
