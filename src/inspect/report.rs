//! Inspection report types.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::ir::Record;

/// Summary of a verified shard directory.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    pub directory: PathBuf,
    pub shards: Vec<ShardStats>,
}

impl InspectReport {
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            shards: Vec::new(),
        }
    }

    pub fn total_records(&self) -> usize {
        self.shards.iter().map(|s| s.records).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.shards.iter().map(|s| s.bytes).sum()
    }
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shard directory: {}", self.directory.display())?;
        writeln!(
            f,
            "  {} shard(s), {} record(s), {} bytes",
            self.shards.len(),
            self.total_records(),
            self.total_bytes()
        )?;

        if self.shards.is_empty() {
            return Ok(());
        }

        writeln!(f)?;
        for shard in &self.shards {
            writeln!(f, "  {}", shard)?;
        }
        Ok(())
    }
}

/// Per-shard counts gathered while reading it back.
#[derive(Clone, Debug, Serialize)]
pub struct ShardStats {
    pub file_name: String,
    pub records: usize,
    pub bytes: u64,
    pub image_bytes: u64,
    /// Mean normalized box width, 0 for an empty shard.
    pub mean_box_width: f64,
    /// Mean normalized box height, 0 for an empty shard.
    pub mean_box_height: f64,
}

impl ShardStats {
    pub fn new(path: &Path) -> Self {
        Self {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            records: 0,
            bytes: 0,
            image_bytes: 0,
            mean_box_width: 0.0,
            mean_box_height: 0.0,
        }
    }

    /// Folds one record into the running counts.
    pub fn add(&mut self, record: &Record) {
        self.records += 1;
        self.image_bytes += record.image_bytes.len() as u64;

        // Running mean, so no per-shard buffer is needed.
        let n = self.records as f64;
        self.mean_box_width += (record.face_box.width() - self.mean_box_width) / n;
        self.mean_box_height += (record.face_box.height() - self.mean_box_height) / n;
    }
}

impl fmt::Display for ShardStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {} record(s), {} bytes, mean box {:.3}x{:.3}",
            self.file_name, self.records, self.bytes, self.mean_box_width, self.mean_box_height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBoxXYXY, Coord, Landmarks};

    #[test]
    fn running_mean_matches_plain_mean() {
        let mut stats = ShardStats::new(Path::new("dir/shard-0000.tfrecords"));
        for (w, h) in [(0.5, 0.25), (0.25, 0.75)] {
            stats.add(&Record {
                image_bytes: vec![1, 2, 3],
                face_box: BBoxXYXY::from_xyxy(0.0, 0.0, w, h),
                landmarks: Landmarks::new([Coord::new(0.0, 0.0); 5]),
            });
        }

        assert_eq!(stats.file_name, "shard-0000.tfrecords");
        assert_eq!(stats.records, 2);
        assert_eq!(stats.image_bytes, 6);
        assert!((stats.mean_box_width - 0.375).abs() < 1e-12);
        assert!((stats.mean_box_height - 0.5).abs() < 1e-12);
    }
}
