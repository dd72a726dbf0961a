//! Summary of a finished conversion run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::shard::ShardSummary;

/// What a successful run wrote.
#[derive(Clone, Debug, Serialize)]
pub struct PipelineReport {
    /// Records written across all shards (equals the number of annotations).
    pub total_records: usize,
    /// Shard count the caller asked for.
    pub requested_shards: usize,
    /// Records per shard; only the last shard may hold fewer.
    pub capacity: usize,
    /// Seed used for the processing order, if any.
    pub seed: Option<u64>,
    /// Where the shards were written.
    pub output_dir: PathBuf,
    /// One entry per shard file, in index order.
    pub shards: Vec<ShardSummary>,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of images: {}", self.total_records)?;
        writeln!(f, "Number of images per shard: {}", self.capacity)?;
        writeln!(
            f,
            "Shards written: {} (requested {})",
            self.shards.len(),
            self.requested_shards
        )?;
        if let Some(seed) = self.seed {
            writeln!(f, "Seed: {}", seed)?;
        }

        for shard in &self.shards {
            writeln!(
                f,
                "  {}  {} record(s), {} bytes",
                shard.file_name, shard.records, shard.bytes
            )?;
        }

        writeln!(f, "Result is here: {}", self.output_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::CloseReason;

    #[test]
    fn display_lists_counts_and_location() {
        let report = PipelineReport {
            total_records: 3,
            requested_shards: 2,
            capacity: 2,
            seed: Some(7),
            output_dir: PathBuf::from("out"),
            shards: vec![
                ShardSummary {
                    index: 0,
                    file_name: "shard-0000.tfrecords".into(),
                    records: 2,
                    bytes: 100,
                    reason: CloseReason::Full,
                },
                ShardSummary {
                    index: 1,
                    file_name: "shard-0001.tfrecords".into(),
                    records: 1,
                    bytes: 50,
                    reason: CloseReason::Drained,
                },
            ],
        };

        let text = report.to_string();
        assert!(text.contains("Number of images: 3"));
        assert!(text.contains("Number of images per shard: 2"));
        assert!(text.contains("Shards written: 2 (requested 2)"));
        assert!(text.contains("shard-0001.tfrecords  1 record(s)"));
        assert!(text.contains("Result is here: out"));

        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["shards"][1]["reason"], "drained");
    }
}
