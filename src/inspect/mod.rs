//! Read-back and verification of a shard directory.
//!
//! Every shard file is read end to end: framing checksums are verified,
//! each payload is decoded as a `tf.Example` and turned back into a
//! [`Record`], which re-checks the geometric invariants.

mod report;

pub use report::{InspectReport, ShardStats};

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use prost::Message;
use walkdir::WalkDir;

use crate::error::FacerecordsError;
use crate::ir::Record;
use crate::tfrecord::{record_from_example, Example, TfRecordReader};

const SHARD_PREFIX: &str = "shard-";
const SHARD_EXTENSION: &str = "tfrecords";

/// Lists the shard files directly inside `dir`, ordered by shard index.
pub fn list_shard_files(dir: &Path) -> Result<Vec<PathBuf>, FacerecordsError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| FacerecordsError::ListDirectory {
            path: dir.to_path_buf(),
            message: source.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(index) = shard_index(entry.path()) {
            files.push((index, entry.into_path()));
        }
    }

    // Numeric, so shard-10000 comes after shard-9999.
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Index parsed from a `shard-NNNN.tfrecords` file name.
fn shard_index(path: &Path) -> Option<usize> {
    if path.extension().and_then(|e| e.to_str()) != Some(SHARD_EXTENSION) {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(SHARD_PREFIX)?
        .parse()
        .ok()
}

/// Reads every record of one shard file.
///
/// Calls `visit` for each record in file order and returns how many were
/// read. Stops at the first corrupt record.
pub fn read_shard<F>(path: &Path, mut visit: F) -> Result<usize, FacerecordsError>
where
    F: FnMut(Record),
{
    let file = File::open(path).map_err(|source| FacerecordsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut count = 0;
    for payload in TfRecordReader::new(BufReader::new(file)) {
        let payload = payload.map_err(|err| FacerecordsError::TfRecordParse {
            path: path.to_path_buf(),
            offset: err.offset,
            message: err.message,
        })?;

        let example =
            Example::decode(payload.as_slice()).map_err(|err| FacerecordsError::InvalidRecord {
                path: path.to_path_buf(),
                index: count,
                message: err.to_string(),
            })?;
        let record =
            record_from_example(&example).map_err(|message| FacerecordsError::InvalidRecord {
                path: path.to_path_buf(),
                index: count,
                message,
            })?;

        visit(record);
        count += 1;
    }

    Ok(count)
}

/// Collects every record of one shard file.
pub fn read_shard_records(path: &Path) -> Result<Vec<Record>, FacerecordsError> {
    let mut records = Vec::new();
    read_shard(path, |record| records.push(record))?;
    Ok(records)
}

/// Verifies every shard in `dir` and summarizes what it holds.
pub fn inspect_shards(dir: &Path) -> Result<InspectReport, FacerecordsError> {
    let mut report = InspectReport::new(dir);

    for path in list_shard_files(dir)? {
        let stats = inspect_shard(&path)?;
        tracing::debug!(shard = %stats.file_name, records = stats.records, "shard verified");
        report.shards.push(stats);
    }

    Ok(report)
}

/// Verifies one shard file and gathers its counts.
pub fn inspect_shard(path: &Path) -> Result<ShardStats, FacerecordsError> {
    let mut stats = ShardStats::new(path);
    stats.bytes = path
        .metadata()
        .map_err(|source| FacerecordsError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    read_shard(path, |record| stats.add(&record))?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBoxXYXY, Coord, Landmarks};
    use crate::shard::{ShardPlan, ShardWriter};
    use std::fs;

    fn record(tag: u8) -> Record {
        Record {
            image_bytes: vec![0xFF, 0xD8, tag],
            face_box: BBoxXYXY::from_xyxy(0.0, 0.25, 0.5, 1.0),
            landmarks: Landmarks::new([Coord::new(0.25, 0.5); 5]),
        }
    }

    #[test]
    fn inspects_written_shards() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut writer = ShardWriter::new(temp.path(), ShardPlan::new(5, 2).expect("plan"));
        for i in 0..5 {
            writer.write(&record(i)).expect("write");
        }
        writer.finish().expect("finish");
        fs::write(temp.path().join("README.txt"), "not a shard").expect("write");

        let report = inspect_shards(temp.path()).expect("inspect");
        assert_eq!(report.shards.len(), 2);
        assert_eq!(report.total_records(), 5);
        assert_eq!(report.shards[0].records, 3);
        assert_eq!(report.shards[1].records, 2);

        let first = read_shard_records(&temp.path().join("shard-0000.tfrecords")).expect("read");
        let tags: Vec<u8> = first.iter().map(|r| r.image_bytes[2]).collect();
        assert_eq!(tags, vec![0, 1, 2]);
    }

    #[test]
    fn reports_corrupt_shard() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut writer = ShardWriter::new(temp.path(), ShardPlan::new(1, 1).expect("plan"));
        writer.write(&record(0)).expect("write");
        writer.finish().expect("finish");

        let path = temp.path().join("shard-0000.tfrecords");
        let mut bytes = fs::read(&path).expect("read");
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        fs::write(&path, bytes).expect("rewrite");

        let err = inspect_shards(temp.path()).unwrap_err();
        assert!(matches!(err, FacerecordsError::TfRecordParse { .. }), "{err}");
        assert_eq!(err.kind(), crate::error::ErrorKind::Container);
    }

    #[test]
    fn shard_files_are_ordered_by_index() {
        let temp = tempfile::tempdir().expect("create temp dir");
        for name in [
            "shard-10000.tfrecords",
            "shard-2000.tfrecords",
            "shard-0003.tfrecords",
            "shard-notes.tfrecords",
            "shard-0001.txt",
        ] {
            fs::write(temp.path().join(name), b"").expect("write");
        }

        let names: Vec<String> = list_shard_files(temp.path())
            .expect("list")
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "shard-0003.tfrecords",
                "shard-2000.tfrecords",
                "shard-10000.tfrecords"
            ]
        );
    }

    #[test]
    fn missing_shard_is_a_read_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("shard-0000.tfrecords");

        let err = inspect_shard(&path).unwrap_err();
        match &err {
            FacerecordsError::ReadFile { path: failed, .. } => assert_eq!(failed, &path),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn shard_bytes_match_file_size() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut writer = ShardWriter::new(temp.path(), ShardPlan::new(2, 1).expect("plan"));
        writer.write(&record(0)).expect("write");
        writer.write(&record(1)).expect("write");
        let summaries = writer.finish().expect("finish");

        let stats = inspect_shard(&temp.path().join("shard-0000.tfrecords")).expect("inspect");
        assert_eq!(stats.records, 2);
        assert_eq!(stats.bytes, summaries[0].bytes);
    }
}
