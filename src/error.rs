use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::ir::LandmarkKind;
use crate::validation::ValidationReport;

/// Broad classification of a failure.
///
/// `Io`, `Schema`, `Format` and `Geometry` cover everything that can go
/// wrong with a single annotation. `Config` is a bad invocation.
/// `Container` is a shard file that does not match its plan: corrupt on
/// read-back, or written with more or fewer records than planned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Io,
    Schema,
    Format,
    Geometry,
    Config,
    Container,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Io => "IOError",
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Format => "FormatError",
            ErrorKind::Geometry => "GeometryError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Container => "ContainerError",
        };
        f.write_str(name)
    }
}

/// The main error type for facerecords operations.
#[derive(Debug, Error)]
pub enum FacerecordsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list directory {path}: {message}")]
    ListDirectory { path: PathBuf, message: String },

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Image filename '{filename}' does not have a .jpg or .jpeg extension")]
    UnsupportedExtension { filename: String },

    #[error("Invalid declared size for '{filename}': {width}x{height}x{depth} (all must be positive)")]
    InvalidImageSize {
        filename: String,
        width: u32,
        height: u32,
        depth: u32,
    },

    #[error(
        "Dimension mismatch for '{filename}': annotation declares {declared_width}x{declared_height}, image is {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        filename: String,
        declared_width: u32,
        declared_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("{path} is not a JPEG image (detected: {detected})")]
    NotJpeg { path: PathBuf, detected: String },

    #[error("Failed to decode JPEG header of {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read JPEG frame header of {path}: {message}")]
    JpegHeader { path: PathBuf, message: String },

    #[error("{path} is not an RGB image (color type: {color})")]
    NotRgb { path: PathBuf, color: String },

    #[error(
        "Degenerate or inverted box for '{filename}': normalized xmin={xmin}, ymin={ymin}, xmax={xmax}, ymax={ymax}"
    )]
    DegenerateBox {
        filename: String,
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },

    #[error(
        "Box for '{filename}' leaves the image: normalized xmin={xmin}, ymin={ymin}, xmax={xmax}, ymax={ymax}"
    )]
    BoxOutOfBounds {
        filename: String,
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },

    #[error("Landmark {landmark} of '{filename}' lies outside the box: normalized x={x}, y={y}")]
    LandmarkOutsideBox {
        filename: String,
        landmark: LandmarkKind,
        x: f64,
        y: f64,
    },

    #[error("Number of shards must be at least 1 (got {num_shards})")]
    InvalidShardCount { num_shards: usize },

    #[error("Output directory {output} overlaps input directory {input}")]
    OutputOverlapsInput { output: PathBuf, input: PathBuf },

    #[error("Shard writer received more records than planned ({planned})")]
    ShardOverflow { planned: usize },

    #[error("Shard writer finished after {written} record(s), expected {planned}")]
    ShardUnderflow { planned: usize, written: usize },

    #[error("Corrupt TFRecord file {path} at byte {offset}: {message}")]
    TfRecordParse {
        path: PathBuf,
        offset: u64,
        message: String,
    },

    #[error("Invalid record #{index} in {path}: {message}")]
    InvalidRecord {
        path: PathBuf,
        index: usize,
        message: String,
    },

    #[error("Annotation {path}: {source}")]
    Annotation {
        path: PathBuf,
        #[source]
        source: Box<FacerecordsError>,
    },

    #[error("Validation failed: {failed} of {total} annotation(s) rejected")]
    ValidationFailed {
        failed: usize,
        total: usize,
        report: ValidationReport,
    },
}

impl FacerecordsError {
    /// Classify this error, looking through the per-annotation wrapper.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FacerecordsError::Io(_)
            | FacerecordsError::ReadFile { .. }
            | FacerecordsError::WriteFile { .. }
            | FacerecordsError::ListDirectory { .. } => ErrorKind::Io,

            FacerecordsError::AnnotationParse { .. }
            | FacerecordsError::UnsupportedExtension { .. }
            | FacerecordsError::InvalidImageSize { .. }
            | FacerecordsError::DimensionMismatch { .. } => ErrorKind::Schema,

            FacerecordsError::NotJpeg { .. }
            | FacerecordsError::ImageDecode { .. }
            | FacerecordsError::JpegHeader { .. }
            | FacerecordsError::NotRgb { .. } => ErrorKind::Format,

            FacerecordsError::DegenerateBox { .. }
            | FacerecordsError::BoxOutOfBounds { .. }
            | FacerecordsError::LandmarkOutsideBox { .. } => ErrorKind::Geometry,

            FacerecordsError::InvalidShardCount { .. }
            | FacerecordsError::OutputOverlapsInput { .. }
            | FacerecordsError::ValidationFailed { .. } => ErrorKind::Config,

            FacerecordsError::ShardOverflow { .. }
            | FacerecordsError::ShardUnderflow { .. }
            | FacerecordsError::TfRecordParse { .. }
            | FacerecordsError::InvalidRecord { .. } => ErrorKind::Container,

            FacerecordsError::Annotation { source, .. } => source.kind(),
        }
    }

    /// Attach the annotation file that produced this error.
    pub fn in_annotation(self, path: impl Into<PathBuf>) -> Self {
        FacerecordsError::Annotation {
            path: path.into(),
            source: Box::new(self),
        }
    }
}
