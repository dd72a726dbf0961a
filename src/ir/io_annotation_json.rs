//! Reader for per-image annotation JSON files.
//!
//! Each file describes one image:
//!
//! ```json
//! {
//!   "filename": "132416.jpg",
//!   "box": {"xmin": 14, "ymin": 1, "xmax": 149, "ymax": 248},
//!   "landmarks": [[102, 98], [135, 109], [121, 132], [85, 134], [117, 144]],
//!   "size": {"width": 356, "height": 570, "depth": 3}
//! }
//! ```
//!
//! Landmarks are `[x, y]` pairs in the order left eye, right eye, nose,
//! left mouth corner, right mouth corner.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::model::Annotation;
use crate::error::FacerecordsError;

/// Reads one annotation from a JSON file.
///
/// # Errors
/// Returns [`FacerecordsError::ReadFile`] if the file cannot be opened and
/// [`FacerecordsError::AnnotationParse`] if it is not a well-formed annotation.
pub fn read_annotation(path: &Path) -> Result<Annotation, FacerecordsError> {
    let file = File::open(path).map_err(|source| FacerecordsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| FacerecordsError::AnnotationParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses an annotation from a JSON string.
pub fn from_annotation_str(json: &str) -> Result<Annotation, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses an annotation from raw bytes.
///
/// Useful for fuzzing without requiring UTF-8 upfront.
pub fn from_annotation_slice(bytes: &[u8]) -> Result<Annotation, serde_json::Error> {
    serde_json::from_slice(bytes)
}
