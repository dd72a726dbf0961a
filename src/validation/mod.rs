//! Annotation validation and normalization.
//!
//! [`validate_and_normalize`] turns one [`Annotation`] into a [`Record`] or
//! rejects it. Nothing is ever repaired: an annotation either satisfies
//! every check below or produces no record at all.
//!
//! 1. The image filename ends in `.jpg` or `.jpeg`.
//! 2. The image file can be read.
//! 3. The bytes are a JPEG with 8-bit RGB color.
//! 4. The JPEG dimensions equal the declared `size`.
//! 5. The normalized box is non-degenerate and inside `[0, 1]`.
//! 6. Every normalized landmark lies inside the box, edges included.

mod jpeg;
mod report;

pub use jpeg::{probe_jpeg, ImageHeader};
pub use report::{ValidationIssue, ValidationReport};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FacerecordsError;
use crate::ir::io_annotation_json::read_annotation;
use crate::ir::{Annotation, BBoxXYXY, Coord, Landmarks, Normalized, Record};

const JPEG_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// Validates one annotation against its image and builds the record.
///
/// Reads `image_root/annotation.filename` and nothing else. The same input
/// always yields the same record or the same error.
pub fn validate_and_normalize(
    annotation: &Annotation,
    image_root: &Path,
) -> Result<Record, FacerecordsError> {
    check_extension(&annotation.filename)?;

    let image_path = image_root.join(&annotation.filename);
    let image_bytes = fs::read(&image_path).map_err(|source| FacerecordsError::ReadFile {
        path: image_path.clone(),
        source,
    })?;

    let header = probe_jpeg(&image_bytes, &image_path)?;

    let size = annotation.size;
    if !size.is_positive() {
        return Err(FacerecordsError::InvalidImageSize {
            filename: annotation.filename.clone(),
            width: size.width,
            height: size.height,
            depth: size.depth,
        });
    }
    if header.width != size.width || header.height != size.height {
        return Err(FacerecordsError::DimensionMismatch {
            filename: annotation.filename.clone(),
            declared_width: size.width,
            declared_height: size.height,
            actual_width: header.width,
            actual_height: header.height,
        });
    }

    let (face_box, landmarks) = normalize_geometry(annotation)?;

    Ok(Record {
        image_bytes,
        face_box,
        landmarks,
    })
}

/// Normalizes box and landmarks by the declared image size and checks them.
///
/// This is the pure half of [`validate_and_normalize`]: no file is touched,
/// and the declared size is trusted. The checks run both in `f64` and at
/// the 32-bit precision the record is stored with.
pub fn normalize_geometry(
    annotation: &Annotation,
) -> Result<(BBoxXYXY<Normalized>, Landmarks<Normalized>), FacerecordsError> {
    let width = f64::from(annotation.size.width);
    let height = f64::from(annotation.size.height);

    let face_box = annotation.face_box.to_normalized(width, height);
    let landmarks = Landmarks::new(
        annotation
            .landmarks
            .points
            .map(|point| point.to_normalized(width, height)),
    );

    check_normalized_geometry(&annotation.filename, &face_box, &landmarks)?;

    // Records store f32. Geometry that only holds in f64 would be written
    // fine and then rejected when read back.
    let stored_box = BBoxXYXY::from_xyxy(
        stored_precision(face_box.xmin()),
        stored_precision(face_box.ymin()),
        stored_precision(face_box.xmax()),
        stored_precision(face_box.ymax()),
    );
    let stored_landmarks = Landmarks::new(
        landmarks
            .points
            .map(|p| Coord::new(stored_precision(p.x), stored_precision(p.y))),
    );
    check_normalized_geometry(&annotation.filename, &stored_box, &stored_landmarks)?;

    Ok((face_box, landmarks))
}

fn stored_precision(value: f64) -> f64 {
    f64::from(value as f32)
}

/// Checks the geometric invariants every record must satisfy.
///
/// `filename` is only used for error messages.
pub fn check_normalized_geometry(
    filename: &str,
    face_box: &BBoxXYXY<Normalized>,
    landmarks: &Landmarks<Normalized>,
) -> Result<(), FacerecordsError> {
    // NaN fails every comparison, so non-finite boxes land here too.
    if !face_box.is_non_degenerate() {
        return Err(FacerecordsError::DegenerateBox {
            filename: filename.to_string(),
            xmin: face_box.xmin(),
            ymin: face_box.ymin(),
            xmax: face_box.xmax(),
            ymax: face_box.ymax(),
        });
    }

    if !face_box.is_within_unit_square() {
        return Err(FacerecordsError::BoxOutOfBounds {
            filename: filename.to_string(),
            xmin: face_box.xmin(),
            ymin: face_box.ymin(),
            xmax: face_box.xmax(),
            ymax: face_box.ymax(),
        });
    }

    for (kind, point) in landmarks.iter() {
        if !face_box.contains(point) {
            return Err(FacerecordsError::LandmarkOutsideBox {
                filename: filename.to_string(),
                landmark: kind,
                x: point.x,
                y: point.y,
            });
        }
    }

    Ok(())
}

/// Validates every annotation file without stopping at the first failure.
///
/// Used by the `validate` command; the conversion pipeline itself is
/// fail-fast and does not go through here.
pub fn validate_annotations(annotation_paths: &[PathBuf], image_root: &Path) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.total = annotation_paths.len();

    for path in annotation_paths {
        let result = read_annotation(path)
            .and_then(|annotation| validate_and_normalize(&annotation, image_root));

        if let Err(err) = result {
            tracing::debug!(annotation = %path.display(), error = %err, "annotation rejected");
            report.add(ValidationIssue::from_error(path.clone(), &err));
        }
    }

    report
}

fn check_extension(filename: &str) -> Result<(), FacerecordsError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    if JPEG_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    {
        Ok(())
    } else {
        Err(FacerecordsError::UnsupportedExtension {
            filename: filename.to_string(),
        })
    }
}
