//! Fuzz target for annotation JSON parsing and geometry normalization.
//!
//! Anything that parses is pushed through normalization too, so the
//! geometry checks see arbitrary (including NaN and huge) coordinates.

#![no_main]

use facerecords::ir::io_annotation_json::from_annotation_slice;
use facerecords::validation::normalize_geometry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(annotation) = from_annotation_slice(data) {
        let _ = normalize_geometry(&annotation);
    }
});
