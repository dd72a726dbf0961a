//! Annotation and record types.
//!
//! An [`Annotation`] is the pixel-space description of one face image as it
//! is stored on disk. A [`Record`] is what survives validation: the raw JPEG
//! payload plus geometry normalized to `[0, 1]`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::bbox::BBoxXYXY;
use super::coord::Coord;
use super::space::{Normalized, Pixel};

/// Number of facial landmarks carried by every annotation.
pub const NUM_LANDMARKS: usize = 5;

/// One face annotation, exactly as read from its JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Image file name, relative to the image root directory.
    pub filename: String,

    /// Face bounding box in pixels.
    #[serde(rename = "box")]
    pub face_box: BBoxXYXY<Pixel>,

    /// Five facial keypoints in pixels.
    pub landmarks: Landmarks<Pixel>,

    /// Declared pixel dimensions of the image.
    pub size: ImageSize,
}

/// Declared image dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl ImageSize {
    /// Returns true if every dimension is positive.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0 && self.depth > 0
    }
}

/// The fixed semantic order of the five landmarks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    LeftEye,
    RightEye,
    Nose,
    LeftMouth,
    RightMouth,
}

impl LandmarkKind {
    /// All landmarks in storage order.
    pub const ALL: [LandmarkKind; NUM_LANDMARKS] = [
        LandmarkKind::LeftEye,
        LandmarkKind::RightEye,
        LandmarkKind::Nose,
        LandmarkKind::LeftMouth,
        LandmarkKind::RightMouth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkKind::LeftEye => "left_eye",
            LandmarkKind::RightEye => "right_eye",
            LandmarkKind::Nose => "nose",
            LandmarkKind::LeftMouth => "left_mouth",
            LandmarkKind::RightMouth => "right_mouth",
        }
    }
}

impl fmt::Display for LandmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly five landmarks, in [`LandmarkKind::ALL`] order.
///
/// The count is part of the type, so an annotation with four or six points
/// fails to parse instead of reaching the validator.
#[derive(Clone, Copy, PartialEq)]
pub struct Landmarks<TSpace> {
    pub points: [Coord<TSpace>; NUM_LANDMARKS],
}

impl<TSpace> Landmarks<TSpace> {
    pub fn new(points: [Coord<TSpace>; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Iterate over `(kind, point)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (LandmarkKind, &Coord<TSpace>)> {
        LandmarkKind::ALL.into_iter().zip(self.points.iter())
    }

    pub fn get(&self, kind: LandmarkKind) -> &Coord<TSpace> {
        &self.points[kind as usize]
    }
}

impl<TSpace> fmt::Debug for Landmarks<TSpace> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<TSpace> Serialize for Landmarks<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.points.serialize(serializer)
    }
}

impl<'de, TSpace> Deserialize<'de> for Landmarks<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = <[Coord<TSpace>; NUM_LANDMARKS]>::deserialize(deserializer)?;
        Ok(Landmarks::new(points))
    }
}

/// A validated, normalized training record.
///
/// Records come out of [`crate::validation::validate_and_normalize`] or
/// [`crate::tfrecord::record_from_example`], and both check the same
/// invariants: the box is non-degenerate and inside the unit square, and
/// every landmark lies inside the box.
#[derive(Clone, PartialEq)]
pub struct Record {
    /// The original encoded JPEG bytes, never re-encoded.
    pub image_bytes: Vec<u8>,

    /// Face box in normalized coordinates.
    pub face_box: BBoxXYXY<Normalized>,

    /// Landmarks in normalized coordinates.
    pub landmarks: Landmarks<Normalized>,
}

impl Record {
    pub fn xmin(&self) -> f64 {
        self.face_box.xmin()
    }

    pub fn xmax(&self) -> f64 {
        self.face_box.xmax()
    }

    pub fn ymin(&self) -> f64 {
        self.face_box.ymin()
    }

    pub fn ymax(&self) -> f64 {
        self.face_box.ymax()
    }

    /// The landmarks flattened as `[y0, x0, y1, x1, ...]`.
    ///
    /// Note the axis swap: annotations store `(x, y)` pairs, records emit
    /// `(y, x)` pairs.
    pub fn landmarks_normalized(&self) -> [f64; 2 * NUM_LANDMARKS] {
        let mut flat = [0.0; 2 * NUM_LANDMARKS];
        for (i, point) in self.landmarks.points.iter().enumerate() {
            flat[2 * i] = point.y;
            flat[2 * i + 1] = point.x;
        }
        flat
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("image_bytes", &format_args!("<{} bytes>", self.image_bytes.len()))
            .field("face_box", &self.face_box)
            .field("landmarks", &self.landmarks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmarks_flatten_swaps_axes() {
        let record = Record {
            image_bytes: vec![],
            face_box: BBoxXYXY::from_xyxy(0.0, 0.0, 1.0, 1.0),
            landmarks: Landmarks::new([
                Coord::new(0.1, 0.2),
                Coord::new(0.3, 0.4),
                Coord::new(0.5, 0.6),
                Coord::new(0.7, 0.8),
                Coord::new(0.9, 1.0),
            ]),
        };

        assert_eq!(
            record.landmarks_normalized(),
            [0.2, 0.1, 0.4, 0.3, 0.6, 0.5, 0.8, 0.7, 1.0, 0.9]
        );
    }

    #[test]
    fn test_landmark_lookup_by_kind() {
        let landmarks: Landmarks<Pixel> = Landmarks::new([
            Coord::new(1.0, 1.0),
            Coord::new(2.0, 2.0),
            Coord::new(3.0, 3.0),
            Coord::new(4.0, 4.0),
            Coord::new(5.0, 5.0),
        ]);
        assert_eq!(landmarks.get(LandmarkKind::Nose).x, 3.0);
        assert_eq!(landmarks.get(LandmarkKind::RightMouth).y, 5.0);
    }
}
