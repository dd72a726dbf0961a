//! Bounding box types in canonical XYXY format.

use serde::{Deserialize, Serialize};

use super::coord::Coord;
use super::{Normalized, Pixel};

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The constructor does NOT enforce min < max. Annotations are read as-is
/// and the validator decides whether the box is acceptable, so a malformed
/// box can be reported with its actual values.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// Width of the box. Negative if the box is inverted.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the box. Negative if the box is inverted.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns true if min < max on both axes, i.e. the box has positive area.
    #[inline]
    pub fn is_non_degenerate(&self) -> bool {
        self.min.x < self.max.x && self.min.y < self.max.y
    }

    /// Returns true if `point` lies inside the box, edges included.
    #[inline]
    pub fn contains(&self, point: &Coord<TSpace>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

// Custom serde implementation to avoid TSpace: Serialize/Deserialize bounds
impl<TSpace> Serialize for BBoxXYXY<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("BBoxXYXY", 4)?;
        state.serialize_field("xmin", &self.min.x)?;
        state.serialize_field("ymin", &self.min.y)?;
        state.serialize_field("xmax", &self.max.x)?;
        state.serialize_field("ymax", &self.max.y)?;
        state.end()
    }
}

impl<'de, TSpace> Deserialize<'de> for BBoxXYXY<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct BBoxData {
            xmin: f64,
            ymin: f64,
            xmax: f64,
            ymax: f64,
        }
        let data = BBoxData::deserialize(deserializer)?;
        Ok(BBoxXYXY::from_xyxy(
            data.xmin, data.ymin, data.xmax, data.ymax,
        ))
    }
}

impl BBoxXYXY<Pixel> {
    /// Converts pixel coordinates to normalized coordinates.
    ///
    /// # Arguments
    /// * `image_width` - The width of the image in pixels
    /// * `image_height` - The height of the image in pixels
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        BBoxXYXY::new(
            self.min.to_normalized(image_width, image_height),
            self.max.to_normalized(image_width, image_height),
        )
    }
}

impl BBoxXYXY<Normalized> {
    /// Returns true if every edge lies within `[0, 1]`.
    pub fn is_within_unit_square(&self) -> bool {
        let unit = BBoxXYXY::<Normalized>::from_xyxy(0.0, 0.0, 1.0, 1.0);
        unit.contains(&self.min) && unit.contains(&self.max)
    }
}
