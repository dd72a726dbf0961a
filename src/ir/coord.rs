//! Typed 2D points.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::{Normalized, Pixel};

/// A 2D point with a type-level marker for the coordinate space.
///
/// On the wire a point is a two-element `[x, y]` array, which is how the
/// annotation files store landmarks.
#[derive(Clone, Copy, PartialEq)]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }
}

impl Coord<Pixel> {
    /// Divides x by the image width and y by the image height.
    #[inline]
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> Coord<Normalized> {
        Coord::new(self.x / image_width, self.y / image_height)
    }
}

impl<TSpace> std::fmt::Debug for Coord<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coord")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

// Custom serde implementation to avoid TSpace: Serialize/Deserialize bounds
impl<TSpace> Serialize for Coord<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y].serialize(serializer)
    }
}

impl<'de, TSpace> Deserialize<'de> for Coord<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Coord::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_reads_xy_pair() {
        let coord: Coord<Pixel> = serde_json::from_str("[150, 100.5]").expect("parse pair");
        assert_eq!(coord.x, 150.0);
        assert_eq!(coord.y, 100.5);

        assert!(serde_json::from_str::<Coord<Pixel>>("[1, 2, 3]").is_err());
        assert!(serde_json::from_str::<Coord<Pixel>>("{\"x\": 1, \"y\": 2}").is_err());
    }

    #[test]
    fn test_coord_to_normalized() {
        let coord: Coord<Pixel> = Coord::new(150.0, 100.0);
        let norm = coord.to_normalized(400.0, 500.0);
        assert_eq!(norm.x, 0.375);
        assert_eq!(norm.y, 0.2);
    }
}
