//! Coordinate space marker types.
//!
//! Zero-sized types used as type parameters so pixel-space geometry read
//! from annotations can never be written into a record without passing
//! through normalization.

use std::fmt;

/// Marker for absolute pixel coordinates, origin at the top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker for coordinates expressed as fractions of image width/height.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
