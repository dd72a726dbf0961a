//! Typed geometry and data model.
//!
//! Pixel-space and normalized geometry share the same types, parameterized
//! by a marker ([`Pixel`] or [`Normalized`]), so the compiler keeps the two
//! coordinate systems apart. Conversion happens in exactly one place:
//! `to_normalized` on [`Coord`] and [`BBoxXYXY`].
//!
//! # Example
//!
//! ```
//! use facerecords::ir::{BBoxXYXY, Pixel};
//!
//! let px = BBoxXYXY::<Pixel>::from_xyxy(100.0, 50.0, 300.0, 250.0);
//! let norm = px.to_normalized(400.0, 500.0);
//! assert_eq!(norm.xmin(), 0.25);
//! assert_eq!(norm.ymax(), 0.5);
//! ```

mod bbox;
mod coord;
pub mod io_annotation_json;
mod model;
mod space;

// Re-export core types for convenient access
pub use bbox::BBoxXYXY;
pub use coord::Coord;
pub use model::{Annotation, ImageSize, LandmarkKind, Landmarks, Record, NUM_LANDMARKS};
pub use space::{Normalized, Pixel};
