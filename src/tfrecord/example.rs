//! `tf.Example` protobuf messages and the record <-> example mapping.
//!
//! Only the subset of `tensorflow/core/example/{example,feature}.proto`
//! this tool writes is declared here, with field numbers matching the
//! upstream schema so the output is readable by any TFRecord consumer.

use std::collections::BTreeMap;

use prost::Message;

use crate::ir::{BBoxXYXY, Coord, Landmarks, Record, NUM_LANDMARKS};

/// Feature key for the encoded JPEG.
pub const KEY_IMAGE: &str = "image";
pub const KEY_XMIN: &str = "xmin";
pub const KEY_XMAX: &str = "xmax";
pub const KEY_YMIN: &str = "ymin";
pub const KEY_YMAX: &str = "ymax";
/// Feature key for the ten `(y, x)`-ordered landmark floats.
pub const KEY_LANDMARKS: &str = "landmarks";

#[derive(Clone, PartialEq, Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Features {
    // BTreeMap keeps the encoded key order stable across runs.
    #[prost(btree_map = "string, message", tag = "1")]
    pub feature: BTreeMap<String, Feature>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

/// The kinds of value a record field can serialize to.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureValue {
    /// An opaque binary blob.
    Bytes(Vec<u8>),
    /// A single 32-bit float.
    Float(f32),
    /// A sequence of 32-bit floats.
    FloatList(Vec<f32>),
}

impl From<FeatureValue> for Feature {
    fn from(value: FeatureValue) -> Self {
        let kind = match value {
            FeatureValue::Bytes(bytes) => feature::Kind::BytesList(BytesList { value: vec![bytes] }),
            FeatureValue::Float(v) => feature::Kind::FloatList(FloatList { value: vec![v] }),
            FeatureValue::FloatList(values) => {
                feature::Kind::FloatList(FloatList { value: values })
            }
        };
        Feature { kind: Some(kind) }
    }
}

/// The named fields of a record, in a fixed order.
pub fn record_features(record: &Record) -> Vec<(&'static str, FeatureValue)> {
    let landmarks = record
        .landmarks_normalized()
        .iter()
        .map(|&v| v as f32)
        .collect();

    vec![
        (KEY_IMAGE, FeatureValue::Bytes(record.image_bytes.clone())),
        (KEY_XMIN, FeatureValue::Float(record.xmin() as f32)),
        (KEY_XMAX, FeatureValue::Float(record.xmax() as f32)),
        (KEY_YMIN, FeatureValue::Float(record.ymin() as f32)),
        (KEY_YMAX, FeatureValue::Float(record.ymax() as f32)),
        (KEY_LANDMARKS, FeatureValue::FloatList(landmarks)),
    ]
}

/// Builds the `tf.Example` for a record.
pub fn record_to_example(record: &Record) -> Example {
    let feature = record_features(record)
        .into_iter()
        .map(|(key, value)| (key.to_string(), Feature::from(value)))
        .collect();

    Example {
        features: Some(Features { feature }),
    }
}

/// Serializes a record to protobuf bytes, ready to be framed.
pub fn encode_record(record: &Record) -> Vec<u8> {
    record_to_example(record).encode_to_vec()
}

/// Rebuilds a record from a decoded example.
///
/// Values come back as 32-bit floats widened to `f64`. The geometric
/// invariants are re-checked, so a record read from disk is held to the
/// same rules as one built from an annotation.
///
/// Returns a description of the first problem found.
pub fn record_from_example(example: &Example) -> Result<Record, String> {
    let features = example
        .features
        .as_ref()
        .map(|f| &f.feature)
        .ok_or_else(|| "example has no features".to_string())?;

    let image_bytes = match features.get(KEY_IMAGE).and_then(|f| f.kind.as_ref()) {
        Some(feature::Kind::BytesList(list)) if list.value.len() == 1 => list.value[0].clone(),
        Some(_) => return Err(format!("feature '{KEY_IMAGE}' is not a single bytes value")),
        None => return Err(format!("missing feature '{KEY_IMAGE}'")),
    };

    let scalar = |key: &str| -> Result<f64, String> {
        match float_list(features, key)? {
            [v] => Ok(f64::from(*v)),
            other => Err(format!(
                "feature '{key}' has {} values, expected 1",
                other.len()
            )),
        }
    };
    let face_box = BBoxXYXY::from_xyxy(
        scalar(KEY_XMIN)?,
        scalar(KEY_YMIN)?,
        scalar(KEY_XMAX)?,
        scalar(KEY_YMAX)?,
    );

    let flat = float_list(features, KEY_LANDMARKS)?;
    if flat.len() != 2 * NUM_LANDMARKS {
        return Err(format!(
            "feature '{KEY_LANDMARKS}' has {} values, expected {}",
            flat.len(),
            2 * NUM_LANDMARKS
        ));
    }
    let points = std::array::from_fn(|i| {
        Coord::new(f64::from(flat[2 * i + 1]), f64::from(flat[2 * i]))
    });
    let landmarks = Landmarks::new(points);

    crate::validation::check_normalized_geometry("<record>", &face_box, &landmarks)
        .map_err(|err| err.to_string())?;

    Ok(Record {
        image_bytes,
        face_box,
        landmarks,
    })
}

fn float_list<'a>(features: &'a BTreeMap<String, Feature>, key: &str) -> Result<&'a [f32], String> {
    match features.get(key).and_then(|f| f.kind.as_ref()) {
        Some(feature::Kind::FloatList(list)) => Ok(&list.value),
        Some(_) => Err(format!("feature '{key}' is not a float list")),
        None => Err(format!("missing feature '{key}'")),
    }
}
