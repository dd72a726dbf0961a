#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Rgb, RgbImage};
use serde_json::json;

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Jpeg)
        .expect("encode rgb jpeg");
    cursor.into_inner()
}

pub fn gray_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    GrayImage::new(width, height)
        .write_to(&mut cursor, ImageFormat::Jpeg)
        .expect("encode gray jpeg");
    cursor.into_inner()
}

/// A four-channel CMYK JPEG. Decoders convert it to RGB on output.
pub fn cmyk_jpeg_bytes(width: u16, height: u16) -> Vec<u8> {
    let pixels = vec![0x20u8; usize::from(width) * usize::from(height) * 4];
    let mut bytes = Vec::new();
    jpeg_encoder::Encoder::new(&mut bytes, 90)
        .encode(&pixels, width, height, jpeg_encoder::ColorType::Cmyk)
        .expect("encode cmyk jpeg");
    bytes
}

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

/// A well-formed annotation for a `width` x `height` image with a centered face.
pub fn face_annotation(filename: &str, width: u32, height: u32) -> serde_json::Value {
    let (w, h) = (width as f64, height as f64);
    json!({
        "filename": filename,
        "box": {"xmin": w * 0.25, "ymin": h * 0.1, "xmax": w * 0.75, "ymax": h * 0.5},
        "landmarks": [
            [w * 0.375, h * 0.2],
            [w * 0.625, h * 0.2],
            [w * 0.5, h * 0.3],
            [w * 0.4, h * 0.4],
            [w * 0.6, h * 0.4]
        ],
        "size": {"width": width, "height": height, "depth": 3}
    })
}

/// Scratch layout: `images/`, `annotations/` and an `output` path.
pub struct Workspace {
    pub temp: tempfile::TempDir,
    pub images: PathBuf,
    pub annotations: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images = temp.path().join("images");
        let annotations = temp.path().join("annotations");
        fs::create_dir_all(&images).expect("create images dir");
        fs::create_dir_all(&annotations).expect("create annotations dir");
        let output = temp.path().join("shards");
        Self {
            temp,
            images,
            annotations,
            output,
        }
    }

    pub fn write_image(&self, filename: &str, bytes: &[u8]) {
        fs::write(self.images.join(filename), bytes).expect("write image");
    }

    pub fn write_annotation(&self, name: &str, annotation: &serde_json::Value) -> PathBuf {
        let path = self.annotations.join(name);
        fs::write(&path, serde_json::to_vec_pretty(annotation).expect("encode json"))
            .expect("write annotation");
        path
    }

    /// Adds `count` valid faces named `face_000.jpg`, `face_001.jpg`, ...
    pub fn add_faces(&self, count: usize) {
        for i in 0..count {
            let width = 40 + (i as u32 % 5) * 8;
            let height = 48 + (i as u32 % 3) * 8;
            let filename = format!("face_{i:03}.jpg");
            self.write_image(&filename, &jpeg_bytes(width, height));
            self.write_annotation(
                &format!("face_{i:03}.json"),
                &face_annotation(&filename, width, height),
            );
        }
    }

    pub fn shard_names(&self) -> Vec<String> {
        list_names(&self.output)
    }
}

pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
