//! JPEG header probing.
//!
//! Only the header is parsed: enough to learn the container format, the
//! color type and the pixel dimensions. Pixel data is never decoded.
//!
//! The `image` decoder reports the color type it will *output*, and it
//! converts CMYK and YCCK to RGB. The colorspace stored in the file is
//! read separately with `zune-jpeg`, the decoder `image` uses underneath.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder};
use zune_jpeg::zune_core::colorspace::ColorSpace;

use crate::error::FacerecordsError;

/// Facts read from an image header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
}

/// Confirms that `bytes` is an 8-bit RGB JPEG and returns its dimensions.
///
/// `path` is only used for error messages.
///
/// # Errors
/// [`FacerecordsError::NotJpeg`] if the header is not a JPEG header,
/// [`FacerecordsError::ImageDecode`] or [`FacerecordsError::JpegHeader`]
/// if the JPEG header is corrupt and [`FacerecordsError::NotRgb`] unless
/// the file holds three RGB or YCbCr components.
pub fn probe_jpeg(bytes: &[u8], path: &Path) -> Result<ImageHeader, FacerecordsError> {
    let detected = imagesize::image_type(bytes).map_err(|source| FacerecordsError::NotJpeg {
        path: path.to_path_buf(),
        detected: source.to_string(),
    })?;
    if !matches!(detected, imagesize::ImageType::Jpeg) {
        return Err(FacerecordsError::NotJpeg {
            path: path.to_path_buf(),
            detected: format!("{detected:?}"),
        });
    }

    let decoder =
        JpegDecoder::new(Cursor::new(bytes)).map_err(|source| FacerecordsError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;

    let stored = input_colorspace(bytes, path)?;
    if !matches!(stored, ColorSpace::RGB | ColorSpace::YCbCr) {
        return Err(FacerecordsError::NotRgb {
            path: path.to_path_buf(),
            color: format!("{stored:?}"),
        });
    }

    let color = decoder.color_type();
    if color != ColorType::Rgb8 {
        return Err(FacerecordsError::NotRgb {
            path: path.to_path_buf(),
            color: format!("{color:?}"),
        });
    }

    let (width, height) = decoder.dimensions();
    Ok(ImageHeader { width, height })
}

/// Colorspace of the components as stored in the file.
fn input_colorspace(bytes: &[u8], path: &Path) -> Result<ColorSpace, FacerecordsError> {
    let mut decoder = zune_jpeg::JpegDecoder::new(bytes);
    decoder
        .decode_headers()
        .map_err(|err| FacerecordsError::JpegHeader {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    decoder
        .get_input_colorspace()
        .ok_or_else(|| FacerecordsError::JpegHeader {
            path: path.to_path_buf(),
            message: "no frame header".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, RgbImage};

    fn encode_jpeg<I>(image: I) -> Vec<u8>
    where
        I: FnOnce(&mut Cursor<Vec<u8>>) -> image::ImageResult<()>,
    {
        let mut cursor = Cursor::new(Vec::new());
        image(&mut cursor).expect("encode jpeg");
        cursor.into_inner()
    }

    #[test]
    fn probe_reads_rgb_dimensions() {
        let bytes = encode_jpeg(|c| RgbImage::new(40, 30).write_to(c, ImageFormat::Jpeg));
        let header = probe_jpeg(&bytes, Path::new("rgb.jpg")).expect("probe rgb");
        assert_eq!(
            header,
            ImageHeader {
                width: 40,
                height: 30
            }
        );
    }

    #[test]
    fn probe_rejects_grayscale() {
        let bytes = encode_jpeg(|c| GrayImage::new(8, 8).write_to(c, ImageFormat::Jpeg));
        let err = probe_jpeg(&bytes, Path::new("gray.jpg")).unwrap_err();
        assert!(matches!(err, FacerecordsError::NotRgb { .. }), "{err}");
    }

    fn encode_four_channel(color: jpeg_encoder::ColorType) -> Vec<u8> {
        let pixels = vec![0x40u8; 16 * 16 * 4];
        let mut bytes = Vec::new();
        jpeg_encoder::Encoder::new(&mut bytes, 90)
            .encode(&pixels, 16, 16, color)
            .expect("encode four-channel jpeg");
        bytes
    }

    #[test]
    fn probe_rejects_cmyk() {
        let bytes = encode_four_channel(jpeg_encoder::ColorType::Cmyk);
        let err = probe_jpeg(&bytes, Path::new("cmyk.jpg")).unwrap_err();
        assert!(matches!(err, FacerecordsError::NotRgb { .. }), "{err}");
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
        assert!(err.to_string().contains("CMYK"), "{err}");
    }

    #[test]
    fn probe_rejects_ycck() {
        let bytes = encode_four_channel(jpeg_encoder::ColorType::Ycck);
        let err = probe_jpeg(&bytes, Path::new("ycck.jpg")).unwrap_err();
        assert!(matches!(err, FacerecordsError::NotRgb { .. }), "{err}");
    }

    #[test]
    fn probe_rejects_non_jpeg_bytes() {
        let err = probe_jpeg(b"GIF89a\x01\x00\x01\x00", Path::new("fake.jpg")).unwrap_err();
        assert!(matches!(err, FacerecordsError::NotJpeg { .. }), "{err}");

        let err = probe_jpeg(b"", Path::new("empty.jpg")).unwrap_err();
        assert!(matches!(err, FacerecordsError::NotJpeg { .. }), "{err}");
    }
}
