//! TFRecord container framing.
//!
//! Each record on disk is
//!
//! ```text
//! u64  length            (little endian)
//! u32  masked_crc32c(length bytes)
//! [u8] payload           (length bytes)
//! u32  masked_crc32c(payload)
//! ```
//!
//! The payload written by this crate is always a serialized `tf.Example`
//! (see [`example`]).

pub mod example;

pub use example::{
    encode_record, record_features, record_from_example, record_to_example, Example,
    FeatureValue,
};

use std::io::{self, Read, Write};

const MASK_DELTA: u32 = 0xa282_ead8;
const LENGTH_HEADER_LEN: usize = 8 + 4;
const FOOTER_LEN: usize = 4;

/// CRC32C with the rotation and offset TFRecord applies on top.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Writes framed records to an underlying byte sink.
#[derive(Debug)]
pub struct TfRecordWriter<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> TfRecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Frames and writes one payload.
    pub fn write_record(&mut self, payload: &[u8]) -> io::Result<()> {
        let length = (payload.len() as u64).to_le_bytes();
        self.inner.write_all(&length)?;
        self.inner.write_all(&masked_crc32c(&length).to_le_bytes())?;
        self.inner.write_all(payload)?;
        self.inner.write_all(&masked_crc32c(payload).to_le_bytes())?;
        self.bytes_written += (LENGTH_HEADER_LEN + payload.len() + FOOTER_LEN) as u64;
        Ok(())
    }

    /// Total bytes written so far, framing included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// A framing problem, with the byte offset of the record that caused it.
#[derive(Debug)]
pub struct FramingError {
    pub offset: u64,
    pub message: String,
}

/// Reads framed records, verifying both checksums.
///
/// Iterates over payloads. Iteration stops after the first error.
pub struct TfRecordReader<R: Read> {
    inner: R,
    offset: u64,
    failed: bool,
}

impl<R: Read> TfRecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            failed: false,
        }
    }

    /// Reads the next payload, or `Ok(None)` at a clean end of input.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>, FramingError> {
        let start = self.offset;
        let fail = |message: String| FramingError {
            offset: start,
            message,
        };

        let mut header = [0u8; LENGTH_HEADER_LEN];
        match read_full(&mut self.inner, &mut header) {
            Ok(0) => return Ok(None),
            Ok(n) if n < LENGTH_HEADER_LEN => {
                return Err(fail(format!("truncated length header ({n} bytes)")))
            }
            Ok(_) => {}
            Err(err) => return Err(fail(err.to_string())),
        }

        let (length_bytes, length_crc) = header.split_at(8);
        let expected = u32::from_le_bytes(length_crc.try_into().unwrap_or_default());
        if masked_crc32c(length_bytes) != expected {
            return Err(fail("length checksum mismatch".to_string()));
        }
        let length = u64::from_le_bytes(length_bytes.try_into().unwrap_or_default());

        // Read through `take` so a corrupt length cannot trigger a huge allocation.
        let mut payload = Vec::new();
        let got = (&mut self.inner)
            .take(length)
            .read_to_end(&mut payload)
            .map_err(|err| fail(err.to_string()))?;
        if (got as u64) < length {
            return Err(fail(format!(
                "truncated payload ({got} of {length} bytes)"
            )));
        }

        let mut footer = [0u8; FOOTER_LEN];
        match read_full(&mut self.inner, &mut footer) {
            Ok(FOOTER_LEN) => {}
            Ok(_) => return Err(fail("truncated payload checksum".to_string())),
            Err(err) => return Err(fail(err.to_string())),
        }
        if masked_crc32c(&payload) != u32::from_le_bytes(footer) {
            return Err(fail("payload checksum mismatch".to_string()));
        }

        self.offset += (LENGTH_HEADER_LEN + FOOTER_LEN) as u64 + length;
        Ok(Some(payload))
    }
}

impl<R: Read> Iterator for TfRecordReader<R> {
    type Item = Result<Vec<u8>, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_record() {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Like `read_exact`, but reports how many bytes were available at EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
