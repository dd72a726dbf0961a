//! Fuzz target for TFRecord framing and `tf.Example` decoding.
//!
//! Feeds arbitrary bytes to the shard reader and decodes every payload
//! that passes the CRC checks.

#![no_main]

use facerecords::tfrecord::example::{record_from_example, Example};
use facerecords::tfrecord::TfRecordReader;
use libfuzzer_sys::fuzz_target;
use prost::Message;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    // Bare payloads first, so the decoder is reached without valid CRCs.
    if let Ok(example) = Example::decode(data) {
        let _ = record_from_example(&example);
    }

    for payload in TfRecordReader::new(data).flatten() {
        if let Ok(example) = Example::decode(payload.as_slice()) {
            let _ = record_from_example(&example);
        }
    }
});
