//! Pure conversions between a [`Snapshot`] and bytes.

use std::io::{Read, Write};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use thiserror::Error;

use crate::Snapshot;

/// Failure while encoding, decoding or (de)compressing a snapshot.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The structural binary codec rejected the data.
    #[error("binary codec failed: {0}")]
    Binary(#[from] bincode::Error),
    /// The JSON codec rejected the data.
    #[error("JSON codec failed: {0}")]
    Json(#[from] serde_json::Error),
    /// The gzip stream could not be written or read.
    #[error("gzip stream failed: {0}")]
    Gzip(#[source] std::io::Error),
    /// Decompression was asked to read an empty buffer.
    #[error("compressed input is empty")]
    EmptyInput,
}

/// Encode a snapshot with `bincode`.
pub fn encode_binary(snapshot: &Snapshot) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(snapshot)?)
}

/// Decode a snapshot produced by [`encode_binary`].
pub fn decode_binary(bytes: &[u8]) -> Result<Snapshot, CodecError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Gzip `bytes` at the default compression level.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(CodecError::Gzip)?;
    encoder.finish().map_err(CodecError::Gzip)
}

/// Inflate a gzip stream produced by [`compress`].
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    let mut decoder = GzDecoder::new(bytes);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(CodecError::Gzip)?;
    Ok(inflated)
}

/// Encode a snapshot as a JSON document.
pub fn encode_json(snapshot: &Snapshot) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(snapshot)?)
}

/// Decode a snapshot from a JSON document.
pub fn decode_json(bytes: &[u8]) -> Result<Snapshot, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}
