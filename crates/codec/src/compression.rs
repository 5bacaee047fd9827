//! Compression layer for tile payloads

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{Read, Write};
use std::str::FromStr;
use ulevel_core::{LevelError, Result};

/// Compression method applied to packed tile bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    #[default]
    None,
    Zlib,
    Gzip,
}

impl CompressionType {
    /// Parse an optional compression token as found in level documents
    ///
    /// A missing token means no compression.
    pub fn from_token(token: Option<&str>) -> Result<Self> {
        match token {
            None => Ok(CompressionType::None),
            Some(token) => token.parse(),
        }
    }

    /// Token used for this method in level documents
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionType::None => "none",
            CompressionType::Zlib => "zlib",
            CompressionType::Gzip => "gzip",
        }
    }
}

impl FromStr for CompressionType {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "none" => Ok(CompressionType::None),
            "zlib" => Ok(CompressionType::Zlib),
            "gzip" => Ok(CompressionType::Gzip),
            other => Err(LevelError::UnsupportedCompression(other.to_string())),
        }
    }
}

/// Compress data using the specified method at the default level
pub fn compress(data: &[u8], method: CompressionType) -> Result<Vec<u8>> {
    compress_with_level(data, method, Compression::default())
}

/// Compress data using the specified method and level
pub fn compress_with_level(
    data: &[u8],
    method: CompressionType,
    level: Compression,
) -> Result<Vec<u8>> {
    match method {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), level);
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        CompressionType::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), level);
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
    }
}

/// Decompress data using the specified method
///
/// A corrupt stream is a payload error, not an I/O error.
pub fn decompress(data: &[u8], method: CompressionType) -> Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    let outcome = match method {
        CompressionType::None => return Ok(data.to_vec()),
        CompressionType::Zlib => ZlibDecoder::new(data).read_to_end(&mut decompressed),
        CompressionType::Gzip => GzDecoder::new(data).read_to_end(&mut decompressed),
    };
    outcome.map_err(|e| {
        LevelError::MalformedPayload(format!("{} decompression failed: {}", method.as_str(), e))
    })?;
    Ok(decompressed)
}
