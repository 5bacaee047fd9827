//! Tile stream encoding
//!
//! # Format
//! Each tile ID is packed as a 32-bit little-endian word:
//! ```text
//! [id & 0xFF] [(id >> 8) & 0xFF] [(id >> 16) & 0xFF] [(id >> 24) & 0xFF]
//! ```
//! The packed buffer is optionally compressed (zlib or gzip) and then base64
//! encoded. The `csv` encoding skips packing entirely and lists the IDs as
//! decimal integers separated by commas.

use crate::compression::{compress_with_level, decompress, CompressionType};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::Compression;
use std::str::FromStr;
use ulevel_core::{LevelError, Result};

/// Bytes per packed tile ID
const WORD_SIZE: usize = 4;

/// Text encoding of a tile stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Csv,
    Base64,
}

impl FromStr for Encoding {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(Encoding::Csv),
            "base64" => Ok(Encoding::Base64),
            other => Err(LevelError::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// Decode a tile stream described by string tokens
///
/// `compression` is only consulted for base64 data; csv data is never
/// compressed, so its compression token is ignored even when unknown.
pub fn decode_tiles(data: &str, encoding: &str, compression: Option<&str>) -> Result<Vec<u32>> {
    match encoding.parse::<Encoding>()? {
        Encoding::Csv => decode(data, Encoding::Csv, CompressionType::None),
        Encoding::Base64 => decode(
            data,
            Encoding::Base64,
            CompressionType::from_token(compression)?,
        ),
    }
}

/// Decode a tile stream into tile IDs
pub fn decode(data: &str, encoding: Encoding, compression: CompressionType) -> Result<Vec<u32>> {
    let tiles = match encoding {
        Encoding::Csv => decode_csv(data)?,
        Encoding::Base64 => {
            let packed: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            let raw = BASE64
                .decode(packed.as_bytes())
                .map_err(|e| LevelError::MalformedPayload(format!("base64 decode failed: {}", e)))?;
            let bytes = decompress(&raw, compression)?;
            unpack_words(&bytes)?
        }
    };

    tracing::trace!(
        "decoded {} tiles from {} chars ({:?}, {})",
        tiles.len(),
        data.len(),
        encoding,
        compression.as_str()
    );
    Ok(tiles)
}

/// Encode tile IDs as zlib-compressed base64 at the default level
pub fn encode_tiles(tiles: &[u32]) -> Result<String> {
    encode_tiles_with(tiles, Compression::default())
}

/// Encode tile IDs as zlib-compressed base64 at the given level
pub fn encode_tiles_with(tiles: &[u32], level: Compression) -> Result<String> {
    let packed = pack_words(tiles);
    let compressed = compress_with_level(&packed, CompressionType::Zlib, level)?;
    let text = BASE64.encode(compressed);

    tracing::trace!("encoded {} tiles into {} chars", tiles.len(), text.len());
    Ok(text)
}

fn decode_csv(data: &str) -> Result<Vec<u32>> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(Vec::new());
    }

    data.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<u32>()
                .map_err(|_| LevelError::MalformedPayload(format!("invalid tile ID: {:?}", token)))
        })
        .collect()
}

fn pack_words(tiles: &[u32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(tiles.len() * WORD_SIZE);
    for &tile in tiles {
        data.extend_from_slice(&tile.to_le_bytes());
    }
    data
}

fn unpack_words(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % WORD_SIZE != 0 {
        return Err(LevelError::MalformedPayload(format!(
            "tile data is {} bytes, not a multiple of {}",
            bytes.len(),
            WORD_SIZE
        )));
    }

    Ok(bytes
        .chunks_exact(WORD_SIZE)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect())
}
