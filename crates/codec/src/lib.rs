//! ulevel codec - packed tile stream encoding
//!
//! Tile layers travel as strings: a list of 32-bit little-endian tile IDs,
//! optionally compressed, then either base64 encoded or written out as
//! comma-separated integers.
//!
//! ## Layers
//! - [`compression`]: raw byte compression (none, zlib, gzip)
//! - [`tiles`]: tile ID packing and the text encodings

pub mod compression;
pub mod tiles;

pub use compression::{compress, decompress, CompressionType};
pub use tiles::{decode, decode_tiles, encode_tiles, encode_tiles_with, Encoding};
