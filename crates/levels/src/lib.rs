//! # ulevel Levels
//!
//! Loads and saves 2-D game levels in several interchange formats, all
//! sharing one canonical model ([`Level`], [`TileLayer`], [`LevelObject`]).
//!
//! ## Formats
//! - [`AsciiFormat`]: character grid with metadata lines (read/write)
//! - [`JsonFormat`]: JSON document (read/write)
//! - [`XmlFormat`]: native XML document (read/write)
//! - [`TmxFormat`]: Tiled TMX map (read only)
//!
//! Tile layers in the JSON and XML formats are stored as zlib-compressed,
//! base64-encoded 32-bit tile IDs; see [`encode_tiles`] and [`decode_tiles`].
//!
//! Callers own the streams. Every adapter reads from any [`std::io::Read`]
//! and writes to any [`std::io::Write`].

pub mod ascii;
pub mod format;
pub mod json;
pub mod tmx;
pub mod xml_native;
mod tree;

pub use ascii::AsciiFormat;
pub use format::{Format, LevelReader, LevelWriter, SaveOptions};
pub use json::JsonFormat;
pub use tmx::{localize_gids, TmxFormat};
pub use xml_native::XmlFormat;

pub use ulevel_codec::{decode_tiles, encode_tiles, CompressionType, Encoding};
pub use ulevel_core::{Level, LevelError, LevelObject, Result, TileLayer, Value, ValueMap};
