//! Format adapter traits and runtime format selection

use crate::ascii::AsciiFormat;
use crate::json::JsonFormat;
use crate::tmx::TmxFormat;
use crate::xml_native::XmlFormat;
use flate2::Compression;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use ulevel_codec::encode_tiles_with;
use ulevel_core::{Level, LevelError, Result};

/// A format that can be loaded into a [`Level`]
pub trait LevelReader {
    /// Parse a whole level from the reader
    fn load<R: Read>(&self, reader: R) -> Result<Level>;
}

/// A format that can also be written
pub trait LevelWriter: LevelReader {
    /// Serialize the level into the writer
    fn save<W: Write>(&self, level: &Level, writer: W) -> Result<()>;
}

/// Output configuration shared by the writable formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// zlib level for tile payloads (0-9)
    pub compression_level: u32,

    /// Spaces per indent level (JSON/XML)
    pub indent: usize,

    /// Whether to indent output at all
    pub pretty: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
            indent: 4,
            pretty: true,
        }
    }
}

impl SaveOptions {
    /// Single-line output with default compression
    pub fn compact() -> Self {
        Self {
            pretty: false,
            ..Self::default()
        }
    }

    /// Set the zlib level, clamped to 9
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub(crate) fn indent_string(&self) -> String {
        " ".repeat(self.indent)
    }

    /// Encode a tile list with the configured compression level
    pub(crate) fn encode_tiles(&self, tiles: &[u32]) -> Result<String> {
        encode_tiles_with(tiles, Compression::new(self.compression_level.min(9)))
    }
}

/// Supported level formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Character grid with metadata lines
    Ascii,
    /// JSON document
    Json,
    /// Native XML document
    Xml,
    /// Tiled map (import only)
    Tmx,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Ascii, Format::Json, Format::Xml, Format::Tmx];

    pub fn name(&self) -> &'static str {
        match self {
            Format::Ascii => "ascii",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Tmx => "tmx",
        }
    }

    /// Whether `save` is available for this format
    pub fn is_writable(&self) -> bool {
        !matches!(self, Format::Tmx)
    }

    /// Load a level in this format with default settings
    pub fn load<R: Read>(&self, reader: R) -> Result<Level> {
        match self {
            Format::Ascii => AsciiFormat.load(reader),
            Format::Json => JsonFormat::default().load(reader),
            Format::Xml => XmlFormat::default().load(reader),
            Format::Tmx => TmxFormat.load(reader),
        }
    }

    /// Save a level in this format with default settings
    pub fn save<W: Write>(&self, level: &Level, writer: W) -> Result<()> {
        self.save_with(level, writer, &SaveOptions::default())
    }

    /// Save a level in this format
    pub fn save_with<W: Write>(&self, level: &Level, writer: W, options: &SaveOptions) -> Result<()> {
        match self {
            Format::Ascii => AsciiFormat.save(level, writer),
            Format::Json => JsonFormat::with_options(options.clone()).save(level, writer),
            Format::Xml => XmlFormat::with_options(options.clone()).save(level, writer),
            Format::Tmx => Err(LevelError::ReadOnlyFormat(self.name().to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self> {
        Format::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LevelError::MalformedDocument(format!("unknown level format: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulevel_core::{TileLayer, Value};

    #[test]
    fn test_format_names() {
        for format in Format::ALL {
            assert_eq!(format.name().parse::<Format>().unwrap(), format);
        }
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert!("yaml".parse::<Format>().is_err());
        assert_eq!(Format::Xml.to_string(), "xml");
    }

    #[test]
    fn test_tmx_is_read_only() {
        assert!(!Format::Tmx.is_writable());
        assert!(Format::Json.is_writable());

        let mut out = Vec::new();
        let result = Format::Tmx.save(&Level::new(), &mut out);
        assert!(matches!(result, Err(LevelError::ReadOnlyFormat(ref f)) if f == "tmx"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_dispatch_roundtrip() {
        let mut level = Level::new();
        level.layers.push(TileLayer::new(Value::Null, 2, vec![b'#' as u32, 0, 0, b'@' as u32]));

        for format in [Format::Ascii, Format::Json, Format::Xml] {
            let mut out = Vec::new();
            format.save(&level, &mut out).unwrap();
            let loaded = format.load(out.as_slice()).unwrap();
            assert_eq!(loaded.layers[0].tiles, level.layers[0].tiles, "{}", format);
            assert_eq!(loaded.layers[0].columns, 2, "{}", format);
        }
    }

    #[test]
    fn test_file_roundtrip() {
        let mut level = Level::with_meta(Value::from("saved to disk"));
        level.layers.push(TileLayer::new("ground", 3, vec![1, 2, 3, 4, 5, 6]));

        let file = tempfile::NamedTempFile::new().unwrap();
        Format::Json
            .save(&level, std::fs::File::create(file.path()).unwrap())
            .unwrap();

        let loaded = Format::Json
            .load(std::fs::File::open(file.path()).unwrap())
            .unwrap();
        assert_eq!(loaded, level);
    }

    #[test]
    fn test_save_options() {
        let options = SaveOptions::default().with_compression_level(42).with_indent(2);
        assert_eq!(options.compression_level, 9);
        assert_eq!(options.indent_string(), "  ");
        assert!(!SaveOptions::compact().pretty);
    }
}
