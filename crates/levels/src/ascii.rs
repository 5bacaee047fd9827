//! ASCII grid level format
//!
//! # File Format
//! ```text
//! My Level          <- metadata, one string per line
//! by someone
//!                   <- first blank line ends the metadata
//! ####  ####        <- tile grid, one byte per tile
//! #  @     $#
//! ##########
//! ```
//!
//! Every grid byte is a tile ID, except space which is the empty tile `0`.
//! Rows shorter than the longest one are padded with empty tiles.
//!
//! The format only carries string metadata and a single anonymous layer;
//! layer type, layer metadata and level objects are dropped on save.

use crate::format::{LevelReader, LevelWriter};
use std::io::{ErrorKind, Read, Write};
use ulevel_core::{Level, LevelError, Result, TileLayer, Value, EMPTY_TILE};

const EMPTY_CELL: u8 = b' ';

/// Loader and writer for ASCII grid levels
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiFormat;

impl AsciiFormat {
    pub fn new() -> Self {
        Self
    }

    /// Parse level text
    pub fn parse(data: &str) -> Level {
        let mut meta = Vec::new();
        let mut rows: Vec<&[u8]> = Vec::new();
        let mut in_grid = false;

        for line in data.lines() {
            if in_grid {
                rows.push(line.as_bytes());
            } else if line.is_empty() {
                in_grid = true;
            } else {
                meta.push(Value::from(line));
            }
        }

        let columns = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let mut tiles = Vec::with_capacity(columns * rows.len());
        for row in &rows {
            for i in 0..columns {
                tiles.push(match row.get(i) {
                    Some(&EMPTY_CELL) | None => EMPTY_TILE,
                    Some(&byte) => byte as u32,
                });
            }
        }

        Level {
            meta: Value::Array(meta),
            objects: Vec::new(),
            layers: vec![TileLayer::new(Value::Null, columns, tiles)],
        }
    }

    /// Render a level to bytes
    pub fn render(level: &Level) -> Result<Vec<u8>> {
        let mut out = Vec::new();

        for line in meta_lines(&level.meta) {
            if line.is_empty() || line.contains(['\n', '\r']) {
                return Err(LevelError::Encode(format!(
                    "metadata {:?} does not fit on one non-empty line",
                    line
                )));
            }
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        out.push(b'\n');

        if let Some(layer) = level.layers.first() {
            if layer.columns == 0 && !layer.tiles.is_empty() {
                return Err(LevelError::Encode("tile layer has zero columns".into()));
            }

            for (i, &tile) in layer.tiles.iter().enumerate() {
                if i > 0 && i % layer.columns == 0 {
                    out.push(b'\n');
                }
                out.push(tile_byte(tile)?);
            }
        }

        if let Err(e) = std::str::from_utf8(&out) {
            return Err(LevelError::Encode(format!(
                "tile grid is not valid UTF-8 text at byte {}",
                e.valid_up_to()
            )));
        }
        Ok(out)
    }
}

impl LevelReader for AsciiFormat {
    fn load<R: Read>(&self, mut reader: R) -> Result<Level> {
        let mut data = String::new();
        reader.read_to_string(&mut data).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => LevelError::MalformedDocument("level text is not UTF-8".into()),
            _ => LevelError::Io(e),
        })?;

        let level = Self::parse(&data);
        tracing::debug!(
            "loaded ascii level: {} columns, {} tiles",
            level.layers[0].columns,
            level.layers[0].tiles.len()
        );
        Ok(level)
    }
}

impl LevelWriter for AsciiFormat {
    fn save<W: Write>(&self, level: &Level, mut writer: W) -> Result<()> {
        if level.layers.len() > 1 || !level.objects.is_empty() {
            tracing::debug!(
                "ascii save drops {} extra layers and {} objects",
                level.layers.len().saturating_sub(1),
                level.objects.len()
            );
        }

        writer.write_all(&Self::render(level)?)?;
        Ok(())
    }
}

/// Metadata values as text lines
fn meta_lines(meta: &Value) -> Vec<String> {
    match meta {
        Value::Null => Vec::new(),
        Value::Array(values) => values.iter().map(Value::to_string).collect(),
        Value::Map(map) => map.values().map(Value::to_string).collect(),
        other => vec![other.to_string()],
    }
}

fn tile_byte(tile: u32) -> Result<u8> {
    if tile == EMPTY_TILE {
        return Ok(EMPTY_CELL);
    }
    u8::try_from(tile)
        .map_err(|_| LevelError::Encode(format!("tile ID {} does not fit in one character", tile)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> Vec<u32> {
        rows.iter()
            .flat_map(|row| row.bytes())
            .map(|b| if b == b' ' { 0 } else { b as u32 })
            .collect()
    }

    #[test]
    fn test_parse_level() {
        let data = "Castle\nby someone\n\n####\n#@\n#  #\n";

        let level = AsciiFormat.load(data.as_bytes()).unwrap();
        assert_eq!(
            level.meta,
            Value::Array(vec![Value::from("Castle"), Value::from("by someone")])
        );
        assert!(level.objects.is_empty());
        assert_eq!(level.layers.len(), 1);

        let layer = &level.layers[0];
        assert!(layer.kind.is_null());
        assert!(layer.meta.is_null());
        assert_eq!(layer.columns, 4);
        // Short row is padded with empty tiles
        assert_eq!(layer.tiles, grid(&["####", "#@  ", "#  #"]));
    }

    #[test]
    fn test_width_in_bytes() {
        let level = AsciiFormat::parse("\né\nab");
        let layer = &level.layers[0];
        assert_eq!(layer.columns, 2);
        assert_eq!(layer.tiles, vec![0xC3, 0xA9, b'a' as u32, b'b' as u32]);
    }

    #[test]
    fn test_crlf_lines() {
        let level = AsciiFormat::parse("title\r\n\r\nab\r\ncd\r\n");
        assert_eq!(level.meta, Value::Array(vec![Value::from("title")]));
        assert_eq!(level.layers[0].tiles, grid(&["ab", "cd"]));
    }

    #[test]
    fn test_render_layout() {
        let mut level = Level::with_meta(Value::Array(vec![Value::from("Title"), Value::Int(3)]));
        level
            .layers
            .push(TileLayer::new("ignored", 3, grid(&["#.#", " @ "])));

        let text = AsciiFormat::render(&level).unwrap();
        assert_eq!(text, b"Title\n3\n\n#.#\n @ ".to_vec());
    }

    #[test]
    fn test_roundtrip() {
        let rows = ["##########", "#  @   $ #", "#   ~~   #", "##########"];
        let mut level = Level::with_meta(Value::Array(vec![
            Value::from("Dungeon 1"),
            Value::Bool(true),
            Value::Float(1.5),
        ]));
        level.layers.push(TileLayer::new(Value::Null, 10, grid(&rows)));

        let mut out = Vec::new();
        AsciiFormat.save(&level, &mut out).unwrap();
        let loaded = AsciiFormat.load(out.as_slice()).unwrap();

        assert_eq!(loaded.layers, level.layers);
        // Order is kept, types are not
        assert_eq!(
            loaded.meta,
            Value::Array(vec![
                Value::from("Dungeon 1"),
                Value::from("true"),
                Value::from("1.5"),
            ])
        );
    }

    #[test]
    fn test_roundtrip_without_meta() {
        let mut level = Level::new();
        level.layers.push(TileLayer::new(Value::Null, 2, grid(&["ab", "  "])));

        let mut out = Vec::new();
        AsciiFormat.save(&level, &mut out).unwrap();
        let loaded = AsciiFormat.load(out.as_slice()).unwrap();

        assert_eq!(loaded.meta, Value::Array(Vec::new()));
        assert_eq!(loaded.layers[0].tiles, level.layers[0].tiles);
        assert_eq!(loaded.layers[0].columns, 2);
    }

    #[test]
    fn test_save_rejects_wide_tiles() {
        let mut level = Level::new();
        level.layers.push(TileLayer::new(Value::Null, 1, vec![300]));
        assert!(matches!(
            AsciiFormat::render(&level),
            Err(LevelError::Encode(_))
        ));

        let mut level = Level::new();
        level.layers.push(TileLayer::new(Value::Null, 0, vec![1]));
        assert!(matches!(
            AsciiFormat::render(&level),
            Err(LevelError::Encode(_))
        ));
    }

    #[test]
    fn test_save_rejects_multiline_meta() {
        for meta in [vec!["", "title"], vec!["two\nlines"], vec!["cr\r"]] {
            let mut level = Level::with_meta(Value::Array(
                meta.into_iter().map(Value::from).collect(),
            ));
            level.layers.push(TileLayer::new(Value::Null, 2, grid(&["ab"])));

            let mut out = Vec::new();
            assert!(matches!(
                AsciiFormat.save(&level, &mut out),
                Err(LevelError::Encode(_))
            ));
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_save_rejects_non_utf8_grid() {
        let mut level = Level::new();
        level.layers.push(TileLayer::new(Value::Null, 2, vec![0x80, b'a' as u32]));
        assert!(matches!(
            AsciiFormat::render(&level),
            Err(LevelError::Encode(_))
        ));

        // A complete multi-byte sequence is still text
        let mut level = Level::new();
        level.layers.push(TileLayer::new(Value::Null, 2, vec![0xC3, 0xA9]));
        let out = AsciiFormat::render(&level).unwrap();
        let loaded = AsciiFormat.load(out.as_slice()).unwrap();
        assert_eq!(loaded.layers[0].tiles, vec![0xC3, 0xA9]);
    }

    #[test]
    fn test_invalid_utf8() {
        let data: &[u8] = &[b'a', b'\n', b'\n', 0xFF, 0xFE];
        assert!(matches!(
            AsciiFormat.load(data),
            Err(LevelError::MalformedDocument(_))
        ));
    }
}
