//! JSON level format
//!
//! # Document Layout
//! ```text
//! {
//!     "meta": <any>,
//!     "objects": { "<kind>": [<meta or null>, ...], ... },
//!     "layers": [
//!         { "type": <any>, "columns": 16, "tiles": "<base64 zlib>", "meta": <any> },
//!         ...
//!     ]
//! }
//! ```
//!
//! This is the only format that keeps nested metadata intact. JSON `null`
//! and a missing key both load as [`Value::Null`].

use crate::format::{LevelReader, LevelWriter, SaveOptions};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use ulevel_codec::decode_tiles;
use ulevel_core::{Level, LevelError, LevelObject, Result, TileLayer, Value};

/// On-disk document shape
#[derive(Debug, Serialize, Deserialize)]
struct JsonLevel {
    #[serde(default)]
    meta: Value,

    /// Object kind -> per-object metadata, in first-appearance order
    #[serde(default)]
    objects: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    layers: Vec<JsonLayer>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonLayer {
    #[serde(rename = "type", default)]
    kind: Value,

    #[serde(default = "default_columns")]
    columns: usize,

    #[serde(default)]
    tiles: Option<String>,

    #[serde(default)]
    meta: Value,
}

fn default_columns() -> usize {
    1
}

/// Loader and writer for JSON levels
#[derive(Debug, Clone, Default)]
pub struct JsonFormat {
    options: SaveOptions,
}

impl JsonFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SaveOptions) -> Self {
        Self { options }
    }

    fn to_document(&self, level: &Level) -> Result<JsonLevel> {
        let mut objects = serde_json::Map::new();
        for obj in &level.objects {
            let entry = objects
                .entry(obj.kind.to_string())
                .or_insert_with(|| serde_json::Value::Array(Vec::new()));
            if let serde_json::Value::Array(list) = entry {
                list.push(obj.meta.to_json());
            }
        }

        let layers = level
            .layers
            .iter()
            .map(|layer| {
                Ok(JsonLayer {
                    kind: layer.kind.clone(),
                    columns: layer.columns,
                    tiles: Some(self.options.encode_tiles(&layer.tiles)?),
                    meta: layer.meta.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(JsonLevel {
            meta: level.meta.clone(),
            objects,
            layers,
        })
    }
}

impl LevelReader for JsonFormat {
    fn load<R: Read>(&self, reader: R) -> Result<Level> {
        let doc: JsonLevel = serde_json::from_reader(reader).map_err(map_json_error)?;

        let mut level = Level::with_meta(doc.meta);

        for (kind, metas) in doc.objects {
            let metas: Vec<Value> = serde_json::from_value(metas).map_err(|e| {
                LevelError::MalformedDocument(format!("objects of kind {:?}: {}", kind, e))
            })?;
            for meta in metas {
                level.objects.push(LevelObject::new(kind.as_str(), meta));
            }
        }

        for (index, layer) in doc.layers.into_iter().enumerate() {
            let data = match layer.tiles {
                Some(data) if !data.is_empty() => data,
                _ => {
                    tracing::debug!("skipping json layer {} without tiles", index);
                    continue;
                }
            };

            let tiles = decode_tiles(&data, "base64", Some("zlib"))?;
            let tile_layer = TileLayer::new(layer.kind, layer.columns, tiles).with_meta(layer.meta);
            if !tile_layer.is_rectangular() {
                tracing::debug!(
                    "json layer {} has {} tiles, not a multiple of {} columns",
                    index,
                    tile_layer.tiles.len(),
                    tile_layer.columns
                );
            }
            level.layers.push(tile_layer);
        }

        tracing::debug!(
            "loaded json level: {} layers, {} objects",
            level.layers.len(),
            level.objects.len()
        );
        Ok(level)
    }
}

impl LevelWriter for JsonFormat {
    fn save<W: Write>(&self, level: &Level, writer: W) -> Result<()> {
        let doc = self.to_document(level)?;

        let written = if self.options.pretty {
            let indent = self.options.indent_string();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
            doc.serialize(&mut serializer)
        } else {
            serde_json::to_writer(writer, &doc)
        };
        written.map_err(map_json_error)?;

        tracing::debug!(
            "saved json level: {} layers, {} objects",
            level.layers.len(),
            level.objects.len()
        );
        Ok(())
    }
}

fn map_json_error(err: serde_json::Error) -> LevelError {
    if err.is_io() {
        LevelError::Io(err.into())
    } else {
        LevelError::MalformedDocument(err.to_string())
    }
}
