//! Native XML level format
//!
//! # Document Layout
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <level>
//!     <meta>
//!         <title>Forest</title>          <- one element per metadata key
//!     </meta>
//!     <objects>
//!         <object type="coin" meta="gold" />
//!     </objects>
//!     <layers>
//!         <layer columns="16" type="ground">eJxj...</layer>
//!     </layers>
//! </level>
//! ```
//!
//! XML only stores text, so every type and metadata value is written with
//! its `Display` form and loads back as [`Value::String`]. Absent values
//! are omitted on save.

use crate::format::{LevelReader, LevelWriter, SaveOptions};
use crate::tree::{self, Element};
use std::io::{Read, Write};
use ulevel_codec::decode_tiles;
use ulevel_core::{Level, LevelError, LevelObject, Result, TileLayer, Value, ValueMap};
use xml::common::XmlVersion;
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

/// Loader and writer for native XML levels
#[derive(Debug, Clone, Default)]
pub struct XmlFormat {
    options: SaveOptions,
}

impl XmlFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SaveOptions) -> Self {
        Self { options }
    }

    fn read_level(root: &Element) -> Result<Level> {
        if root.name != "level" {
            return Err(LevelError::MalformedDocument(format!(
                "expected <level> root, found <{}>",
                root.name
            )));
        }

        let mut meta = ValueMap::new();
        let mut level = Level::new();

        for child in &root.children {
            match child.name.as_str() {
                "meta" => {
                    for entry in &child.children {
                        meta.insert(entry.name.clone(), Value::String(entry.text.clone()));
                    }
                }
                "objects" => {
                    for obj in child.children_named("object") {
                        level
                            .objects
                            .push(LevelObject::new(obj.attr("type"), obj.attr("meta")));
                    }
                }
                "layers" => {
                    for layer in child.children_named("layer") {
                        level.layers.push(Self::read_layer(layer)?);
                    }
                }
                _ => {}
            }
        }

        level.meta = Value::Map(meta);
        Ok(level)
    }

    fn read_layer(layer: &Element) -> Result<TileLayer> {
        let columns = match layer.attr("columns") {
            None => 1,
            Some(text) => text.trim().parse::<usize>().map_err(|_| {
                LevelError::MalformedDocument(format!("invalid layer columns: {:?}", text))
            })?,
        };

        let tiles = decode_tiles(&layer.text, "base64", Some("zlib"))?;
        Ok(TileLayer::new(layer.attr("type"), columns, tiles).with_meta(layer.attr("meta")))
    }

    fn write_level<W: Write>(&self, level: &Level, writer: &mut EventWriter<W>) -> Result<()> {
        let meta = match &level.meta {
            Value::Null => None,
            Value::Map(map) => Some(map),
            _ => {
                return Err(LevelError::Encode(
                    "XML level metadata must be a key/value mapping".into(),
                ))
            }
        };

        emit(
            writer,
            XmlEvent::StartDocument {
                version: XmlVersion::Version10,
                encoding: Some("UTF-8"),
                standalone: None,
            },
        )?;
        emit(writer, XmlEvent::start_element("level"))?;

        emit(writer, XmlEvent::start_element("meta"))?;
        for (key, value) in meta.into_iter().flatten() {
            if !is_xml_name(key) {
                return Err(LevelError::Encode(format!(
                    "metadata key {:?} is not a valid XML element name",
                    key
                )));
            }
            emit(writer, XmlEvent::start_element(key.as_str()))?;
            if let Some(text) = attr_text(value) {
                emit(writer, XmlEvent::characters(&text))?;
            }
            emit(writer, XmlEvent::end_element())?;
        }
        emit(writer, XmlEvent::end_element())?;

        emit(writer, XmlEvent::start_element("objects"))?;
        for obj in &level.objects {
            let kind = attr_text(&obj.kind);
            let meta = attr_text(&obj.meta);
            let mut element = XmlEvent::start_element("object");
            if let Some(kind) = &kind {
                element = element.attr("type", kind);
            }
            if let Some(meta) = &meta {
                element = element.attr("meta", meta);
            }
            emit(writer, element)?;
            emit(writer, XmlEvent::end_element())?;
        }
        emit(writer, XmlEvent::end_element())?;

        emit(writer, XmlEvent::start_element("layers"))?;
        for layer in &level.layers {
            let columns = layer.columns.to_string();
            let kind = attr_text(&layer.kind);
            let meta = attr_text(&layer.meta);
            let tiles = self.options.encode_tiles(&layer.tiles)?;

            let mut element = XmlEvent::start_element("layer").attr("columns", &columns);
            if let Some(kind) = &kind {
                element = element.attr("type", kind);
            }
            if let Some(meta) = &meta {
                element = element.attr("meta", meta);
            }
            emit(writer, element)?;
            emit(writer, XmlEvent::characters(&tiles))?;
            emit(writer, XmlEvent::end_element())?;
        }
        emit(writer, XmlEvent::end_element())?;

        emit(writer, XmlEvent::end_element())
    }
}

impl LevelReader for XmlFormat {
    fn load<R: Read>(&self, reader: R) -> Result<Level> {
        let root = tree::parse(reader)?;
        let level = Self::read_level(&root)?;

        tracing::debug!(
            "loaded xml level: {} layers, {} objects",
            level.layers.len(),
            level.objects.len()
        );
        Ok(level)
    }
}

impl LevelWriter for XmlFormat {
    fn save<W: Write>(&self, level: &Level, writer: W) -> Result<()> {
        let mut writer = EmitterConfig::new()
            .perform_indent(self.options.pretty)
            .indent_string(self.options.indent_string())
            .create_writer(writer);

        self.write_level(level, &mut writer)?;
        writer.into_inner().flush()?;

        tracing::debug!(
            "saved xml level: {} layers, {} objects",
            level.layers.len(),
            level.objects.len()
        );
        Ok(())
    }
}

fn emit<'a, W: Write, E: Into<XmlEvent<'a>>>(writer: &mut EventWriter<W>, event: E) -> Result<()> {
    writer.write(event).map_err(|e| match e {
        xml::writer::Error::Io(io) => LevelError::Io(io),
        other => LevelError::Encode(other.to_string()),
    })
}

/// Text form of a value, `None` when absent
fn attr_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')) && !name.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_to_string(level: &Level) -> String {
        let mut out = Vec::new();
        XmlFormat::new().save(level, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_roundtrip_stringifies() {
        let mut meta = ValueMap::new();
        meta.insert("title".into(), Value::from("Forest"));
        meta.insert("lives".into(), Value::Int(3));
        meta.insert("night".into(), Value::Bool(true));

        let mut level = Level::with_meta(meta);
        level.objects = vec![
            LevelObject::new("coin", Value::Int(10)),
            LevelObject::new(Value::Null, Value::from("x=1")),
            LevelObject::new("door", Value::Null),
        ];
        level.layers = vec![
            TileLayer::new("ground", 2, vec![1, 2, 3, 400_000]),
            TileLayer::new(Value::Null, 3, vec![0, 0, 9]).with_meta(Value::Float(0.5)),
        ];

        let text = save_to_string(&level);
        let loaded = XmlFormat::new().load(text.as_bytes()).unwrap();

        let mut expected = ValueMap::new();
        expected.insert("title".into(), Value::from("Forest"));
        expected.insert("lives".into(), Value::from("3"));
        expected.insert("night".into(), Value::from("true"));
        assert_eq!(loaded.meta, Value::Map(expected));

        assert_eq!(
            loaded.objects,
            vec![
                LevelObject::new("coin", Value::from("10")),
                LevelObject::new(Value::Null, Value::from("x=1")),
                LevelObject::new("door", Value::Null),
            ]
        );

        assert_eq!(loaded.layers.len(), 2);
        assert_eq!(loaded.layers[0], TileLayer::new("ground", 2, vec![1, 2, 3, 400_000]));
        assert_eq!(
            loaded.layers[1],
            TileLayer::new(Value::Null, 3, vec![0, 0, 9]).with_meta(Value::from("0.5"))
        );
    }

    #[test]
    fn test_document_shape() {
        let mut level = Level::new();
        level.objects.push(LevelObject::new("coin", Value::Null));
        level.layers.push(TileLayer::new(Value::Null, 1, vec![1]));

        let text = save_to_string(&level);
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

        let root = tree::parse(text.as_bytes()).unwrap();
        assert_eq!(root.name, "level");
        let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["meta", "objects", "layers"]);

        let object = root.child("objects").and_then(|o| o.child("object")).unwrap();
        assert_eq!(object.attr("type"), Some("coin"));
        assert_eq!(object.attr("meta"), None);

        let layer = root.child("layers").and_then(|l| l.child("layer")).unwrap();
        assert_eq!(layer.attr("columns"), Some("1"));
        assert_eq!(layer.attr("type"), None);
    }

    #[test]
    fn test_roundtrip_whitespace_meta() {
        let mut meta = ValueMap::new();
        meta.insert("pad".into(), Value::from("   "));
        meta.insert("lead".into(), Value::from("  x "));
        let level = Level::with_meta(meta.clone());

        let loaded = XmlFormat::new().load(save_to_string(&level).as_bytes()).unwrap();
        assert_eq!(loaded.meta, Value::Map(meta));
    }

    #[test]
    fn test_empty_meta_entry() {
        let data = r#"<?xml version="1.0"?>
<level><meta><title>Cave</title><note/></meta></level>"#;

        let level = XmlFormat::new().load(data.as_bytes()).unwrap();
        assert_eq!(level.meta.get("title"), Some(&Value::from("Cave")));
        assert_eq!(level.meta.get("note"), Some(&Value::from("")));
        assert!(level.layers.is_empty());
    }

    #[test]
    fn test_columns_default_and_errors() {
        let tiles = ulevel_codec::encode_tiles(&[4, 5]).unwrap();

        let data = format!("<level><layers><layer>{}</layer></layers></level>", tiles);
        let level = XmlFormat::new().load(data.as_bytes()).unwrap();
        assert_eq!(level.layers[0].columns, 1);
        assert_eq!(level.layers[0].tiles, vec![4, 5]);

        let data = format!(
            "<level><layers><layer columns=\"wide\">{}</layer></layers></level>",
            tiles
        );
        assert!(matches!(
            XmlFormat::new().load(data.as_bytes()),
            Err(LevelError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_malformed() {
        for data in ["<level><meta></level>", "<map/>", "plain text"] {
            assert!(matches!(
                XmlFormat::new().load(data.as_bytes()),
                Err(LevelError::MalformedDocument(_))
            ));
        }
    }

    #[test]
    fn test_save_rejects_bad_meta() {
        let mut out = Vec::new();
        let level = Level::with_meta(Value::Int(5));
        assert!(matches!(
            XmlFormat::new().save(&level, &mut out),
            Err(LevelError::Encode(_))
        ));

        let mut meta = ValueMap::new();
        meta.insert("two words".into(), Value::Int(1));
        let level = Level::with_meta(meta);
        assert!(matches!(
            XmlFormat::new().save(&level, &mut Vec::new()),
            Err(LevelError::Encode(_))
        ));
    }
}
