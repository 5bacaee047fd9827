//! Tiled TMX map import
//!
//! Reads the parts of a Tiled map that fit the generic level model:
//! map attributes and properties, plain tile layers, and object groups.
//! Group layers, image layers, infinite-map chunks and tile flip flags
//! are not supported. Saving TMX is not supported.
//!
//! # Tile IDs
//! Tiled numbers tiles globally across every tileset of a map (GIDs).
//! Each layer is assumed to draw from a single tileset, so its tiles are
//! shifted down by that tileset's `firstgid - 1`. The tileset is picked
//! from the highest GID in the layer; see [`localize_gids`].
//!
//! # Metadata
//! - Level: `orientation`, `renderorder`, `width`, `height`, `tilewidth`,
//!   `tileheight`, `backgroundcolor`, then map properties.
//! - Layers: `width`, `height`, `opacity`, `visible`, `offsetx`, `offsety`,
//!   then layer properties. The layer name becomes the layer kind.
//! - Objects: group `color`, `opacity`, `offsetx`, `offsety`, then object
//!   `x`, `y`, `width`, `height`, `rotation`, `gid`, `visible`, then object
//!   properties.
//!
//! Only attributes present in the source are captured, except object `x`
//! and `y` which default to `0`. A `gid` entry marks a tile object, whose
//! origin is bottom-center instead of top-left.

use crate::format::LevelReader;
use crate::tree::{self, Element};
use std::fmt::Display;
use std::io::Read;
use std::str::FromStr;
use ulevel_codec::{decode_tiles, Encoding};
use ulevel_core::{Level, LevelError, LevelObject, Result, TileLayer, Value, ValueMap};

/// Import-only loader for Tiled maps
#[derive(Debug, Clone, Copy, Default)]
pub struct TmxFormat;

impl TmxFormat {
    pub fn new() -> Self {
        Self
    }

    fn read_map(map: &Element) -> Result<Level> {
        if map.name != "map" {
            return Err(LevelError::MalformedDocument(format!(
                "expected <map> root, found <{}>",
                map.name
            )));
        }

        let map_width: Option<usize> = parse_attr(map, "width")?;

        let mut meta = ValueMap::new();
        insert_opt(&mut meta, "orientation", map.attr("orientation"));
        insert_opt(&mut meta, "renderorder", map.attr("renderorder"));
        insert_opt(&mut meta, "width", parse_attr::<i64>(map, "width")?);
        insert_opt(&mut meta, "height", parse_attr::<i64>(map, "height")?);
        insert_opt(&mut meta, "tilewidth", parse_attr::<i64>(map, "tilewidth")?);
        insert_opt(&mut meta, "tileheight", parse_attr::<i64>(map, "tileheight")?);
        insert_opt(&mut meta, "backgroundcolor", map.attr("backgroundcolor"));
        merge_properties(map, &mut meta)?;

        let firstgids = tileset_boundaries(map)?;

        let mut level = Level::with_meta(meta);
        for child in &map.children {
            match child.name.as_str() {
                "layer" => {
                    if let Some(layer) = read_layer(child, map_width, &firstgids)? {
                        level.layers.push(layer);
                    }
                }
                "objectgroup" => read_object_group(child, &mut level.objects)?,
                _ => {}
            }
        }

        Ok(level)
    }
}

impl LevelReader for TmxFormat {
    fn load<R: Read>(&self, reader: R) -> Result<Level> {
        let root = tree::parse(reader)?;
        let level = Self::read_map(&root)?;

        tracing::debug!(
            "loaded tmx map: {} layers, {} objects",
            level.layers.len(),
            level.objects.len()
        );
        Ok(level)
    }
}

/// Shift global tile IDs into one tileset's local ID space
///
/// `firstgids` must be sorted ascending. A single offset is used for the
/// whole layer: `firstgid - 1` of the last tileset starting strictly below
/// the layer's highest tile. Tiles that would go negative clamp to `0`.
pub fn localize_gids(layer: &mut TileLayer, firstgids: &[u32]) {
    let highest = layer.highest_tile();

    let mut diff = 0;
    for &firstgid in firstgids {
        if firstgid < highest {
            diff = firstgid.saturating_sub(1);
        } else {
            break;
        }
    }

    for tile in layer.tiles.iter_mut() {
        *tile = tile.saturating_sub(diff);
    }
}

/// Sorted, deduplicated `firstgid` of every tileset
fn tileset_boundaries(map: &Element) -> Result<Vec<u32>> {
    let mut firstgids = map
        .children_named("tileset")
        .map(|tileset| Ok(parse_attr::<u32>(tileset, "firstgid")?.unwrap_or(1)))
        .collect::<Result<Vec<_>>>()?;
    firstgids.sort_unstable();
    firstgids.dedup();
    Ok(firstgids)
}

fn read_layer(
    layer: &Element,
    map_width: Option<usize>,
    firstgids: &[u32],
) -> Result<Option<TileLayer>> {
    let name = layer.attr("name").unwrap_or_default();

    let Some(data) = layer.child("data") else {
        tracing::debug!("skipping tmx layer {:?}: no data", name);
        return Ok(None);
    };
    let Some(encoding) = data.attr("encoding") else {
        tracing::debug!("skipping tmx layer {:?}: xml tile data is not supported", name);
        return Ok(None);
    };
    if encoding.parse::<Encoding>().is_err() {
        tracing::debug!("skipping tmx layer {:?}: unknown encoding {:?}", name, encoding);
        return Ok(None);
    }
    if data.child("chunk").is_some() {
        tracing::debug!("skipping tmx layer {:?}: infinite map chunks are not supported", name);
        return Ok(None);
    }

    let tiles = decode_tiles(&data.text, encoding, data.attr("compression"))?;

    let columns = parse_attr::<usize>(layer, "width")?
        .or(map_width)
        .unwrap_or(tiles.len())
        .max(1);

    let mut meta = ValueMap::new();
    insert_opt(&mut meta, "width", parse_attr::<i64>(layer, "width")?);
    insert_opt(&mut meta, "height", parse_attr::<i64>(layer, "height")?);
    insert_opt(&mut meta, "opacity", parse_attr::<f64>(layer, "opacity")?);
    insert_opt(&mut meta, "visible", parse_flag(layer, "visible")?);
    insert_opt(&mut meta, "offsetx", parse_attr::<i64>(layer, "offsetx")?);
    insert_opt(&mut meta, "offsety", parse_attr::<i64>(layer, "offsety")?);
    merge_properties(layer, &mut meta)?;

    let mut tile_layer = TileLayer::new(layer.attr("name"), columns, tiles).with_meta(meta);
    localize_gids(&mut tile_layer, firstgids);
    if !tile_layer.is_rectangular() {
        tracing::debug!(
            "tmx layer {:?} has {} tiles, not a multiple of {} columns",
            name,
            tile_layer.tiles.len(),
            columns
        );
    }
    Ok(Some(tile_layer))
}

fn read_object_group(group: &Element, objects: &mut Vec<LevelObject>) -> Result<()> {
    let group_name = group.attr("name");
    let group_type = group.attr("type");

    // Objects are labelled after their group, never after themselves
    let kind = match (group_name, group_type) {
        (Some(name), _) if !name.is_empty() => Value::from(name),
        (_, Some(kind)) if !kind.is_empty() => Value::from(kind),
        _ => Value::from(group_name),
    };

    let mut group_meta = ValueMap::new();
    insert_opt(&mut group_meta, "color", group.attr("color"));
    insert_opt(&mut group_meta, "opacity", parse_attr::<f64>(group, "opacity")?);
    insert_opt(&mut group_meta, "offsetx", parse_attr::<i64>(group, "offsetx")?);
    insert_opt(&mut group_meta, "offsety", parse_attr::<i64>(group, "offsety")?);

    for obj in group.children_named("object") {
        let mut meta = group_meta.clone();
        meta.insert("x".into(), Value::Int(parse_attr(obj, "x")?.unwrap_or(0)));
        meta.insert("y".into(), Value::Int(parse_attr(obj, "y")?.unwrap_or(0)));
        insert_opt(&mut meta, "width", parse_attr::<i64>(obj, "width")?);
        insert_opt(&mut meta, "height", parse_attr::<i64>(obj, "height")?);
        insert_opt(&mut meta, "rotation", parse_attr::<f64>(obj, "rotation")?);
        insert_opt(&mut meta, "gid", parse_attr::<i64>(obj, "gid")?);
        insert_opt(&mut meta, "visible", parse_flag(obj, "visible")?);
        merge_properties(obj, &mut meta)?;

        objects.push(LevelObject::new(kind.clone(), meta));
    }

    Ok(())
}

/// Merge the `<properties>` children of an element into `meta`
fn merge_properties(element: &Element, meta: &mut ValueMap) -> Result<()> {
    for properties in element.children_named("properties") {
        for property in properties.children_named("property") {
            let (Some(name), Some(value)) = (property.attr("name"), property.attr("value")) else {
                continue;
            };
            meta.insert(name.to_string(), property_value(property.attr("type"), value)?);
        }
    }
    Ok(())
}

/// Coerce a property value according to its declared type
pub fn property_value(kind: Option<&str>, value: &str) -> Result<Value> {
    match kind {
        Some("int") => parse_text::<i64>("int property", value).map(Value::Int),
        Some("float") => parse_text::<f64>("float property", value).map(Value::Float),
        Some("bool") => Ok(Value::Bool(value == "true")),
        _ => Ok(Value::from(value)),
    }
}

fn parse_attr<T>(element: &Element, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    element
        .attr(name)
        .map(|text| parse_text(&format!("<{}> attribute {:?}", element.name, name), text))
        .transpose()
}

/// Parse a `0`/`1` attribute, any nonzero integer is true
fn parse_flag(element: &Element, name: &str) -> Result<Option<bool>> {
    Ok(parse_attr::<i64>(element, name)?.map(|flag| flag != 0))
}

fn parse_text<T>(what: &str, text: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    text.trim()
        .parse()
        .map_err(|e| LevelError::MalformedDocument(format!("invalid {} {:?}: {}", what, text, e)))
}

fn insert_opt<T: Into<Value>>(meta: &mut ValueMap, key: &str, value: Option<T>) {
    if let Some(value) = value {
        meta.insert(key.to_string(), value.into());
    }
}
