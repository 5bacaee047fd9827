//! Canonical level model
//!
//! A level is a flat list of tile layers and a flat list of free-standing
//! objects, plus one level-wide metadata value. There are no references
//! between the parts; everything is plain owned data.

use crate::value::Value;

/// Empty tile value (no tile)
pub const EMPTY_TILE: u32 = 0;

/// A whole level as loaded from any format
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    /// Level-wide metadata
    pub meta: Value,

    /// Free-standing objects, in document order
    pub objects: Vec<LevelObject>,

    /// Tile layers, in document order
    pub layers: Vec<TileLayer>,
}

impl Level {
    /// Create an empty level
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty level with metadata
    pub fn with_meta(meta: impl Into<Value>) -> Self {
        Self {
            meta: meta.into(),
            ..Self::default()
        }
    }
}

/// A grid of tiles in row-major order
///
/// Tile `0` is "no tile"; any other ID is chosen by the game.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Layer type tag, meaning depends on the format
    pub kind: Value,

    /// Row length of the grid
    pub columns: usize,

    /// Tile IDs, `tiles.len()` is a multiple of `columns`
    pub tiles: Vec<u32>,

    /// Layer metadata
    pub meta: Value,
}

impl TileLayer {
    /// Create a new tile layer without metadata
    pub fn new(kind: impl Into<Value>, columns: usize, tiles: Vec<u32>) -> Self {
        Self {
            kind: kind.into(),
            columns,
            tiles,
            meta: Value::Null,
        }
    }

    /// Attach metadata to the layer
    pub fn with_meta(mut self, meta: impl Into<Value>) -> Self {
        self.meta = meta.into();
        self
    }

    /// Number of rows in the grid
    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.tiles.len().div_ceil(self.columns)
        }
    }

    /// Get tile at column `x`, row `y`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.columns {
            return None;
        }
        self.tiles.get(y * self.columns + x).copied()
    }

    /// Largest tile ID in the layer, `0` when empty
    pub fn highest_tile(&self) -> u32 {
        self.tiles.iter().copied().max().unwrap_or(EMPTY_TILE)
    }

    /// Check the grid invariant
    pub fn is_rectangular(&self) -> bool {
        if self.columns == 0 {
            self.tiles.is_empty()
        } else {
            self.tiles.len() % self.columns == 0
        }
    }
}

/// A free-standing level object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelObject {
    /// Object type tag
    pub kind: Value,

    /// Object metadata (position, size, custom properties...)
    pub meta: Value,
}

impl LevelObject {
    pub fn new(kind: impl Into<Value>, meta: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            meta: meta.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_layer_grid() {
        let layer = TileLayer::new("ground", 3, vec![1, 2, 3, 4, 0, 6]);
        assert_eq!(layer.rows(), 2);
        assert_eq!(layer.get(0, 0), Some(1));
        assert_eq!(layer.get(2, 1), Some(6));
        assert_eq!(layer.get(3, 0), None);
        assert_eq!(layer.get(0, 2), None);
        assert_eq!(layer.highest_tile(), 6);
        assert!(layer.is_rectangular());
    }

    #[test]
    fn test_empty_layer() {
        let layer = TileLayer::new(Value::Null, 0, Vec::new());
        assert_eq!(layer.rows(), 0);
        assert_eq!(layer.highest_tile(), EMPTY_TILE);
        assert!(layer.is_rectangular());
        assert!(!TileLayer::new(Value::Null, 0, vec![1]).is_rectangular());
    }

    #[test]
    fn test_level_defaults() {
        let level = Level::new();
        assert!(level.meta.is_null());
        assert!(level.objects.is_empty());
        assert!(level.layers.is_empty());

        let level = Level::with_meta("title");
        assert_eq!(level.meta, Value::from("title"));

        let obj = LevelObject::new("coin", Value::Null);
        assert_eq!(obj.kind, Value::from("coin"));
        assert!(obj.meta.is_null());
    }
}
