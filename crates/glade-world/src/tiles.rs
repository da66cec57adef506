//! Sparse tile storage with a default-tile policy.
//!
//! The grid is a mapping from [`Position`] to [`Tile`] that only holds
//! non-default entries. Lookups of unset in-bounds positions synthesize the
//! default walkable tile; lookups of any out-of-bounds position return a
//! constant non-walkable sentinel. Tiles are never mutated through
//! aliasing — a change replaces the whole entry.

use std::collections::BTreeMap;

use glade_types::{Position, Tile};
use serde::{Deserialize, Serialize};

/// The sparse tile map for a bounded rectangular grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    /// Grid width in tiles.
    width: u32,
    /// Grid height in tiles.
    height: u32,
    /// Non-default tiles only.
    tiles: BTreeMap<Position, Tile>,
    /// The tile synthesized for unset in-bounds positions.
    default_tile: Tile,
    /// The sentinel returned for out-of-bounds lookups.
    sentinel: Tile,
}

impl TileMap {
    /// Create a tile map for a `width x height` grid with the standard
    /// default-tile policy (walkable, transparent ground).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: BTreeMap::new(),
            default_tile: Tile::default(),
            sentinel: Tile::out_of_bounds(),
        }
    }

    /// Grid dimensions as `(width, height)`.
    pub const fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether `position` lies inside `[0, width) x [0, height)`.
    pub fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && i64::from(position.x) < i64::from(self.width)
            && i64::from(position.y) < i64::from(self.height)
    }

    /// Look up the tile at `position`.
    ///
    /// In-bounds positions without an explicit entry yield the default
    /// tile; out-of-bounds positions yield the non-walkable sentinel.
    pub fn tile_at(&self, position: Position) -> &Tile {
        if !self.in_bounds(position) {
            return &self.sentinel;
        }
        self.tiles.get(&position).unwrap_or(&self.default_tile)
    }

    /// Whether the tile at `position` is walkable.
    pub fn is_walkable(&self, position: Position) -> bool {
        self.tile_at(position).walkable
    }

    /// Replace the tile at `position`.
    ///
    /// Setting a tile equal to the default removes its entry, keeping the
    /// map sparse. Returns `false` (and stores nothing) for out-of-bounds
    /// positions.
    pub fn set_tile(&mut self, position: Position, tile: Tile) -> bool {
        if !self.in_bounds(position) {
            return false;
        }
        if tile == self.default_tile {
            self.tiles.remove(&position);
        } else {
            self.tiles.insert(position, tile);
        }
        true
    }

    /// Iterate over the explicitly stored (non-default) tiles.
    pub fn explicit_tiles(&self) -> impl Iterator<Item = (&Position, &Tile)> {
        self.tiles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_in_bounds_position_is_default() {
        let map = TileMap::new(10, 10);
        let tile = map.tile_at(Position::new(4, 7));
        assert!(tile.walkable);
        assert_eq!(tile.floor_type, "ground");
    }

    #[test]
    fn out_of_bounds_is_sentinel() {
        let map = TileMap::new(10, 10);
        assert!(!map.tile_at(Position::new(-1, 0)).walkable);
        assert!(!map.tile_at(Position::new(10, 0)).walkable);
        assert!(!map.tile_at(Position::new(0, 10)).walkable);
    }

    #[test]
    fn set_tile_replaces_entry() {
        let mut map = TileMap::new(10, 10);
        let rock = Tile {
            walkable: false,
            opaque: true,
            floor_type: String::from("rock"),
        };
        assert!(map.set_tile(Position::new(2, 2), rock));
        assert!(!map.is_walkable(Position::new(2, 2)));
        assert_eq!(map.explicit_tiles().count(), 1);
    }

    #[test]
    fn setting_default_keeps_map_sparse() {
        let mut map = TileMap::new(10, 10);
        let rock = Tile {
            walkable: false,
            opaque: false,
            floor_type: String::from("rock"),
        };
        let _ = map.set_tile(Position::new(2, 2), rock);
        let _ = map.set_tile(Position::new(2, 2), Tile::default());
        assert_eq!(map.explicit_tiles().count(), 0);
        assert!(map.is_walkable(Position::new(2, 2)));
    }

    #[test]
    fn set_tile_out_of_bounds_is_rejected() {
        let mut map = TileMap::new(3, 3);
        assert!(!map.set_tile(Position::new(3, 0), Tile::default()));
    }

    #[test]
    fn one_by_one_grid_bounds() {
        let map = TileMap::new(1, 1);
        assert!(map.in_bounds(Position::new(0, 0)));
        assert!(!map.in_bounds(Position::new(1, 0)));
        assert!(!map.in_bounds(Position::new(0, -1)));
    }
}
