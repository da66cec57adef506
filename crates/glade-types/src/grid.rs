//! Grid primitives: positions, compass directions, and tiles.
//!
//! The world is a bounded rectangular grid of integer tile coordinates.
//! Positions are plain value types; all coordinate math uses checked
//! arithmetic so a malformed delta can never wrap silently.

use serde::{Deserialize, Serialize};

/// An integer coordinate pair on the grid.
///
/// Equality, hashing, and ordering are by component (`y` major, `x` minor
/// under the derived lexicographic order, which is only used for map keys).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Position {
    /// Column index, increasing eastward.
    pub x: i32,
    /// Row index, increasing southward.
    pub y: i32,
}

impl Position {
    /// Create a position from its components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Return the position one step in `direction`, or `None` if the
    /// coordinate arithmetic would overflow `i32`.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.delta();
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// Chebyshev distance to `other`: `max(|dx|, |dy|)`.
    ///
    /// This is the natural radius metric on a king-move grid.
    pub const fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the eight compass headings, or the explicit no-direction marker.
///
/// `None` is the default/unspecified value; a move intent carrying it is
/// treated as a wait.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// North: `(0, -1)`.
    N,
    /// Northeast: `(1, -1)`.
    Ne,
    /// East: `(1, 0)`.
    E,
    /// Southeast: `(1, 1)`.
    Se,
    /// South: `(0, 1)`.
    S,
    /// Southwest: `(-1, 1)`.
    Sw,
    /// West: `(-1, 0)`.
    W,
    /// Northwest: `(-1, -1)`.
    Nw,
    /// No direction (the default/unspecified marker).
    #[default]
    None,
}

impl Direction {
    /// The unit delta `(dx, dy)` for this heading, each in `{-1, 0, 1}`.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::N => (0, -1),
            Self::Ne => (1, -1),
            Self::E => (1, 0),
            Self::Se => (1, 1),
            Self::S => (0, 1),
            Self::Sw => (-1, 1),
            Self::W => (-1, 0),
            Self::Nw => (-1, -1),
            Self::None => (0, 0),
        }
    }

    /// Whether this heading moves along both axes at once.
    pub const fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }

    /// For a diagonal heading, the two cardinal components it is composed
    /// of; `None` for cardinal headings and the no-direction marker.
    ///
    /// Used by the anti-corner-cut rule: a diagonal move is legal only when
    /// both intervening cardinal neighbors are walkable.
    pub const fn cardinal_components(self) -> Option<(Self, Self)> {
        match self {
            Self::Ne => Some((Self::N, Self::E)),
            Self::Se => Some((Self::S, Self::E)),
            Self::Sw => Some((Self::S, Self::W)),
            Self::Nw => Some((Self::N, Self::W)),
            Self::N | Self::E | Self::S | Self::W | Self::None => None,
        }
    }
}

/// A single grid tile.
///
/// Tiles are stored sparsely: only non-default tiles occupy map entries,
/// and lookups of unset in-bounds positions synthesize [`Tile::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Whether entities may occupy this tile.
    pub walkable: bool,
    /// Whether this tile blocks line of sight (reserved for the future
    /// opaque-tile visibility extension; unused by the v1 radius check).
    pub opaque: bool,
    /// Free-form floor tag (`"ground"`, `"water"`, `"rock"`, ...).
    pub floor_type: String,
}

impl Tile {
    /// The floor tag used by default tiles.
    pub const DEFAULT_FLOOR: &'static str = "ground";

    /// The non-walkable sentinel returned for out-of-bounds lookups.
    pub fn out_of_bounds() -> Self {
        Self {
            walkable: false,
            opaque: true,
            floor_type: String::from("void"),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            walkable: true,
            opaque: false,
            floor_type: String::from(Self::DEFAULT_FLOOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_applies_unit_delta() {
        let p = Position::new(3, 4);
        assert_eq!(p.step(Direction::N), Some(Position::new(3, 3)));
        assert_eq!(p.step(Direction::Se), Some(Position::new(4, 5)));
        assert_eq!(p.step(Direction::None), Some(p));
    }

    #[test]
    fn step_checks_overflow() {
        let p = Position::new(i32::MAX, 0);
        assert_eq!(p.step(Direction::E), None);
        assert_eq!(p.step(Direction::W), Some(Position::new(i32::MAX - 1, 0)));
    }

    #[test]
    fn chebyshev_is_max_axis_distance() {
        let a = Position::new(0, 0);
        assert_eq!(a.chebyshev_distance(Position::new(3, 1)), 3);
        assert_eq!(a.chebyshev_distance(Position::new(-2, -5)), 5);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn all_eight_headings_are_unit_deltas() {
        let headings = [
            Direction::N,
            Direction::Ne,
            Direction::E,
            Direction::Se,
            Direction::S,
            Direction::Sw,
            Direction::W,
            Direction::Nw,
        ];
        for dir in headings {
            let (dx, dy) = dir.delta();
            assert!(dx.abs() <= 1 && dy.abs() <= 1);
            assert!((dx, dy) != (0, 0));
        }
        assert_eq!(Direction::None.delta(), (0, 0));
    }

    #[test]
    fn diagonals_decompose_into_cardinals() {
        assert_eq!(
            Direction::Ne.cardinal_components(),
            Some((Direction::N, Direction::E))
        );
        assert_eq!(Direction::E.cardinal_components(), None);
        assert!(Direction::Ne.is_diagonal());
        assert!(!Direction::S.is_diagonal());
        assert!(!Direction::None.is_diagonal());
    }

    #[test]
    fn default_tile_is_walkable_ground() {
        let tile = Tile::default();
        assert!(tile.walkable);
        assert!(!tile.opaque);
        assert_eq!(tile.floor_type, "ground");
    }

    #[test]
    fn sentinel_tile_is_not_walkable() {
        assert!(!Tile::out_of_bounds().walkable);
    }

    #[test]
    fn direction_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Ne).ok().as_deref(), Some("\"ne\""));
        assert_eq!(serde_json::to_string(&Direction::None).ok().as_deref(), Some("\"none\""));
    }
}
