//! The cell grid — canonical integer coordinates over a fixed-size
//! angular tiling anchored at null island (0°, 0°).
//!
//! RULE: Every cell in the session comes out of the [`CellIndex`].
//! Downstream maps key on the cell's (i, j) pair, so canonicalization
//! is an interning optimization, not a correctness requirement — but
//! routing all lookups through one place keeps the projection math in
//! exactly one spot.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::types::LatLng;

/// A grid cell: integer tile coordinates at a fixed angular size.
/// Immutable once created; identity is the (i, j) pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Cell {
    pub i: i64,
    pub j: i64,
}

impl Cell {
    pub fn new(i: i64, j: i64) -> Self {
        Self { i, j }
    }

    /// The `"i,j"` form used as the cell key in persisted records.
    pub fn key(&self) -> String {
        format!("{},{}", self.i, self.j)
    }

    /// Parse a persisted `"i,j"` key. Returns None on any malformed
    /// input — the codec treats that as a damaged record.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (i, j) = key.split_once(',')?;
        Some(Self {
            i: i.trim().parse().ok()?,
            j: j.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.i, self.j)
    }
}

/// Flyweight index over all cells touched this session.
///
/// Owns the lat/lng projection. No eviction: the set only grows, which
/// is acceptable — a cell is two integers.
pub struct CellIndex {
    tile_size: f64,
    known: HashSet<Cell>,
}

impl CellIndex {
    pub fn new(tile_size: f64) -> Self {
        assert!(tile_size > 0.0, "tile_size must be positive");
        Self {
            tile_size,
            known: HashSet::new(),
        }
    }

    /// The canonical cell for (i, j). Repeated calls observe the same
    /// interned identity.
    pub fn cell(&mut self, i: i64, j: i64) -> Cell {
        let cell = Cell::new(i, j);
        self.known.insert(cell);
        cell
    }

    /// Project a continuous position onto its containing cell.
    pub fn cell_at(&mut self, lat: f64, lng: f64) -> Cell {
        let i = (lat / self.tile_size).floor() as i64;
        let j = (lng / self.tile_size).floor() as i64;
        self.cell(i, j)
    }

    /// Southwest corner of a cell — the inverse projection.
    pub fn origin_of(&self, cell: Cell) -> LatLng {
        (cell.i as f64 * self.tile_size, cell.j as f64 * self.tile_size)
    }

    /// Midpoint of a cell. Discrete moves land here, half a tile away
    /// from the cell boundary, so rounding noise can never flip the
    /// reverse projection into a neighbor.
    pub fn center_of(&self, cell: Cell) -> LatLng {
        (
            (cell.i as f64 + 0.5) * self.tile_size,
            (cell.j as f64 + 0.5) * self.tile_size,
        )
    }

    /// The square viewport of `radius` cells around `center`, in
    /// row-major order. Deterministic order matters: viewport passes
    /// walk this list, and their event order must not depend on hash
    /// iteration.
    pub fn neighborhood(&mut self, center: Cell, radius: i64) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for i in (center.i - radius)..=(center.i + radius) {
            for j in (center.j - radius)..=(center.j + radius) {
                cells.push(self.cell(i, j));
            }
        }
        cells
    }

    /// Number of distinct cells interned so far.
    pub fn known_cells(&self) -> usize {
        self.known.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_round_trips_through_cell_centers() {
        let mut index = CellIndex::new(1e-4);
        for (lat, lng) in [(0.0, 0.0), (36.9895, -122.0628), (-12.34, 56.78)] {
            let cell = index.cell_at(lat, lng);
            let (clat, clng) = index.center_of(cell);
            assert_eq!(index.cell_at(clat, clng), cell);
            let (olat, olng) = index.origin_of(cell);
            assert!((olat - clat).abs() <= 1e-4 && (olng - clng).abs() <= 1e-4);
        }
    }

    #[test]
    fn negative_coordinates_floor_toward_negative_infinity() {
        let mut index = CellIndex::new(1e-4);
        let cell = index.cell_at(-0.00005, -0.00005);
        assert_eq!(cell, Cell::new(-1, -1));
    }

    #[test]
    fn key_round_trips() {
        let cell = Cell::new(-42, 17);
        assert_eq!(Cell::parse_key(&cell.key()), Some(cell));
        assert_eq!(Cell::parse_key("garbage"), None);
        assert_eq!(Cell::parse_key("1,2,3"), None);
    }

    #[test]
    fn neighborhood_is_row_major_and_complete() {
        let mut index = CellIndex::new(1e-4);
        let cells = index.neighborhood(Cell::new(0, 0), 1);
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], Cell::new(-1, -1));
        assert_eq!(cells[8], Cell::new(1, 1));
        assert_eq!(index.known_cells(), 9);
    }
}
