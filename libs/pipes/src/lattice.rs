//! Occupancy registry for the integer lattice pipes grow through.

use std::collections::HashSet;

use crate::direction::Dir;

/// Integer lattice coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCell {
    pub const ORIGIN: GridCell = GridCell { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, o: GridCell) -> GridCell {
        GridCell::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    /// The neighbouring cell one step along `dir`.
    pub fn step(self, dir: Dir) -> GridCell {
        self.add(dir.vec())
    }

    pub fn manhattan(self, o: GridCell) -> i32 {
        (self.x - o.x).abs() + (self.y - o.y).abs() + (self.z - o.z).abs()
    }

    /// Adjacent cells differ by one unit along exactly one axis.
    pub fn is_adjacent(self, o: GridCell) -> bool {
        self.manhattan(o) == 1
    }

    /// Largest absolute component; a cell is in bounds iff this is <= grid size.
    pub fn chebyshev_norm(self) -> i32 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }
}

/// Largest accepted grid size. Keeps the cell count of the cube within a 32-bit `usize`.
pub const MAX_GRID_SIZE: i32 = 800;

/// Process-wide set of occupied cells inside the cube `[-grid_size, grid_size]^3`.
///
/// Cells are only ever added. Retiring a segment frees its visual, not its cell,
/// so a long-running field fills up and pipes stall more often over time.
#[derive(Debug, Clone)]
pub struct Lattice {
    grid_size: i32,
    occupied: HashSet<GridCell>,
}

impl Lattice {
    /// `grid_size` is clamped to `0..=MAX_GRID_SIZE`.
    pub fn new(grid_size: i32) -> Self {
        let clamped = grid_size.clamp(0, MAX_GRID_SIZE);
        if clamped != grid_size {
            log::warn!("grid size {} clamped to {}", grid_size, clamped);
        }
        Self {
            grid_size: clamped,
            occupied: HashSet::new(),
        }
    }

    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn in_bounds(&self, cell: GridCell) -> bool {
        cell.chebyshev_norm() <= self.grid_size
    }

    pub fn is_occupied(&self, cell: GridCell) -> bool {
        self.occupied.contains(&cell)
    }

    /// In bounds and not yet occupied.
    pub fn is_valid(&self, cell: GridCell) -> bool {
        self.in_bounds(cell) && !self.is_occupied(cell)
    }

    /// Marks `cell` occupied. Returns `false` if it already was; the set is unchanged then.
    pub fn mark_occupied(&mut self, cell: GridCell) -> bool {
        let inserted = self.occupied.insert(cell);
        if !inserted {
            log::debug!("cell {:?} was already occupied", cell);
        }
        inserted
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    /// Number of cells inside the bounds.
    pub fn capacity(&self) -> usize {
        let side = (2 * self.grid_size + 1) as usize;
        side * side * side
    }

    pub fn is_full(&self) -> bool {
        self.occupied_count() >= self.capacity()
    }

    /// Uniformly random cell inside the (inclusive) bounds. May be occupied.
    pub fn random_cell(&self, rng: &mut oorandom::Rand32) -> GridCell {
        let span = (2 * self.grid_size + 1) as u32;
        let g = self.grid_size;
        GridCell::new(
            rng.rand_range(0..span) as i32 - g,
            rng.rand_range(0..span) as i32 - g,
            rng.rand_range(0..span) as i32 - g,
        )
    }

    pub fn occupied(&self) -> impl Iterator<Item = &GridCell> {
        self.occupied.iter()
    }
}
