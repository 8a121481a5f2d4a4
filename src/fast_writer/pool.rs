//! Reusable cell arrays keyed by row width

use crate::types::CellValue;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Arrays kept per width
const MAX_POOLED_PER_WIDTH: usize = 4;

/// Freelist of cell vectors. Rented vectors come back on drop, so they are
/// returned on every exit path including errors.
#[derive(Debug, Default)]
pub struct CellPool {
    free: HashMap<usize, Vec<Vec<CellValue<'static>>>>,
}

impl CellPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty vector with room for `width` cells
    pub fn rent(&mut self, width: usize) -> PooledCells<'_> {
        let cells = self
            .free
            .get_mut(&width)
            .and_then(Vec::pop)
            .unwrap_or_else(|| Vec::with_capacity(width));
        PooledCells {
            pool: self,
            width,
            cells,
        }
    }

    /// Vectors currently available for `width`
    pub fn available(&self, width: usize) -> usize {
        self.free.get(&width).map_or(0, Vec::len)
    }

    fn give_back(&mut self, width: usize, mut cells: Vec<CellValue<'static>>) {
        cells.clear();
        let free = self.free.entry(width).or_default();
        if free.len() < MAX_POOLED_PER_WIDTH {
            free.push(cells);
        }
    }
}

/// A rented cell vector
pub struct PooledCells<'p> {
    pool: &'p mut CellPool,
    width: usize,
    cells: Vec<CellValue<'static>>,
}

impl Deref for PooledCells<'_> {
    type Target = Vec<CellValue<'static>>;

    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

impl DerefMut for PooledCells<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cells
    }
}

impl Drop for PooledCells<'_> {
    fn drop(&mut self) {
        let cells = std::mem::take(&mut self.cells);
        self.pool.give_back(self.width, cells);
    }
}
