//! Triangular span-indexed storage.
//!
//! Charts only ever store entries for spans `(i, j)` with `i <= j <= max`, so a
//! full square table wastes half its space. `ChartSpan` packs the upper
//! triangle row by row into one vector:
//!
//! ```text
//!        j=0  1  2  3
//!   i=0 [ 0   1  2  3 ]
//!   i=1 [     4  5  6 ]      offset(i) = i*(max+1) - i*(i-1)/2
//!   i=2 [        7  8 ]      index(i, j) = offset(i) + (j - i)
//!   i=3 [           9 ]
//! ```

/// Upper-triangular table over spans `(i, j)`, `0 <= i <= j <= max`.
#[derive(Debug, Clone)]
pub struct ChartSpan<T> {
    max: usize,
    cells: Vec<T>,
}

impl<T: Clone> ChartSpan<T> {
    /// Allocate a table for spans up to `max`, every entry set to `default`.
    pub fn new(max: usize, default: T) -> Self {
        ChartSpan { max, cells: vec![default; (max + 1) * (max + 2) / 2] }
    }
}

impl<T> ChartSpan<T> {
    pub fn max(&self) -> usize {
        self.max
    }

    fn index(&self, i: usize, j: usize) -> Option<usize> {
        if i > j || j > self.max {
            return None;
        }
        let offset = i * (self.max + 1) - i * i.saturating_sub(1) / 2;
        Some(offset + (j - i))
    }

    /// Entry for `(i, j)`, or `None` when the span is outside the table.
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        self.index(i, j).map(|idx| &self.cells[idx])
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        self.index(i, j).map(|idx| &mut self.cells[idx])
    }

    /// Overwrite `(i, j)`. Returns false (and drops `value`) when the span is
    /// outside the table.
    pub fn set(&mut self, i: usize, j: usize, value: T) -> bool {
        match self.get_mut(i, j) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
