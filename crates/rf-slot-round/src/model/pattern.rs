//! Win patterns

use serde::{Deserialize, Serialize};

/// Boolean grid of cells that took part in a win, indexed `[reel][row]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WinPattern {
    cells: Vec<Vec<bool>>,
}

impl WinPattern {
    /// All-false grid with `shape[reel]` rows per reel
    pub fn empty(shape: &[usize]) -> Self {
        Self {
            cells: shape.iter().map(|&rows| vec![false; rows]).collect(),
        }
    }

    /// Grid with the given `(reel, row)` cells set; `None` if any cell is off-grid
    pub fn from_cells(shape: &[usize], cells: &[(usize, usize)]) -> Option<Self> {
        let mut pattern = Self::empty(shape);
        for &(reel, row) in cells {
            if !pattern.set(reel, row) {
                return None;
            }
        }
        Some(pattern)
    }

    /// Mark every cell where `predicate` holds
    pub fn from_grid(grid: &[Vec<u32>], predicate: impl Fn(u32) -> bool) -> Self {
        Self {
            cells: grid
                .iter()
                .map(|reel| reel.iter().map(|&symbol| predicate(symbol)).collect())
                .collect(),
        }
    }

    /// Set a cell; returns false if it is outside the grid
    pub fn set(&mut self, reel: usize, row: usize) -> bool {
        match self.cells.get_mut(reel).and_then(|r| r.get_mut(row)) {
            Some(cell) => {
                *cell = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, reel: usize, row: usize) -> bool {
        self.cells
            .get(reel)
            .and_then(|r| r.get(row))
            .copied()
            .unwrap_or(false)
    }

    /// OR another pattern into this one, growing to cover both shapes
    pub fn union_with(&mut self, other: &WinPattern) {
        if self.cells.len() < other.cells.len() {
            self.cells.resize(other.cells.len(), Vec::new());
        }
        for (mine, theirs) in self.cells.iter_mut().zip(&other.cells) {
            if mine.len() < theirs.len() {
                mine.resize(theirs.len(), false);
            }
            for (a, b) in mine.iter_mut().zip(theirs) {
                *a |= *b;
            }
        }
    }

    /// OR of `patterns` over an all-false grid of `shape`
    pub fn union_all<'a>(shape: &[usize], patterns: impl IntoIterator<Item = &'a WinPattern>) -> Self {
        let mut combined = Self::empty(shape);
        for pattern in patterns {
            combined.union_with(pattern);
        }
        combined
    }

    /// Number of set cells
    pub fn count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Rows per reel
    pub fn shape(&self) -> Vec<usize> {
        self.cells.iter().map(Vec::len).collect()
    }

    pub fn cells(&self) -> &[Vec<bool>] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cells() {
        let pattern = WinPattern::from_cells(&[3, 3, 3], &[(0, 1), (2, 2)]).unwrap();
        assert!(pattern.get(0, 1));
        assert!(pattern.get(2, 2));
        assert!(!pattern.get(1, 1));
        assert_eq!(pattern.count(), 2);

        assert!(WinPattern::from_cells(&[3, 3], &[(2, 0)]).is_none());
        assert!(WinPattern::from_cells(&[3, 3], &[(0, 3)]).is_none());
    }

    #[test]
    fn test_from_grid() {
        let grid = vec![vec![1, 7, 2], vec![7, 3, 3]];
        let pattern = WinPattern::from_grid(&grid, |s| s == 7);
        assert_eq!(pattern.cells(), &[vec![false, true, false], vec![true, false, false]]);
    }

    #[test]
    fn test_union_is_monotonic() {
        let shape = [2, 2];
        let mut combined = WinPattern::from_cells(&shape, &[(0, 0)]).unwrap();
        combined.union_with(&WinPattern::from_cells(&shape, &[(1, 1)]).unwrap());
        combined.union_with(&WinPattern::empty(&shape));

        assert!(combined.get(0, 0));
        assert!(combined.get(1, 1));
        assert_eq!(combined.count(), 2);
    }

    #[test]
    fn test_union_grows_to_larger_shape() {
        let mut small = WinPattern::from_cells(&[1], &[(0, 0)]).unwrap();
        let large = WinPattern::from_cells(&[2, 2], &[(1, 1)]).unwrap();
        small.union_with(&large);

        assert_eq!(small.shape(), vec![2, 2]);
        assert!(small.get(0, 0) && small.get(1, 1));
    }

    #[test]
    fn test_serializes_as_nested_arrays() {
        let pattern = WinPattern::from_cells(&[1, 1], &[(1, 0)]).unwrap();
        assert_eq!(serde_json::to_string(&pattern).unwrap(), "[[false],[true]]");
    }
}
