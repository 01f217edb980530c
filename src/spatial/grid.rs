//! Generic grid for per-tile data

use crate::core::types::Cell;

/// Dense row-major 2D grid addressed by `Cell`
#[derive(Debug, Clone)]
pub struct Grid<T: Clone + Default> {
    pub width: i32,
    pub height: i32,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            data: vec![T::default(); (width * height) as usize],
        }
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if self.contains(cell) {
            Some((cell.y * self.width + cell.x) as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<&T> {
        self.index(cell).and_then(|i| self.data.get(i))
    }

    #[inline]
    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut T> {
        match self.index(cell) {
            Some(i) => self.data.get_mut(i),
            None => None,
        }
    }

    /// Out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, cell: Cell, value: T) {
        if let Some(slot) = self.get_mut(cell) {
            *slot = value;
        }
    }

    /// Iterate all cells with their values, row by row
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (Cell::new(i as i32 % width, i as i32 / width), v))
    }
}
