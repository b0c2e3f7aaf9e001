// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::cell::Cell;

/// Screen-sized cell buffer that remembers which cells changed since the
/// last flush.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::blank(bg); len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    /// Overwrites every cell and schedules a full repaint.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
        self.dirty_all = true;
        self.dirty.clear();
        self.dirty_map.fill(false);
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn has_changes(&self) -> bool {
        self.dirty_all || !self.dirty.is_empty()
    }

    pub fn clear_dirty(&mut self) {
        for &i in &self.dirty {
            self.dirty_map[i] = false;
        }
        self.dirty.clear();
        self.dirty_all = false;
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[allow(dead_code)]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells[i]
    }

    /// Writes a cell; unchanged writes are not marked dirty.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.cells[i] == cell {
            return;
        }
        self.cells[i] = cell;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }
}
