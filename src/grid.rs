// Copyright (c) 2026 rezky_nightky

use std::collections::HashMap;

use crate::scheduler::TaskId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Art,
    Trail,
}

/// Axis-aligned rectangle in virtual pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Position relative to the top-left corner, if inside.
    pub fn local(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        let rx = i64::from(x) - i64::from(self.left);
        let ry = i64::from(y) - i64::from(self.top);
        if rx < 0 || ry < 0 || rx >= i64::from(self.width) || ry >= i64::from(self.height) {
            return None;
        }
        Some((rx as u32, ry as u32))
    }

    /// A rect of `width x height` centred inside `outer`.
    pub fn centered_in(outer: Rect, width: u32, height: u32) -> Self {
        let left = outer.left + (i64::from(outer.width) - i64::from(width)).div_euclid(2) as i32;
        let top = outer.top + (i64::from(outer.height) - i64::from(height)).div_euclid(2) as i32;
        Self::new(left, top, width, height)
    }
}

/// Where a grid is allowed to live. A missing mount means the layer is off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mount {
    pub rect: Rect,
}

/// Row-major grid of ramp levels.
#[derive(Clone, Debug)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    /// Side of one cell in virtual pixels.
    pub cell_size: u32,
    pub rect: Rect,
    pub generation: u32,
    levels: Vec<u8>,
    last_level: u8,
    reversions: HashMap<usize, TaskId>,
}

impl Grid {
    /// Sizes a blank grid to the mount, at least 1x1. `None` when there is
    /// nothing to mount on.
    pub fn mount(
        mount: Option<&Mount>,
        cell_size: u32,
        ramp_len: usize,
        generation: u32,
    ) -> Option<Self> {
        let mount = mount?;
        let cell = cell_size.max(1);
        let rows = (mount.rect.height / cell).max(1) as usize;
        let cols = (mount.rect.width / cell).max(1) as usize;
        Some(Self::blank(rows, cols, cell, mount.rect, ramp_len, generation))
    }

    pub fn blank(
        rows: usize,
        cols: usize,
        cell_size: u32,
        rect: Rect,
        ramp_len: usize,
        generation: u32,
    ) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            cell_size: cell_size.max(1),
            rect,
            generation,
            levels: vec![0; rows * cols],
            last_level: ramp_len.saturating_sub(1).min(u8::MAX as usize) as u8,
            reversions: HashMap::new(),
        }
    }

    /// Adopts mapped levels. Falls back to blank if the count is off, so the
    /// grid is never partially populated.
    pub fn with_levels(
        rows: usize,
        cols: usize,
        cell_size: u32,
        rect: Rect,
        ramp_len: usize,
        generation: u32,
        levels: Vec<u8>,
    ) -> Self {
        let mut grid = Self::blank(rows, cols, cell_size, rect, ramp_len, generation);
        if levels.len() == grid.levels.len() {
            let top = grid.last_level;
            grid.levels = levels.into_iter().map(|l| l.min(top)).collect();
        }
        grid
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(row * self.cols + col)
    }

    pub fn level(&self, index: usize) -> Option<u8> {
        self.levels.get(index).copied()
    }

    pub fn last_level(&self) -> u8 {
        self.last_level
    }

    pub fn set_level(&mut self, index: usize, level: u8) -> bool {
        let top = self.last_level;
        match self.levels.get_mut(index) {
            Some(v) => {
                *v = level.min(top);
                true
            }
            None => false,
        }
    }

    pub fn levels(&self) -> &[u8] {
        &self.levels
    }

    pub fn clear(&mut self) {
        self.levels.fill(0);
        self.reversions.clear();
    }

    /// Maps a virtual-pixel position to a cell through the cached rect.
    pub fn locate(&self, x: i32, y: i32) -> Option<usize> {
        let (rx, ry) = self.rect.local(x, y)?;
        let col = (u64::from(rx) * self.cols as u64 / u64::from(self.rect.width)) as usize;
        let row = (u64::from(ry) * self.rows as u64 / u64::from(self.rect.height)) as usize;
        self.index(row, col)
    }

    /// Top-left of a cell in virtual pixels.
    pub fn cell_origin(&self, index: usize) -> Option<(i32, i32)> {
        if index >= self.levels.len() {
            return None;
        }
        let row = (index / self.cols) as i64;
        let col = (index % self.cols) as i64;
        let x = i64::from(self.rect.left) + col * i64::from(self.rect.width) / self.cols as i64;
        let y = i64::from(self.rect.top) + row * i64::from(self.rect.height) / self.rows as i64;
        Some((x as i32, y as i32))
    }

    pub fn take_reversion(&mut self, index: usize) -> Option<TaskId> {
        self.reversions.remove(&index)
    }

    pub fn set_reversion(&mut self, index: usize, id: TaskId) {
        self.reversions.insert(index, id);
    }

    pub fn reversion(&self, index: usize) -> Option<TaskId> {
        self.reversions.get(&index).copied()
    }
}
