// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

/// One terminal character cell as the renderer sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Cell {
    pub fn blank(bg: Option<Color>) -> Self {
        Self::glyph(' ', None, bg)
    }

    pub fn glyph(ch: char, fg: Option<Color>, bg: Option<Color>) -> Self {
        Self {
            ch,
            fg,
            bg,
            bold: false,
        }
    }
}
