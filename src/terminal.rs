// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, BufWriter, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;

/// Style currently active on the terminal, so runs only emit what changed.
#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    bold: bool,
}

impl Pen {
    fn apply<W: Write>(&mut self, out: &mut W, cell: &Cell) -> Result<()> {
        if cell.fg != self.fg {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            self.fg = cell.fg;
        }
        if cell.bg != self.bg {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            self.bg = cell.bg;
        }
        if cell.bold != self.bold {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = cell.bold;
        }
        Ok(())
    }
}

fn same_style(a: &Cell, b: &Cell) -> bool {
    a.fg == b.fg && a.bg == b.bg && a.bold == b.bold
}

pub struct Terminal {
    out: BufWriter<Stdout>,
    shown: Vec<Cell>,
    shown_size: (u16, u16),
    rows: Vec<Vec<u16>>,
    run: String,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()
        })();
        if let Err(e) = init {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            out: BufWriter::with_capacity(1 << 16, out),
            shown: Vec::new(),
            shown_size: (0, 0),
            rows: Vec::new(),
            run: String::with_capacity(64),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    /// Flushes the frame's changes. Falls back to repainting every row after a
    /// resize, a full invalidation, or when a third of the screen changed.
    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let size = (frame.width, frame.height);
        let total = frame.width as usize * frame.height as usize;
        let resized = self.shown_size != size || self.shown.len() != total;
        let full = resized || frame.is_dirty_all() || frame.dirty_indices().len() * 3 >= total;

        if resized {
            self.out
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.shown = vec![Cell::blank(None); total];
            self.shown_size = size;
        }

        for row in &mut self.rows {
            row.clear();
        }
        self.rows.resize(frame.height as usize, Vec::new());

        let width = frame.width as usize;
        if full {
            for (y, row) in self.rows.iter_mut().enumerate() {
                row.extend(0..frame.width);
                // force every cell out even when it matches what is shown
                for x in 0..width {
                    self.shown[y * width + x].ch = '\0';
                }
            }
        } else {
            for &i in frame.dirty_indices() {
                if let Some(row) = self.rows.get_mut(i / width) {
                    row.push((i % width) as u16);
                }
            }
        }

        let mut pen = Pen::default();
        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.queue(ResetColor)?;

        for (y, xs) in self.rows.iter_mut().enumerate() {
            if xs.is_empty() {
                continue;
            }
            xs.sort_unstable();
            xs.dedup();

            let mut k = 0;
            while k < xs.len() {
                let x0 = xs[k];
                let i0 = y * width + x0 as usize;
                let head = frame.cell_at_index(i0);
                if self.shown[i0] == head {
                    k += 1;
                    continue;
                }

                self.run.clear();
                self.run.push(head.ch);
                self.shown[i0] = head;
                let mut next = x0 + 1;
                k += 1;
                while k < xs.len() && xs[k] == next {
                    let i = y * width + next as usize;
                    let cell = frame.cell_at_index(i);
                    if self.shown[i] == cell || !same_style(&cell, &head) {
                        break;
                    }
                    self.run.push(cell.ch);
                    self.shown[i] = cell;
                    next += 1;
                    k += 1;
                }

                self.out.queue(cursor::MoveTo(x0, y as u16))?;
                pen.apply(&mut self.out, &head)?;
                self.out.queue(Print(self.run.as_str()))?;
            }
        }

        self.out.queue(SetAttribute(Attribute::Reset))?;
        self.out.queue(ResetColor)?;
        self.out.flush()?;
        frame.clear_dirty();
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.out.flush();
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
