// Copyright (c) 2026 rezky_nightky

//! Image to density-level mapping.
//!
//! The image is squashed to exactly one pixel per grid cell and each pixel's
//! mean channel value picks a ramp level. Decoding runs on a worker thread
//! so the animation keeps going while a large file loads.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage};

use crate::ramp::DensityRamp;

/// Levels for a `rows x cols` grid, row-major.
pub fn map_image(img: &DynamicImage, rows: usize, cols: usize, ramp: &DensityRamp) -> Vec<u8> {
    let small = img
        .resize_exact(cols.max(1) as u32, rows.max(1) as u32, FilterType::Triangle)
        .to_rgba8();

    small
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            // straight RGB like a canvas readback; only fully transparent is black
            let brightness = if a == 0 {
                0.0
            } else {
                (r as f32 + g as f32 + b as f32) / 3.0
            };
            ramp.symbol_index(brightness)
        })
        .collect()
}

pub fn load_levels(path: &Path, rows: usize, cols: usize, ramp: &DensityRamp) -> Result<Vec<u8>> {
    let img =
        image::open(path).with_context(|| format!("failed to load image {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        rows,
        cols,
        "image decoded"
    );
    Ok(map_image(&img, rows, cols, ramp))
}

/// What the art layer ends up holding once loading settles.
#[derive(Debug)]
pub enum ArtOutcome {
    Mapped(Vec<u8>),
    Blank(anyhow::Error),
}

enum Pending {
    Waiting(Receiver<Result<Vec<u8>>>),
    NotStarted(anyhow::Error),
    Spent,
}

/// One background decode. Yields exactly one outcome, then stays silent.
pub struct ArtLoader {
    pub rows: usize,
    pub cols: usize,
    pending: Pending,
}

impl ArtLoader {
    pub fn spawn(path: PathBuf, rows: usize, cols: usize, ramp: DensityRamp) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("asciiant-art".to_string())
            .spawn(move || {
                let _ = tx.send(load_levels(&path, rows, cols, &ramp));
            });

        let pending = match spawned {
            Ok(_) => Pending::Waiting(rx),
            Err(e) => {
                Pending::NotStarted(anyhow::Error::new(e).context("failed to start image loader"))
            }
        };
        Self {
            rows,
            cols,
            pending,
        }
    }

    #[cfg(test)]
    pub fn from_receiver(rows: usize, cols: usize, rx: Receiver<Result<Vec<u8>>>) -> Self {
        Self {
            rows,
            cols,
            pending: Pending::Waiting(rx),
        }
    }

    #[cfg(test)]
    pub fn is_spent(&self) -> bool {
        matches!(self.pending, Pending::Spent)
    }

    /// `None` while the decode is still running and after the outcome was
    /// handed out.
    pub fn poll(&mut self) -> Option<ArtOutcome> {
        let rx = match std::mem::replace(&mut self.pending, Pending::Spent) {
            Pending::Spent => return None,
            Pending::NotStarted(e) => return Some(ArtOutcome::Blank(e)),
            Pending::Waiting(rx) => rx,
        };
        let expected = self.rows * self.cols;
        let outcome = match rx.try_recv() {
            Err(TryRecvError::Empty) => {
                self.pending = Pending::Waiting(rx);
                return None;
            }
            Ok(Ok(levels)) if levels.len() == expected => ArtOutcome::Mapped(levels),
            Ok(Ok(levels)) => ArtOutcome::Blank(anyhow::anyhow!(
                "mapped {} cells, expected {}",
                levels.len(),
                expected
            )),
            Ok(Err(e)) => ArtOutcome::Blank(e),
            Err(TryRecvError::Disconnected) => {
                ArtOutcome::Blank(anyhow::anyhow!("image loader exited without a result"))
            }
        };
        Some(outcome)
    }
}
