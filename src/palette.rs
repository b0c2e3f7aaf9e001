// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::{ColorMode, ColorScheme};

/// One foreground color per ramp level, dim for sparse glyphs and bright for
/// dense ones.
#[derive(Clone, Debug)]
pub struct Palette {
    pub levels: Vec<Color>,
    pub bg: Option<Color>,
}

impl Palette {
    pub fn fg(&self, level: u8) -> Option<Color> {
        self.levels.get(level as usize).copied()
    }
}

fn dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> i32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    dr * dr + dg * dg + db * db
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let to6 = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;

    let (r6, g6, b6) = (to6(r), to6(g), to6(b));
    let cube = (LEVELS[r6 as usize], LEVELS[g6 as usize], LEVELS[b6 as usize]);
    let cube_idx = 16 + 36 * r6 + 6 * g6 + b6;

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let (gray_idx, gray) = match avg {
        0..=7 => (16, (0, 0, 0)),
        239..=255 => (231, (255, 255, 255)),
        _ => {
            let step = (avg - 8) / 10;
            let v = 8 + 10 * step;
            (232 + step, (v, v, v))
        }
    };

    if dist2((r, g, b), gray) < dist2((r, g, b), cube) {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 12] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];
    TABLE
        .iter()
        .min_by_key(|(_, rgb)| dist2((r, g, b), *rgb))
        .map(|(c, _)| *c)
        .unwrap_or(Color::White)
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

/// `steps` evenly spaced samples along the polyline through `stops`.
fn gradient(stops: &[(u8, u8, u8)], steps: usize) -> Vec<(u8, u8, u8)> {
    match (stops.len(), steps) {
        (0, _) | (_, 0) => return Vec::new(),
        (1, n) => return vec![stops[0]; n],
        (_, 1) => return vec![stops[stops.len() - 1]],
        _ => {}
    }

    let segs = stops.len() - 1;
    (0..steps)
        .map(|i| {
            let pos = i as f32 / (steps - 1) as f32 * segs as f32;
            let seg = (pos.floor() as usize).min(segs - 1);
            let t = pos - seg as f32;
            let (a, b) = (stops[seg], stops[seg + 1]);
            (lerp_u8(a.0, b.0, t), lerp_u8(a.1, b.1, t), lerp_u8(a.2, b.2, t))
        })
        .collect()
}

fn stops_for(scheme: ColorScheme) -> &'static [(u8, u8, u8)] {
    match scheme {
        ColorScheme::Green => &[(0, 59, 0), (0, 143, 17), (0, 255, 65), (200, 255, 200)],
        ColorScheme::Amber => &[(64, 32, 0), (160, 96, 0), (255, 176, 0), (255, 230, 160)],
        ColorScheme::Gray => &[(58, 58, 58), (138, 138, 138), (238, 238, 238)],
        ColorScheme::Cyan => &[(0, 48, 64), (0, 135, 175), (0, 215, 255), (200, 250, 255)],
        ColorScheme::Ice => &[(40, 60, 110), (95, 135, 215), (175, 215, 255), (255, 255, 255)],
        ColorScheme::Fire => &[(90, 0, 0), (200, 30, 0), (255, 135, 0), (255, 255, 95)],
        ColorScheme::Sepia => &[(70, 45, 25), (135, 95, 55), (215, 175, 125), (250, 235, 205)],
        ColorScheme::Neon => &[(95, 0, 135), (215, 0, 175), (255, 95, 215), (0, 255, 255)],
    }
}

pub fn build_palette(
    scheme: ColorScheme,
    mode: ColorMode,
    levels: usize,
    default_background: bool,
) -> Palette {
    let bg = if default_background {
        None
    } else {
        Some(match mode {
            ColorMode::TrueColor => Color::Rgb { r: 0, g: 0, b: 0 },
            ColorMode::Color256 => Color::AnsiValue(16),
            ColorMode::Color16 | ColorMode::Mono => Color::Black,
        })
    };

    let rgb = gradient(stops_for(scheme), levels.max(1));
    let levels = match mode {
        ColorMode::Mono => vec![Color::White; rgb.len()],
        ColorMode::TrueColor => rgb.iter().map(|&(r, g, b)| Color::Rgb { r, g, b }).collect(),
        ColorMode::Color256 => rgb
            .iter()
            .map(|&(r, g, b)| Color::AnsiValue(rgb_to_ansi256(r, g, b)))
            .collect(),
        ColorMode::Color16 => rgb.iter().map(|&(r, g, b)| rgb_to_color16(r, g, b)).collect(),
    };

    Palette { levels, bg }
}
