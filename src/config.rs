// Copyright (c) 2026 rezky_nightky

use std::fmt::Display;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::Parser;

use crate::mutator::MutationMode;
use crate::ramp::{ramp_from_str, DensityRamp};
use crate::ripple::RippleConfig;
use crate::walker::Pace;

pub const DEFAULT_PARAMS_USAGE: &str = "PRESETS:\n  ant     asciiant --preset ant --cell-size 6 --ramp classic --mode ramp --steps-per-frame 35\n  matrix  asciiant --preset matrix --cell-size 10 --ramp blink --mode blink --revert-ms 100000 --interval-ms 0 --ripple --ripple-radius 6 --ripple-delay-ms 100 --ripple-every-ms 500\n  art     asciiant --preset art --image <PATH> --art-size 56x56 --cell-size 6 --ramp classic --steps-per-frame 35";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

pub fn default_params_usage_for_help() -> String {
    if !color_enabled_stdout() {
        return DEFAULT_PARAMS_USAGE.to_string();
    }
    let mut out = String::with_capacity(DEFAULT_PARAMS_USAGE.len() + 64);
    for line in DEFAULT_PARAMS_USAGE.lines() {
        if !out.is_empty() {
            out.push('\n');
        }
        if line.ends_with(':') && !line.starts_with(' ') {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
        } else if let Some((name, rest)) = line.trim_start().split_once(' ') {
            out.push_str("  \x1b[33m");
            out.push_str(name);
            out.push_str("\x1b[0m ");
            out.push_str(rest);
        } else {
            out.push_str(line);
        }
    }
    out
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Full-screen trail darkened by the ant.
    #[value(name = "ant")]
    Ant,
    /// Blinking cells with radar-ping ripples.
    #[value(name = "matrix")]
    Matrix,
    /// Image art in the middle, trail around it.
    #[value(name = "art")]
    Art,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    #[value(name = "ramp")]
    Ramp,
    #[value(name = "blink")]
    Blink,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
    #[value(name = "transparent")]
    Transparent,
}

/// `ROWSxCOLS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl FromStr for GridSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| "expected: ROWSxCOLS".to_string())?;
        let rows: usize = a
            .trim()
            .parse()
            .map_err(|_| "invalid rows value".to_string())?;
        let cols: usize = b
            .trim()
            .parse()
            .map_err(|_| "invalid cols value".to_string())?;
        if rows == 0 || cols == 0 {
            return Err("rows and cols must be > 0".to_string());
        }
        Ok(Self { rows, cols })
    }
}

/// One parameterized effect. Presets fill it in, flags override.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Trail cell side and walker step, in virtual pixels.
    pub cell_size: u32,
    pub ramp: DensityRamp,
    pub mode: MutationMode,
    pub pace: Pace,
    pub ripple: RippleConfig,
    pub ripple_enabled: bool,
    pub trail: bool,
    pub image: Option<PathBuf>,
    pub art_rows: usize,
    pub art_cols: usize,
    pub art_cell_size: u32,
}

impl SimConfig {
    pub fn preset(preset: Preset) -> Self {
        let ripple = RippleConfig {
            max_radius: 6,
            delay_per_unit: Duration::from_millis(100),
            every: Duration::from_millis(500),
        };
        match preset {
            Preset::Matrix => Self {
                cell_size: 10,
                ramp: DensityRamp::blink(),
                mode: MutationMode::Blink {
                    revert_after: Duration::from_millis(100_000),
                },
                pace: Pace::Interval(Duration::ZERO),
                ripple,
                ripple_enabled: true,
                trail: true,
                image: None,
                art_rows: 56,
                art_cols: 56,
                art_cell_size: 10,
            },
            Preset::Ant | Preset::Art => Self {
                cell_size: 6,
                ramp: DensityRamp::classic(),
                mode: MutationMode::RampAdvance,
                pace: Pace::PerFrame(35),
                ripple,
                ripple_enabled: false,
                trail: true,
                image: None,
                art_rows: 56,
                art_cols: 56,
                art_cell_size: 6,
            },
        }
    }
}

fn require_range<T: PartialOrd + Display + Copy>(name: &str, v: T, min: T, max: T) -> Result<T> {
    if v < min || v > max {
        bail!("failed to apply {} {} (min {} max {})", name, v, min, max);
    }
    Ok(v)
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> Result<f64> {
    if !v.is_finite() {
        bail!("failed to apply {} {} (must be a finite number)", name, v);
    }
    require_range(name, v, min, max)
}

#[derive(Parser, Debug, Clone)]
#[command(name = "asciiant", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        long = "preset",
        value_enum,
        help_heading = "GENERAL",
        help = "Effect preset: ant, matrix, art (default: art with --image, else ant)"
    )]
    pub preset: Option<Preset>,

    #[arg(
        long = "image",
        help_heading = "ART",
        help = "Image to render as ASCII art in the middle of the screen"
    )]
    pub image: Option<PathBuf>,

    #[arg(
        long = "art-size",
        help_heading = "ART",
        help = "Art grid size as ROWSxCOLS (min 1 max 1000 each)"
    )]
    pub art_size: Option<GridSize>,

    #[arg(
        long = "art-cell-size",
        help_heading = "ART",
        help = "Art cell size in virtual pixels (min 1 max 64)"
    )]
    pub art_cell_size: Option<u32>,

    #[arg(
        long = "print",
        requires = "image",
        help_heading = "ART",
        help = "Print --image as ASCII art to stdout and exit"
    )]
    pub print: bool,

    #[arg(
        long = "no-trail",
        help_heading = "GENERAL",
        help = "Disable the full-screen trail grid"
    )]
    pub no_trail: bool,

    #[arg(
        long = "cell-size",
        help_heading = "GENERAL",
        help = "Trail cell size and ant step in virtual pixels (min 1 max 64)"
    )]
    pub cell_size: Option<u32>,

    #[arg(
        long = "ramp",
        help_heading = "RAMP",
        help = "Density ramp preset (see --list-ramps)"
    )]
    pub ramp: Option<String>,

    #[arg(
        long = "ramp-chars",
        conflicts_with = "ramp",
        help_heading = "RAMP",
        help = "Custom density ramp, emptiest character first"
    )]
    pub ramp_chars: Option<String>,

    #[arg(
        long = "mode",
        value_enum,
        help_heading = "RAMP",
        help = "Cell mutation: ramp (advance one step) or blink (toggle, timed revert)"
    )]
    pub mode: Option<ModeArg>,

    #[arg(
        long = "revert-ms",
        help_heading = "RAMP",
        help = "Blink revert delay in ms (min 1 max 3600000)"
    )]
    pub revert_ms: Option<u64>,

    #[arg(
        long = "interval-ms",
        conflicts_with = "steps_per_frame",
        help_heading = "SPEED",
        help = "Ant step interval in ms; 0 = one step per frame (max 60000)"
    )]
    pub interval_ms: Option<u64>,

    #[arg(
        long = "steps-per-frame",
        help_heading = "SPEED",
        help = "Ant steps per frame (min 1 max 10000)"
    )]
    pub steps_per_frame: Option<u32>,

    #[arg(
        long = "ripple",
        conflicts_with = "no_ripple",
        help_heading = "RIPPLE",
        help = "Enable timed ripples"
    )]
    pub ripple: bool,

    #[arg(
        long = "no-ripple",
        help_heading = "RIPPLE",
        help = "Disable timed ripples"
    )]
    pub no_ripple: bool,

    #[arg(
        long = "ripple-radius",
        help_heading = "RIPPLE",
        help = "Ripple radius in cells (min 0 max 64)"
    )]
    pub ripple_radius: Option<u16>,

    #[arg(
        long = "ripple-delay-ms",
        help_heading = "RIPPLE",
        help = "Ripple delay per unit of distance in ms (max 10000)"
    )]
    pub ripple_delay_ms: Option<u64>,

    #[arg(
        long = "ripple-every-ms",
        help_heading = "RIPPLE",
        help = "Time between ripples in ms (min 1 max 600000)"
    )]
    pub ripple_every_ms: Option<u64>,

    #[arg(long = "seed", help_heading = "GENERAL", help = "RNG seed")]
    pub seed: Option<u64>,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "SPEED",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        short = 'c',
        long = "color",
        default_value = "green",
        help_heading = "APPEARANCE",
        help = "Color theme (see --list-colors)"
    )]
    pub color: String,

    #[arg(
        long = "color-bg",
        default_value_t = ColorBg::Black,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Background mode (black, default-background, transparent)"
    )]
    pub color_bg: ColorBg,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8,24). Default: auto-detect from COLORTERM/TERM"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "log-file",
        help_heading = "GENERAL",
        help = "Write logs to this file (filter with ASCIIANT_LOG)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "list-ramps",
        help_heading = "HELP",
        help = "List available density ramps and exit"
    )]
    pub list_ramps: bool,

    #[arg(
        long = "list-colors",
        help_heading = "HELP",
        help = "List available color themes and exit"
    )]
    pub list_colors: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

impl Args {
    pub fn effective_preset(&self) -> Preset {
        match (self.preset, &self.image) {
            (Some(p), _) => p,
            (None, Some(_)) => Preset::Art,
            (None, None) => Preset::Ant,
        }
    }

    /// Preset defaults with every given flag applied on top.
    pub fn sim_config(&self) -> Result<SimConfig> {
        let mut c = SimConfig::preset(self.effective_preset());

        if let Some(v) = self.cell_size {
            c.cell_size = require_range("--cell-size", v, 1, 64)?;
            c.art_cell_size = c.cell_size;
        }
        if let Some(v) = self.art_cell_size {
            c.art_cell_size = require_range("--art-cell-size", v, 1, 64)?;
        }
        if let Some(size) = self.art_size {
            c.art_rows = require_range("--art-size rows", size.rows, 1, 1000)?;
            c.art_cols = require_range("--art-size cols", size.cols, 1, 1000)?;
        }
        c.image = self.image.clone();
        if self.no_trail {
            c.trail = false;
        }

        if let Some(name) = &self.ramp {
            c.ramp = ramp_from_str(name).map_err(|e| anyhow!(e))?;
        }
        if let Some(chars) = &self.ramp_chars {
            c.ramp = DensityRamp::parse(chars).map_err(|e| anyhow!("--ramp-chars: {}", e))?;
        }

        let revert_after = match (self.revert_ms, c.mode) {
            (Some(ms), _) => Duration::from_millis(require_range("--revert-ms", ms, 1, 3_600_000)?),
            (None, MutationMode::Blink { revert_after }) => revert_after,
            (None, MutationMode::RampAdvance) => Duration::from_millis(100_000),
        };
        c.mode = match self.mode {
            Some(ModeArg::Ramp) => MutationMode::RampAdvance,
            Some(ModeArg::Blink) => MutationMode::Blink { revert_after },
            None => match c.mode {
                MutationMode::Blink { .. } => MutationMode::Blink { revert_after },
                m => m,
            },
        };

        if let Some(ms) = self.interval_ms {
            let ms = require_range("--interval-ms", ms, 0, 60_000)?;
            c.pace = Pace::Interval(Duration::from_millis(ms));
        }
        if let Some(n) = self.steps_per_frame {
            c.pace = Pace::PerFrame(require_range("--steps-per-frame", n, 1, 10_000)?);
        }

        if self.ripple {
            c.ripple_enabled = true;
        }
        if self.no_ripple {
            c.ripple_enabled = false;
        }
        if let Some(r) = self.ripple_radius {
            c.ripple.max_radius = require_range("--ripple-radius", r, 0, 64)?;
        }
        if let Some(ms) = self.ripple_delay_ms {
            let ms = require_range("--ripple-delay-ms", ms, 0, 10_000)?;
            c.ripple.delay_per_unit = Duration::from_millis(ms);
        }
        if let Some(ms) = self.ripple_every_ms {
            let ms = require_range("--ripple-every-ms", ms, 1, 600_000)?;
            c.ripple.every = Duration::from_millis(ms);
        }

        Ok(c)
    }

    pub fn target_fps(&self) -> Result<f64> {
        require_f64_range("--fps", self.fps, 1.0, 240.0)
    }

    /// `None` when the run is unbounded.
    pub fn duration(&self) -> Result<Option<Duration>> {
        match self.duration {
            Some(s) if !s.is_finite() => {
                bail!("failed to apply --duration {} (must be a finite number)", s)
            }
            Some(s) if s > 0.0 => {
                let s = require_f64_range("--duration", s, 0.1, 86400.0)?;
                Ok(Some(Duration::from_secs_f64(s)))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["asciiant"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn grid_size_parses_rows_by_cols() {
        assert_eq!(
            "56x40".parse::<GridSize>(),
            Ok(GridSize { rows: 56, cols: 40 })
        );
        assert!("0x4".parse::<GridSize>().is_err());
        assert!("56".parse::<GridSize>().is_err());
    }

    #[test]
    fn image_implies_art_preset() {
        assert_eq!(parse(&[]).effective_preset(), Preset::Ant);
        assert_eq!(parse(&["--image", "a.png"]).effective_preset(), Preset::Art);
        assert_eq!(
            parse(&["--image", "a.png", "--preset", "matrix"]).effective_preset(),
            Preset::Matrix
        );
    }

    #[test]
    fn matrix_preset_matches_ripple_script() {
        let c = parse(&["--preset", "matrix"]).sim_config().unwrap();
        assert_eq!(c.cell_size, 10);
        assert_eq!(c.ramp.len(), 2);
        assert_eq!(c.pace, Pace::Interval(Duration::ZERO));
        assert!(c.ripple_enabled);
        assert_eq!(c.ripple.max_radius, 6);
        assert_eq!(
            c.mode,
            MutationMode::Blink {
                revert_after: Duration::from_millis(100_000)
            }
        );
    }

    #[test]
    fn flags_override_preset() {
        let c = parse(&[
            "--preset",
            "matrix",
            "--mode",
            "ramp",
            "--no-ripple",
            "--steps-per-frame",
            "3",
            "--ramp",
            "blocks",
            "--cell-size",
            "4",
        ])
        .sim_config()
        .unwrap();
        assert_eq!(c.mode, MutationMode::RampAdvance);
        assert!(!c.ripple_enabled);
        assert_eq!(c.pace, Pace::PerFrame(3));
        assert_eq!(c.ramp.len(), 5);
        assert_eq!((c.cell_size, c.art_cell_size), (4, 4));
    }

    #[test]
    fn blink_mode_picks_up_revert_delay() {
        let c = parse(&["--mode", "blink", "--revert-ms", "250"])
            .sim_config()
            .unwrap();
        assert_eq!(
            c.mode,
            MutationMode::Blink {
                revert_after: Duration::from_millis(250)
            }
        );
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(parse(&["--cell-size", "0"]).sim_config().is_err());
        assert!(parse(&["--steps-per-frame", "0"]).sim_config().is_err());
        assert!(parse(&["--ramp-chars", "aa"]).sim_config().is_err());
        assert!(parse(&["--ramp", "nope"]).sim_config().is_err());
        assert!(parse(&["--fps", "0"]).target_fps().is_err());
        assert!(parse(&["--duration", "0.01"]).duration().is_err());
        assert_eq!(parse(&["--duration", "0"]).duration().unwrap(), None);
    }

    #[test]
    fn print_requires_image() {
        assert!(Args::try_parse_from(["asciiant", "--print"]).is_err());
    }
}
