// Copyright (c) 2026 rezky_nightky

mod cell;
mod config;
mod density;
mod frame;
mod grid;
mod logging;
mod mutator;
mod palette;
mod ramp;
mod ripple;
mod router;
mod runtime;
mod scheduler;
mod sim;
mod terminal;
mod walker;

use std::env;
use std::io::{self, Write};
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use anyhow::{bail, Result};
use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use rand::{rngs::StdRng, SeedableRng};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::cell::Cell;
use crate::config::{color_enabled_stdout, default_params_usage_for_help, Args, ColorBg, SimConfig};
use crate::density::load_levels;
use crate::frame::Frame;
use crate::palette::{build_palette, Palette};
use crate::ramp::print_list_ramps;
use crate::runtime::{parse_color_scheme, print_list_colors, ColorMode, ColorScheme};
use crate::sim::Simulation;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> String {
    let sha = env!("ASCIIANT_GIT_SHA");
    if sha.is_empty() {
        env!("ASCIIANT_BUILD").to_string()
    } else {
        format!("{} ({})", env!("ASCIIANT_BUILD"), sha)
    }
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn detect_color_mode_auto() -> ColorMode {
    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }
    if term == "linux" || term == "vt100" {
        return ColorMode::Color16;
    }

    ColorMode::Color256
}

fn detect_color_mode(args: &Args) -> Result<ColorMode> {
    match args.colormode {
        None => Ok(detect_color_mode_auto()),
        Some(0) => Ok(ColorMode::Mono),
        Some(16) => Ok(ColorMode::Color16),
        Some(8) => Ok(ColorMode::Color256),
        Some(24) => Ok(ColorMode::TrueColor),
        Some(m) => bail!("invalid --colormode: {} (allowed: 0,16,8,24)", m),
    }
}

fn install_signal_handlers() {
    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

fn parse_args() -> Args {
    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Renders the image once to stdout. A decode failure prints a blank grid.
fn print_art(config: &SimConfig) -> Result<()> {
    let Some(path) = &config.image else {
        bail!("--print needs --image");
    };
    let (rows, cols) = (config.art_rows, config.art_cols);
    let levels = load_levels(path, rows, cols, &config.ramp).unwrap_or_else(|e| {
        tracing::warn!(error = %format!("{e:#}"), "art image unavailable, printing blank grid");
        vec![0; rows * cols]
    });

    let mut out = io::stdout().lock();
    let mut line = String::with_capacity(cols);
    for row in levels.chunks(cols.max(1)) {
        line.clear();
        line.extend(row.iter().map(|&l| config.ramp.char_at(l)));
        writeln!(out, "{}", line.trim_end())?;
    }
    out.flush()?;
    Ok(())
}

fn theme_for_key(c: char) -> Option<ColorScheme> {
    let i = c.to_digit(10)? as usize;
    let i = i.checked_sub(1)?;
    ColorScheme::ALL.get(i).map(|(s, _, _)| *s)
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    install_signal_handlers();

    let args = parse_args();

    if args.list_ramps {
        print_list_ramps();
        return Ok(());
    }

    if args.list_colors {
        print_list_colors();
        return Ok(());
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    logging::init(args.log_file.as_deref(), !args.print)?;

    let config = args.sim_config()?;
    if args.print {
        return print_art(&config);
    }

    let color_mode = detect_color_mode(&args)?;
    let mut scheme = parse_color_scheme(&args.color).map_err(anyhow::Error::msg)?;
    let target_fps = args.target_fps()?;
    let run_for = args.duration()?;
    let default_background = matches!(
        args.color_bg,
        ColorBg::DefaultBackground | ColorBg::Transparent
    );
    let levels = config.ramp.len();
    let mut palette: Palette = build_palette(scheme, color_mode, levels, default_background);

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    tracing::info!(
        preset = ?args.effective_preset(),
        seed = ?args.seed,
        color_mode = ?color_mode,
        fps = target_fps,
        "starting"
    );

    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;
    let mut sim = Simulation::new(config, w, h, rng);
    sim.load_art();
    let mut frame = Frame::new(w, h, palette.bg);

    let start = Instant::now();
    let end_time = run_for.map(|d| start + d);
    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let mut next_frame = Instant::now();

    let mut clock = Duration::ZERO;
    let mut last_tick = Instant::now();
    let mut paused = false;
    let mut running = true;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::ZERO)? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => pending_resize = Some((nw, nh)),
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if args.screensaver {
                            running = false;
                            break;
                        }
                        match k.code {
                            KeyCode::Esc | KeyCode::Char('q') => running = false,
                            KeyCode::Char('p') => {
                                paused = !paused;
                                tracing::debug!(paused, "pause toggled");
                            }
                            KeyCode::Char(' ') => sim.clear_trail(),
                            KeyCode::Char('r') => sim.trigger_ripple(),
                            KeyCode::Up => sim.set_pace(sim.pace().faster(target_period)),
                            KeyCode::Down => sim.set_pace(sim.pace().slower(target_period)),
                            KeyCode::Char(c) => {
                                if let Some(s) = theme_for_key(c) {
                                    scheme = s;
                                    palette =
                                        build_palette(scheme, color_mode, levels, default_background);
                                    frame.fill(Cell::blank(palette.bg));
                                }
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }

            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            sim.resize(nw, nh);
            frame = Frame::new(nw, nh, palette.bg);
        }

        let now = Instant::now();
        if !paused {
            clock += now - last_tick;
            sim.advance(clock);
        }
        last_tick = now;

        sim.draw(&mut frame, &palette);
        if frame.has_changes() {
            term.draw(&mut frame)?;
        }

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    drop(term);
    tracing::info!(elapsed_s = start.elapsed().as_secs_f64(), "stopped");
    Ok(())
}
