// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use rand::{rngs::StdRng, Rng};

use crate::{
    cell::Cell,
    config::SimConfig,
    density::{ArtLoader, ArtOutcome},
    frame::Frame,
    grid::{Grid, LayerKind, Mount, Rect},
    mutator::{self, Mutator, Outcome},
    palette::Palette,
    ripple::{self, RippleEmitter},
    router,
    scheduler::{Action, CellRef, Scheduler},
    walker::{Cursor, Direction, Pace, Walker},
};

/// Ceiling on scheduled work. A ripple that would push the queue past it
/// is dropped whole.
pub const MAX_PENDING_TASKS: usize = 1 << 18;

/// Everything one running effect owns: both layers, the ant, pending
/// timed mutations and the RNG. Time is the caller's clock, passed in.
pub struct Simulation {
    config: SimConfig,
    viewport: Rect,
    trail: Option<Grid>,
    art: Option<Grid>,
    loader: Option<ArtLoader>,
    cursor: Cursor,
    walker: Walker,
    ripple: Option<RippleEmitter>,
    mutator: Mutator,
    scheduler: Scheduler,
    rng: StdRng,
    generation: u32,
    now: Duration,
    force_redraw: bool,
}

impl Simulation {
    pub fn new(config: SimConfig, cols: u16, lines: u16, mut rng: StdRng) -> Self {
        let viewport = viewport_for(&config, cols, lines);
        let cursor = Cursor::random_in(viewport.width, viewport.height, &mut rng);
        let walker = Walker::new(config.pace, Duration::ZERO);
        let ripple = config
            .ripple_enabled
            .then(|| RippleEmitter::new(config.ripple, Duration::ZERO));
        let mutator = Mutator::new(config.mode);

        let mut sim = Self {
            config,
            viewport,
            trail: None,
            art: None,
            loader: None,
            cursor,
            walker,
            ripple,
            mutator,
            scheduler: Scheduler::new(),
            rng,
            generation: 0,
            now: Duration::ZERO,
            force_redraw: true,
        };
        sim.rebuild_trail();
        tracing::info!(
            viewport_w = viewport.width,
            viewport_h = viewport.height,
            trail = sim.trail.is_some(),
            cursor_x = sim.cursor.x,
            cursor_y = sim.cursor.y,
            "simulation ready"
        );
        sim
    }

    /// Kicks off the background decode for the configured image, if any.
    pub fn load_art(&mut self) {
        let Some(path) = self.config.image.clone() else {
            return;
        };
        tracing::info!(
            path = %path.display(),
            rows = self.config.art_rows,
            cols = self.config.art_cols,
            "loading art"
        );
        let loader = ArtLoader::spawn(
            path,
            self.config.art_rows,
            self.config.art_cols,
            self.config.ramp.clone(),
        );
        self.attach_loader(loader);
    }

    pub fn attach_loader(&mut self, loader: ArtLoader) {
        self.loader = Some(loader);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn trail(&self) -> Option<&Grid> {
        self.trail.as_ref()
    }

    pub fn art(&self) -> Option<&Grid> {
        self.art.as_ref()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn pace(&self) -> Pace {
        self.walker.pace
    }

    pub fn set_pace(&mut self, pace: Pace) {
        self.walker.set_pace(pace, self.now);
    }

    fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    fn art_rect(&self) -> Rect {
        let cell = self.config.art_cell_size.max(1);
        Rect::centered_in(
            self.viewport,
            self.config.art_cols as u32 * cell,
            self.config.art_rows as u32 * cell,
        )
    }

    fn rebuild_trail(&mut self) {
        let cancelled = self.scheduler.cancel_layer(LayerKind::Trail);
        let mount = self.config.trail.then_some(Mount {
            rect: self.viewport,
        });
        let generation = self.next_generation();
        self.trail = Grid::mount(
            mount.as_ref(),
            self.config.cell_size,
            self.config.ramp.len(),
            generation,
        );
        if let Some(t) = &self.trail {
            tracing::debug!(
                rows = t.rows,
                cols = t.cols,
                cell = t.cell_size,
                generation,
                cancelled,
                "trail built"
            );
        }
        self.force_redraw = true;
    }

    pub fn poll_art(&mut self) {
        let Some(outcome) = self.loader.as_mut().and_then(ArtLoader::poll) else {
            return;
        };
        self.loader = None;

        let (rows, cols) = (self.config.art_rows, self.config.art_cols);
        let rect = self.art_rect();
        let generation = self.next_generation();
        let cell = self.config.art_cell_size;
        let ramp_len = self.config.ramp.len();

        let grid = match outcome {
            ArtOutcome::Mapped(levels) => {
                tracing::info!(rows, cols, "art mapped");
                Grid::with_levels(rows, cols, cell, rect, ramp_len, generation, levels)
            }
            ArtOutcome::Blank(e) => {
                tracing::warn!(
                    error = %format!("{e:#}"),
                    "art image unavailable, using blank grid"
                );
                Grid::blank(rows, cols, cell, rect, ramp_len, generation)
            }
        };
        self.art = Some(grid);
        self.force_redraw = true;
    }

    pub fn resize(&mut self, cols: u16, lines: u16) {
        self.viewport = viewport_for(&self.config, cols, lines);
        self.rebuild_trail();
        let rect = self.art_rect();
        if let Some(art) = self.art.as_mut() {
            art.rect = rect;
        }
        self.cursor.clamp_to(self.viewport.width, self.viewport.height);
        tracing::debug!(
            viewport_w = self.viewport.width,
            viewport_h = self.viewport.height,
            pending = self.scheduler.pending(),
            "resized"
        );
    }

    /// Wipes the trail and any pending work aimed at it.
    pub fn clear_trail(&mut self) {
        self.rebuild_trail();
    }

    pub fn advance(&mut self, now: Duration) {
        self.now = now;
        self.poll_art();
        self.run_due(now);

        while let Some(at) = self.ripple.as_mut().and_then(|r| r.due(now)) {
            self.emit_ripple(at);
        }

        let steps = self.walker.steps_due(now);
        for _ in 0..steps {
            self.walk_once();
        }
    }

    pub fn walk_once(&mut self) -> bool {
        let dir = Direction::random(&mut self.rng);
        self.step(dir)
    }

    /// One walker tick in a fixed direction. The cell under the cursor is
    /// mutated whether or not the move was accepted.
    pub fn step(&mut self, dir: Direction) -> bool {
        let accepted = self.cursor.try_step(
            dir,
            self.config.cell_size,
            self.viewport.width,
            self.viewport.height,
        );
        self.mutate_at(self.cursor.x, self.cursor.y);
        accepted
    }

    fn mutate_at(&mut self, x: i32, y: i32) -> Option<(LayerKind, Outcome)> {
        let (layer, index) = router::route(self.art.as_ref(), self.trail.as_ref(), x, y)?;
        let grid = match layer {
            LayerKind::Art => self.art.as_mut(),
            LayerKind::Trail => self.trail.as_mut(),
        }?;
        let outcome = self
            .mutator
            .apply(grid, layer, index, self.now, &mut self.scheduler);
        Some((layer, outcome))
    }

    fn run_due(&mut self, now: Duration) {
        while let Some(task) = self.scheduler.pop_due(now) {
            let CellRef {
                layer,
                generation,
                index,
            } = task.target;
            let grid = match layer {
                LayerKind::Art => self.art.as_mut(),
                LayerKind::Trail => self.trail.as_mut(),
            };
            let Some(grid) = grid.filter(|g| g.generation == generation) else {
                continue;
            };
            match task.action {
                Action::Mutate => {
                    self.mutator
                        .apply(grid, layer, index, task.due, &mut self.scheduler);
                }
                Action::Revert => {
                    mutator::revert(grid, index, task.id);
                }
            }
        }
    }

    /// Pings a random trail cell right now.
    pub fn trigger_ripple(&mut self) {
        self.emit_ripple(self.now);
    }

    fn emit_ripple(&mut self, at: Duration) {
        let Some(trail) = self.trail.as_ref() else {
            return;
        };
        let row = self.rng.random_range(0..trail.rows);
        let col = self.rng.random_range(0..trail.cols);
        self.ripple_from(row, col, at);
    }

    /// Schedules one ring of mutations around `(row, col)` of the trail.
    pub fn ripple_from(&mut self, row: usize, col: usize, at: Duration) -> usize {
        let Some(trail) = self.trail.as_ref() else {
            return 0;
        };
        let generation = trail.generation;
        let hits = ripple::plan(row, col, trail.rows, trail.cols, &self.config.ripple);
        let pending = self.scheduler.pending();
        if pending + hits.len() > MAX_PENDING_TASKS {
            tracing::debug!(row, col, pending, cells = hits.len(), "ripple dropped, queue full");
            return 0;
        }
        for hit in &hits {
            let target = CellRef {
                layer: LayerKind::Trail,
                generation,
                index: hit.index,
            };
            self.scheduler.schedule(at + hit.delay, target, Action::Mutate);
        }
        tracing::debug!(row, col, cells = hits.len(), "ripple");
        hits.len()
    }

    /// Projects both layers onto the frame, art on top.
    pub fn draw(&mut self, frame: &mut Frame, palette: &Palette) {
        if self.force_redraw {
            frame.fill(Cell::blank(palette.bg));
            self.force_redraw = false;
        }
        let ramp = &self.config.ramp;
        let glyph = |level: u8| {
            let fg = if level == 0 { None } else { palette.fg(level) };
            let mut cell = Cell::glyph(ramp.char_at(level), fg, palette.bg);
            cell.bold = level == ramp.last_level();
            cell
        };

        if let Some(trail) = &self.trail {
            for (i, &level) in trail.levels().iter().enumerate() {
                let (x, y) = (i % trail.cols, i / trail.cols);
                if x > u16::MAX as usize || y > u16::MAX as usize {
                    continue;
                }
                frame.set(x as u16, y as u16, glyph(level));
            }
        }

        if let Some(art) = &self.art {
            let cell = self.config.cell_size.max(1) as i32;
            for (i, &level) in art.levels().iter().enumerate() {
                let Some((px, py)) = art.cell_origin(i) else {
                    continue;
                };
                let (tx, ty) = (px.div_euclid(cell), py.div_euclid(cell));
                if tx < 0 || ty < 0 || tx > u16::MAX as i32 || ty > u16::MAX as i32 {
                    continue;
                }
                frame.set(tx as u16, ty as u16, glyph(level));
            }
        }
    }
}

fn viewport_for(config: &SimConfig, cols: u16, lines: u16) -> Rect {
    let cell = config.cell_size.max(1);
    Rect::new(
        0,
        0,
        u32::from(cols.max(1)) * cell,
        u32::from(lines.max(1)) * cell,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use rand::SeedableRng;

    use super::*;
    use crate::config::{Preset, SimConfig};
    use crate::mutator::MutationMode;
    use crate::palette::build_palette;
    use crate::runtime::{ColorMode, ColorScheme};

    impl Simulation {
        fn ripple_at_origin(&mut self) -> usize {
            self.ripple_from(0, 0, self.now)
        }

        fn place_cursor(&mut self, x: i32, y: i32) {
            self.cursor = Cursor::new(x, y);
        }
    }

    fn sim(config: SimConfig, cols: u16, lines: u16) -> Simulation {
        Simulation::new(config, cols, lines, StdRng::seed_from_u64(42))
    }

    fn art_config(rows: usize, cols: usize) -> SimConfig {
        let mut c = SimConfig::preset(Preset::Art);
        c.art_rows = rows;
        c.art_cols = cols;
        c.pace = Pace::PerFrame(0);
        c
    }

    fn install_art(s: &mut Simulation, levels: Vec<u8>) {
        let (tx, rx) = mpsc::channel();
        let (rows, cols) = (s.config().art_rows, s.config().art_cols);
        s.attach_loader(ArtLoader::from_receiver(rows, cols, rx));
        tx.send(Ok(levels)).unwrap();
        s.poll_art();
    }

    #[test]
    fn trail_fills_the_viewport() {
        let s = sim(SimConfig::preset(Preset::Ant), 80, 24);
        let t = s.trail().unwrap();
        assert_eq!((t.rows, t.cols), (24, 80));
        assert_eq!(t.len(), 24 * 80);
        let c = s.cursor();
        assert!(c.x >= 0 && (c.x as u32) < s.viewport().width);
        assert!(c.y >= 0 && (c.y as u32) < s.viewport().height);
    }

    #[test]
    fn no_trail_mount_means_no_trail() {
        let mut c = SimConfig::preset(Preset::Ant);
        c.trail = false;
        let mut s = sim(c, 20, 10);
        assert!(s.trail().is_none());
        for _ in 0..50 {
            s.walk_once();
        }
        assert_eq!(s.ripple_at_origin(), 0);
    }

    #[test]
    fn step_from_corner_is_rejected_but_still_paints() {
        let mut s = sim(SimConfig::preset(Preset::Ant), 10, 10);
        s.place_cursor(0, 0);
        assert!(!s.step(Direction::Up));
        assert!(!s.step(Direction::Left));
        assert_eq!(s.cursor(), Cursor::new(0, 0));
        assert_eq!(s.trail().unwrap().level(0), Some(2));
    }

    #[test]
    fn art_takes_priority_over_trail() {
        let mut s = sim(art_config(2, 2), 10, 10);
        install_art(&mut s, vec![0, 0, 0, 0]);
        let art = s.art().unwrap();
        let rect = art.rect;
        assert_eq!(rect, Rect::new(24, 24, 12, 12));

        s.place_cursor(rect.left, rect.top);
        s.step(Direction::Right);
        assert_eq!(s.art().unwrap().level(1), Some(1));
        assert!(s.trail().unwrap().levels().iter().all(|&l| l == 0));

        s.place_cursor(rect.left - 6, rect.top);
        s.step(Direction::Up);
        assert!(s.trail().unwrap().levels().iter().any(|&l| l == 1));
    }

    #[test]
    fn failed_art_load_installs_blank_grid_once() {
        let mut s = sim(art_config(3, 4), 40, 20);
        let (tx, rx) = mpsc::channel::<anyhow::Result<Vec<u8>>>();
        s.attach_loader(ArtLoader::from_receiver(3, 4, rx));

        s.advance(Duration::from_millis(1));
        assert!(s.art().is_none());

        tx.send(Err(anyhow::anyhow!("decode failed"))).unwrap();
        s.advance(Duration::from_millis(2));
        let art = s.art().unwrap();
        assert_eq!(art.len(), 12);
        assert!(art.levels().iter().all(|&l| l == 0));
        let generation = art.generation;

        s.advance(Duration::from_millis(3));
        assert_eq!(s.art().unwrap().generation, generation);
    }

    #[test]
    fn resize_rebuilds_trail_and_keeps_art() {
        let mut c = art_config(2, 2);
        c.mode = MutationMode::Blink {
            revert_after: Duration::from_secs(10),
        };
        c.ramp = crate::ramp::ramp_from_str("blink").unwrap();
        let mut s = sim(c, 20, 20);
        install_art(&mut s, vec![1, 0, 1, 0]);

        s.ripple_from(0, 0, Duration::ZERO);
        s.advance(Duration::from_secs(1));
        assert!(s.scheduler().pending() > 0);
        let old_gen = s.trail().unwrap().generation;

        s.resize(30, 10);
        let t = s.trail().unwrap();
        assert_eq!((t.rows, t.cols), (10, 30));
        assert_ne!(t.generation, old_gen);
        assert!(t.levels().iter().all(|&l| l == 0));
        assert!(s
            .scheduler()
            .pending_tasks()
            .all(|task| task.target.layer != LayerKind::Trail));

        let art = s.art().unwrap();
        assert_eq!(art.levels(), &[1, 0, 1, 0]);
        assert_eq!(art.rect, Rect::centered_in(s.viewport(), 12, 12));
    }

    #[test]
    fn ripple_lands_on_schedule() {
        let mut c = SimConfig::preset(Preset::Matrix);
        c.pace = Pace::PerFrame(0);
        c.ripple_enabled = false;
        let mut s = sim(c, 40, 40);
        let ms = Duration::from_millis;

        let n = s.ripple_from(20, 20, ms(0));
        assert_eq!(n, 113);

        s.advance(ms(0));
        let lit = |s: &Simulation| s.trail().unwrap().levels().iter().filter(|&&l| l == 1).count();
        assert_eq!(lit(&s), 1);
        s.advance(ms(100));
        assert_eq!(lit(&s), 5);
        s.advance(ms(600));
        assert_eq!(lit(&s), 113);
    }

    #[test]
    fn timed_ripples_follow_the_emitter() {
        let mut c = SimConfig::preset(Preset::Matrix);
        c.pace = Pace::PerFrame(0);
        c.ripple.every = Duration::from_millis(500);
        let mut s = sim(c, 40, 40);
        s.advance(Duration::from_millis(499));
        assert_eq!(s.scheduler().pending(), 0);
        s.advance(Duration::from_millis(500));
        assert!(s.scheduler().pending() > 0);
    }

    #[test]
    fn fast_wide_ripples_stay_under_the_task_ceiling() {
        let mut c = SimConfig::preset(Preset::Matrix);
        c.pace = Pace::PerFrame(0);
        c.ripple.max_radius = 64;
        c.ripple.every = Duration::from_millis(1);
        c.ripple.delay_per_unit = Duration::from_millis(10_000);
        let mut s = sim(c, 40, 40);

        for ms in 1..=400 {
            s.advance(Duration::from_millis(ms));
            assert!(s.scheduler().pending() <= MAX_PENDING_TASKS);
        }
        // the queue filled up instead of dropping everything
        assert!(s.scheduler().pending() > MAX_PENDING_TASKS - 2 * 40 * 40);
    }

    #[test]
    fn blink_reverts_after_delay() {
        let mut c = SimConfig::preset(Preset::Matrix);
        c.pace = Pace::PerFrame(0);
        c.ripple_enabled = false;
        c.mode = MutationMode::Blink {
            revert_after: Duration::from_millis(200),
        };
        let mut s = sim(c, 10, 10);
        s.place_cursor(0, 0);
        s.step(Direction::Up);
        assert_eq!(s.trail().unwrap().level(0), Some(1));
        s.advance(Duration::from_millis(199));
        assert_eq!(s.trail().unwrap().level(0), Some(1));
        s.advance(Duration::from_millis(200));
        assert_eq!(s.trail().unwrap().level(0), Some(0));
    }

    #[test]
    fn draw_projects_levels_to_ramp_chars() {
        let mut s = sim(art_config(2, 2), 10, 10);
        install_art(&mut s, vec![11, 0, 0, 11]);
        s.place_cursor(0, 0);
        s.step(Direction::Up);

        let palette = build_palette(ColorScheme::Green, ColorMode::Mono, 12, true);
        let mut frame = Frame::new(10, 10, None);
        s.draw(&mut frame, &palette);

        assert_eq!(frame.get(0, 0).unwrap().ch, '.');
        assert_eq!(frame.get(4, 4).unwrap().ch, '@');
        assert_eq!(frame.get(5, 4).unwrap().ch, ' ');
        assert_eq!(frame.get(5, 5).unwrap().ch, '@');
    }
}
