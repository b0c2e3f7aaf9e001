// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use rand::Rng;

/// Upper bound on steps taken in one advance, so a stalled frame does not
/// turn into a burst.
pub const MAX_CATCHUP_STEPS: u32 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// The ant. Position is in virtual pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub x: i32,
    pub y: i32,
}

impl Cursor {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn random_in<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Self {
        let x = rng.random_range(0..width.max(1)) as i32;
        let y = rng.random_range(0..height.max(1)) as i32;
        Self { x, y }
    }

    /// Moves `step` pixels in `dir` if the result stays inside
    /// `[0, width) x [0, height)`. A rejected move leaves the cursor put.
    pub fn try_step(&mut self, dir: Direction, step: u32, width: u32, height: u32) -> bool {
        let (dx, dy) = dir.delta();
        let step = i64::from(step);
        let nx = i64::from(self.x) + i64::from(dx) * step;
        let ny = i64::from(self.y) + i64::from(dy) * step;
        if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
            return false;
        }
        self.x = nx as i32;
        self.y = ny as i32;
        true
    }

    pub fn clamp_to(&mut self, width: u32, height: u32) {
        self.x = self.x.clamp(0, width.max(1) as i32 - 1);
        self.y = self.y.clamp(0, height.max(1) as i32 - 1);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pace {
    /// Fixed-rate timer. Zero means one step per advance.
    Interval(Duration),
    /// This many steps every advance.
    PerFrame(u32),
}

/// Longest interval the speed keys slow down to.
pub const MAX_INTERVAL: Duration = Duration::from_secs(60);

impl Pace {
    /// Roughly doubles the step rate for a loop advancing every `frame`.
    /// Intervals that would tick more than once a frame turn into a
    /// per-frame count.
    pub fn faster(self, frame: Duration) -> Self {
        match self {
            Pace::PerFrame(n) => Pace::PerFrame(n.saturating_mul(2).min(MAX_CATCHUP_STEPS)),
            Pace::Interval(d) if d.is_zero() => Pace::PerFrame(2),
            Pace::Interval(d) if d / 2 < frame => {
                let per_frame = frame.as_nanos() * 2 / d.as_nanos();
                let per_frame = per_frame.min(u128::from(MAX_CATCHUP_STEPS)) as u32;
                Pace::PerFrame(per_frame.max(2))
            }
            Pace::Interval(d) => Pace::Interval(d / 2),
        }
    }

    /// Roughly halves the step rate. One step a frame becomes a two-frame
    /// interval.
    pub fn slower(self, frame: Duration) -> Self {
        match self {
            Pace::PerFrame(n) if n > 1 => Pace::PerFrame(n / 2),
            Pace::PerFrame(_) => Pace::Interval(two_frames(frame)),
            Pace::Interval(d) if d.is_zero() => Pace::Interval(two_frames(frame)),
            Pace::Interval(d) => Pace::Interval((d * 2).min(MAX_INTERVAL).max(d)),
        }
    }
}

fn two_frames(frame: Duration) -> Duration {
    (frame * 2).clamp(Duration::from_millis(1), MAX_INTERVAL)
}

#[derive(Clone, Debug)]
pub struct Walker {
    pub pace: Pace,
    last_step: Duration,
}

impl Walker {
    pub fn new(pace: Pace, now: Duration) -> Self {
        Self {
            pace,
            last_step: now,
        }
    }

    pub fn set_pace(&mut self, pace: Pace, now: Duration) {
        self.pace = pace;
        self.last_step = now;
    }

    pub fn steps_due(&mut self, now: Duration) -> u32 {
        match self.pace {
            Pace::PerFrame(n) => n.min(MAX_CATCHUP_STEPS),
            Pace::Interval(d) if d.is_zero() => {
                self.last_step = now;
                1
            }
            Pace::Interval(d) => {
                let elapsed = now.saturating_sub(self.last_step);
                let due = elapsed.as_nanos() / d.as_nanos();
                if due > u128::from(MAX_CATCHUP_STEPS) {
                    self.last_step = now;
                    return MAX_CATCHUP_STEPS;
                }
                let due = due as u32;
                self.last_step += d * due;
                due
            }
        }
    }
}
