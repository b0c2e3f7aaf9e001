// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RippleConfig {
    pub max_radius: u16,
    pub delay_per_unit: Duration,
    pub every: Duration,
}

/// One cell hit by a ripple and how long after the ping it lands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingHit {
    pub index: usize,
    pub delay: Duration,
}

/// Every in-bounds cell within `max_radius` of `(row, col)`, in scan order.
pub fn plan(row: usize, col: usize, rows: usize, cols: usize, cfg: &RippleConfig) -> Vec<RingHit> {
    let r = i64::from(cfg.max_radius);
    let mut hits = Vec::new();
    for di in -r..=r {
        for dj in -r..=r {
            let distance = ((di * di + dj * dj) as f64).sqrt();
            if distance > r as f64 {
                continue;
            }
            let ii = row as i64 + di;
            let jj = col as i64 + dj;
            if ii < 0 || jj < 0 || ii >= rows as i64 || jj >= cols as i64 {
                continue;
            }
            hits.push(RingHit {
                index: ii as usize * cols + jj as usize,
                delay: cfg.delay_per_unit.mul_f64(distance),
            });
        }
    }
    hits
}

/// Fixed-interval ping timer.
#[derive(Clone, Debug)]
pub struct RippleEmitter {
    pub cfg: RippleConfig,
    next_at: Duration,
}

impl RippleEmitter {
    pub fn new(cfg: RippleConfig, now: Duration) -> Self {
        Self {
            cfg,
            next_at: now + cfg.every,
        }
    }

    /// The fire time of the next ping if it is due. A long stall yields one
    /// ping, not a backlog.
    pub fn due(&mut self, now: Duration) -> Option<Duration> {
        if self.cfg.every.is_zero() || now < self.next_at {
            return None;
        }
        let at = self.next_at;
        self.next_at += self.cfg.every;
        if self.next_at <= now {
            self.next_at = now + self.cfg.every;
        }
        Some(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(radius: u16) -> RippleConfig {
        RippleConfig {
            max_radius: radius,
            delay_per_unit: Duration::from_millis(100),
            every: Duration::from_millis(500),
        }
    }

    #[test]
    fn radius_six_covers_exactly_the_disc_once() {
        let (rows, cols) = (40, 40);
        let (i, j) = (20, 20);
        let hits = plan(i, j, rows, cols, &cfg(6));

        let mut seen = vec![0u32; rows * cols];
        for h in &hits {
            seen[h.index] += 1;
            let (ri, rj) = ((h.index / cols) as f64, (h.index % cols) as f64);
            let d = ((ri - i as f64).powi(2) + (rj - j as f64).powi(2)).sqrt();
            assert_eq!(h.delay, Duration::from_millis(100).mul_f64(d));
        }
        for r in 0..rows {
            for c in 0..cols {
                let d2 = (r as i64 - 20).pow(2) + (c as i64 - 20).pow(2);
                let expected = if d2 <= 36 { 1 } else { 0 };
                assert_eq!(seen[r * cols + c], expected, "cell {},{}", r, c);
            }
        }
        assert_eq!(hits.len(), 113);
    }

    #[test]
    fn edges_are_skipped() {
        let hits = plan(0, 0, 3, 3, &cfg(6));
        assert_eq!(hits.len(), 9);
        let origin = hits.iter().find(|h| h.index == 0).unwrap();
        assert_eq!(origin.delay, Duration::ZERO);
    }

    #[test]
    fn emitter_fires_on_schedule_without_backlog() {
        let ms = Duration::from_millis;
        let mut e = RippleEmitter::new(cfg(6), ms(0));
        assert_eq!(e.due(ms(499)), None);
        assert_eq!(e.due(ms(500)), Some(ms(500)));
        assert_eq!(e.due(ms(600)), None);
        assert_eq!(e.due(ms(5000)), Some(ms(1000)));
        assert_eq!(e.due(ms(5000)), None);
        assert_eq!(e.due(ms(5500)), Some(ms(5500)));
    }
}
