// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use crate::grid::{Grid, LayerKind};
use crate::scheduler::{Action, CellRef, Scheduler, TaskId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationMode {
    /// Push the cell one step denser, stopping at the densest entry.
    RampAdvance,
    /// Toggle blank/mark; a mark reverts to blank after `revert_after`.
    Blink { revert_after: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Advanced,
    Marked,
    Cleared,
    OutOfBounds,
}

#[derive(Clone, Copy, Debug)]
pub struct Mutator {
    pub mode: MutationMode,
}

impl Mutator {
    pub fn new(mode: MutationMode) -> Self {
        Self { mode }
    }

    pub fn apply(
        &self,
        grid: &mut Grid,
        layer: LayerKind,
        index: usize,
        now: Duration,
        scheduler: &mut Scheduler,
    ) -> Outcome {
        let Some(level) = grid.level(index) else {
            return Outcome::OutOfBounds;
        };
        let mark = grid.last_level();

        match self.mode {
            MutationMode::RampAdvance => {
                if level < mark {
                    grid.set_level(index, level + 1);
                    Outcome::Advanced
                } else {
                    Outcome::Unchanged
                }
            }
            MutationMode::Blink { revert_after } => {
                if level == 0 {
                    grid.set_level(index, mark);
                    if let Some(old) = grid.take_reversion(index) {
                        scheduler.cancel(old);
                    }
                    let target = CellRef {
                        layer,
                        generation: grid.generation,
                        index,
                    };
                    let id = scheduler.schedule(now + revert_after, target, Action::Revert);
                    grid.set_reversion(index, id);
                    Outcome::Marked
                } else if level == mark {
                    grid.set_level(index, 0);
                    if let Some(old) = grid.take_reversion(index) {
                        scheduler.cancel(old);
                    }
                    Outcome::Cleared
                } else {
                    // mid-ramp art cells are neither blank nor marked
                    Outcome::Unchanged
                }
            }
        }
    }
}

/// Fires a due `Revert`. Stale refs (old generation, superseded id) are
/// ignored.
pub fn revert(grid: &mut Grid, task_index: usize, task_id: TaskId) -> bool {
    if grid.reversion(task_index) != Some(task_id) {
        return false;
    }
    grid.take_reversion(task_index);
    grid.set_level(task_index, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rect;

    fn grid(ramp_len: usize) -> Grid {
        Grid::blank(2, 2, 10, Rect::new(0, 0, 20, 20), ramp_len, 1)
    }

    #[test]
    fn ramp_advance_saturates_at_top() {
        let m = Mutator::new(MutationMode::RampAdvance);
        let mut g = grid(3);
        let mut s = Scheduler::new();
        let now = Duration::ZERO;
        assert_eq!(m.apply(&mut g, LayerKind::Trail, 0, now, &mut s), Outcome::Advanced);
        assert_eq!(m.apply(&mut g, LayerKind::Trail, 0, now, &mut s), Outcome::Advanced);
        for _ in 0..5 {
            assert_eq!(m.apply(&mut g, LayerKind::Trail, 0, now, &mut s), Outcome::Unchanged);
            assert_eq!(g.level(0), Some(2));
        }
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn out_of_bounds_is_dropped() {
        let m = Mutator::new(MutationMode::RampAdvance);
        let mut g = grid(3);
        let mut s = Scheduler::new();
        assert_eq!(
            m.apply(&mut g, LayerKind::Trail, 4, Duration::ZERO, &mut s),
            Outcome::OutOfBounds
        );
    }

    #[test]
    fn blink_marks_then_reverts() {
        let revert_after = Duration::from_millis(200);
        let m = Mutator::new(MutationMode::Blink { revert_after });
        let mut g = grid(2);
        let mut s = Scheduler::new();

        assert_eq!(m.apply(&mut g, LayerKind::Trail, 1, Duration::ZERO, &mut s), Outcome::Marked);
        assert_eq!(g.level(1), Some(1));
        assert!(s.pop_due(Duration::from_millis(199)).is_none());

        let task = s.pop_due(revert_after).unwrap();
        assert_eq!(task.action, Action::Revert);
        assert!(revert(&mut g, task.target.index, task.id));
        assert_eq!(g.level(1), Some(0));
    }

    #[test]
    fn blink_clears_marked_cell_and_drops_its_reversion() {
        let m = Mutator::new(MutationMode::Blink {
            revert_after: Duration::from_secs(1),
        });
        let mut g = grid(2);
        let mut s = Scheduler::new();

        m.apply(&mut g, LayerKind::Trail, 0, Duration::ZERO, &mut s);
        assert_eq!(s.pending(), 1);
        assert_eq!(m.apply(&mut g, LayerKind::Trail, 0, Duration::ZERO, &mut s), Outcome::Cleared);
        assert_eq!(g.level(0), Some(0));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn re_marking_keeps_only_latest_reversion() {
        let after = Duration::from_millis(100);
        let m = Mutator::new(MutationMode::Blink { revert_after: after });
        let mut g = grid(2);
        let mut s = Scheduler::new();
        let ms = Duration::from_millis;

        m.apply(&mut g, LayerKind::Trail, 0, ms(0), &mut s);
        m.apply(&mut g, LayerKind::Trail, 0, ms(10), &mut s);
        m.apply(&mut g, LayerKind::Trail, 0, ms(20), &mut s);
        assert_eq!(s.pending(), 1);
        assert!(s.pop_due(ms(119)).is_none());
        let t = s.pop_due(ms(120)).unwrap();
        assert!(revert(&mut g, t.target.index, t.id));
    }

    #[test]
    fn blink_leaves_mid_ramp_cells_alone() {
        let m = Mutator::new(MutationMode::Blink {
            revert_after: Duration::from_secs(1),
        });
        let r = Rect::new(0, 0, 20, 20);
        let mut g = Grid::with_levels(2, 2, 10, r, 5, 1, vec![2, 0, 0, 0]);
        let mut s = Scheduler::new();
        assert_eq!(m.apply(&mut g, LayerKind::Art, 0, Duration::ZERO, &mut s), Outcome::Unchanged);
        assert_eq!(g.level(0), Some(2));
    }
}
