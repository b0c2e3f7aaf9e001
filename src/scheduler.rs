// Copyright (c) 2026 rezky_nightky

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use crate::grid::LayerKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Mutate,
    Revert,
}

/// Names a cell without borrowing its grid. A rebuilt grid gets a new
/// generation, so refs into the old one stop matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRef {
    pub layer: LayerKind,
    pub generation: u32,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub due: Duration,
    pub target: CellRef,
    pub action: Action,
}

/// One-shot delayed tasks on the simulation clock.
///
/// Tasks fire in due order, ties in scheduling order. Cancelled tasks are
/// dropped from the index right away and their heap slots are skipped
/// lazily.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    queue: BinaryHeap<Reverse<(Duration, u64)>>,
    live: HashMap<u64, Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, target: CellRef, action: Action) -> TaskId {
        let raw = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let id = TaskId(raw);
        self.live.insert(
            raw,
            Task {
                id,
                due,
                target,
                action,
            },
        );
        self.queue.push(Reverse((due, raw)));
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let removed = self.live.remove(&id.0).is_some();
        self.compact_if_sparse();
        removed
    }

    /// Drops every pending task aimed at `layer`. Returns how many.
    pub fn cancel_layer(&mut self, layer: LayerKind) -> usize {
        let before = self.live.len();
        self.live.retain(|_, t| t.target.layer != layer);
        let cancelled = before - self.live.len();
        self.compact_if_sparse();
        cancelled
    }

    pub fn pop_due(&mut self, now: Duration) -> Option<Task> {
        while let Some(&Reverse((due, raw))) = self.queue.peek() {
            if due > now {
                return None;
            }
            self.queue.pop();
            if let Some(task) = self.live.remove(&raw) {
                return Some(task);
            }
        }
        None
    }

    pub fn pending(&self) -> usize {
        self.live.len()
    }

    #[cfg(test)]
    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> {
        self.live.values()
    }

    fn compact_if_sparse(&mut self) {
        if self.queue.len() <= 64 || self.queue.len() <= self.live.len() * 2 {
            return;
        }
        let live = &self.live;
        self.queue.retain(|Reverse((_, raw))| live.contains_key(raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(layer: LayerKind, index: usize) -> CellRef {
        CellRef {
            layer,
            generation: 1,
            index,
        }
    }

    #[test]
    fn pops_in_due_order_then_schedule_order() {
        let mut s = Scheduler::new();
        let ms = Duration::from_millis;
        s.schedule(ms(20), cell(LayerKind::Trail, 0), Action::Mutate);
        s.schedule(ms(10), cell(LayerKind::Trail, 1), Action::Mutate);
        s.schedule(ms(10), cell(LayerKind::Trail, 2), Action::Mutate);

        assert!(s.pop_due(ms(5)).is_none());
        assert_eq!(s.pop_due(ms(10)).unwrap().target.index, 1);
        assert_eq!(s.pop_due(ms(10)).unwrap().target.index, 2);
        assert!(s.pop_due(ms(19)).is_none());
        assert_eq!(s.pop_due(ms(25)).unwrap().target.index, 0);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut s = Scheduler::new();
        let id = s.schedule(Duration::ZERO, cell(LayerKind::Art, 3), Action::Revert);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.pop_due(Duration::from_secs(1)).is_none());
    }

    #[test]
    fn cancel_layer_leaves_other_layers() {
        let mut s = Scheduler::new();
        for i in 0..100 {
            s.schedule(Duration::from_millis(i), cell(LayerKind::Trail, i as usize), Action::Mutate);
        }
        s.schedule(Duration::from_millis(7), cell(LayerKind::Art, 9), Action::Mutate);

        assert_eq!(s.cancel_layer(LayerKind::Trail), 100);
        assert_eq!(s.pending(), 1);
        let t = s.pop_due(Duration::from_secs(1)).unwrap();
        assert_eq!(t.target.layer, LayerKind::Art);
    }
}
