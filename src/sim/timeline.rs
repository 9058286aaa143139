//! Cancellable scheduled tasks
//!
//! Cues are polled from the frame loop against a wall clock instead of being
//! handed to detached timers, so whoever owns the timeline owns every pending
//! callback and can cancel it.

/// Handle for a scheduled cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct Scheduled<E> {
    id: TaskId,
    due_ms: f64,
    event: E,
}

/// Pending cues ordered by due time (ties broken by scheduling order)
#[derive(Debug, Clone)]
pub struct Timeline<E> {
    next_id: u64,
    pending: Vec<Scheduled<E>>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Schedule `event` to fire once the clock reaches `due_ms`
    pub fn schedule(&mut self, due_ms: f64, event: E) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        // Insert after every cue due at or before this one
        let at = self.pending.partition_point(|s| s.due_ms <= due_ms);
        self.pending.insert(at, Scheduled { id, due_ms, event });
        id
    }

    /// Cancel a pending cue. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.pending.iter().position(|s| s.id == id) {
            Some(i) => {
                self.pending.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove and return the earliest cue due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(TaskId, f64, E)> {
        if self.pending.first()?.due_ms <= now_ms {
            let s = self.pending.remove(0);
            Some((s.id, s.due_ms, s.event))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_due_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(300.0, "c");
        timeline.schedule(100.0, "a");
        timeline.schedule(200.0, "b");

        let fired: Vec<_> = std::iter::from_fn(|| timeline.pop_due(1000.0))
            .map(|(_, due, e)| (due, e))
            .collect();
        assert_eq!(fired, vec![(100.0, "a"), (200.0, "b"), (300.0, "c")]);
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_nothing_fires_early() {
        let mut timeline = Timeline::new();
        timeline.schedule(100.0, ());
        assert!(timeline.pop_due(99.9).is_none());
        assert!(timeline.pop_due(100.0).is_some());
    }

    #[test]
    fn test_ties_keep_scheduling_order() {
        let mut timeline = Timeline::new();
        timeline.schedule(50.0, 1);
        timeline.schedule(50.0, 2);
        assert_eq!(timeline.pop_due(50.0).map(|(_, _, e)| e), Some(1));
        assert_eq!(timeline.pop_due(50.0).map(|(_, _, e)| e), Some(2));
    }

    #[test]
    fn test_cancel() {
        let mut timeline = Timeline::new();
        let keep = timeline.schedule(10.0, "keep");
        let drop = timeline.schedule(20.0, "drop");
        assert!(timeline.cancel(drop));
        assert!(!timeline.cancel(drop));
        assert_eq!(timeline.len(), 1);

        let (id, _, event) = timeline.pop_due(100.0).unwrap();
        assert_eq!(id, keep);
        assert_eq!(event, "keep");
        assert!(!timeline.cancel(keep));
    }
}
