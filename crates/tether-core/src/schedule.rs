//! Deferred one-shot tasks fired on a future simulation tick
//!
//! Each mechanic owns its own queue, so cancelling everything in a queue
//! cancels exactly that mechanic's pending work.

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    /// Scheduling order, breaks deadline ties
    seq: u64,
    remaining: f32,
    task: T,
}

/// A queue of delayed one-shot tasks
#[derive(Debug, Clone)]
pub struct DelayedTasks<T> {
    next_seq: u64,
    pending: Vec<ScheduledTask<T>>,
}

impl<T> Default for DelayedTasks<T> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> DelayedTasks<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to fire once `delay` seconds have elapsed
    pub fn schedule(&mut self, delay: f32, task: T) {
        self.pending.push(ScheduledTask {
            seq: self.next_seq,
            remaining: delay.max(0.0),
            task,
        });
        self.next_seq += 1;
    }

    /// Cancel every pending task, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Advance time by `dt` and return the tasks that came due,
    /// earliest deadline first (ties in scheduling order)
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        for scheduled in &mut self.pending {
            scheduled.remaining -= dt;
        }

        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].remaining <= 0.0 {
                due.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }

        due.sort_by(|a, b| {
            a.remaining
                .total_cmp(&b.remaining)
                .then_with(|| a.seq.cmp(&b.seq))
        });
        due.into_iter().map(|scheduled| scheduled.task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_fires_after_delay() {
        let mut tasks = DelayedTasks::new();
        tasks.schedule(0.15, "launch");

        assert!(tasks.advance(0.1).is_empty());
        assert_eq!(tasks.advance(0.1), vec!["launch"]);
        assert!(tasks.advance(1.0).is_empty());
    }

    #[test]
    fn test_due_tasks_ordered_by_deadline() {
        let mut tasks = DelayedTasks::new();
        tasks.schedule(0.3, 2);
        tasks.schedule(0.1, 1);
        tasks.schedule(0.1, 3);

        assert_eq!(tasks.advance(1.0), vec![1, 3, 2]);
    }

    #[test]
    fn test_cancel_all() {
        let mut tasks = DelayedTasks::new();
        tasks.schedule(0.1, 'a');
        tasks.schedule(0.2, 'b');
        assert_eq!(tasks.cancel_all(), 2);
        assert_eq!(tasks.cancel_all(), 0);
        assert!(tasks.advance(1.0).is_empty());
    }
}
