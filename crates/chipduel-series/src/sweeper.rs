//! Deadline-ordered timeout queue.
//!
//! One coordinator drains this queue instead of interval-scanning every
//! entity, so a deadline fires at most once. Handlers stay idempotent
//! regardless: a popped task whose entity already advanced is a no-op.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use chipduel_types::{DuelId, OrderId};

/// A scheduled timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineTask {
    /// A creator confirmation window lapses.
    ConfirmOrder { order_id: OrderId },
    /// A round submission window lapses.
    RoundDeadline { duel_id: DuelId, round_index: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    due: DateTime<Utc>,
    /// Tie-breaker so equal deadlines pop in scheduling order.
    seq: u64,
    task: DeadlineTask,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending deadlines.
pub struct DeadlineQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    next_seq: u64,
}

impl DeadlineQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule a task.
    pub fn push(&mut self, due: DateTime<Utc>, task: DeadlineTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(QueueEntry { due, seq, task }));
    }

    /// Pop the earliest task whose deadline has lapsed at `now`, if any.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<DeadlineTask> {
        match self.heap.peek() {
            Some(Reverse(entry)) if entry.due < now => {
                let Reverse(entry) = self.heap.pop()?;
                Some(entry.task)
            }
            _ => None,
        }
    }

    /// The earliest pending deadline, if any. Lets a driver sleep until
    /// something is actually due.
    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Default for DeadlineQueue {
    fn default() -> Self {
        Self::new()
    }
}
