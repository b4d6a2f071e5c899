use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Work deferred to a later point on the engine clock. Player-bound tasks
/// carry the slot's incarnation so a swapped-out character never receives
/// callbacks meant for its predecessor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeferredTask {
    CastJudgementCut { slot: usize, incarnation: u64 },
    RevealLines { slot: usize, incarnation: u64, count: Option<usize> },
    ShatterScreen { slot: usize, incarnation: u64 },
    BeginSlide { slot: usize, incarnation: u64 },
    ResumeGame,
}

#[derive(Clone, Debug)]
struct Scheduled {
    fire_at_ms: u64,
    seq: u64,
    task: DeferredTask,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at_ms == other.fire_at_ms && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at_ms
            .cmp(&other.fire_at_ms)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of deferred tasks ordered by due time, then insertion order.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: DeferredTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled {
            fire_at_ms: now_ms.saturating_add(delay_ms),
            seq,
            task,
        }));
    }

    /// Removes and returns every task due at or before `now_ms`, earliest first.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<DeferredTask> {
        let mut due = Vec::new();
        while let Some(Reverse(head)) = self.queue.peek() {
            if head.fire_at_ms > now_ms {
                break;
            }
            if let Some(Reverse(item)) = self.queue.pop() {
                due.push(item.task);
            }
        }
        due
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
