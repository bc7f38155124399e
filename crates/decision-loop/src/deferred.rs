//! Deferred decision queue
//!
//! Keyed by due step, earliest first. When several decisions are due at
//! once, the most recently queued one is released and the rest are dropped.

use meridian_core::{Decision, Step};
use priority_queue::PriorityQueue;
use std::cmp::Reverse;

/// A queued decision, unique by sequence number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Queued {
    seq: u64,
    decision: Decision,
}

#[derive(Debug, Clone)]
pub struct DeferredQueue {
    queue: PriorityQueue<Queued, Reverse<(Step, u64)>>,
    next_seq: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue a decision for execution at `due`
    pub fn push(&mut self, due: Step, decision: Decision) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Queued { seq, decision }, Reverse((due, seq)));
    }

    /// Earliest due step, if anything is queued
    pub fn next_due(&self) -> Option<Step> {
        self.queue.peek().map(|(_, Reverse((due, _)))| *due)
    }

    /// Remove everything due at or before `step`
    ///
    /// Returns the most recently queued of them; older ones are superseded.
    pub fn pop_due(&mut self, step: Step) -> Option<Decision> {
        let mut latest: Option<Queued> = None;
        while self.next_due().is_some_and(|due| due <= step) {
            let Some((queued, _)) = self.queue.pop() else {
                break;
            };
            if latest.as_ref().is_none_or(|l| queued.seq > l.seq) {
                latest = Some(queued);
            }
        }
        latest.map(|q| q.decision)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new()
    }
}
