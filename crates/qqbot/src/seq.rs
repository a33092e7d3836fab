//! Per-reply-target `msg_seq` counters.
//!
//! The platform rejects a second reply to the same inbound message unless it
//! carries a fresh `msg_seq`, so every reply target gets its own counter.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use tracing::debug;

/// Tracked reply targets before a sweep kicks in.
pub const MAX_TRACKED_TARGETS: usize = 1000;

/// Oldest reply targets dropped by one sweep.
pub const EVICTION_BATCH: usize = 500;

#[derive(Default)]
struct SeqState {
    counters: HashMap<String, u64>,
    /// Insertion order of `counters` keys, oldest first.
    order: VecDeque<String>,
}

impl SeqState {
    fn evict_oldest(&mut self, count: usize) {
        for _ in 0..count {
            let Some(id) = self.order.pop_front() else {
                break;
            };
            self.counters.remove(&id);
        }
    }
}

/// Bounded map of reply-target message id to last issued sequence number.
///
/// Eviction is by insertion order, not recency: a busy conversation whose
/// first reply is old enough loses its counter and restarts at 1.
#[derive(Default)]
pub struct SeqTracker {
    state: Mutex<SeqState>,
}

impl SeqTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number for `reply_target_id`, starting at 1.
    pub fn next_seq(&self, reply_target_id: &str) -> u64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(counter) = state.counters.get_mut(reply_target_id) {
            *counter += 1;
            return *counter;
        }

        if state.counters.len() >= MAX_TRACKED_TARGETS {
            state.evict_oldest(EVICTION_BATCH);
            debug!(
                evicted = EVICTION_BATCH,
                remaining = state.counters.len(),
                "evicted oldest msg_seq counters"
            );
        }

        state.counters.insert(reply_target_id.to_string(), 1);
        state.order.push_back(reply_target_id.to_string());
        1
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .counters
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn peek(&self, reply_target_id: &str) -> Option<u64> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .counters
            .get(reply_target_id)
            .copied()
    }
}
