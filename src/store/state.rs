//! Write queue and activity tracking for one store

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A pure function from the current document to the next one
pub type Updater<T> = Arc<dyn Fn(&T) -> T + Send + Sync>;

struct PendingWrite<T> {
    seq: u64,
    updater: Updater<T>,
}

/// FIFO of accepted writes whose remote half has not finished
///
/// `base` is the last value the cache converged to before the oldest
/// pending write was accepted. The cache always equals `base` with every
/// pending updater applied in order.
pub(crate) struct WriteQueue<T> {
    base: T,
    pending: VecDeque<PendingWrite<T>>,
    next_seq: u64,
    version: u64,
    draining: bool,
}

impl<T: Clone> WriteQueue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            base: initial,
            pending: VecDeque::new(),
            next_seq: 1,
            version: 0,
            draining: false,
        }
    }

    /// Enqueues a write accepted on top of `current`, returning its sequence number
    pub fn push(&mut self, current: &T, updater: Updater<T>) -> u64 {
        if self.pending.is_empty() {
            self.base = current.clone();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push_back(PendingWrite { seq, updater });
        seq
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Sequence number of the write whose cycle runs next
    pub fn front_seq(&self) -> Option<u64> {
        self.pending.front().map(|write| write.seq)
    }

    /// The oldest pending write applied to `base`
    pub fn front_local_state(&self) -> Option<T> {
        self.pending
            .front()
            .map(|write| (write.updater)(&self.base))
    }

    /// Removes the finished write and re-applies the remaining ones on top
    /// of `converged`, returning the value the cache must now hold
    pub fn complete(&mut self, seq: u64, converged: T) -> T {
        if self.front_seq() == Some(seq) {
            self.pending.pop_front();
        }
        self.base = converged;
        self.pending
            .iter()
            .fold(self.base.clone(), |value, write| (write.updater)(&value))
    }

    /// Incremented on every cache replacement
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Marks the drain task as running. Returns false if it already was.
    pub fn begin_drain(&mut self) -> bool {
        if self.draining {
            return false;
        }
        self.draining = true;
        true
    }

    /// Stops the drain if nothing is left. Returns whether it stopped.
    pub fn end_drain_if_empty(&mut self) -> bool {
        if self.pending.is_empty() {
            self.draining = false;
            true
        } else {
            false
        }
    }
}

/// Counts overlapping pulls and write drains
#[derive(Debug, Default)]
pub(crate) struct ActivityCounter {
    active: AtomicUsize,
}

impl ActivityCounter {
    pub fn enter(&self) -> ActivityGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        ActivityGuard {
            active: &self.active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }
}

pub(crate) struct ActivityGuard<'a> {
    active: &'a AtomicUsize,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
