//! Command queue shared by the device reader and the synthesis worker.
//!
//! One mutex guards the queued entries together with the `should_run` and
//! `runner_must_stop` flags, so the flush handshake in
//! [`crate::coordinator`] serializes with every enqueue and dequeue.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use crate::entry::QueueEntry;

pub(crate) struct QueueState {
    pub(crate) entries: VecDeque<QueueEntry>,
    pub(crate) should_run: bool,
    pub(crate) runner_must_stop: bool,
    pub(crate) stop_requests: u64,
}

/// Outcome of [`CommandQueue::dequeue_blocking`].
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued {
    Entry(QueueEntry),
    /// A flush is pending. Nothing was removed; the worker must stop audio
    /// and acknowledge before consuming again.
    StopRequested,
    Shutdown,
}

/// Unbounded FIFO of decoded work, plus the shared control flags.
pub struct CommandQueue {
    state: Mutex<QueueState>,
    pub(crate) runner_awake: Condvar,
    pub(crate) stop_acknowledged: Condvar,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                should_run: true,
                runner_must_stop: false,
                stop_requests: 0,
            }),
            runner_awake: Condvar::new(),
            stop_acknowledged: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry and wake the worker.
    ///
    /// Returns `false` when the entry could not be stored (allocation
    /// failure). The entry is dropped and the loss logged.
    pub fn enqueue(&self, entry: QueueEntry) -> bool {
        let mut state = self.lock();
        if let Err(e) = state.entries.try_reserve(1) {
            error!("Unable to allocate memory for queue entry, dropping {}: {e}", entry.describe());
            return false;
        }
        state.entries.push_back(entry);
        self.runner_awake.notify_one();
        true
    }

    /// Remove the oldest entry, blocking while the queue is empty.
    ///
    /// A pending stop request takes priority over queued entries.
    pub fn dequeue_blocking(&self) -> Dequeued {
        let mut state = self.lock();
        loop {
            if !state.should_run {
                return Dequeued::Shutdown;
            }
            if state.runner_must_stop {
                return Dequeued::StopRequested;
            }
            if let Some(entry) = state.entries.pop_front() {
                return Dequeued::Entry(entry);
            }
            state = self
                .runner_awake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_running(&self) -> bool {
        self.lock().should_run
    }

    /// Begin orderly shutdown. Wakes the worker and any thread waiting for a
    /// stop acknowledgement. Safe to call more than once.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        if state.should_run {
            debug!("Command queue shutting down ({} entries pending)", state.entries.len());
        }
        state.should_run = false;
        self.runner_awake.notify_all();
        self.stop_acknowledged.notify_all();
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
