//! Stop/flush handshake between the device reader and the synthesis worker.
//!
//! RUNNING → STOP_REQUESTED → RUNNING
//!
//! The reader calls [`StopCoordinator::request_stop`] when it sees a flush
//! marker and blocks until the worker calls [`StopCoordinator::acknowledge`].
//! Shutdown releases a waiting reader without an acknowledgement.

use std::fmt;
use std::sync::{Arc, PoisonError};

use tracing::{debug, info};

use crate::queue::CommandQueue;
use crate::synth::Synth;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopState {
    Running,
    StopRequested,
}

impl fmt::Display for StopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "RUNNING"),
            Self::StopRequested => write!(f, "STOP_REQUESTED"),
        }
    }
}

/// Handle shared by the reader (requests) and the worker (acknowledges).
#[derive(Clone)]
pub struct StopCoordinator {
    queue: Arc<CommandQueue>,
    synth: Arc<dyn Synth>,
}

impl StopCoordinator {
    pub fn new(queue: Arc<CommandQueue>, synth: Arc<dyn Synth>) -> Self {
        Self { queue, synth }
    }

    pub fn state(&self) -> StopState {
        if self.queue.lock().runner_must_stop {
            StopState::StopRequested
        } else {
            StopState::Running
        }
    }

    /// Number of stop requests issued since startup.
    pub fn stop_requests(&self) -> u64 {
        self.queue.lock().stop_requests
    }

    /// Raise the stop flag, cancel in-flight audio and wait for the worker to
    /// acknowledge. Returns early if the queue is shut down meanwhile.
    ///
    /// The cancel is issued under the queue lock, so it can never land before
    /// the worker's re-arm for an earlier stop.
    ///
    /// There is no timeout: a worker that never acknowledges stalls the caller.
    pub fn request_stop(&self) {
        let mut state = self.queue.lock();
        state.runner_must_stop = true;
        state.stop_requests += 1;
        let request = state.stop_requests;
        self.synth.cancel();
        info!("State: {} → {} (flush #{request})", StopState::Running, StopState::StopRequested);
        self.queue.runner_awake.notify_one();

        while state.should_run && state.runner_must_stop {
            state = self
                .queue
                .stop_acknowledged
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.runner_must_stop {
            debug!("Flush #{request} abandoned: shutting down");
        } else {
            debug!("Flush #{request} acknowledged");
        }
    }

    /// Worker side: drop every queued entry, clear the stop flag, re-arm the
    /// synth and release the requester. Must be called once audio output has
    /// stopped. Returns the number of entries dropped.
    pub fn acknowledge(&self) -> usize {
        let mut state = self.queue.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.runner_must_stop = false;
        self.synth.reset();
        self.queue.stop_acknowledged.notify_one();
        info!(
            "State: {} → {} ({dropped} queued entries dropped)",
            StopState::StopRequested,
            StopState::Running
        );
        dropped
    }
}
