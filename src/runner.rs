//! Synthesis worker: drains the command queue into the speech backend.
//!
//! Honours the stop handshake: on a pending stop it silences the backend and
//! acknowledges, which drops everything queued before the flush and re-arms
//! the backend before consuming again.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::coordinator::StopCoordinator;
use crate::entry::QueueEntry;
use crate::queue::{CommandQueue, Dequeued};
use crate::synth::voice::VoiceSettings;
use crate::synth::Synth;

pub struct Runner {
    queue: Arc<CommandQueue>,
    coordinator: StopCoordinator,
    synth: Arc<dyn Synth>,
    voice: VoiceSettings,
}

impl Runner {
    pub fn new(
        queue: Arc<CommandQueue>,
        coordinator: StopCoordinator,
        synth: Arc<dyn Synth>,
        voice: VoiceSettings,
    ) -> Self {
        Self {
            queue,
            coordinator,
            synth,
            voice,
        }
    }

    /// Consume entries until shutdown. Returns the final voice settings.
    pub fn run(mut self) -> VoiceSettings {
        info!("Runner started");
        loop {
            match self.queue.dequeue_blocking() {
                Dequeued::Entry(entry) => self.process(entry),
                Dequeued::StopRequested => {
                    self.synth.cancel();
                    let dropped = self.coordinator.acknowledge();
                    debug!("Stop handled, {dropped} entries discarded");
                }
                Dequeued::Shutdown => break,
            }
        }
        info!("Runner stopped");
        self.voice
    }

    fn process(&mut self, entry: QueueEntry) {
        match entry {
            QueueEntry::SpeakText { text, length } => {
                debug!("Speaking {length} bytes");
                if let Err(e) = self.synth.speak(&text, &self.voice) {
                    warn!("Speech failed: {e}");
                }
            }
            QueueEntry::AdjustParameter {
                parameter,
                mode,
                value,
            } => {
                let now = self.voice.apply(parameter, mode, value);
                debug!("{parameter} {mode:?} {value} → {now}");
            }
        }
    }
}
