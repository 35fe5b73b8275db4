//! Speech synthesizer backends driven by the [`crate::runner::Runner`].
//!
//! - `espeak`: espeak-ng subprocess per text run, killable mid-utterance
//! - `voice`: speakup parameter model and its espeak-ng mapping
//! - [`LogSynth`]: writes text to the log instead of speaking it

pub mod espeak;
pub mod voice;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::config::SynthConfig;
use crate::error::{BridgeError, SynthError};
use voice::VoiceSettings;

/// A speech backend shared between the worker (speak) and the reader (cancel).
pub trait Synth: Send + Sync {
    /// Speak `text` and block until it is finished or cancelled.
    fn speak(&self, text: &str, voice: &VoiceSettings) -> Result<(), SynthError>;

    /// Stop audio immediately. Any `speak` in progress, or started before the
    /// next [`Synth::reset`], returns without producing audio.
    fn cancel(&self);

    /// Re-arm after a stop has been acknowledged.
    fn reset(&self);
}

/// Build the backend named in the config.
pub fn from_config(config: &SynthConfig) -> Result<Arc<dyn Synth>, BridgeError> {
    match config.backend.as_str() {
        "espeak-ng" | "espeak" => Ok(Arc::new(espeak::EspeakSynth::new(config))),
        "log" => Ok(Arc::new(LogSynth::default())),
        other => Err(BridgeError::UnknownBackend(other.to_string())),
    }
}

/// Backend without audio, for running against the device without a speaker.
#[derive(Default)]
pub struct LogSynth {
    cancelled: AtomicBool,
}

impl Synth for LogSynth {
    fn speak(&self, text: &str, voice: &VoiceSettings) -> Result<(), SynthError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(());
        }
        info!(
            "speak (rate {}, pitch {}, frequency {}, volume {}, punctuation {}): {text}",
            voice.rate, voice.pitch, voice.frequency, voice.volume, voice.punctuation
        );
        Ok(())
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Records spoken text and counts cancellations.
    #[derive(Default)]
    pub struct RecordingSynth {
        pub spoken: Mutex<Vec<(String, VoiceSettings)>>,
        cancels: AtomicUsize,
        resets: AtomicUsize,
    }

    impl RecordingSynth {
        pub fn cancel_count(&self) -> usize {
            self.cancels.load(Ordering::SeqCst)
        }

        pub fn reset_count(&self) -> usize {
            self.resets.load(Ordering::SeqCst)
        }

        pub fn texts(&self) -> Vec<String> {
            self.spoken
                .lock()
                .unwrap()
                .iter()
                .map(|(text, _)| text.clone())
                .collect()
        }
    }

    impl Synth for RecordingSynth {
        fn speak(&self, text: &str, voice: &VoiceSettings) -> Result<(), SynthError> {
            self.spoken.lock().unwrap().push((text.to_string(), *voice));
            Ok(())
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }

        fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }
}
