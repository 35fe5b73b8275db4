//! espeak-ng backend: one `espeak-ng` process per text run.
//!
//! The running child is kept so `cancel` can kill it from the reader thread
//! while `speak` is polling it from the worker thread.

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::voice::{PunctuationLevel, VoiceSettings};
use super::Synth;
use crate::config::SynthConfig;
use crate::error::SynthError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Symbols read out at the "some" punctuation level.
const SOME_PUNCTUATION: &str = "#$%&*+/<=>@\\^_|~";

pub struct EspeakSynth {
    program: String,
    voice: String,
    cancel_flag: AtomicBool,
    active_child: Mutex<Option<Child>>,
}

impl EspeakSynth {
    pub fn new(config: &SynthConfig) -> Self {
        info!("espeak-ng synth: program {}, voice {}", config.program, config.voice);
        Self {
            program: config.program.clone(),
            voice: config.voice.clone(),
            cancel_flag: AtomicBool::new(false),
            active_child: Mutex::new(None),
        }
    }

    fn child(&self) -> MutexGuard<'_, Option<Child>> {
        self.active_child.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Command-line arguments for one utterance, excluding the text.
    pub fn args(&self, voice: &VoiceSettings) -> Vec<String> {
        let mut args = vec![
            "-v".to_string(),
            self.voice.clone(),
            "-s".to_string(),
            voice.words_per_minute().to_string(),
            "-p".to_string(),
            voice.pitch_percent().to_string(),
            "-a".to_string(),
            voice.amplitude().to_string(),
        ];
        match voice.punctuation_level() {
            PunctuationLevel::None => {}
            PunctuationLevel::Some => args.push(format!("--punct={SOME_PUNCTUATION}")),
            PunctuationLevel::All => args.push("--punct".to_string()),
        }
        args
    }

    fn kill_active(&self) {
        if let Some(mut child) = self.child().take() {
            if let Err(e) = child.kill() {
                debug!("espeak-ng already exited: {e}");
            }
            match child.wait() {
                Ok(status) => debug!("espeak-ng stopped: {status}"),
                Err(e) => debug!("Unable to reap espeak-ng: {e}"),
            }
        }
    }
}

impl Synth for EspeakSynth {
    fn speak(&self, text: &str, voice: &VoiceSettings) -> Result<(), SynthError> {
        if self.cancel_flag.load(Ordering::SeqCst) {
            debug!("Skipping {} bytes: cancelled", text.len());
            return Ok(());
        }

        let child = Command::new(&self.program)
            .args(self.args(voice))
            .arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SynthError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        *self.child() = Some(child);

        loop {
            // A cancel that raced with the spawn is caught by the flag check.
            if self.cancel_flag.load(Ordering::SeqCst) {
                self.kill_active();
                debug!("Speech cancelled");
                return Ok(());
            }

            {
                let mut guard = self.child();
                let Some(child) = guard.as_mut() else {
                    // cancel() took and killed it
                    return Ok(());
                };
                match child.try_wait() {
                    Ok(Some(status)) => {
                        guard.take();
                        if !status.success() {
                            warn!("espeak-ng exited with {status}");
                        }
                        return Ok(());
                    }
                    Ok(None) => {}
                    Err(e) => {
                        guard.take();
                        return Err(SynthError::Wait(e));
                    }
                }
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
        self.kill_active();
    }

    fn reset(&self) {
        self.cancel_flag.store(false, Ordering::SeqCst);
    }
}
