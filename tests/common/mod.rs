//! Instrumented speech backend shared by the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use speakup_rs::synth::voice::VoiceSettings;
use speakup_rs::synth::Synth;
use speakup_rs::SynthError;

/// Text containing this marker blocks in `speak` until cancelled.
pub const HOLD: &str = "<hold>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SpeakStarted(String),
    /// Audio for this text has stopped (finished or cut off).
    SpeakFinished(String),
    Cancel,
    Reset,
    /// Recorded by a test once `request_stop` returned.
    StopReturned,
}

#[derive(Default)]
struct Gate {
    cancelled: bool,
}

#[derive(Default)]
pub struct ScriptedSynth {
    events: Mutex<Vec<Event>>,
    spoken: Mutex<Vec<(String, VoiceSettings)>>,
    gate: Mutex<Gate>,
    cancelled: Condvar,
    /// Slept after raising a cancel and before clearing it on reset, to widen
    /// the window between the two.
    pause: Duration,
}

impl ScriptedSynth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_pause(pause: Duration) -> Arc<Self> {
        Arc::new(Self {
            pause,
            ..Self::default()
        })
    }

    fn pause(&self) {
        if !self.pause.is_zero() {
            std::thread::sleep(self.pause);
        }
    }

    pub fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }

    pub fn spoken(&self) -> Vec<(String, VoiceSettings)> {
        self.spoken.lock().unwrap().clone()
    }

    /// Poll until `check` holds, failing the test after five seconds.
    pub fn wait_until(&self, what: &str, check: impl Fn(&Self) -> bool) {
        let start = Instant::now();
        while !check(self) {
            assert!(start.elapsed() < Duration::from_secs(5), "timed out waiting for {what}");
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

impl Synth for ScriptedSynth {
    fn speak(&self, text: &str, voice: &VoiceSettings) -> Result<(), SynthError> {
        self.record(Event::SpeakStarted(text.to_string()));
        if text.contains(HOLD) {
            let mut gate = self.gate.lock().unwrap();
            while !gate.cancelled {
                gate = self.cancelled.wait(gate).unwrap();
            }
            drop(gate);
            self.record(Event::SpeakFinished(text.to_string()));
            return Ok(());
        }
        if self.gate.lock().unwrap().cancelled {
            self.record(Event::SpeakFinished(text.to_string()));
            return Ok(());
        }
        self.spoken.lock().unwrap().push((text.to_string(), *voice));
        self.record(Event::SpeakFinished(text.to_string()));
        Ok(())
    }

    fn cancel(&self) {
        self.gate.lock().unwrap().cancelled = true;
        self.cancelled.notify_all();
        self.record(Event::Cancel);
        self.pause();
    }

    fn reset(&self) {
        self.pause();
        self.gate.lock().unwrap().cancelled = false;
        self.record(Event::Reset);
    }
}
