//! Voice parameters on the speakup scale and their espeak-ng equivalents.

use crate::config::VoiceConfig;
use crate::entry::{Adjust, Parameter};

const RATE_MULTIPLIER: u32 = 34;
const RATE_OFFSET: u32 = 84;
const PITCH_MULTIPLIER: u32 = 11;
const VOLUME_MULTIPLIER: u32 = 22;

/// How much punctuation the synthesizer reads out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunctuationLevel {
    None,
    Some,
    All,
}

/// Current voice parameters. Values use the speakup scale: 0-9, and 0-3 for
/// punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSettings {
    pub punctuation: u32,
    pub frequency: u32,
    pub pitch: u32,
    pub rate: u32,
    pub volume: u32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self::from(&VoiceConfig::default())
    }
}

impl From<&VoiceConfig> for VoiceSettings {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            punctuation: config.punctuation.min(Parameter::Punctuation.max_value()),
            frequency: config.frequency.min(Parameter::Frequency.max_value()),
            pitch: config.pitch.min(Parameter::Pitch.max_value()),
            rate: config.rate.min(Parameter::Rate.max_value()),
            volume: config.volume.min(Parameter::Volume.max_value()),
        }
    }
}

impl VoiceSettings {
    pub fn get(&self, parameter: Parameter) -> u32 {
        match parameter {
            Parameter::Punctuation => self.punctuation,
            Parameter::Frequency => self.frequency,
            Parameter::Pitch => self.pitch,
            Parameter::Rate => self.rate,
            Parameter::Volume => self.volume,
        }
    }

    fn slot(&mut self, parameter: Parameter) -> &mut u32 {
        match parameter {
            Parameter::Punctuation => &mut self.punctuation,
            Parameter::Frequency => &mut self.frequency,
            Parameter::Pitch => &mut self.pitch,
            Parameter::Rate => &mut self.rate,
            Parameter::Volume => &mut self.volume,
        }
    }

    /// Apply a parameter command and return the resulting value, clamped to
    /// the parameter's range.
    pub fn apply(&mut self, parameter: Parameter, mode: Adjust, value: u32) -> u32 {
        let slot = self.slot(parameter);
        let next = match mode {
            Adjust::Set => value,
            Adjust::Increment => slot.saturating_add(value),
            Adjust::Decrement => slot.saturating_sub(value),
        };
        *slot = next.min(parameter.max_value());
        *slot
    }

    pub fn words_per_minute(&self) -> u32 {
        self.rate * RATE_MULTIPLIER + RATE_OFFSET
    }

    /// espeak-ng pitch, 0-99.
    pub fn pitch_percent(&self) -> u32 {
        self.pitch * PITCH_MULTIPLIER
    }

    /// espeak-ng amplitude, 0-198.
    pub fn amplitude(&self) -> u32 {
        self.volume * VOLUME_MULTIPLIER
    }

    pub fn punctuation_level(&self) -> PunctuationLevel {
        match self.punctuation {
            0 => PunctuationLevel::None,
            3.. => PunctuationLevel::All,
            _ => PunctuationLevel::Some,
        }
    }
}
