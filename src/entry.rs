//! Work items passed from the device reader to the synthesis worker.

use std::fmt;

/// Voice parameter addressed by a `0x01 ... selector` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Punctuation,
    Frequency,
    Pitch,
    Rate,
    Volume,
}

impl Parameter {
    /// Map a selector byte (`b`, `f`, `p`, `s`, `v`) to its parameter.
    pub fn from_selector(byte: u8) -> Option<Self> {
        match byte {
            b'b' => Some(Self::Punctuation),
            b'f' => Some(Self::Frequency),
            b'p' => Some(Self::Pitch),
            b's' => Some(Self::Rate),
            b'v' => Some(Self::Volume),
            _ => None,
        }
    }

    pub fn selector(self) -> u8 {
        match self {
            Self::Punctuation => b'b',
            Self::Frequency => b'f',
            Self::Pitch => b'p',
            Self::Rate => b's',
            Self::Volume => b'v',
        }
    }

    /// Highest value accepted on the speakup scale.
    pub fn max_value(self) -> u32 {
        match self {
            Self::Punctuation => 3,
            _ => 9,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Punctuation => write!(f, "punctuation"),
            Self::Frequency => write!(f, "frequency"),
            Self::Pitch => write!(f, "pitch"),
            Self::Rate => write!(f, "rate"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

/// How a parameter value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjust {
    Set,
    Increment,
    Decrement,
}

/// A single unit of work for the synthesis worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEntry {
    /// Text to be spoken verbatim. `length` is the byte length of the source run.
    SpeakText { text: String, length: usize },
    /// Persistent change to a voice parameter.
    AdjustParameter {
        parameter: Parameter,
        mode: Adjust,
        value: u32,
    },
}

impl QueueEntry {
    /// Short description for log lines (never the full text).
    pub fn describe(&self) -> String {
        match self {
            Self::SpeakText { length, .. } => format!("text ({length} bytes)"),
            Self::AdjustParameter {
                parameter,
                mode,
                value,
            } => format!("{parameter} {mode:?} {value}"),
        }
    }
}
