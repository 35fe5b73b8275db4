//! speakup-rs: bridge between the speakup soft synth device and a speech
//! synthesizer.
//!
//! The reader thread decodes `/dev/softsynth` into a [`queue::CommandQueue`];
//! the [`runner::Runner`] speaks it. A flush marker in the stream stops the
//! runner through the [`coordinator::StopCoordinator`] handshake.

pub mod config;
pub mod coordinator;
pub mod decoder;
pub mod entry;
pub mod error;
pub mod queue;
pub mod reader;
pub mod runner;
pub mod shutdown;
pub mod synth;

pub use error::{BridgeError, SynthError};
