//! Error types for the device bridge and the speech backends.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;

/// Errors that end the device reader or prevent startup.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Unable to open the softsynth device {}: {source}", .path.display())]
    OpenDevice { path: PathBuf, source: io::Error },

    #[error("Waiting on the softsynth device failed: {0}")]
    Poll(Errno),

    #[error("Read from softsynth failed: {0}")]
    Read(io::Error),

    #[error("Unable to create the shutdown pipe: {0}")]
    ShutdownPipe(Errno),

    #[error("Unknown synth backend: {0}")]
    UnknownBackend(String),
}

/// Errors from a single utterance. The worker logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("Failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("Failed to wait for the speech process: {0}")]
    Wait(io::Error),
}
