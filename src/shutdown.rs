//! Pipe-based shutdown signal for the device reader's poll loop.

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use nix::errno::Errno;
use nix::unistd;

use crate::error::BridgeError;

/// Write end: makes the listener readable.
pub struct ShutdownTrigger {
    fd: OwnedFd,
}

/// Read end: polled next to the device. Readable means stop.
pub struct ShutdownListener {
    fd: OwnedFd,
}

pub fn shutdown_channel() -> Result<(ShutdownTrigger, ShutdownListener), BridgeError> {
    let (read, write) = unistd::pipe().map_err(BridgeError::ShutdownPipe)?;
    Ok((ShutdownTrigger { fd: write }, ShutdownListener { fd: read }))
}

impl ShutdownTrigger {
    pub fn trigger(&self) -> Result<(), BridgeError> {
        loop {
            match unistd::write(&self.fd, &[1]) {
                Ok(_) => return Ok(()),
                Err(Errno::EINTR) => continue,
                // Listener already closed: the reader has stopped.
                Err(Errno::EPIPE) => return Ok(()),
                Err(e) => return Err(BridgeError::ShutdownPipe(e)),
            }
        }
    }
}

impl AsFd for ShutdownListener {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}
