//! Soft synth device reader.
//!
//! Waits on the device and the shutdown pipe with `poll(2)`, reads whatever
//! the kernel has buffered, applies the flush marker and feeds the rest to
//! the decoder. No lock is held while polling or reading.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::Arc;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tracing::{debug, info, trace};

use crate::coordinator::StopCoordinator;
use crate::decoder;
use crate::error::BridgeError;
use crate::queue::CommandQueue;
use crate::shutdown::ShutdownListener;

/// Bytes requested per read.
pub const READ_SIZE: usize = 1024;

/// Open the soft synth device read/write and non-blocking.
pub fn open_device(path: &Path) -> Result<File, BridgeError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(OFlag::O_NONBLOCK.bits())
        .open(path)
        .map_err(|source| BridgeError::OpenDevice {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Opened {}", path.display());
    Ok(file)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Device,
    Shutdown,
    /// Woken without device data (EINTR, spurious wake).
    Idle,
}

pub struct DeviceReader<D> {
    device: D,
    shutdown: ShutdownListener,
    queue: Arc<CommandQueue>,
    coordinator: StopCoordinator,
}

impl<D: Read + AsFd> DeviceReader<D> {
    pub fn new(
        device: D,
        shutdown: ShutdownListener,
        queue: Arc<CommandQueue>,
        coordinator: StopCoordinator,
    ) -> Self {
        Self {
            device,
            shutdown,
            queue,
            coordinator,
        }
    }

    /// Run until shutdown, end of stream or a fatal I/O error. Always shuts
    /// the queue down on exit so the worker can finish.
    pub fn run(mut self) -> Result<(), BridgeError> {
        info!("Reader started");
        let result = self.read_loop();
        self.queue.shutdown();
        info!("Reader stopped");
        result
    }

    fn read_loop(&mut self) -> Result<(), BridgeError> {
        let mut buf = [0u8; READ_SIZE];

        while self.queue.is_running() {
            match self.wait()? {
                Readiness::Shutdown => {
                    debug!("Shutdown signalled");
                    break;
                }
                Readiness::Idle => continue,
                Readiness::Device => {}
            }

            let length = match self.device.read(&mut buf) {
                Ok(0) => {
                    info!("Softsynth device reached end of stream");
                    break;
                }
                Ok(n) => n,
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                    continue
                }
                Err(e) => return Err(BridgeError::Read(e)),
            };
            trace!("Read {length} bytes");

            self.process(&buf[..length]);
        }

        Ok(())
    }

    fn wait(&self) -> Result<Readiness, BridgeError> {
        let ready = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
        let mut fds = [
            PollFd::new(self.device.as_fd(), PollFlags::POLLIN),
            PollFd::new(self.shutdown.as_fd(), PollFlags::POLLIN),
        ];

        match poll(&mut fds, PollTimeout::NONE) {
            Ok(_) => {}
            Err(Errno::EINTR) => return Ok(Readiness::Idle),
            Err(e) => return Err(BridgeError::Poll(e)),
        }

        let shutdown = fds[1].revents().unwrap_or(PollFlags::empty());
        if shutdown.intersects(ready) {
            return Ok(Readiness::Shutdown);
        }

        let device = fds[0].revents().unwrap_or(PollFlags::empty());
        if device.contains(PollFlags::POLLNVAL) {
            return Err(BridgeError::Poll(Errno::EBADF));
        }
        if device.intersects(ready) {
            Ok(Readiness::Device)
        } else {
            Ok(Readiness::Idle)
        }
    }

    /// Handle one read: a flush marker stops the worker and discards
    /// everything up to the last marker, the remainder is decoded.
    pub fn process(&self, bytes: &[u8]) {
        let pending = match decoder::after_last_flush(bytes) {
            Some(tail) => {
                debug!(
                    "Flush marker: discarding {} bytes",
                    bytes.len() - tail.len()
                );
                self.coordinator.request_stop();
                tail
            }
            None => bytes,
        };

        decoder::decode(pending, |entry| {
            self.queue.enqueue(entry);
        });
    }
}
