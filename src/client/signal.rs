//! Readiness notification for event loops that cannot block on `retrieve`.
//!
//! The puller writes one byte into a pipe for every message it delivers. The
//! read end is exposed as a file descriptor, so a single-threaded consumer can
//! register it with `poll`/`epoll` (or tokio's `AsyncFd`) next to its other
//! inputs and call `consume` once per wakeup.
//!
//! The write end never blocks. Once the pipe buffer is full further
//! notifications are dropped; a consumer that falls that far behind sees the
//! handle stay readable and should drain with `try_retrieve` until empty.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};

use nix::fcntl::{FcntlArg, OFlag, fcntl};
use tracing::debug;

use crate::utils::{MqError, Result};

const SIGNAL_BYTE: u8 = 1;

/// Write end, owned by the engine and used only by the puller.
#[derive(Debug)]
pub struct Notifier {
    writer: File,
}

impl Notifier {
    /// Emits one readiness notification, unless the pipe is already full of
    /// unread ones.
    pub fn notify(&self) -> io::Result<()> {
        loop {
            match (&self.writer).write(&[SIGNAL_BYTE]) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    debug!("readiness pipe full, signal already pending");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Read end handed to the application's event loop.
#[derive(Debug)]
pub struct Readiness {
    reader: File,
}

impl Readiness {
    /// Consumes exactly one notification.
    ///
    /// Blocks until one is available unless the handle was switched to
    /// non-blocking mode, in which case an empty pipe yields
    /// `ErrorKind::WouldBlock`.
    pub fn consume(&self) -> io::Result<()> {
        let mut buf = [0u8; 1];
        loop {
            match (&self.reader).read(&mut buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "readiness channel closed",
                    ));
                }
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Switches the read end between blocking and non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        set_nonblocking(self.reader.as_raw_fd(), nonblocking)
    }
}

impl AsFd for Readiness {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.reader.as_fd()
    }
}

impl AsRawFd for Readiness {
    fn as_raw_fd(&self) -> RawFd {
        self.reader.as_raw_fd()
    }
}

fn set_nonblocking(fd: RawFd, nonblocking: bool) -> Result<()> {
    let bits = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| MqError::Signal(e.into()))?;
    let mut flags = OFlag::from_bits_truncate(bits);
    flags.set(OFlag::O_NONBLOCK, nonblocking);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|e| MqError::Signal(e.into()))?;
    Ok(())
}

/// Opens a new notification pipe with a non-blocking write end.
pub fn channel() -> Result<(Notifier, Readiness)> {
    let (read_fd, write_fd) = nix::unistd::pipe().map_err(|e| MqError::Signal(e.into()))?;
    set_nonblocking(write_fd.as_raw_fd(), true)?;
    Ok((
        Notifier {
            writer: File::from(write_fd),
        },
        Readiness {
            reader: File::from(read_fd),
        },
    ))
}
