use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::raw::c_int;
use std::sync::atomic::{AtomicI32, Ordering};

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd;

use crate::error::{Error, PipeSnafu, SignalSnafu};
use snafu::ResultExt;

/// Write end of the self-pipe, set once before handlers are installed.
/// Signal handlers may only touch async-signal-safe state; a plain
/// `AtomicI32` global is the only way to reach it from a bare
/// `extern "C" fn`.
static SELF_PIPE_WRITE: AtomicI32 = AtomicI32::new(-1);

const WATCHED: [Signal; 4] = [
    Signal::SIGCHLD,
    Signal::SIGUSR1,
    Signal::SIGINT,
    Signal::SIGTERM,
];

extern "C" fn handler(sig: c_int) {
    let fd = SELF_PIPE_WRITE.load(Ordering::Relaxed);
    if fd < 0 {
        return;
    }
    let byte = sig as u8;
    unsafe {
        libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
    }
}

/// The self-pipe: its write end is touched only by signal handlers (one
/// single-byte write each); its read end participates in the
/// supervisor's readiness multiplex alongside the child's descriptors.
pub struct SelfPipe {
    pub read_fd: OwnedFd,
}

impl SelfPipe {
    /// Create the self-pipe and install handlers for SIGCHLD, SIGUSR1,
    /// SIGINT, and SIGTERM, each performing the single async-signal-safe
    /// action of posting its signal number into the pipe.
    pub fn install() -> Result<Self, Error> {
        let (read_fd, write_fd) = unistd::pipe().context(PipeSnafu)?;
        set_nonblocking(read_fd.as_raw_fd());
        set_nonblocking(write_fd.as_raw_fd());

        SELF_PIPE_WRITE.store(write_fd.as_raw_fd(), Ordering::Relaxed);
        // Leak the write end deliberately: it must outlive this function
        // and is only ever touched by signal handlers for the rest of
        // the process's life.
        std::mem::forget(write_fd);

        let action = SigAction::new(
            SigHandler::Handler(handler),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        for sig in WATCHED {
            unsafe { sigaction(sig, &action) }.context(SignalSnafu)?;
        }

        Ok(SelfPipe { read_fd })
    }

    pub fn raw_fd(&self) -> RawFd {
        self.read_fd.as_raw_fd()
    }

    /// Drain every pending signal byte, returning the distinct signals
    /// observed in the order they first appeared.
    pub fn drain(&self) -> Vec<Signal> {
        let mut seen = Vec::new();
        let mut byte = [0u8; 64];
        loop {
            let n = unsafe {
                libc::read(
                    self.raw_fd(),
                    byte.as_mut_ptr() as *mut libc::c_void,
                    byte.len(),
                )
            };
            if n <= 0 {
                break;
            }
            for &b in &byte[..n as usize] {
                if let Ok(sig) = Signal::try_from(b as c_int) {
                    if !seen.contains(&sig) {
                        seen.push(sig);
                    }
                }
            }
        }
        seen
    }
}

fn set_nonblocking(fd: RawFd) {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags >= 0 {
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
        }
    }
}
