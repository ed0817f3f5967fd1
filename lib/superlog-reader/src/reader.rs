use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use crate::{COMPACT_MARGIN, SCRATCH_LEN};

/// A non-blocking, line-framing reader over one descriptor.
///
/// `PipeReader` owns the descriptor for its lifetime (closed on drop via
/// `OwnedFd`) and a fixed scratch buffer of unread bytes. It never
/// allocates once `SCRATCH_LEN` worth of buffer exists; a line longer
/// than the scratch is truncated rather than grown, per the line-reader
/// contract.
pub struct PipeReader {
    fd: OwnedFd,
    scratch: Vec<u8>,
    /// Index of the first unread byte.
    ptr: usize,
    /// Number of unread bytes starting at `ptr`.
    len: usize,
    eof: bool,
}

impl PipeReader {
    /// Wrap `fd`, switching it to non-blocking mode. `fd` is closed when
    /// the reader is dropped.
    pub fn new(fd: OwnedFd) -> io::Result<Self> {
        set_nonblocking(fd.as_raw_fd())?;
        Ok(PipeReader {
            fd,
            scratch: vec![0u8; SCRATCH_LEN],
            ptr: 0,
            len: 0,
            eof: false,
        })
    }

    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// True once the descriptor has returned EOF and no unread bytes remain.
    pub fn at_eof(&self) -> bool {
        self.eof && self.len == 0
    }

    /// Drain the descriptor greedily, then return the first complete line
    /// in the scratch buffer, if any. The returned slice borrows the
    /// reader's scratch buffer and is valid until the next call.
    ///
    /// A line without a trailing newline is held back (it may still be
    /// in flight); if the descriptor hits EOF with such a partial line
    /// pending, that partial line is discarded, matching the original
    /// behavior of dropping unterminated tails at EOF. A line that fills
    /// the scratch buffer without ever finding a newline is truncated and
    /// returned as-is so the descriptor never stalls; reading resumes
    /// immediately after the truncated portion.
    pub fn read_line(&mut self) -> io::Result<Option<&[u8]>> {
        self.drain()?;

        if let Some(nl) = memchr(b'\n', &self.scratch[self.ptr..self.ptr + self.len]) {
            let start = self.ptr;
            let end = start + nl;
            self.ptr += nl + 1;
            self.len -= nl + 1;
            return Ok(Some(&self.scratch[start..end]));
        }

        if self.at_eof() && self.len > 0 {
            // Unterminated tail at EOF: discarded, not returned.
            self.ptr = 0;
            self.len = 0;
            return Ok(None);
        }

        if self.ptr + self.len >= self.scratch.len() - 1 {
            // Scratch is full (capacity minus one byte) with no newline
            // anywhere in it: truncate here rather than stalling the
            // descriptor forever.
            let start = self.ptr;
            let end = self.ptr + self.len;
            self.ptr = 0;
            self.len = 0;
            return Ok(Some(&self.scratch[start..end]));
        }

        if self.ptr + self.len + COMPACT_MARGIN >= self.scratch.len() {
            self.scratch.copy_within(self.ptr..self.ptr + self.len, 0);
            self.ptr = 0;
        }

        Ok(None)
    }

    fn drain(&mut self) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }
        // One byte of the scratch buffer is always left unwritten, so a
        // maximally-full buffer is capacity minus one, per the
        // truncation contract in `read_line`.
        let capacity = self.scratch.len() - 1;
        loop {
            let tail_start = self.ptr + self.len;
            if tail_start >= capacity {
                break;
            }
            match raw_read(self.fd.as_raw_fd(), &mut self.scratch[tail_start..capacity]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => self.len += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn memchr(needle: u8, haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

fn raw_read(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
