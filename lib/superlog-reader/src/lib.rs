//! Non-blocking, line-framing reader over a single raw descriptor.
//!
//! Generalized from a file-tailing watcher (which has to cope with log
//! rotation and truncation) down to the simpler case of a pipe: a pipe
//! read end never rotates or shrinks underneath the reader, it just
//! produces bytes until the write end closes.

mod reader;

pub use reader::PipeReader;

/// Scratch buffer capacity. Must be at least 2 KiB per the line-reader
/// contract; 8 KiB keeps the common case (one read drains one syscall)
/// without growing the buffer.
pub const SCRATCH_LEN: usize = 8192;

/// When the unread tail comes within this many bytes of `SCRATCH_LEN`,
/// the reader compacts the remaining partial line to the front instead
/// of risking truncation on the next read.
pub const COMPACT_MARGIN: usize = 100;
