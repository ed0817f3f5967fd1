use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command};

use nix::unistd;
use snafu::ResultExt;

use crate::config::MAX_FDS;
use crate::error::{Error, PipeSnafu, SpawnSnafu};

pub struct Spawned {
    pub child: Child,
    /// Read ends of the child's output pipes, in the same order as the
    /// `ofds` passed to [`spawn`]. Owned by the parent for the process's
    /// lifetime.
    pub readers: Vec<OwnedFd>,
}

/// Fork+exec `argv`, remapping pipe write ends onto `ofds` inside the
/// child before exec. `ofds[i]` is the descriptor the child will see;
/// the parent gets the corresponding read end back in `readers[i]`.
pub fn spawn(ofds: &[i32], argv: &[String]) -> Result<Spawned, Error> {
    assert!(!argv.is_empty(), "child command must be non-empty");
    let k = ofds.len();
    assert!(k <= MAX_FDS, "too many descriptors");

    let mut readers = Vec::with_capacity(k);
    let mut write_fds = [-1i32; MAX_FDS];
    let mut read_fds = [-1i32; MAX_FDS];
    let mut targets = [-1i32; MAX_FDS];

    for (i, &ofd) in ofds.iter().enumerate() {
        let (read_end, write_end) = unistd::pipe().context(PipeSnafu)?;
        read_fds[i] = read_end.as_raw_fd();
        write_fds[i] = write_end.as_raw_fd();
        targets[i] = ofd;
        readers.push(read_end);
        // The write end's lifetime is now owned by the raw fd table
        // above; it is closed explicitly in the child (after remap) or
        // in the parent (right after spawn), never by a Rust drop.
        std::mem::forget(write_end);
    }

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]);

    // SAFETY: the closure only calls async-signal-safe libc functions
    // (close/dup/dup2) and touches no Rust-managed allocations, so it
    // is sound to run between fork and exec.
    unsafe {
        cmd.pre_exec(move || {
            for fd in read_fds.iter().take(k).copied() {
                libc::close(fd);
            }
            remap_with_collision_resolution(&mut write_fds, &targets, k);
            Ok(())
        });
    }

    let child = cmd.spawn().context(SpawnSnafu)?;

    for fd in write_fds.iter().take(k).copied() {
        unsafe {
            libc::close(fd);
        }
    }

    Ok(Spawned { child, readers })
}

/// Remap each `write_fds[i]` onto `targets[i]` via `dup2`, relocating
/// any other pair's write end that currently occupies a target before
/// overwriting it. This is the permutation-resolution step `spec.md`
/// §4.7 and §9 call for: without it, remapping pair `i` could silently
/// clobber a descriptor pair `j` still needs.
fn remap_with_collision_resolution(write_fds: &mut [i32; MAX_FDS], targets: &[i32; MAX_FDS], k: usize) {
    for i in 0..k {
        let target = targets[i];
        for j in 0..k {
            if j != i && write_fds[j] == target {
                let relocated = unsafe { libc::dup(write_fds[j]) };
                unsafe {
                    libc::close(write_fds[j]);
                }
                write_fds[j] = relocated;
            }
        }
        if write_fds[i] != target {
            unsafe {
                libc::dup2(write_fds[i], target);
                libc::close(write_fds[i]);
            }
            write_fds[i] = target;
        }
    }
}
