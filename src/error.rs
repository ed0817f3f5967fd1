use snafu::Snafu;

/// Top-level error type. Each variant maps to one of the exit codes in
/// the CLI contract (0 normal, 2 usage, 3 system, 4 output file).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{message}"))]
    Configuration { message: String },

    #[snafu(display("failed to create pipe: {source}"))]
    Pipe { source: nix::Error },

    #[snafu(display("failed to spawn child process: {source}"))]
    Spawn { source: std::io::Error },

    #[snafu(display("failed to mark descriptor non-blocking: {source}"))]
    NonBlocking { source: std::io::Error },

    #[snafu(display("failed to install signal handler: {source}"))]
    Signal { source: nix::Error },

    #[snafu(display("readiness wait failed: {source}"))]
    Poll { source: std::io::Error },

    #[snafu(display("failed to open output file {path}: {source}"))]
    OutputOpen {
        path: String,
        source: std::io::Error,
    },
}

/// Exit codes per `spec.md` §6. The `exitcode` crate's named constants
/// are sysexits.h values (e.g. `EX_USAGE` = 64), not these; the CLI
/// contract calls for the literal values 2/3/4, so they're defined here
/// instead of borrowed from that crate.
mod exit_codes {
    pub const USAGE: i32 = 2;
    pub const SETUP: i32 = 3;
    pub const OUTPUT_OPEN: i32 = 4;
}

impl Error {
    /// Process exit code per the CLI contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration { .. } => exit_codes::USAGE,
            Error::Pipe { .. }
            | Error::Spawn { .. }
            | Error::NonBlocking { .. }
            | Error::Signal { .. }
            | Error::Poll { .. } => exit_codes::SETUP,
            Error::OutputOpen { .. } => exit_codes::OUTPUT_OPEN,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
