use clap::Parser;

/// Collect output logs from another program.
///
/// Positional integers before `--` name the descriptors the child will
/// write to (default: just fd 2). Everything after `--` is the child's
/// command and argv.
#[derive(Debug, Parser)]
#[command(name = "superlog", version)]
pub struct Cli {
    /// Mb allocated for "debug" messages (0 => 1000-byte test mode)
    #[arg(short = 'd', value_name = "N", default_value_t = 2)]
    pub debug_mb: u32,

    /// Mb allocated for "info" messages (0 => 1000-byte test mode)
    #[arg(short = 'i', value_name = "N", default_value_t = 2)]
    pub info_mb: u32,

    /// Mb allocated for all other messages (0 => 1000-byte test mode)
    #[arg(short = 'b', value_name = "N", default_value_t = 2)]
    pub other_mb: u32,

    /// Also echo messages to stdout in real time
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Prefix each dumped line with its originating fd
    #[arg(short = 'f')]
    pub show_fds: bool,

    /// Prefix each dumped line with a timestamp
    #[arg(short = 't')]
    pub timestamps: bool,

    /// Color dumped lines by originating fd
    #[arg(short = 'c')]
    pub color_by_fd: bool,

    /// Color dumped lines by severity
    #[arg(short = 'C')]
    pub color_by_severity: bool,

    /// Add a trigger pattern; dump fires `-Tn` events after it is seen
    #[arg(long = "Ts", value_name = "STR")]
    pub trigger: Vec<String>,

    /// Number of subsequent log events to retain before dumping
    #[arg(long = "Tn", value_name = "N", default_value_t = 100)]
    pub trigger_context: u32,

    /// Number of times the trigger needs to be seen before arming
    #[arg(long = "Tc", value_name = "N", default_value_t = 1)]
    pub trigger_count: u32,

    /// Substring that denotes a debug line
    #[arg(long = "dpat", value_name = "STR")]
    pub debug_pattern: Option<String>,

    /// Substring that denotes an info line
    #[arg(long = "ipat", value_name = "STR")]
    pub info_pattern: Option<String>,

    /// Substring that denotes a warning line
    #[arg(long = "wpat", value_name = "STR")]
    pub warn_pattern: Option<String>,

    /// Substring that denotes an error line
    #[arg(long = "epat", value_name = "STR")]
    pub error_pattern: Option<String>,

    /// Add a line to the exclusion patterns
    #[arg(short = 'x', value_name = "STR")]
    pub exclude: Vec<String>,

    /// Read exclusion patterns from FILE, one per line
    #[arg(short = 'X', value_name = "FILE")]
    pub exclude_file: Vec<std::path::PathBuf>,

    /// Write the dump to FILE instead of stdout
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<std::path::PathBuf>,

    /// Descriptors the child will write to (default: just fd 2)
    #[arg(value_name = "FD")]
    pub fds: Vec<i32>,

    /// Child command and its arguments, after `--`
    #[arg(last = true, value_name = "CMD")]
    pub child: Vec<String>,
}
