use std::path::PathBuf;

use crate::cli::Cli;
use crate::dumper::ColorMode;
use crate::error::{ConfigurationSnafu, Error};
use crate::pattern::{self, PatternSet, MAX_EXCLUDES, MAX_TRIGGERS};

/// Hard cap on simultaneously-watched child descriptors, carried over
/// from the original's `MAX_FDS`.
pub const MAX_FDS: usize = 8;

pub struct Config {
    pub fds: Vec<i32>,
    pub debug_mb: u32,
    pub info_mb: u32,
    pub other_mb: u32,
    pub verbose: bool,
    pub show_fds: bool,
    pub timestamps: bool,
    pub color: ColorMode,
    pub debug_pattern: String,
    pub info_pattern: String,
    /// Pattern for the third ("other"/catch-all) buffer. Named `warn_`
    /// for historical reasons: the supervisor only maintains three
    /// buffers (debug, info, other), and the third is tagged 'W' and
    /// seeded from `-wpat`, matching the original three-buffer layout.
    pub warn_pattern: String,
    /// Accepted for CLI compatibility but not wired to a fourth buffer
    /// — the original implementation parses `-epat` and never uses it.
    /// `Some` only if the operator passed `-epat`; surfaced as a
    /// one-time warning by the supervisor so it isn't a silent no-op.
    pub error_pattern: Option<String>,
    pub excludes: PatternSet,
    pub trigger_patterns: PatternSet,
    pub trigger_count: u32,
    pub trigger_context: u32,
    pub output: Option<PathBuf>,
    pub child: Vec<String>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Config, Error> {
        let fds = if cli.fds.is_empty() {
            vec![2]
        } else {
            cli.fds
        };
        if fds.len() > MAX_FDS {
            return ConfigurationSnafu {
                message: format!("at most {MAX_FDS} descriptors may be watched"),
            }
            .fail();
        }
        for mb in [cli.debug_mb, cli.info_mb, cli.other_mb] {
            if mb > 20 {
                return ConfigurationSnafu {
                    message: "buffer sizes must be in 0..=20 MB".to_string(),
                }
                .fail();
            }
        }
        if cli.child.is_empty() {
            return ConfigurationSnafu {
                message: "missing child command after `--`".to_string(),
            }
            .fail();
        }

        let color = match (cli.color_by_severity, cli.color_by_fd) {
            (true, _) => ColorMode::BySeverity,
            (false, true) => ColorMode::ByFd,
            (false, false) => ColorMode::None,
        };

        let mut excludes = PatternSet::new(MAX_EXCLUDES, "exclude");
        for pat in cli.exclude {
            excludes.add(pat);
        }
        for path in &cli.exclude_file {
            let loaded = pattern::load_patterns_from_file(path).map_err(|source| {
                Error::Configuration {
                    message: format!(
                        "could not read exclude file {}: {source}",
                        path.display()
                    ),
                }
            })?;
            for pat in loaded {
                excludes.add(pat);
            }
        }

        let mut trigger_patterns = PatternSet::new(MAX_TRIGGERS, "trigger");
        for pat in cli.trigger {
            trigger_patterns.add(pat);
        }

        Ok(Config {
            fds,
            debug_mb: cli.debug_mb,
            info_mb: cli.info_mb,
            other_mb: cli.other_mb,
            verbose: cli.verbose,
            show_fds: cli.show_fds,
            timestamps: cli.timestamps,
            color,
            debug_pattern: cli.debug_pattern.unwrap_or_else(|| " debug ".to_string()),
            info_pattern: cli.info_pattern.unwrap_or_else(|| " info ".to_string()),
            warn_pattern: cli.warn_pattern.unwrap_or_else(|| " warning ".to_string()),
            error_pattern: cli.error_pattern,
            excludes,
            trigger_patterns,
            trigger_count: cli.trigger_count,
            trigger_context: cli.trigger_context,
            output: cli.output,
            child: cli.child,
        })
    }
}
