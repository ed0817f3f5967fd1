use std::fs::File;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};
use nix::sys::signal::Signal;
use snafu::ResultExt;
use tracing::{info, warn};

use superlog_reader::PipeReader;

use crate::buffer::LogBuffer;
use crate::classifier;
use crate::config::Config;
use crate::dumper::{self, DumpOptions};
use crate::error::{Error, NonBlockingSnafu, OutputOpenSnafu, PollSnafu};
use crate::process;
use crate::signal::SelfPipe;
use crate::trigger::TriggerEngine;

const SELF_PIPE_TOKEN: Token = Token(usize::MAX);

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Run the supervisor to completion: spawn the child, drive the
/// readiness loop, and perform the final dump. Returns once the child
/// has exited or the operator has sent SIGINT/SIGTERM.
pub fn run(mut config: Config) -> Result<(), Error> {
    if let Some(pat) = &config.error_pattern {
        warn!(pattern = %pat, "-epat is accepted but not wired to a buffer; ignoring");
    }

    let argv = std::mem::take(&mut config.child);
    let spawned = process::spawn(&config.fds, &argv)?;
    let mut child = spawned.child;

    let mut readers = Vec::with_capacity(spawned.readers.len());
    for fd in spawned.readers {
        readers.push(PipeReader::new(fd).context(NonBlockingSnafu)?);
    }
    let fds = config.fds.clone();

    let self_pipe = SelfPipe::install()?;

    let mut poll = Poll::new().context(PollSnafu)?;
    let self_pipe_fd = self_pipe.raw_fd();
    poll.registry()
        .register(
            &mut SourceFd(&self_pipe_fd),
            SELF_PIPE_TOKEN,
            Interest::READABLE,
        )
        .context(PollSnafu)?;
    for (i, reader) in readers.iter().enumerate() {
        let raw = reader.raw_fd();
        poll.registry()
            .register(&mut SourceFd(&raw), Token(i), Interest::READABLE)
            .context(PollSnafu)?;
    }

    let mut buffers = vec![
        LogBuffer::alloc(Some(config.debug_pattern.clone()), 'D', config.debug_mb),
        LogBuffer::alloc(Some(config.info_pattern.clone()), 'I', config.info_mb),
        LogBuffer::alloc(Some(config.warn_pattern.clone()), 'W', config.other_mb),
    ];

    let mut trigger = TriggerEngine::new(config.trigger_patterns.clone());
    trigger.set_params(config.trigger_count, config.trigger_context);
    let mut triggered = false;

    let mut seq: u64 = 0;
    let mut events = Events::with_capacity(1 + readers.len());

    let dump_opts = DumpOptions {
        show_fds: config.show_fds,
        timestamps: config.timestamps,
        color: config.color,
    };
    if config.color != dumper::ColorMode::None {
        colored::control::set_override(true);
    }

    let mut output_sink = open_sink(&config)?;

    'main: loop {
        match poll.poll(&mut events, None) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Poll { source: e }),
        }

        let mut should_exit = false;

        for event in events.iter() {
            if event.token() == SELF_PIPE_TOKEN {
                for sig in self_pipe.drain() {
                    match sig {
                        Signal::SIGCHLD => {
                            info!("Child process has exited");
                            should_exit = true;
                        }
                        Signal::SIGUSR1 => {
                            dumper::dump(&mut buffers, &mut *output_sink, &dump_opts)
                                .map_err(|source| Error::OutputOpen {
                                    path: "<dump>".to_string(),
                                    source,
                                })?;
                        }
                        Signal::SIGINT | Signal::SIGTERM => {
                            info!("Received termination signal, exiting");
                            should_exit = true;
                        }
                        _ => {}
                    }
                }
            }
        }

        if should_exit {
            break 'main;
        }

        for i in 0..readers.len() {
            loop {
                let line = match readers[i].read_line() {
                    Ok(Some(line)) => line.to_vec(),
                    Ok(None) => break,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => return Err(Error::Poll { source: e }),
                };
                let line = String::from_utf8_lossy(&line).into_owned();

                if config.verbose {
                    let mut stdout = io::stdout();
                    let _ = writeln!(stdout, "{line}");
                }

                if config.excludes.contains_match(&line).is_some() {
                    continue;
                }
                if triggered {
                    continue;
                }

                seq += 1;
                let idx = classifier::classify(&buffers, &line);
                buffers[idx].append(seq, now_unix(), &line, fds[i]);

                if trigger.has_triggers() && trigger.check(&line) {
                    triggered = true;
                    info!("Triggered, dumping logs");
                    dumper::dump(&mut buffers, &mut *output_sink, &dump_opts).map_err(|source| {
                        Error::OutputOpen {
                            path: "<dump>".to_string(),
                            source,
                        }
                    })?;
                }
            }
        }
    }

    // Best-effort final drain: the child may have exited with bytes
    // still sitting in the pipes. `spec.md` §5 flags this as a SHOULD.
    drain_remaining(&mut readers, &fds, &config, &mut buffers, &mut trigger, &mut triggered, &mut seq);

    let _ = child.try_wait();

    info!("Finished, dumping logs");
    dumper::dump(&mut buffers, &mut *output_sink, &dump_opts).map_err(|source| {
        Error::OutputOpen {
            path: "<dump>".to_string(),
            source,
        }
    })?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn drain_remaining(
    readers: &mut [PipeReader],
    fds: &[i32],
    config: &Config,
    buffers: &mut [LogBuffer],
    trigger: &mut TriggerEngine,
    triggered: &mut bool,
    seq: &mut u64,
) {
    for i in 0..readers.len() {
        loop {
            let line = match readers[i].read_line() {
                Ok(Some(line)) => line.to_vec(),
                _ => break,
            };
            let line = String::from_utf8_lossy(&line).into_owned();
            if config.excludes.contains_match(&line).is_some() || *triggered {
                continue;
            }
            *seq += 1;
            let idx = classifier::classify(buffers, &line);
            buffers[idx].append(*seq, now_unix(), &line, fds[i]);
            if trigger.has_triggers() && trigger.check(&line) {
                *triggered = true;
            }
        }
    }
}

fn open_sink(config: &Config) -> Result<Box<dyn Write>, Error> {
    match &config.output {
        None => Ok(Box::new(io::stdout())),
        Some(path) => {
            let file = File::create(path).context(OutputOpenSnafu {
                path: path.display().to_string(),
            })?;
            Ok(Box::new(file))
        }
    }
}
