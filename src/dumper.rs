use std::io::{self, Write};

use colored::{Color, Colorize};

use crate::buffer::LogBuffer;
use crate::record::LineRecord;

/// Color policy for dumped lines. Mirrors the original's three modes:
/// off, palette-indexed by originating fd, and fixed by severity tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    None,
    ByFd,
    BySeverity,
}

const PALETTE: [Color; 7] = [
    Color::Black,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

fn palette_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

fn severity_color(tag: char) -> Color {
    match tag {
        'D' => palette_color(4), // blue
        'I' => palette_color(2), // green
        'W' => palette_color(3), // yellow
        'E' => palette_color(1), // red
        _ => palette_color(0),   // black
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DumpOptions {
    pub show_fds: bool,
    pub timestamps: bool,
    pub color: ColorMode,
}

fn color_for(opts: &DumpOptions, record: &LineRecord) -> Option<Color> {
    match opts.color {
        ColorMode::None => None,
        ColorMode::ByFd => Some(palette_color((record.fd - 1).max(0) as usize)),
        ColorMode::BySeverity => Some(severity_color(record.class)),
    }
}

fn format_timestamp(unix_secs: i64) -> String {
    // `YYYY-MM-DD HH:MM:SS ` in local time, trailing space, using only
    // libc's localtime_r to avoid pulling in a calendar-math dependency
    // purely for this one call site.
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    let t = unix_secs as libc::time_t;
    unsafe {
        libc::localtime_r(&t, &mut tm);
    }
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} ",
        tm.tm_year + 1900,
        tm.tm_mon + 1,
        tm.tm_mday,
        tm.tm_hour,
        tm.tm_min,
        tm.tm_sec
    )
}

fn emit_one(sink: &mut dyn Write, opts: &DumpOptions, record: &LineRecord) -> io::Result<()> {
    if opts.show_fds {
        write!(sink, "{} ", record.fd)?;
    }
    if opts.timestamps {
        write!(sink, "{}", format_timestamp(record.time))?;
    }
    match color_for(opts, record) {
        Some(color) => writeln!(sink, "{}", record.text.color(color)),
        None => writeln!(sink, "{}", record.text),
    }
}

/// Produce a unified, sequence-ordered transcript across all buffers,
/// then clear every buffer. This is the only blocking-write point in
/// the supervisor; nothing else can run input concurrently with it.
pub fn dump(buffers: &mut [LogBuffer], sink: &mut dyn Write, opts: &DumpOptions) -> io::Result<()> {
    let n = buffers.len();
    let mut candidates: Vec<Option<LineRecord>> = Vec::with_capacity(n);
    for buf in buffers.iter_mut() {
        buf.begin();
        candidates.push(buf.next().cloned());
    }

    loop {
        let winner = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|r| (i, r.seq)))
            .min_by_key(|(i, seq)| (*seq, *i));

        let Some((idx, _)) = winner else { break };

        let record = candidates[idx].take().unwrap();
        emit_one(sink, opts, &record)?;
        candidates[idx] = buffers[idx].next().cloned();
    }

    sink.flush()?;
    for buf in buffers.iter_mut() {
        buf.clear();
    }
    Ok(())
}
