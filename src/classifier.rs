use crate::buffer::LogBuffer;

/// Choose the owning buffer for `line`: the first whose pattern matches
/// (or is absent), falling back to the last registered buffer if none
/// matched. Registration order doubles as priority, so the last buffer
/// SHOULD carry a `None` pattern for a predictable default.
pub fn classify(buffers: &[LogBuffer], line: &str) -> usize {
    debug_assert!(!buffers.is_empty(), "at least one buffer must be registered");
    buffers
        .iter()
        .position(|b| b.pattern_matches(line))
        .unwrap_or(buffers.len() - 1)
}
