/// Per-record bookkeeping overhead assumed for byte-budget accounting.
/// The original C struct carries a `next` pointer, a sequence number, a
/// timestamp, and two shorts of header before the line text; this is a
/// conservative stand-in used only to size buffers, not a real layout.
pub const RECORD_OVERHEAD: usize = 32;

/// One immutable-once-written line, addressed only by its slot inside
/// the owning [`crate::buffer::LogBuffer`].
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub seq: u64,
    pub time: i64,
    pub fd: i32,
    pub class: char,
    pub text: String,
}

impl LineRecord {
    /// Bytes this record counts against its buffer's budget.
    pub fn footprint(&self) -> usize {
        RECORD_OVERHEAD + self.text.len() + 1
    }
}
