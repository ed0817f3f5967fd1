use tracing::info;

use crate::pattern::PatternSet;

/// Counts matches of trigger patterns, then counts down a context
/// window, signaling the supervisor to dump once the countdown
/// reaches zero. See `spec.md` §4.6 for the exact state machine.
pub struct TriggerEngine {
    patterns: PatternSet,
    count: u32,
    context: u32,
}

impl TriggerEngine {
    pub fn new(patterns: PatternSet) -> Self {
        TriggerEngine {
            patterns,
            count: 1,
            context: 100,
        }
    }

    /// Configure (or re-arm) the trigger: `count` pattern hits required
    /// to arm, `context` subsequent log events retained before dumping.
    pub fn set_params(&mut self, count: u32, context: u32) {
        self.count = count;
        self.context = context;
    }

    pub fn has_triggers(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// Check one line against the trigger state machine. Returns `true`
    /// when it is time to dump.
    pub fn check(&mut self, line: &str) -> bool {
        if !self.has_triggers() {
            return false;
        }
        if self.context == 0 {
            return true;
        }
        if self.count > 0 {
            if let Some(pat) = self.patterns.contains_match(line) {
                info!(pattern = pat, "log triggered, pattern {}", pat);
                self.count -= 1;
            }
            return false;
        }
        self.context -= 1;
        self.context == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(count: u32, context: u32, patterns: &[&str]) -> TriggerEngine {
        let mut set = PatternSet::new(crate::pattern::MAX_TRIGGERS, "trigger");
        for p in patterns {
            set.add(*p);
        }
        let mut e = TriggerEngine::new(set);
        e.set_params(count, context);
        e
    }

    #[test]
    fn no_triggers_never_fires() {
        let mut e = engine(1, 2, &[]);
        assert!(!e.check("PANIC now"));
    }

    #[test]
    fn fires_after_count_matches_then_context_events() {
        let mut e = engine(1, 2, &["PANIC"]);
        assert!(!e.check("ok"));
        assert!(!e.check("ok"));
        assert!(!e.check("PANIC now")); // matched, count -> 0
        assert!(!e.check("ctx1")); // context 2 -> 1
        assert!(e.check("ctx2")); // context 1 -> 0, fire
    }

    #[test]
    fn degenerate_zero_context_fires_immediately() {
        let mut e = engine(1, 0, &["PANIC"]);
        assert!(e.check("anything"));
    }

    #[test]
    fn requires_count_matches_before_counting_context() {
        let mut e = engine(2, 1, &["PANIC"]);
        assert!(!e.check("PANIC"));
        assert!(!e.check("not it"));
        assert!(!e.check("PANIC")); // second match, count -> 0
        assert!(e.check("after")); // context 1 -> 0
    }
}
