use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;

/// Upper bound on registered exclude patterns; matches the original's
/// hard cap so capacity-exceeded is diagnosed the same way.
pub const MAX_EXCLUDES: usize = 100;

/// Upper bound on registered trigger patterns.
pub const MAX_TRIGGERS: usize = 20;

/// An ordered list of substring patterns with first-match lookup.
#[derive(Debug, Default, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    limit: usize,
    kind: &'static str,
}

impl PatternSet {
    pub fn new(limit: usize, kind: &'static str) -> Self {
        PatternSet {
            patterns: Vec::new(),
            limit,
            kind,
        }
    }

    /// Register a pattern. Logs a warning and drops the pattern if the
    /// set is already at capacity.
    pub fn add(&mut self, pattern: impl Into<String>) {
        if self.patterns.len() >= self.limit {
            warn!(
                kind = self.kind,
                limit = self.limit,
                "too many {} patterns registered, ignoring the rest",
                self.kind
            );
            return;
        }
        self.patterns.push(pattern.into());
    }

    /// Return the first pattern that is a substring of `line`, if any.
    pub fn contains_match<'a>(&'a self, line: &str) -> Option<&'a str> {
        self.patterns
            .iter()
            .find(|pat| line.contains(pat.as_str()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

/// Read one pattern per line from `path`. Trailing newlines are
/// stripped; blank lines are kept verbatim (no filtering beyond that).
pub fn load_patterns_from_file(path: &Path) -> io::Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        let mut set = PatternSet::new(MAX_EXCLUDES, "exclude");
        set.add("heartbeat");
        set.add("noisy");
        assert_eq!(set.contains_match("a heartbeat noisy line"), Some("heartbeat"));
        assert_eq!(set.contains_match("quiet line"), None);
    }

    #[test]
    fn drops_patterns_past_capacity() {
        let mut set = PatternSet::new(1, "trigger");
        set.add("a");
        set.add("b");
        assert_eq!(set.len(), 1);
        assert_eq!(set.contains_match("b"), None);
    }

    #[test]
    fn file_loader_keeps_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("excludes.txt");
        std::fs::write(&path, "one\n\ntwo\n").unwrap();
        let patterns = load_patterns_from_file(&path).unwrap();
        assert_eq!(patterns, vec!["one".to_string(), "".to_string(), "two".to_string()]);
    }
}
