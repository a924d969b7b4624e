//! Source file bookkeeping for diagnostics
//!
//! Holds the compiled file's path and its split lines so diagnostics can
//! quote the offending source. One value per compilation, threaded by
//! reference through the pipeline.

use std::path::{Path, PathBuf};

/// The source text of the file currently being compiled, split into lines.
#[derive(Debug, Clone)]
pub struct SourceManager {
    path: PathBuf,
    lines: Vec<String>,
}

impl SourceManager {
    pub fn new(path: impl Into<PathBuf>, source: &str) -> Self {
        let lines = source.lines().map(|l| l.trim_end_matches('\r').to_string()).collect();
        SourceManager {
            path: path.into(),
            lines,
        }
    }

    /// Get a source line by 1-indexed line number.
    /// Returns an empty string for out-of-range lines.
    pub fn line(&self, line: usize) -> &str {
        if line == 0 {
            return "";
        }
        self.lines.get(line - 1).map(String::as_str).unwrap_or("")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path of the source file for diagnostic prefixes.
    /// Falls back to the stored path when canonicalization fails
    /// (e.g. in tests compiling from a string).
    pub fn path_string(&self) -> String {
        std::fs::canonicalize(&self.path)
            .unwrap_or_else(|_| self.path.clone())
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_one_indexed() {
        let sm = SourceManager::new("test.malin", "first\nsecond\nthird");
        assert_eq!(sm.line(1), "first");
        assert_eq!(sm.line(2), "second");
        assert_eq!(sm.line(3), "third");
        assert_eq!(sm.line_count(), 3);
    }

    #[test]
    fn test_out_of_range_line_is_empty() {
        let sm = SourceManager::new("test.malin", "only");
        assert_eq!(sm.line(0), "");
        assert_eq!(sm.line(2), "");
    }

    #[test]
    fn test_carriage_returns_are_stripped() {
        let sm = SourceManager::new("test.malin", "a\r\nb\r\n");
        assert_eq!(sm.line(1), "a");
        assert_eq!(sm.line(2), "b");
    }
}
