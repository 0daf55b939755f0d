//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls in production code
//! - The engine never reads a wall clock outside its runtime driver
//!
//! The helpers below walk the workspace source trees and report offending
//! lines. Test modules (everything from the first `#[cfg(test)]` onward) and
//! comments are ignored.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["engine/core/src", "engine/runner/src"];

/// A matching line in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the line
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Code portion of each production line, with its 1-based number.
///
/// Stops at the first `#[cfg(test)]`; strips `//` comments.
pub fn production_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
        .filter(|(_, code)| !code.trim().is_empty())
}

/// Scan every `.rs` file under `dir` for production lines matching `matcher`
pub fn scan_directory(dir: &Path, matcher: impl Fn(&str) -> bool) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !dir.exists() {
        return violations;
    }

    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
    {
        let Ok(content) = fs::read_to_string(entry.path()) else {
            continue;
        };
        for (line, code) in production_lines(&content) {
            if matcher(code) {
                violations.push(Violation {
                    path: entry.path().to_path_buf(),
                    line,
                    text: code.trim().to_string(),
                });
            }
        }
    }
    violations
}

/// Scan all production directories of the workspace
pub fn scan_production(matcher: impl Fn(&str) -> bool) -> Vec<Violation> {
    let root = workspace_root();
    PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| scan_directory(&root.join(dir), &matcher))
        .collect()
}

/// `thread::sleep(..)`, `time::sleep(..)`, `x.sleep(..)`
#[must_use]
pub fn is_sleep_call(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

/// `Instant::now()` or `SystemTime::now()`
#[must_use]
pub fn is_wall_clock_read(code: &str) -> bool {
    code.contains("Instant::now()") || code.contains("SystemTime::now()")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_detection() {
        assert!(is_sleep_call("    tokio::time::sleep(Duration::from_millis(10)).await;"));
        assert!(is_sleep_call("std::thread::sleep(d);"));
        assert!(!is_sleep_call("let mut heartbeat = tokio::time::interval(d);"));
    }

    #[test]
    fn test_production_lines_skip_tests_and_comments() {
        let source = "\
fn real() {
    // tokio::time::sleep(d) in a comment
    let x = 1; // trailing ::sleep( note
}

#[cfg(test)]
mod tests {
    fn t() { std::thread::sleep(d); }
}
";
        let lines: Vec<_> = production_lines(source).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|(_, code)| !is_sleep_call(code)));
        assert_eq!(lines[1].0, 3);
    }

    #[test]
    fn test_workspace_root_has_engine() {
        assert!(workspace_root().join("engine").exists());
    }
}
