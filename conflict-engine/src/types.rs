//! Core types for the conflict engine.

use std::fmt;
use std::str::FromStr;

/// Marker opening a conflict block (our side follows).
pub const START_MARKER: &str = "<<<<<<<";
/// Marker opening the diff3 base section.
pub const BASE_MARKER: &str = "|||||||";
/// Marker separating our side from theirs.
pub const SEPARATOR_MARKER: &str = "=======";
/// Marker closing a conflict block.
pub const END_MARKER: &str = ">>>>>>>";

/// Which side of a conflict block survives resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Keep the lines between the start marker and the separator.
    Ours,
    /// Keep the lines between the separator and the end marker.
    Theirs,
}

impl Strategy {
    pub fn as_str(&self) -> &str {
        match self {
            Strategy::Ours => "ours",
            Strategy::Theirs => "theirs",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown conflict strategy `{0}` (expected `ours` or `theirs`)")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ours" => Ok(Strategy::Ours),
            "theirs" => Ok(Strategy::Theirs),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Location of one complete conflict block in a document.
///
/// Line numbers are 1-based and inclusive, covering the marker lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictRegion {
    pub start_line: usize,
    pub end_line: usize,
    pub ours_lines: usize,
    pub base_lines: usize,
    pub theirs_lines: usize,
}

impl ConflictRegion {
    /// Total number of lines the block spans, markers included.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}
