//! Mapping from character offsets to 1-based source line numbers.
//!
//! Used by the Fluent front end to attach [`LinePos`] spans to entries,
//! sections, and comments.

use crate::types::LinePos;

/// Precomputed newline index over one source buffer.
#[derive(Debug)]
pub struct LinePosMapper {
    len: usize,
    newlines: Vec<usize>,
}

impl LinePosMapper {
    pub fn new(source: &str) -> Self {
        LinePosMapper {
            len: source.len(),
            newlines: source
                .char_indices()
                .filter_map(|(idx, c)| (c == '\n').then_some(idx))
                .collect(),
        }
    }

    /// Returns the 1-based line number containing `offset`.
    ///
    /// The very end of a source with no newline at all is treated as an
    /// implicit final line boundary.
    pub fn get_line(&self, offset: usize) -> u32 {
        if self.newlines.is_empty() && offset >= self.len {
            return 2;
        }
        self.newlines.partition_point(|&nl| nl <= offset) as u32 + 1
    }

    /// Builds a [`LinePos`] from four offsets, reusing the line number of an
    /// earlier boundary when two offsets are equal.
    pub fn get_linepos(&self, start: usize, key: usize, value: usize, end: usize) -> LinePos {
        let start_line = self.get_line(start);
        let key_line = if key == start {
            start_line
        } else {
            self.get_line(key)
        };
        let value_line = if value == key {
            key_line
        } else {
            self.get_line(value)
        };
        LinePos {
            start: start_line,
            key: key_line,
            value: value_line,
            end: self.get_line(end),
        }
    }
}
