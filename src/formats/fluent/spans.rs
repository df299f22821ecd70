//! Source span recovery for Fluent entries.
//!
//! The parsed AST does not carry byte offsets, so line positions are
//! recovered by walking the source in the same document order as the AST
//! body. The scanner keeps a cursor past the last consumed entry; each
//! lookup only ever moves forward.

/// Byte offsets delimiting one entry: attached-comment (or key) start, key
/// start, value start, and the end of the last entry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct EntrySpans {
    pub start: usize,
    pub key: usize,
    pub value: usize,
    pub end: usize,
}

/// Forward-only scanner over the lines of one Fluent source.
pub(super) struct SpanScanner<'a> {
    /// Per line: start offset, end offset (excluding the newline), text.
    lines: Vec<(usize, usize, &'a str)>,
    /// Index of the first line not yet consumed.
    next: usize,
}

impl<'a> SpanScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for (idx, c) in source.char_indices() {
            if c == '\n' {
                lines.push((start, idx, &source[start..idx]));
                start = idx + 1;
            }
        }
        lines.push((start, source.len(), &source[start..]));
        SpanScanner { lines, next: 0 }
    }

    /// Locates the next `name =` entry (with a `-` sigil for terms) and
    /// consumes it together with its indented continuation and attribute
    /// lines. When `has_comment` is set, the span start extends back over
    /// the directly preceding comment lines.
    pub fn entry(&mut self, name: &str, is_term: bool, has_comment: bool) -> EntrySpans {
        let sigil = if is_term { "-" } else { "" };
        let is_key_line = |text: &str| match text.strip_prefix(sigil).and_then(|t| t.strip_prefix(name)) {
            Some(rest) => rest.trim_start_matches([' ', '\t']).starts_with('='),
            None => false,
        };
        let key_idx = (self.next..self.lines.len())
            .find(|&i| is_key_line(self.lines[i].2))
            .unwrap_or_else(|| self.next.min(self.lines.len() - 1));
        let key_off = self.lines[key_idx].0;

        // Blank and indented lines following the key line belong to the
        // entry; trailing blank lines do not.
        let mut end_idx = key_idx;
        let mut next = key_idx + 1;
        while next < self.lines.len() {
            let text = self.lines[next].2;
            if text.trim().is_empty() {
                next += 1;
            } else if text.starts_with(' ') || text.starts_with('\t') {
                end_idx = next;
                next += 1;
            } else {
                break;
            }
        }

        let key_text = self.lines[key_idx].2;
        let after_eq = key_text.find('=').map(|p| p + 1).unwrap_or(key_text.len());
        let value_off = match key_text[after_eq..].find(|c: char| !c.is_whitespace()) {
            Some(p) => key_off + after_eq + p,
            None => (key_idx + 1..=end_idx)
                .find_map(|i| {
                    let (line_start, _, text) = self.lines[i];
                    text.find(|c: char| !c.is_whitespace()).map(|p| line_start + p)
                })
                .unwrap_or(key_off),
        };

        let mut start_off = key_off;
        if has_comment {
            let mut first = key_idx;
            while first > self.next && self.lines[first - 1].2.starts_with('#') {
                first -= 1;
            }
            start_off = self.lines[first].0;
        }

        self.next = next;
        EntrySpans {
            start: start_off,
            key: key_off,
            value: value_off,
            end: self.lines[end_idx].1,
        }
    }

    /// Locates and consumes the next comment block of exactly `level`
    /// leading `#` characters, returning its start and end offsets.
    pub fn comment_block(&mut self, level: usize) -> (usize, usize) {
        let is_marker = |text: &str| {
            let hashes = text.bytes().take_while(|&b| b == b'#').count();
            hashes == level && (text.len() == hashes || text.as_bytes()[hashes] == b' ')
        };
        match (self.next..self.lines.len()).find(|&i| is_marker(self.lines[i].2)) {
            Some(first) => {
                let mut last = first;
                while last + 1 < self.lines.len() && is_marker(self.lines[last + 1].2) {
                    last += 1;
                }
                self.next = last + 1;
                (self.lines[first].0, self.lines[last].1)
            }
            None => {
                let off = self
                    .lines
                    .get(self.next)
                    .map(|&(start, _, _)| start)
                    .unwrap_or(0);
                (off, off)
            }
        }
    }
}
