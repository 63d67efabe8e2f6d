use crate::config::MAX_LINE_BYTES;
use std::collections::VecDeque;

/// Splits a byte stream into newline-terminated lines.
///
/// Unlike a console reader, empty lines are kept: inside a sweep block an
/// empty line is a missing channel and must stay in position.
pub struct LineReader {
    partial: Vec<u8>,
    overflowed: bool,
    lines: VecDeque<String>,
}

impl LineReader {
    pub const fn new() -> Self {
        Self {
            partial: Vec::new(),
            overflowed: false,
            lines: VecDeque::new(),
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push_byte(byte);
        }
    }

    fn push_byte(&mut self, byte: u8) {
        if byte == b'\n' {
            let mut line = core::mem::take(&mut self.partial);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if self.overflowed {
                // An oversized line still occupies its slot in the block.
                self.overflowed = false;
                line.clear();
            }
            self.lines
                .push_back(String::from_utf8_lossy(&line).into_owned());
            return;
        }

        if self.overflowed {
            return;
        }

        if self.partial.len() < MAX_LINE_BYTES {
            self.partial.push(byte);
        } else {
            tracing::warn!("serial: line longer than {} bytes dropped", MAX_LINE_BYTES);
            self.partial.clear();
            self.overflowed = true;
        }
    }

    /// Number of complete lines waiting.
    pub fn complete_lines(&self) -> usize {
        self.lines.len()
    }

    /// Remove and return the first `count` lines, or nothing if fewer are complete.
    pub fn take_lines(&mut self, count: usize) -> Option<Vec<String>> {
        if self.lines.len() < count {
            return None;
        }
        Some(self.lines.drain(..count).collect())
    }

    pub fn clear(&mut self) {
        self.partial.clear();
        self.overflowed = false;
        self.lines.clear();
    }
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::LineReader;
    use crate::config::MAX_LINE_BYTES;

    #[test]
    fn emits_complete_line_on_newline() {
        let mut reader = LineReader::new();
        reader.push_bytes(b"AB");
        assert_eq!(reader.complete_lines(), 0);
        reader.push_bytes(b"\n");
        assert_eq!(reader.take_lines(1), Some(vec!["AB".to_string()]));
    }

    #[test]
    fn strips_carriage_return_and_keeps_empty_lines() {
        let mut reader = LineReader::new();
        reader.push_bytes(b"1,2\r\n\r\n&41.0\n");
        assert_eq!(
            reader.take_lines(3),
            Some(vec!["1,2".to_string(), String::new(), "&41.0".to_string()])
        );
    }

    #[test]
    fn take_is_all_or_nothing() {
        let mut reader = LineReader::new();
        reader.push_bytes(b"a\nb\nc");
        assert_eq!(reader.take_lines(3), None);
        assert_eq!(reader.complete_lines(), 2);
        reader.push_bytes(b"\n");
        assert_eq!(reader.take_lines(3).map(|l| l.len()), Some(3));
        assert_eq!(reader.complete_lines(), 0);
    }

    #[test]
    fn oversized_line_becomes_empty_slot() {
        let mut reader = LineReader::new();
        let long = vec![b'9'; MAX_LINE_BYTES + 10];
        reader.push_bytes(&long);
        reader.push_bytes(b"\nnext\n");
        assert_eq!(
            reader.take_lines(2),
            Some(vec![String::new(), "next".to_string()])
        );
    }

    #[test]
    fn clear_forgets_partial_input() {
        let mut reader = LineReader::new();
        reader.push_bytes(b"done\nhalf");
        reader.clear();
        reader.push_bytes(b"fresh\n");
        assert_eq!(reader.take_lines(1), Some(vec!["fresh".to_string()]));
    }
}
