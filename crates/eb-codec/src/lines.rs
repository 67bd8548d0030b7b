//! Line-numbered input and output streams.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

use crate::error::CodecError;

/// Reads trimmed, non-blank lines and remembers where each came from.
///
/// Blank lines separate items and sections; they are counted for line
/// numbers but never returned.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    line: usize,
    peeked: Option<(usize, String)>,
}

impl<R: BufRead> LineReader<R> {
    /// Wraps a buffered reader.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            peeked: None,
        }
    }

    /// Returns the number of physical lines consumed so far.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.line
    }

    fn read_non_blank(&mut self) -> Result<Option<(usize, String)>, CodecError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.inner.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = buf.trim();
            if !text.is_empty() {
                return Ok(Some((self.line, text.to_owned())));
            }
        }
    }

    /// Returns the next non-blank line without consuming it.
    pub fn peek(&mut self) -> Result<Option<&str>, CodecError> {
        if self.peeked.is_none() {
            self.peeked = self.read_non_blank()?;
        }
        Ok(self.peeked.as_ref().map(|(_, text)| text.as_str()))
    }

    /// Returns the next non-blank line with its line number.
    pub fn next_line(&mut self) -> Result<Option<(usize, String)>, CodecError> {
        match self.peeked.take() {
            Some(line) => Ok(Some(line)),
            None => self.read_non_blank(),
        }
    }

    /// Returns the next non-blank line, failing if the input has ended.
    pub fn expect(&mut self, expected: &str) -> Result<(usize, String), CodecError> {
        self.next_line()?
            .ok_or_else(|| CodecError::eof(self.line, expected))
    }
}

/// Writes lines and counts them, so write-side failures can name a line.
#[derive(Debug)]
pub struct LineWriter<W> {
    inner: W,
    line: usize,
}

impl<W: Write> LineWriter<W> {
    /// Wraps a writer.
    pub const fn new(inner: W) -> Self {
        Self { inner, line: 0 }
    }

    /// Returns the number of lines written so far.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.line
    }

    /// Writes one line followed by a newline.
    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        self.line += 1;
        writeln!(self.inner, "{text}")
    }

    /// Writes an empty separator line.
    pub fn blank(&mut self) -> io::Result<()> {
        self.line += 1;
        self.inner.write_all(b"\n")
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_lines_and_counts_them() {
        let mut reader = LineReader::new("first\n\n   \r\nsecond\r\n".as_bytes());
        assert_eq!(reader.next_line().unwrap(), Some((1, "first".to_owned())));
        assert_eq!(reader.next_line().unwrap(), Some((4, "second".to_owned())));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut reader = LineReader::new("a\nb\n".as_bytes());
        assert_eq!(reader.peek().unwrap(), Some("a"));
        assert_eq!(reader.peek().unwrap(), Some("a"));
        assert_eq!(reader.next_line().unwrap().map(|(_, t)| t), Some("a".to_owned()));
        assert_eq!(reader.peek().unwrap(), Some("b"));
    }

    #[test]
    fn test_expect_at_eof() {
        let mut reader = LineReader::new("only\n".as_bytes());
        reader.expect("anything").unwrap();
        let err = reader.expect("[End]").unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedEof { line: 1, .. }));
    }

    #[test]
    fn test_writer_counts_lines() {
        let mut out = Vec::new();
        let mut writer = LineWriter::new(&mut out);
        writer.line("one").unwrap();
        writer.blank().unwrap();
        writer.line(2).unwrap();
        assert_eq!(writer.line_number(), 3);
        assert_eq!(String::from_utf8(out).unwrap(), "one\n\n2\n");
    }
}
