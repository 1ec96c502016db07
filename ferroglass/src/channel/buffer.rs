//! Pattern buffer with tail-only prompt search.
//!
//! Prompts are only looked for in the last `search_depth` bytes of the
//! buffer, so a large route table does not get rescanned on every read.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Buffer for accumulating output and searching its tail for a prompt.
///
/// Incoming bytes go through a VT parser: printable characters and the
/// line-structure controls (`\n`, `\r`, `\t`) are kept, escape sequences are
/// dropped. Parser state carries across reads, so a sequence split between
/// two packets is still removed.
pub struct PatternBuffer {
    buffer: BytesMut,
    search_depth: usize,
    parser: Parser,
}

/// Collects the text a terminal would print.
struct Printable<'a> {
    out: &'a mut BytesMut,
}

impl Perform for Printable<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.put_u8(byte);
        }
    }
}

impl PatternBuffer {
    /// Create a buffer that searches the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Append received data, stripping ANSI escape sequences.
    pub fn extend(&mut self, data: &[u8]) {
        let mut printable = Printable {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut printable, data);
    }

    /// Offset where the searched tail starts.
    fn tail_start(&self) -> usize {
        self.buffer.len().saturating_sub(self.search_depth)
    }

    /// First match of `pattern` in the tail, with offsets relative to the
    /// start of the tail.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(&self.buffer[self.tail_start()..])
    }

    /// End offset (in the whole buffer) of a prompt sitting at the end of the
    /// buffer.
    ///
    /// The last match in the tail counts only if nothing but whitespace
    /// follows it; a prompt-looking line in the middle of output is not a
    /// prompt.
    pub fn find_prompt(&self, pattern: &Regex) -> Option<usize> {
        let start = self.tail_start();
        let tail = &self.buffer[start..];
        let last = pattern.find_iter(tail).last()?;
        tail[last.end()..]
            .iter()
            .all(u8::is_ascii_whitespace)
            .then_some(start + last.end())
    }

    /// Remove and return everything up to `end`.
    pub fn take_through(&mut self, end: usize) -> Bytes {
        let end = end.min(self.buffer.len());
        self.buffer.split_to(end).freeze()
    }

    /// Remove and return the whole buffer.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    /// Buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}
