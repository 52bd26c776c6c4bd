use core::fmt;

use crate::eol::Eol;

/// Where the input currently stands: an offset into the arena plus the global
/// byte/line/column counters.
///
/// Markers are plain values. A snapshot is an independent copy; restoring
/// one is a field-wise overwrite of the live marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    pub(crate) offset: usize,
    pub(crate) byte: usize,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            offset: 0,
            byte: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Marker {
    /// Offset of the next unconsumed byte inside the arena, as of the moment
    /// this marker was taken.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes consumed since the start of the input.
    pub fn byte(&self) -> usize {
        self.byte
    }

    /// 1-based.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Advances over `consumed`, counting `E::LINE_BYTE` occurrences as line
    /// breaks.
    pub(crate) fn bump<E: Eol>(&mut self, consumed: &[u8]) {
        self.offset += consumed.len();
        self.byte += consumed.len();
        match memchr::memrchr(E::LINE_BYTE, consumed) {
            Some(last) => {
                self.line += memchr::memchr_iter(E::LINE_BYTE, consumed).count();
                self.column = consumed.len() - last;
            }
            None => self.column += consumed.len(),
        }
    }

    pub(crate) fn bump_in_this_line(&mut self, count: usize) {
        self.offset += count;
        self.byte += count;
        self.column += count;
    }

    pub(crate) fn bump_to_next_line(&mut self, count: usize) {
        self.offset += count;
        self.byte += count;
        self.line += 1;
        self.column = 1;
    }
}

/// A diagnostic position: global counters plus the source label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position<S> {
    pub byte: usize,
    pub line: usize,
    pub column: usize,
    pub source: S,
}

impl<S> Position<S> {
    pub(crate) fn new(marker: &Marker, source: S) -> Self {
        Self {
            byte: marker.byte,
            line: marker.line,
            column: marker.column,
            source,
        }
    }
}

impl<S: fmt::Display> fmt::Display for Position<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}
