use bstr::BStr;

use crate::{
    error::{UnescapeError, UnescapeErrorKind},
    marker::{Marker, Position},
};

/// A matched span `[begin, current)` lent to a decoding action.
///
/// Borrowed straight out of the arena: as long as an `ActionInput` is alive
/// its [`BufferInput`](crate::BufferInput) cannot be compacted.
#[derive(Debug, Clone, Copy)]
pub struct ActionInput<'a, S> {
    bytes: &'a [u8],
    begin: Marker,
    source: &'a S,
}

impl<'a, S> ActionInput<'a, S> {
    /// Wraps `bytes` as if they had been matched starting at `begin`.
    pub fn new(bytes: &'a [u8], begin: Marker, source: &'a S) -> Self {
        Self {
            bytes,
            begin,
            source,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn as_bstr(&self) -> &'a BStr {
        BStr::new(self.bytes)
    }

    pub fn to_str(&self) -> Result<&'a str, core::str::Utf8Error> {
        core::str::from_utf8(self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Marker at the first byte of the span.
    pub fn begin(&self) -> &Marker {
        &self.begin
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn position(&self) -> Position<&'a S> {
        Position::new(&self.begin, self.source)
    }

    pub(crate) fn error(&self, kind: impl Into<UnescapeErrorKind>) -> UnescapeError {
        UnescapeError {
            kind: kind.into(),
            byte: self.begin.byte,
            line: self.begin.line,
            column: self.begin.column,
        }
    }
}
