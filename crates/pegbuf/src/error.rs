use thiserror::Error;

use crate::source::SourceError;

/// Hard faults raised by [`BufferInput`](crate::BufferInput).
///
/// Ordinary end-of-input is not an error: it shows up as zero available
/// bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A lookahead request does not fit in the arena, even after the one
    /// slack chunk beyond the declared maximum.
    #[error("overflow: {requested} bytes of lookahead exceed the buffer capacity of {capacity}")]
    Overflow { requested: usize, capacity: usize },
    #[error("byte source failed: {0}")]
    Source(#[from] SourceError),
    #[error("invalid buffer options: {0}")]
    InvalidOptions(&'static str),
    /// A marker refers to bytes that have already been compacted away.
    #[error("cannot rewind to byte {byte}: the buffer only retains bytes from {retained_from}")]
    RewindPastWindow { byte: usize, retained_from: usize },
    /// A span was requested from a marker that lies beyond the current
    /// position.
    #[error("marker at byte {byte} is ahead of the current position {current}")]
    MarkerAhead { byte: usize, current: usize },
}

/// A decoding action failed on a captured span.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {line}:{column}")]
pub struct UnescapeError {
    pub(crate) kind: UnescapeErrorKind,
    pub(crate) byte: usize,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl UnescapeError {
    pub fn kind(&self) -> &UnescapeErrorKind {
        &self.kind
    }

    pub fn byte(&self) -> usize {
        self.byte
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Whether the failure means the grammar and its action table disagree.
    ///
    /// Fatal errors must abort the parse; the buffer and output are not in a
    /// state the grammar anticipated.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, UnescapeErrorKind::ContractViolation(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnescapeErrorKind {
    #[error("invalid escaped unicode code point {0:#X}")]
    InvalidCodePoint(u32),
    #[error("grammar/action mismatch: {0}")]
    ContractViolation(#[from] ContractViolation),
}

/// An action received input its grammar rule should never have matched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("character {:?} has no mapping", char::from(*.0))]
    UnmappedCharacter(u8),
    #[error("byte {0:#04x} is not a hexadecimal digit")]
    NonHexDigit(u8),
    #[error("escape span of {len} bytes has the wrong shape")]
    MalformedSpan { len: usize },
}
