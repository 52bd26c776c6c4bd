//! Line-terminator policies.
//!
//! A policy answers two questions: which byte ends a line for eager
//! line/column tracking ([`Eol::LINE_BYTE`]), and how wide the terminator at
//! the front of a byte slice is ([`Eol::match_eol`]). Only
//! [`BufferInput::consume`](crate::BufferInput::consume) and
//! [`BufferInput::consume_eol`](crate::BufferInput::consume_eol) consult it.

/// A pluggable recognizer of line terminators.
pub trait Eol {
    /// The byte that advances the line counter when consumed.
    const LINE_BYTE: u8;

    /// Longest terminator this policy recognizes, in bytes.
    const MAX_WIDTH: usize;

    /// Width of the terminator starting at `bytes[0]`, or `None` if the slice
    /// does not start with one.
    ///
    /// `bytes` may be shorter than [`Eol::MAX_WIDTH`] near end-of-input; a
    /// shorter match is then preferred over none.
    fn match_eol(bytes: &[u8]) -> Option<usize>;
}

/// `\n`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lf;

/// `\r`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cr;

/// `\r\n`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crlf;

/// `\n` or `\r\n`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LfCrlf;

/// `\r` or `\n`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrLf;

/// `\r` or `\r\n`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrCrlf;

/// `\r`, `\n` or `\r\n`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrLfCrlf;

impl Eol for Lf {
    const LINE_BYTE: u8 = b'\n';
    const MAX_WIDTH: usize = 1;

    fn match_eol(bytes: &[u8]) -> Option<usize> {
        (bytes.first() == Some(&b'\n')).then_some(1)
    }
}

impl Eol for Cr {
    const LINE_BYTE: u8 = b'\r';
    const MAX_WIDTH: usize = 1;

    fn match_eol(bytes: &[u8]) -> Option<usize> {
        (bytes.first() == Some(&b'\r')).then_some(1)
    }
}

impl Eol for Crlf {
    const LINE_BYTE: u8 = b'\n';
    const MAX_WIDTH: usize = 2;

    fn match_eol(bytes: &[u8]) -> Option<usize> {
        bytes.starts_with(b"\r\n").then_some(2)
    }
}

impl Eol for LfCrlf {
    const LINE_BYTE: u8 = b'\n';
    const MAX_WIDTH: usize = 2;

    fn match_eol(bytes: &[u8]) -> Option<usize> {
        match bytes {
            [b'\n', ..] => Some(1),
            [b'\r', b'\n', ..] => Some(2),
            _ => None,
        }
    }
}

impl Eol for CrLf {
    const LINE_BYTE: u8 = b'\n';
    const MAX_WIDTH: usize = 1;

    fn match_eol(bytes: &[u8]) -> Option<usize> {
        matches!(bytes.first(), Some(b'\r' | b'\n')).then_some(1)
    }
}

impl Eol for CrCrlf {
    const LINE_BYTE: u8 = b'\r';
    const MAX_WIDTH: usize = 2;

    fn match_eol(bytes: &[u8]) -> Option<usize> {
        match bytes {
            [b'\r', b'\n', ..] => Some(2),
            [b'\r', ..] => Some(1),
            _ => None,
        }
    }
}

impl Eol for CrLfCrlf {
    const LINE_BYTE: u8 = b'\n';
    const MAX_WIDTH: usize = 2;

    fn match_eol(bytes: &[u8]) -> Option<usize> {
        match bytes {
            [b'\r', b'\n', ..] => Some(2),
            [b'\r' | b'\n', ..] => Some(1),
            _ => None,
        }
    }
}
