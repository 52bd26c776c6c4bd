//! Decoding actions for escape sequences in matched spans.
//!
//! Each action reads an [`ActionInput`] and appends decoded bytes to an
//! output buffer. The grammar is responsible for matching only well-formed
//! spans: a span an action cannot interpret (a non-hex digit, an unmapped
//! character, a wrong length) is reported as a [`ContractViolation`], which
//! [`UnescapeError::is_fatal`] flags as a grammar/action mismatch rather than
//! bad input. Bad input that the grammar cannot rule out syntactically, such
//! as a surrogate code point, is reported as
//! [`UnescapeErrorKind::InvalidCodePoint`].
//!
//! On failure nothing is appended: `out` is truncated back to its length at
//! the start of the call.
//!
//! ```rust
//! use pegbuf::{
//!     ActionInput, Marker,
//!     unescape::{Remap, Unescape, UnescapeJ},
//! };
//!
//! const ESCAPES: Remap = Remap::new(b"nt\\\"", b"\n\t\\\"");
//!
//! let mut out = Vec::new();
//! ESCAPES.apply(&ActionInput::new(b"n", Marker::default(), &"doc"), &mut out)?;
//! UnescapeJ.apply(&ActionInput::new(br"ud83d\ude00", Marker::default(), &"doc"), &mut out)?;
//! assert_eq!(out, "\n😀".as_bytes());
//! # Ok::<(), pegbuf::UnescapeError>(())
//! ```

use alloc::vec::Vec;

use crate::{
    action::ActionInput,
    error::{ContractViolation, UnescapeError, UnescapeErrorKind},
};

/// Width of one JSON-style escape: a marker byte plus four hex digits, with
/// the backslash that introduces the next one.
const J_STRIDE: usize = 6;

/// A decoding action applied to a matched span.
pub trait Unescape {
    fn apply<S>(&self, input: &ActionInput<'_, S>, out: &mut Vec<u8>) -> Result<(), UnescapeError>;
}

/// Appends `code_point` encoded as UTF-8.
///
/// Returns `false`, appending nothing, for UTF-16 surrogates and values
/// above `0x10FFFF`.
pub fn append_utf8(out: &mut Vec<u8>, code_point: u32) -> bool {
    let Some(ch) = char::from_u32(code_point) else {
        return false;
    };
    let mut tmp = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
    true
}

/// Value of one ASCII hexadecimal digit.
pub fn unhex(digit: u8) -> Result<u8, ContractViolation> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(ContractViolation::NonHexDigit(digit)),
    }
}

/// Big-endian value of a run of hex digits. More than eight digits keep the
/// low 32 bits.
pub fn unhex_bytes(digits: &[u8]) -> Result<u32, ContractViolation> {
    digits
        .iter()
        .try_fold(0u32, |acc, &d| -> Result<u32, ContractViolation> {
            Ok((acc << 4) | u32::from(unhex(d)?))
        })
}

/// Copies the span unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendAll;

impl Unescape for AppendAll {
    fn apply<S>(&self, input: &ActionInput<'_, S>, out: &mut Vec<u8>) -> Result<(), UnescapeError> {
        out.extend_from_slice(input.as_bytes());
        Ok(())
    }
}

/// Maps a one-byte span through parallel tables of escapable characters and
/// their replacements.
///
/// Build it in a `const` so a table length mismatch fails at compile time.
#[derive(Debug, Clone, Copy)]
pub struct Remap {
    from: &'static [u8],
    to: &'static [u8],
}

impl Remap {
    /// # Panics
    ///
    /// If the tables differ in length.
    pub const fn new(from: &'static [u8], to: &'static [u8]) -> Self {
        assert!(
            from.len() == to.len(),
            "size mismatch between escaped characters and their mappings"
        );
        Self { from, to }
    }

    /// The replacement for `c`, if it is in the table.
    pub fn map(&self, c: u8) -> Option<u8> {
        let i = memchr::memchr(c, self.from)?;
        Some(self.to[i])
    }
}

impl Unescape for Remap {
    fn apply<S>(&self, input: &ActionInput<'_, S>, out: &mut Vec<u8>) -> Result<(), UnescapeError> {
        let &[c] = input.as_bytes() else {
            return Err(input.error(ContractViolation::MalformedSpan { len: input.len() }));
        };
        let mapped = self
            .map(c)
            .ok_or_else(|| input.error(ContractViolation::UnmappedCharacter(c)))?;
        out.push(mapped);
        Ok(())
    }
}

/// `x41` → byte `0x41`: hex digits after a one-byte marker, appended as a
/// single raw byte (digits beyond two keep the low byte).
#[derive(Debug, Clone, Copy, Default)]
pub struct UnescapeX;

impl Unescape for UnescapeX {
    fn apply<S>(&self, input: &ActionInput<'_, S>, out: &mut Vec<u8>) -> Result<(), UnescapeError> {
        let digits = after_marker(input)?;
        let value = digits
            .iter()
            .try_fold(0u8, |acc, &d| -> Result<u8, ContractViolation> {
                Ok((acc << 4) | unhex(d)?)
            })
            .map_err(|e| input.error(e))?;
        out.push(value);
        Ok(())
    }
}

/// `u1F600` → UTF-8 of U+1F600: hex digits after a one-byte marker form one
/// code point.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnescapeU;

impl UnescapeU {
    /// Non-raising variant: `Ok(false)` for an invalid code point, `Err` only
    /// for grammar/action mismatches.
    pub fn try_apply<S>(
        &self,
        input: &ActionInput<'_, S>,
        out: &mut Vec<u8>,
    ) -> Result<bool, UnescapeError> {
        let code_point = unhex_bytes(after_marker(input)?).map_err(|e| input.error(e))?;
        Ok(append_utf8(out, code_point))
    }
}

impl Unescape for UnescapeU {
    fn apply<S>(&self, input: &ActionInput<'_, S>, out: &mut Vec<u8>) -> Result<(), UnescapeError> {
        let code_point = unhex_bytes(after_marker(input)?).map_err(|e| input.error(e))?;
        if append_utf8(out, code_point) {
            Ok(())
        } else {
            Err(input.error(UnescapeErrorKind::InvalidCodePoint(code_point)))
        }
    }
}

/// One or more consecutive `\uXXXX` escapes, starting at the first `u`.
///
/// A high surrogate directly followed by a low surrogate is merged into one
/// supplementary code point, as RFC 8259 requires for JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnescapeJ;

impl UnescapeJ {
    /// Non-raising variant: `Ok(false)` for an unpaired surrogate, `Err` only
    /// for grammar/action mismatches. Nothing is appended on `Ok(false)`.
    pub fn try_apply<S>(
        &self,
        input: &ActionInput<'_, S>,
        out: &mut Vec<u8>,
    ) -> Result<bool, UnescapeError> {
        let start = out.len();
        match decode_j(input.as_bytes(), out) {
            Ok(()) => Ok(true),
            Err(JError::InvalidCodePoint(_)) => {
                out.truncate(start);
                Ok(false)
            }
            Err(JError::Contract(e)) => {
                out.truncate(start);
                Err(input.error(e))
            }
        }
    }
}

impl Unescape for UnescapeJ {
    fn apply<S>(&self, input: &ActionInput<'_, S>, out: &mut Vec<u8>) -> Result<(), UnescapeError> {
        let start = out.len();
        decode_j(input.as_bytes(), out).map_err(|e| {
            out.truncate(start);
            match e {
                JError::InvalidCodePoint(cp) => input.error(UnescapeErrorKind::InvalidCodePoint(cp)),
                JError::Contract(e) => input.error(e),
            }
        })
    }
}

enum JError {
    InvalidCodePoint(u32),
    Contract(ContractViolation),
}

impl From<ContractViolation> for JError {
    fn from(e: ContractViolation) -> Self {
        JError::Contract(e)
    }
}

fn decode_j(span: &[u8], out: &mut Vec<u8>) -> Result<(), JError> {
    if span.is_empty() || (span.len() + 1) % J_STRIDE != 0 {
        return Err(ContractViolation::MalformedSpan { len: span.len() }.into());
    }
    let mut b = 1;
    while b < span.len() {
        let c = unhex_bytes(&span[b..b + 4])?;
        if (0xD800..=0xDBFF).contains(&c) && b + J_STRIDE < span.len() {
            let d = unhex_bytes(&span[b + J_STRIDE..b + J_STRIDE + 4])?;
            if (0xDC00..=0xDFFF).contains(&d) {
                let merged = (((c & 0x03FF) << 10) | (d & 0x03FF)) + 0x10000;
                // Always in range: a surrogate pair spans U+10000..=U+10FFFF.
                let _ = append_utf8(out, merged);
                b += 2 * J_STRIDE;
                continue;
            }
        }
        if !append_utf8(out, c) {
            return Err(JError::InvalidCodePoint(c));
        }
        b += J_STRIDE;
    }
    Ok(())
}

/// The span minus its leading marker byte (`x`, `u`, `U`, ...).
fn after_marker<'a, S>(input: &ActionInput<'a, S>) -> Result<&'a [u8], UnescapeError> {
    match input.as_bytes() {
        [_, digits @ ..] => Ok(digits),
        [] => Err(input.error(ContractViolation::MalformedSpan { len: 0 })),
    }
}
