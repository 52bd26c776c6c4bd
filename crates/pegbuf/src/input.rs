//! The sliding buffer: a fixed-capacity arena between a [`ByteSource`] and a
//! PEG matching engine.
//!
//! Three cursors delimit the state, all plain offsets into the arena:
//!
//! ```text
//!  0                 current.offset             end              capacity
//!  |-- consumed, ------|-- retained lookahead --|-- free space ----|
//!      reclaimable by
//!      discard()
//! ```
//!
//! The engine asks for lookahead with [`BufferInput::ensure_available`],
//! walks the window with [`peek`](BufferInput::peek) and the `consume*`
//! family, and opens a [`RewindGuard`] at every choice point. Consumed bytes
//! stay in the arena until [`discard`](BufferInput::discard) compacts them
//! away; a live active guard pins the window start at its snapshot so a
//! rewind never targets discarded bytes.

use alloc::{boxed::Box, string::String, vec};
use core::{fmt, marker::PhantomData};

use tracing::{debug, trace};

use crate::{
    action::ActionInput,
    eol::{Eol, LfCrlf},
    error::InputError,
    marker::{Marker, Position},
    options::BufferOptions,
    rewind::{RewindGuard, RewindMode},
    source::{ByteSource, SourceError},
};

/// Bounded streaming input with eager byte/line/column tracking.
///
/// `R` is the byte source, `E` the line-terminator policy and `S` the source
/// label echoed into every [`Position`].
///
/// ```rust
/// use pegbuf::{BufferInput, BufferOptions, RewindMode, SliceSource};
///
/// let mut input = BufferInput::new(
///     SliceSource::new(b"let x"),
///     BufferOptions::default(),
///     "example",
/// )?;
///
/// // Speculatively match "lex", fail, and rewind.
/// {
///     let mut guard = input.auto_rewind(RewindMode::Active);
///     assert_eq!(guard.window(3)?, b"let x");
///     guard.consume_in_line(2);
///     assert_eq!(guard.peek(0), Some(b't'));
/// }
/// assert_eq!(input.column(), 1);
///
/// input.ensure_available(3)?;
/// input.consume_in_line(3);
/// assert_eq!(input.position().to_string(), "example:1:4");
/// # Ok::<(), pegbuf::InputError>(())
/// ```
pub struct BufferInput<R, E = LfCrlf, S = String> {
    reader: R,
    buffer: Box<[u8]>,
    chunk_size: usize,
    current: Marker,
    end: usize,
    /// Global byte count of `buffer[0]`.
    base_byte: usize,
    /// Global byte count of the earliest snapshot held by a live active
    /// guard; compaction never moves past it.
    pub(crate) pinned: Option<usize>,
    source: S,
    eol: PhantomData<E>,
}

impl<R: ByteSource, S> BufferInput<R, LfCrlf, S> {
    /// Creates a buffer recognizing `\n` and `\r\n` line terminators.
    ///
    /// The arena of `options.maximum + options.chunk_size` bytes is allocated
    /// here, once.
    pub fn new(reader: R, options: BufferOptions, source: S) -> Result<Self, InputError> {
        Self::with_eol(reader, options, source)
    }
}

impl<R: ByteSource, E: Eol, S> BufferInput<R, E, S> {
    /// Creates a buffer with an explicit line-terminator policy.
    ///
    /// ```rust
    /// use pegbuf::{BufferInput, BufferOptions, SliceSource, eol::Cr};
    ///
    /// let input = BufferInput::<_, Cr, _>::with_eol(
    ///     SliceSource::new(b"a\rb"),
    ///     BufferOptions::default(),
    ///     "classic-mac",
    /// );
    /// assert!(input.is_ok());
    /// ```
    pub fn with_eol(reader: R, options: BufferOptions, source: S) -> Result<Self, InputError> {
        let capacity = options.validate()?;
        Ok(Self {
            reader,
            buffer: vec![0u8; capacity].into_boxed_slice(),
            chunk_size: options.chunk_size,
            current: Marker::default(),
            end: 0,
            base_byte: 0,
            pinned: None,
            source,
            eol: PhantomData,
        })
    }

    /// Guarantees, if the source can deliver them, `amount` unconsumed bytes
    /// starting at the current position.
    ///
    /// Performs at most one pull. A short pull (including end-of-input) is
    /// not an error; callers observe it through [`occupied`](Self::occupied)
    /// or [`is_empty`](Self::is_empty), and [`fill`](Self::fill) retries
    /// until satisfied.
    ///
    /// # Errors
    ///
    /// [`InputError::Overflow`] if `amount` bytes starting at the current
    /// position cannot fit in the arena, and [`InputError::Source`] if the
    /// pull fails.
    pub fn ensure_available(&mut self, amount: usize) -> Result<(), InputError> {
        self.require(amount).map(|_| ())
    }

    /// Like [`ensure_available`](Self::ensure_available) but keeps pulling
    /// until `amount` bytes are available or the source reports
    /// end-of-input. Returns the number of bytes available.
    pub fn fill(&mut self, amount: usize) -> Result<usize, InputError> {
        while self.occupied() < amount {
            if self.require(amount)? == 0 {
                break;
            }
        }
        Ok(self.occupied())
    }

    /// One pull at most; returns the number of bytes received.
    fn require(&mut self, amount: usize) -> Result<usize, InputError> {
        let available = self.occupied();
        if amount <= available {
            return Ok(0);
        }
        let capacity = self.buffer.len();
        if self
            .current
            .offset
            .checked_add(amount)
            .is_none_or(|needed| needed > capacity)
        {
            debug!(
                requested = amount,
                capacity,
                offset = self.current.offset,
                "lookahead request overflows buffer"
            );
            return Err(InputError::Overflow {
                requested: amount,
                capacity,
            });
        }
        let want = (amount - available)
            .max(self.chunk_size)
            .min(self.free_after_end());
        let (start, stop) = (self.end, self.end + want);
        let received = self.reader.pull(&mut self.buffer[start..stop])?;
        if received > want {
            return Err(SourceError::new("byte source reported more bytes than requested").into());
        }
        self.end += received;
        trace!(
            requested = want,
            received,
            window_end = self.end,
            "pulled from byte source"
        );
        Ok(received)
    }

    /// True iff no byte is available at the current position after asking
    /// the source for one.
    pub fn is_empty(&mut self) -> Result<bool, InputError> {
        self.ensure_available(1)?;
        Ok(self.occupied() == 0)
    }

    /// [`ensure_available`](Self::ensure_available) followed by
    /// [`occupied`](Self::occupied).
    pub fn size(&mut self, amount: usize) -> Result<usize, InputError> {
        self.ensure_available(amount)?;
        Ok(self.occupied())
    }

    /// [`ensure_available`](Self::ensure_available) followed by
    /// [`current`](Self::current).
    pub fn window(&mut self, amount: usize) -> Result<&[u8], InputError> {
        self.ensure_available(amount)?;
        Ok(self.current())
    }

    /// The retained lookahead window `[current, end)`.
    pub fn current(&self) -> &[u8] {
        &self.buffer[self.current.offset..self.end]
    }

    /// The byte `offset` positions past the current one, if it has been
    /// pulled already.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        self.current().get(offset).copied()
    }

    /// [`peek`](Self::peek) as a Latin-1 `char`, for ASCII grammars.
    pub fn peek_char(&self, offset: usize) -> Option<char> {
        self.peek(offset).map(char::from)
    }

    /// Consumes `count` bytes, counting line terminators of policy `E`.
    ///
    /// # Panics
    ///
    /// If fewer than `count` bytes are available.
    pub fn consume(&mut self, count: usize) {
        let start = self.current.offset;
        let consumed = &self.buffer[start..self.end][..count];
        self.current.bump::<E>(consumed);
    }

    /// Consumes `count` bytes known to contain no line terminator.
    ///
    /// # Panics
    ///
    /// If fewer than `count` bytes are available.
    pub fn consume_in_line(&mut self, count: usize) {
        assert!(count <= self.occupied(), "consume_in_line past window end");
        debug_assert!(
            memchr::memchr(E::LINE_BYTE, &self.current()[..count]).is_none(),
            "consume_in_line over a line terminator"
        );
        self.current.bump_in_this_line(count);
    }

    /// Consumes a `count`-byte terminator and starts a new line.
    ///
    /// # Panics
    ///
    /// If fewer than `count` bytes are available.
    pub fn consume_to_next_line(&mut self, count: usize) {
        assert!(count <= self.occupied(), "consume_to_next_line past window end");
        self.current.bump_to_next_line(count);
    }

    /// Consumes one line terminator of policy `E` if the input is at one.
    pub fn consume_eol(&mut self) -> Result<bool, InputError> {
        self.ensure_available(E::MAX_WIDTH)?;
        match E::match_eol(self.current()) {
            Some(width) => {
                self.current.bump_to_next_line(width);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Compacts the arena, moving the retained window to the front.
    ///
    /// Only acts once more than `chunk_size` consumed bytes have accumulated.
    /// While an active [`RewindGuard`] is live the window start is pinned at
    /// its snapshot, so bytes a pending rewind still needs are kept.
    pub fn discard(&mut self) {
        let keep_from = match self.pinned {
            Some(byte) => byte.saturating_sub(self.base_byte).min(self.current.offset),
            None => self.current.offset,
        };
        if keep_from <= self.chunk_size {
            if self.current.offset > self.chunk_size {
                debug!(
                    pinned_at = keep_from,
                    offset = self.current.offset,
                    "compaction deferred by live rewind guard"
                );
            }
            return;
        }
        self.buffer.copy_within(keep_from..self.end, 0);
        self.end -= keep_from;
        self.current.offset -= keep_from;
        self.base_byte += keep_from;
        debug!(shift = keep_from, retained = self.end, "compacted buffer");
    }

    /// Opens a transaction at the current position.
    ///
    /// The guard dereferences to this input; dropping it without
    /// [`commit`](RewindGuard::commit) restores the position it was opened
    /// at (for [`RewindMode::Active`]).
    pub fn auto_rewind(&mut self, mode: RewindMode) -> RewindGuard<'_, R, E, S> {
        RewindGuard::new(self, mode)
    }

    /// Runs `f` under an active guard, keeping its consumption only if it
    /// returns `Ok(true)`.
    ///
    /// ```rust
    /// use pegbuf::{BufferInput, BufferOptions, ByteSource, InputError, SliceSource, eol::Eol};
    ///
    /// fn keyword<R: ByteSource, E: Eol, S>(
    ///     input: &mut BufferInput<R, E, S>,
    ///     kw: &[u8],
    /// ) -> Result<bool, InputError> {
    ///     for &expected in kw {
    ///         if input.window(1)?.first() != Some(&expected) {
    ///             return Ok(false);
    ///         }
    ///         input.consume(1);
    ///     }
    ///     Ok(true)
    /// }
    ///
    /// let mut input = BufferInput::new(SliceSource::new(b"abc"), BufferOptions::default(), "")?;
    /// assert!(!input.attempt(|i| keyword(i, b"abd"))?);
    /// assert_eq!(input.byte(), 0);
    /// assert!(input.attempt(|i| keyword(i, b"ab"))?);
    /// assert_eq!(input.byte(), 2);
    /// # Ok::<(), InputError>(())
    /// ```
    pub fn attempt<F, Err>(&mut self, f: F) -> Result<bool, Err>
    where
        F: FnOnce(&mut Self) -> Result<bool, Err>,
    {
        let mut guard = self.auto_rewind(RewindMode::Active);
        let matched = f(&mut *guard)?;
        Ok(guard.finish(matched))
    }

    /// Snapshot of the live marker.
    pub fn rewind_save(&self) -> Marker {
        self.current
    }

    /// Moves the live marker to `marker`.
    ///
    /// # Errors
    ///
    /// [`InputError::RewindPastWindow`] if the bytes at `marker` were
    /// compacted away or were never pulled into the window.
    pub fn rewind_restore(&mut self, marker: &Marker) -> Result<(), InputError> {
        let offset = self.offset_of(marker)?;
        self.current = Marker { offset, ..*marker };
        Ok(())
    }

    /// Restore path for guards, whose snapshots are pinned.
    pub(crate) fn restore_pinned(&mut self, marker: &Marker) {
        debug_assert!(marker.byte >= self.base_byte, "pinned snapshot discarded");
        self.current = Marker {
            offset: marker.byte - self.base_byte,
            ..*marker
        };
    }

    fn offset_of(&self, marker: &Marker) -> Result<usize, InputError> {
        marker
            .byte
            .checked_sub(self.base_byte)
            .filter(|offset| *offset <= self.end)
            .ok_or(InputError::RewindPastWindow {
                byte: marker.byte,
                retained_from: self.base_byte,
            })
    }

    /// Borrows the bytes consumed since `begin` for a decoding action.
    ///
    /// The span borrows the input, so no compaction can happen while an
    /// action holds it.
    pub fn action_input(&self, begin: &Marker) -> Result<ActionInput<'_, S>, InputError> {
        let offset = self.offset_of(begin)?;
        if offset > self.current.offset {
            return Err(InputError::MarkerAhead {
                byte: begin.byte,
                current: self.current.byte,
            });
        }
        let begin = Marker { offset, ..*begin };
        Ok(ActionInput::new(
            &self.buffer[offset..self.current.offset],
            begin,
            &self.source,
        ))
    }

    pub fn marker(&self) -> &Marker {
        &self.current
    }

    pub fn byte(&self) -> usize {
        self.current.byte
    }

    pub fn line(&self) -> usize {
        self.current.line
    }

    pub fn column(&self) -> usize {
        self.current.column
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn position(&self) -> Position<S>
    where
        S: Clone,
    {
        self.position_at(&self.current)
    }

    pub fn position_at(&self, marker: &Marker) -> Position<S>
    where
        S: Clone,
    {
        Position::new(marker, self.source.clone())
    }

    /// Total arena size: the declared maximum plus one chunk.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes retained ahead of the current position.
    pub fn occupied(&self) -> usize {
        debug_assert!(self.end >= self.current.offset);
        self.end - self.current.offset
    }

    /// Consumed bytes still sitting in front of the current position.
    pub fn free_before_current(&self) -> usize {
        self.current.offset
    }

    /// Unused arena space after the retained window.
    pub fn free_after_end(&self) -> usize {
        debug_assert!(self.buffer.len() >= self.end);
        self.buffer.len() - self.end
    }
}

impl<R, E, S: fmt::Debug> fmt::Debug for BufferInput<R, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferInput")
            .field("source", &self.source)
            .field("current", &self.current)
            .field("end", &self.end)
            .field("capacity", &self.buffer.len())
            .field("pinned", &self.pinned)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
