//! Byte sources feeding a [`BufferInput`](crate::BufferInput).
//!
//! A [`ByteSource`] is pulled, never pushed: the buffer hands it the free
//! space after the retained window and the source writes whatever it has.
//! Returning `0` means end-of-input; returning fewer bytes than requested is a
//! valid short read (sockets, pipes, chunked producers).

use alloc::string::String;
use core::fmt;

/// A pull-based producer of raw bytes.
pub trait ByteSource {
    /// Writes up to `dst.len()` bytes into `dst` and returns how many were
    /// written.
    ///
    /// `Ok(0)` signals end-of-input. Implementations must not report more
    /// bytes than `dst.len()`.
    fn pull(&mut self, dst: &mut [u8]) -> Result<usize, SourceError>;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn pull(&mut self, dst: &mut [u8]) -> Result<usize, SourceError> {
        (**self).pull(dst)
    }
}

/// Failure reported by a [`ByteSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    msg: String,
}

impl SourceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl core::error::Error for SourceError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        use alloc::string::ToString;
        Self::new(err.to_string())
    }
}

/// Serves an in-memory byte slice, at most `max_pull` bytes per pull.
///
/// The per-pull cap lets tests exercise short reads against sources that
/// would otherwise hand over everything at once.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    max_pull: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            max_pull: usize::MAX,
        }
    }

    /// Limits every pull to at most `max_pull` bytes (`0` is treated as `1`).
    #[must_use]
    pub fn with_max_pull(mut self, max_pull: usize) -> Self {
        self.max_pull = max_pull.max(1);
        self
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }
}

impl ByteSource for SliceSource<'_> {
    fn pull(&mut self, dst: &mut [u8]) -> Result<usize, SourceError> {
        let n = dst.len().min(self.data.len()).min(self.max_pull);
        let (head, tail) = self.data.split_at(n);
        dst[..n].copy_from_slice(head);
        self.data = tail;
        Ok(n)
    }
}

/// Adapts a closure into a [`ByteSource`]. Created by [`from_fn`].
#[derive(Clone)]
pub struct FnSource<F> {
    f: F,
}

impl<F> fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}

/// Builds a [`ByteSource`] from a closure with the same contract as
/// [`ByteSource::pull`].
///
/// ```rust
/// use pegbuf::{BufferInput, BufferOptions, source};
///
/// // An endless stream of 'x'.
/// let reader = source::from_fn(|dst: &mut [u8]| {
///     dst.fill(b'x');
///     Ok(dst.len())
/// });
/// let mut input = BufferInput::new(reader, BufferOptions::default(), "xs").unwrap();
/// assert!(input.size(3).unwrap() >= 3);
/// ```
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: FnMut(&mut [u8]) -> Result<usize, SourceError>,
{
    FnSource { f }
}

impl<F> ByteSource for FnSource<F>
where
    F: FnMut(&mut [u8]) -> Result<usize, SourceError>,
{
    fn pull(&mut self, dst: &mut [u8]) -> Result<usize, SourceError> {
        (self.f)(dst)
    }
}

/// Pulls from any [`std::io::Read`], retrying reads interrupted by signals.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ByteSource for ReadSource<R> {
    fn pull(&mut self, dst: &mut [u8]) -> Result<usize, SourceError> {
        loop {
            match self.inner.read(dst) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}
