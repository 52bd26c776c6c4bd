use crate::error::InputError;

/// Sizing of a [`BufferInput`](crate::BufferInput) arena.
///
/// The arena holds `maximum + chunk_size` bytes, allocated once at
/// construction. The extra chunk is slack: it lets the buffer satisfy any
/// lookahead request up to `maximum` even when the retained window starts
/// part-way into the arena.
///
/// # Examples
///
/// ```rust
/// use pegbuf::BufferOptions;
///
/// let options = BufferOptions {
///     maximum: 1 << 16,
///     ..Default::default()
/// };
/// assert_eq!(options.capacity(), Some((1 << 16) + 64));
/// ```
///
/// # Default
///
/// `maximum = 4096`, `chunk_size = 64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferOptions {
    /// Largest lookahead window the caller will ever request.
    ///
    /// Requests beyond `maximum + chunk_size` measured from the start of the
    /// arena fail with [`InputError::Overflow`].
    pub maximum: usize,

    /// Minimum number of bytes requested from the source per pull, and the
    /// amount of consumed data that must accumulate before
    /// [`discard`](crate::BufferInput::discard) bothers to compact.
    ///
    /// Must be non-zero.
    pub chunk_size: usize,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            maximum: 4096,
            chunk_size: 64,
        }
    }
}

impl BufferOptions {
    /// Total arena size, or `None` if it does not fit in `usize`.
    pub fn capacity(&self) -> Option<usize> {
        self.maximum.checked_add(self.chunk_size)
    }

    pub(crate) fn validate(&self) -> Result<usize, InputError> {
        if self.chunk_size == 0 {
            return Err(InputError::InvalidOptions("chunk_size must be non-zero"));
        }
        self.capacity()
            .ok_or(InputError::InvalidOptions("maximum + chunk_size overflows usize"))
    }
}
