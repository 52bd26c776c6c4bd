//! Streaming input for parsing-expression-grammar engines.
//!
//! [`BufferInput`] pulls bytes from a [`ByteSource`] into a fixed-capacity
//! arena, tracks byte/line/column positions eagerly, and supports arbitrarily
//! nested backtracking through [`RewindGuard`]s without ever re-reading the
//! source. The [`unescape`] module holds decoding actions that consume
//! matched spans.
//!
//! ```rust
//! use pegbuf::{BufferInput, BufferOptions, RewindMode, SliceSource};
//!
//! let mut input = BufferInput::new(
//!     SliceSource::new(b"ab\ncd"),
//!     BufferOptions { maximum: 16, chunk_size: 4 },
//!     "inline",
//! )?;
//!
//! let mut guard = input.auto_rewind(RewindMode::Active);
//! let n = guard.fill(5)?;
//! guard.consume(n);
//! assert_eq!((guard.line(), guard.column()), (2, 3));
//! guard.commit();
//!
//! assert!(input.is_empty()?);
//! # Ok::<(), pegbuf::InputError>(())
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod action;
pub mod eol;
mod error;
mod input;
mod marker;
mod options;
mod rewind;
pub mod source;
pub mod unescape;

pub use action::ActionInput;
pub use error::{ContractViolation, InputError, UnescapeError, UnescapeErrorKind};
pub use input::BufferInput;
pub use marker::{Marker, Position};
pub use options::BufferOptions;
pub use rewind::{RewindGuard, RewindMode};
#[cfg(feature = "std")]
pub use source::ReadSource;
pub use source::{ByteSource, SliceSource, SourceError};
