use core::ops::{Deref, DerefMut};

use crate::{eol::Eol, input::BufferInput, marker::Marker, source::ByteSource};

/// Whether a [`RewindGuard`] snapshots and restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewindMode {
    /// Restore the snapshot unless committed.
    #[default]
    Active,
    /// Pass-through: no snapshot, no restore. For rules that cannot fail
    /// after consuming input.
    Inactive,
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    marker: Marker,
    /// Pin in place before this guard opened.
    prev_pinned: Option<usize>,
}

/// A transaction over one backtracking decision point.
///
/// The guard mutably borrows its [`BufferInput`] and dereferences to it, so
/// guards nest strictly LIFO: an inner guard borrows through the outer one
/// and must be gone before the outer can be used or dropped.
///
/// Dropping an uncommitted active guard restores the position it was opened
/// at. Restoration rewrites counters only; bytes already pulled stay in the
/// arena, and no bytes are re-read from the source.
#[must_use = "dropping the guard immediately rewinds; bind it and commit on success"]
pub struct RewindGuard<'a, R: ByteSource, E: Eol, S> {
    input: &'a mut BufferInput<R, E, S>,
    snapshot: Option<Snapshot>,
}

impl<'a, R: ByteSource, E: Eol, S> RewindGuard<'a, R, E, S> {
    pub(crate) fn new(input: &'a mut BufferInput<R, E, S>, mode: RewindMode) -> Self {
        let snapshot = match mode {
            RewindMode::Active => {
                let marker = input.rewind_save();
                let prev_pinned = input.pinned;
                input.pinned = Some(prev_pinned.map_or(marker.byte, |p| p.min(marker.byte)));
                Some(Snapshot {
                    marker,
                    prev_pinned,
                })
            }
            RewindMode::Inactive => None,
        };
        Self { input, snapshot }
    }

    pub fn mode(&self) -> RewindMode {
        if self.snapshot.is_some() {
            RewindMode::Active
        } else {
            RewindMode::Inactive
        }
    }

    /// The marker this guard restores on drop; `None` for inactive guards.
    pub fn snapshot(&self) -> Option<&Marker> {
        self.snapshot.as_ref().map(|s| &s.marker)
    }

    /// Keeps everything consumed under this guard.
    pub fn commit(mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.input.pinned = snapshot.prev_pinned;
        }
    }

    /// Commits when `success`, rewinds otherwise. Returns `success`.
    pub fn finish(self, success: bool) -> bool {
        if success {
            self.commit();
        }
        success
    }
}

impl<R: ByteSource, E: Eol, S> Drop for RewindGuard<'_, R, E, S> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.input.restore_pinned(&snapshot.marker);
            self.input.pinned = snapshot.prev_pinned;
        }
    }
}

impl<R: ByteSource, E: Eol, S> Deref for RewindGuard<'_, R, E, S> {
    type Target = BufferInput<R, E, S>;

    fn deref(&self) -> &Self::Target {
        self.input
    }
}

impl<R: ByteSource, E: Eol, S> DerefMut for RewindGuard<'_, R, E, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.input
    }
}
