use alloc::vec::Vec;

use crate::FetchError;

/// The kind tag of a [`SourceEvent`], used for reporting unsupported mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MutationKind {
    Add,
    Remove,
    Replace,
    Move,
    Reset,
}

/// A structural change notification emitted by a live source.
///
/// Index semantics follow standard list-mutation notifications: `Add` indices
/// refer to post-mutation positions, `Remove` indices to pre-mutation
/// positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceEvent<T> {
    Add {
        start_index: usize,
        items: Vec<T>,
    },
    Remove {
        start_index: usize,
        count: usize,
    },
    /// Not supported by this engine; rejected with
    /// [`crate::SyncError::UnsupportedMutation`].
    Replace {
        start_index: usize,
        count: usize,
    },
    /// Not supported by this engine; rejected with
    /// [`crate::SyncError::UnsupportedMutation`].
    Move {
        old_start_index: usize,
        new_start_index: usize,
        count: usize,
    },
    Reset,
}

impl<T> SourceEvent<T> {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Add { .. } => MutationKind::Add,
            Self::Remove { .. } => MutationKind::Remove,
            Self::Replace { .. } => MutationKind::Replace,
            Self::Move { .. } => MutationKind::Move,
            Self::Reset => MutationKind::Reset,
        }
    }
}

/// An incremental structural diff over a materialized window.
///
/// Subscribers receive diffs, not snapshots; item payloads are borrowed from
/// the window for the duration of the callback.
#[derive(Debug)]
pub enum WindowEvent<'a, T> {
    /// A successfully fetched page was appended at `start_index`.
    Appended { start_index: usize, items: &'a [T] },
    /// A live source insert landed inside the materialized window.
    Inserted { start_index: usize, items: &'a [T] },
    /// A live source remove was applied (already clamped to the window).
    Removed { start_index: usize, count: usize },
    /// The source reset; the window is empty and must be re-paged.
    Cleared,
    /// A page fetch failed; the window was left unchanged.
    LoadFailed(&'a FetchError),
}

// Bound-free `Copy`: a derive would demand `T: Copy`, but every variant holds
// only references and plain ints.
impl<T> Clone for WindowEvent<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WindowEvent<'_, T> {}

/// A structural diff over the derived collection of a
/// [`crate::DerivedViewCache`].
#[derive(Debug)]
pub enum CacheEvent<'a, V> {
    /// Inserted items that were eagerly materialized (those at or below the
    /// cache's high-water mark). Items inserted beyond it stay unmaterialized
    /// and are not reported.
    Added { start_index: usize, count: usize },
    /// Removed derived objects, as `(pre-mutation index, view)` pairs. The
    /// views are disposed right after the callback returns; indices with no
    /// cached entry are omitted.
    Removed { views: &'a [(usize, V)] },
    /// The source reset; every derived object was evicted.
    Cleared,
}

impl<V> Clone for CacheEvent<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for CacheEvent<'_, V> {}
