use alloc::string::String;

use thiserror::Error;

use crate::MutationKind;

/// A failure propagated from the underlying page fetch.
///
/// Recoverable: the window is left untouched and callers may retry
/// `load_next_page`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("page fetch failed: {message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by the windowed-sync and derived-cache components.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A `Replace` or `Move` notification was received. Fatal to the affected
    /// component: it stops processing until a `Reset`, since a partial
    /// translation would leave the window or cache inconsistent.
    #[error("unsupported source mutation: {0:?}")]
    UnsupportedMutation(MutationKind),

    /// A cached entry's model could no longer be located in the source.
    #[error("cached identity no longer present in source")]
    IdentityLookupFailed,

    #[error("index {index} out of bounds (source len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The component refused the call because an earlier unsupported mutation
    /// halted it; deliver a `Reset` to recover.
    #[error("halted by a previous unsupported mutation; reset to recover")]
    Halted,

    #[error("component has been disposed")]
    Disposed,
}
