use alloc::vec::Vec;

use crate::FetchError;

/// A pull-based pagination request: fetch `size` items starting at `start_index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageRequest {
    pub start_index: usize,
    pub size: usize,
}

/// One fetched page plus the source metadata observed at fetch time.
///
/// Invariant: `size == items.len()`. Under a non-mutating source,
/// `start_index + size <= total_size`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub size: usize,
    pub start_index: usize,
    pub total_size: usize,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, start_index: usize, total_size: usize) -> Self {
        let size = items.len();
        Self {
            items,
            size,
            start_index,
            total_size,
        }
    }

    /// The plain-data metadata of this response (what `load_next_page` callers keep).
    pub fn info(&self) -> PageInfo {
        PageInfo {
            start_index: self.start_index,
            size: self.size,
            total_size: self.total_size,
        }
    }
}

/// Metadata of a completed page load: where it started, how many items it
/// fetched, and the source's total size as observed by that fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageInfo {
    pub start_index: usize,
    pub size: usize,
    pub total_size: usize,
}

impl PageInfo {
    /// Whether the source holds more items than this page returned.
    pub fn has_more(&self) -> bool {
        self.size < self.total_size
    }
}

/// The outcome of issuing a fetch: either it completed synchronously, or it
/// suspended and will be finished later via
/// [`crate::WindowedResultSet::complete_load`].
#[derive(Debug)]
pub enum Fetch<T> {
    Ready(Result<PageResponse<T>, FetchError>),
    Pending,
}

impl<T> Fetch<T> {
    pub fn ok(response: PageResponse<T>) -> Self {
        Self::Ready(Ok(response))
    }

    pub fn err(error: FetchError) -> Self {
        Self::Ready(Err(error))
    }
}

/// The function-shaped fetch abstraction both static and live sources implement.
///
/// Implemented for any `FnMut(PageRequest) -> Fetch<T>`, so drivers can pass a
/// plain closure.
pub trait PageFetcher<T>: Send {
    fn fetch(&mut self, request: PageRequest) -> Fetch<T>;
}

impl<T, F> PageFetcher<T> for F
where
    F: FnMut(PageRequest) -> Fetch<T> + Send,
{
    fn fetch(&mut self, request: PageRequest) -> Fetch<T> {
        self(request)
    }
}
