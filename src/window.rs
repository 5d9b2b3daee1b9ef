use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::signal::Signal;
use crate::{
    Fetch, FetchError, PageFetcher, PageInfo, PageRequest, PageResponse, SubscriptionId, SyncError,
    WindowEvent,
};

/// A ticket for one logical page load.
///
/// Two `load_next_page` calls made while the same fetch is outstanding return
/// the same ticket, and both resolve to that fetch's single outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadId(u64);

/// The observable state of a page load ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// The fetch is still outstanding; finish it via
    /// [`WindowedResultSet::complete_load`].
    Pending,
    Complete(PageInfo),
    Failed(FetchError),
    /// The ticket predates the most recently completed load (or the window was
    /// disposed); its outcome is no longer retained.
    Superseded,
}

pub type WindowEventCallback<T> = Arc<dyn for<'a> Fn(WindowEvent<'a, T>) + Send + Sync>;

enum PagerState {
    Idle,
    Loading { load: LoadId, request: PageRequest },
}

/// A monotonically growing materialized window over a data source reachable
/// only through a [`PageFetcher`].
///
/// This type is intentionally sans-I/O:
/// - It never blocks. A fetcher may return [`Fetch::Pending`] and the driver
///   finishes the load later with [`Self::complete_load`].
/// - Consumers observe the window through incremental [`WindowEvent`] diffs
///   plus replay-last-value `has_more` / `total_size` signals, not snapshots.
pub struct WindowedResultSet<T> {
    fetcher: Box<dyn PageFetcher<T>>,
    page_size: usize,
    window: Vec<T>,
    pager: PagerState,
    next_load: u64,
    last_outcome: Option<(LoadId, Result<PageInfo, FetchError>)>,
    has_more: Signal<bool>,
    total_size: Signal<usize>,
    subscribers: Vec<(SubscriptionId, WindowEventCallback<T>)>,
    next_subscription: u64,
    disposed: bool,
}

impl<T> WindowedResultSet<T> {
    /// Creates a window over `fetcher`, paging `page_size` items at a time.
    ///
    /// The fetcher is a constructor-time collaborator; nothing is looked up
    /// ambiently.
    pub fn new(fetcher: impl PageFetcher<T> + 'static, page_size: usize) -> Self {
        lwdebug!(page_size, "WindowedResultSet::new");
        Self {
            fetcher: Box::new(fetcher),
            page_size: page_size.max(1),
            window: Vec::new(),
            pager: PagerState::Idle,
            next_load: 0,
            last_outcome: None,
            has_more: Signal::new(),
            total_size: Signal::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
            disposed: false,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of materialized items.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// The materialized window `[0, len)`.
    pub fn items(&self) -> &[T] {
        &self.window
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.window.get(index)
    }

    /// Whether the most recent successful load indicated more data beyond it.
    /// `None` before the first successful load.
    pub fn has_more(&self) -> Option<bool> {
        self.has_more.get().copied()
    }

    /// The source's total size as observed by the most recent successful load.
    /// `None` before the first successful load.
    pub fn total_size(&self) -> Option<usize> {
        self.total_size.get().copied()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.pager, PagerState::Loading { .. })
    }

    /// The request of the outstanding fetch, if one is in flight.
    pub fn pending_request(&self) -> Option<PageRequest> {
        match &self.pager {
            PagerState::Loading { request, .. } => Some(*request),
            PagerState::Idle => None,
        }
    }

    /// Starts loading the next page, or joins the in-flight load.
    ///
    /// While a fetch is outstanding this never issues a second one: the
    /// returned ticket is the in-flight load's ticket, and both callers
    /// observe the identical outcome through [`Self::load_status`].
    pub fn load_next_page(&mut self) -> LoadId {
        if self.disposed {
            return LoadId(self.next_load);
        }
        if let PagerState::Loading { load, .. } = self.pager {
            lwtrace!(load = load.0, "load_next_page: joining in-flight load");
            return load;
        }

        let load = LoadId(self.next_load);
        self.next_load += 1;
        let request = PageRequest {
            start_index: self.window.len(),
            size: self.page_size,
        };
        lwdebug!(
            load = load.0,
            start_index = request.start_index,
            size = request.size,
            "load_next_page"
        );

        match self.fetcher.fetch(request) {
            Fetch::Ready(result) => self.finish_load(load, result),
            Fetch::Pending => {
                self.pager = PagerState::Loading { load, request };
            }
        }
        load
    }

    /// Loads the next page with a fetcher that never suspends.
    ///
    /// Errors with [`SyncError::Fetch`] on fetch failure, and if the fetcher
    /// unexpectedly returned [`Fetch::Pending`].
    pub fn load_next_page_blocking(&mut self) -> Result<PageInfo, SyncError> {
        if self.disposed {
            return Err(SyncError::Disposed);
        }
        let load = self.load_next_page();
        match self.load_status(load) {
            LoadStatus::Complete(info) => Ok(info),
            LoadStatus::Failed(error) => Err(error.into()),
            LoadStatus::Pending | LoadStatus::Superseded => Err(SyncError::Fetch(FetchError::new(
                "fetcher suspended; drive it with complete_load",
            ))),
        }
    }

    /// Finishes the outstanding fetch with its result.
    ///
    /// A completion arriving after [`Self::dispose`] is a no-op, and a
    /// completion with no fetch outstanding is ignored.
    pub fn complete_load(&mut self, result: Result<PageResponse<T>, FetchError>) {
        if self.disposed {
            lwtrace!("complete_load after dispose: ignored");
            return;
        }
        match core::mem::replace(&mut self.pager, PagerState::Idle) {
            PagerState::Loading { load, .. } => self.finish_load(load, result),
            PagerState::Idle => {
                lwwarn!("complete_load with no load in flight: ignored");
            }
        }
    }

    /// Resolves a ticket returned by [`Self::load_next_page`].
    pub fn load_status(&self, load: LoadId) -> LoadStatus {
        if self.disposed {
            return LoadStatus::Superseded;
        }
        if let PagerState::Loading { load: current, .. } = self.pager {
            if current == load {
                return LoadStatus::Pending;
            }
        }
        match &self.last_outcome {
            Some((completed, Ok(info))) if *completed == load => LoadStatus::Complete(*info),
            Some((completed, Err(error))) if *completed == load => LoadStatus::Failed(error.clone()),
            _ => LoadStatus::Superseded,
        }
    }

    /// Subscribes to structural diffs (and load failures) over the window.
    pub fn subscribe(
        &mut self,
        callback: impl for<'a> Fn(WindowEvent<'a, T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub, _)| *sub != id);
    }

    pub fn subscribe_has_more(
        &mut self,
        callback: impl Fn(&bool) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.has_more.subscribe(callback)
    }

    pub fn subscribe_total_size(
        &mut self,
        callback: impl Fn(&usize) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.total_size.subscribe(callback)
    }

    pub fn unsubscribe_has_more(&mut self, id: SubscriptionId) {
        self.has_more.unsubscribe(id);
    }

    pub fn unsubscribe_total_size(&mut self, id: SubscriptionId) {
        self.total_size.unsubscribe(id);
    }

    /// Marks the window disposed: subscribers are dropped and a late
    /// [`Self::complete_load`] no longer mutates anything.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        lwdebug!(len = self.window.len(), "WindowedResultSet::dispose");
        self.disposed = true;
        self.pager = PagerState::Idle;
        self.subscribers.clear();
        self.has_more.clear_subscribers();
        self.total_size.clear_subscribers();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn finish_load(&mut self, load: LoadId, result: Result<PageResponse<T>, FetchError>) {
        self.pager = PagerState::Idle;
        match result {
            Ok(response) => {
                let info = response.info();
                debug_assert_eq!(
                    response.size,
                    response.items.len(),
                    "PageResponse size/items mismatch"
                );
                let start_index = self.window.len();
                self.window.extend(response.items);
                lwdebug!(
                    load = load.0,
                    appended = info.size,
                    len = self.window.len(),
                    total = info.total_size,
                    "page applied"
                );
                self.last_outcome = Some((load, Ok(info)));
                self.has_more.set(info.has_more());
                self.total_size.set(info.total_size);
                let items = &self.window[start_index..];
                for (_, callback) in &self.subscribers {
                    callback(WindowEvent::Appended { start_index, items });
                }
            }
            Err(error) => {
                lwwarn!(load = load.0, error = %error, "page load failed");
                for (_, callback) in &self.subscribers {
                    callback(WindowEvent::LoadFailed(&error));
                }
                self.last_outcome = Some((load, Err(error)));
            }
        }
    }

    // Live-sync splice hooks. These patch the materialized window in place and
    // broadcast the matching diff; paging signals stay response-derived.

    pub(crate) fn insert_range(&mut self, start_index: usize, items: Vec<T>) {
        if self.disposed || items.is_empty() {
            return;
        }
        let at = start_index.min(self.window.len());
        let count = items.len();
        self.window.splice(at..at, items);
        lwtrace!(start_index = at, count, len = self.window.len(), "live insert");
        let items = &self.window[at..at + count];
        for (_, callback) in &self.subscribers {
            callback(WindowEvent::Inserted {
                start_index: at,
                items,
            });
        }
    }

    pub(crate) fn remove_range(&mut self, start_index: usize, count: usize) -> usize {
        if self.disposed || start_index >= self.window.len() {
            return 0;
        }
        let clamped = count.min(self.window.len() - start_index);
        self.window.drain(start_index..start_index + clamped);
        lwtrace!(start_index, removed = clamped, len = self.window.len(), "live remove");
        for (_, callback) in &self.subscribers {
            callback(WindowEvent::Removed {
                start_index,
                count: clamped,
            });
        }
        clamped
    }

    pub(crate) fn clear_all(&mut self) {
        if self.disposed {
            return;
        }
        self.window.clear();
        self.pager = PagerState::Idle;
        lwdebug!("window cleared");
        for (_, callback) in &self.subscribers {
            callback(WindowEvent::Cleared);
        }
    }
}

impl<T> core::fmt::Debug for WindowedResultSet<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowedResultSet")
            .field("page_size", &self.page_size)
            .field("len", &self.window.len())
            .field("loading", &self.is_loading())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
