use alloc::sync::Arc;

use crate::{
    Fetch, LiveSource, PageFetcher, PageInfo, PageRequest, PageResponse, SourceEvent,
    SubscriptionId, SyncError, WindowEvent, WindowedResultSet,
};

/// The resident fetch of a live source: a slice of what is already in memory,
/// answered synchronously.
struct ResidentFetcher<T> {
    source: Arc<dyn LiveSource<T>>,
}

impl<T> PageFetcher<T> for ResidentFetcher<T> {
    fn fetch(&mut self, request: PageRequest) -> Fetch<T> {
        let items = self.source.slice(request.start_index, request.size);
        Fetch::ok(PageResponse::new(
            items,
            request.start_index,
            self.source.len(),
        ))
    }
}

/// A [`WindowedResultSet`] over a source that itself emits structural change
/// notifications.
///
/// Paging pulls slices straight out of the resident source; the driver feeds
/// the source's mutation stream into [`Self::apply_source_event`] (in arrival
/// order) to keep the already-materialized window consistent without
/// refetching. Paging progress (`len`) remains the sole authority for how
/// much is materialized.
pub struct LiveWindowSync<T> {
    inner: WindowedResultSet<T>,
    source: Arc<dyn LiveSource<T>>,
    halted: bool,
}

impl<T: Clone + Send + Sync + 'static> LiveWindowSync<T> {
    pub fn new(source: Arc<dyn LiveSource<T>>, page_size: usize) -> Self {
        let fetcher = ResidentFetcher {
            source: Arc::clone(&source),
        };
        Self {
            inner: WindowedResultSet::new(fetcher, page_size),
            source,
            halted: false,
        }
    }
}

impl<T> LiveWindowSync<T> {
    pub fn source(&self) -> &Arc<dyn LiveSource<T>> {
        &self.source
    }

    /// Loads the next page from the resident source.
    pub fn load_next_page(&mut self) -> Result<PageInfo, SyncError> {
        if self.halted {
            return Err(SyncError::Halted);
        }
        self.inner.load_next_page_blocking()
    }

    /// Applies one source mutation notification to the materialized window.
    ///
    /// `Add`/`Remove` outside the window are ignored; removes straddling the
    /// window boundary are clamped. `Replace` and `Move` are rejected and halt
    /// the component until a `Reset` arrives.
    pub fn apply_source_event(&mut self, event: &SourceEvent<T>) -> Result<(), SyncError>
    where
        T: Clone,
    {
        if self.halted && !matches!(event, SourceEvent::Reset) {
            return Err(SyncError::Halted);
        }
        match event {
            SourceEvent::Add { start_index, items } => {
                if *start_index >= self.inner.len() {
                    lwtrace!(
                        start_index,
                        window = self.inner.len(),
                        "add beyond window: ignored"
                    );
                    return Ok(());
                }
                self.inner.insert_range(*start_index, items.clone());
                Ok(())
            }
            SourceEvent::Remove { start_index, count } => {
                if *start_index >= self.inner.len() {
                    lwtrace!(
                        start_index,
                        window = self.inner.len(),
                        "remove beyond window: ignored"
                    );
                    return Ok(());
                }
                self.inner.remove_range(*start_index, *count);
                Ok(())
            }
            SourceEvent::Reset => {
                self.halted = false;
                self.inner.clear_all();
                Ok(())
            }
            SourceEvent::Replace { .. } | SourceEvent::Move { .. } => {
                lwwarn!(kind = ?event.kind(), "unsupported source mutation");
                self.halted = true;
                Err(SyncError::UnsupportedMutation(event.kind()))
            }
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    // Window surface, delegated.

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn items(&self) -> &[T] {
        self.inner.items()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.inner.get(index)
    }

    pub fn has_more(&self) -> Option<bool> {
        self.inner.has_more()
    }

    pub fn total_size(&self) -> Option<usize> {
        self.inner.total_size()
    }

    pub fn subscribe(
        &mut self,
        callback: impl for<'a> Fn(WindowEvent<'a, T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.inner.unsubscribe(id);
    }

    pub fn subscribe_has_more(
        &mut self,
        callback: impl Fn(&bool) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.subscribe_has_more(callback)
    }

    pub fn subscribe_total_size(
        &mut self,
        callback: impl Fn(&usize) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.subscribe_total_size(callback)
    }

    pub fn dispose(&mut self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

impl<T> core::fmt::Debug for LiveWindowSync<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LiveWindowSync")
            .field("len", &self.inner.len())
            .field("source_len", &self.source.len())
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}
