use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::key::{IndexMap, KeyEntryMap, StableKey};
use crate::{CacheEvent, HasIdentity, IdentitySource, SourceEvent, SubscriptionId, SyncError};

pub type CacheEventCallback<V> = Arc<dyn for<'a> Fn(CacheEvent<'a, V>) + Send + Sync>;

type ViewFactory<M, V> = Box<dyn Fn(&M) -> V + Send>;
type ViewDisposer<V> = Box<dyn FnMut(V) + Send>;

const DEFAULT_CAPACITY: usize = 1000;

struct CacheEntry<V> {
    view: V,
    last_index: usize,
}

/// A same-length, same-order collection of lazily constructed derived objects
/// over a live [`IdentitySource`].
///
/// Derived objects are keyed by stable identity, not position, so an object
/// survives index churn elsewhere in the source. The cache is the exclusive
/// owner of derived-object lifetime: construction happens on first index
/// access, destruction on LRU eviction, removal from the source, reset, or
/// disposal, always through the configured disposer.
///
/// Two bidirectional maps (index → id, id → entry) are kept consistent with
/// the source's order immediately after each processed mutation by a full
/// O(cache size) rebuild. An incremental index-arithmetic patch would be
/// cheaper but is error-prone under compound mutations.
pub struct DerivedViewCache<M, V, I> {
    source: Arc<dyn IdentitySource<M, Id = I>>,
    factory: ViewFactory<M, V>,
    disposer: Option<ViewDisposer<V>>,
    capacity: usize,
    entries: KeyEntryMap<I, CacheEntry<V>>,
    index_to_id: IndexMap<I>,
    /// LRU order; back is most recently used.
    recency: VecDeque<I>,
    /// High-water mark: the largest index a consumer has accessed. Items
    /// inserted at or below it are materialized eagerly on `Add`.
    max_accessed: Option<usize>,
    halted: bool,
    disposed: bool,
    subscribers: Vec<(SubscriptionId, CacheEventCallback<V>)>,
    next_subscription: u64,
}

impl<M, V, I> DerivedViewCache<M, V, I>
where
    M: HasIdentity<Id = I>,
    I: StableKey,
{
    /// Creates a cache over `source`, constructing derived objects through
    /// `factory`. Both collaborators are passed in explicitly; nothing is
    /// looked up ambiently.
    pub fn new(
        source: Arc<dyn IdentitySource<M, Id = I>>,
        factory: impl Fn(&M) -> V + Send + 'static,
    ) -> Self {
        Self {
            source,
            factory: Box::new(factory),
            disposer: None,
            capacity: DEFAULT_CAPACITY,
            entries: KeyEntryMap::new(),
            index_to_id: IndexMap::new(),
            recency: VecDeque::new(),
            max_accessed: None,
            halted: false,
            disposed: false,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Bounds the number of live derived objects. Clamped to at least 1.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Installs a disposer invoked exactly once per evicted derived object.
    pub fn with_disposer(mut self, disposer: impl FnMut(V) + Send + 'static) -> Self {
        self.disposer = Some(Box::new(disposer));
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length of the derived collection, which is the source's length.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Number of currently materialized derived objects.
    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }

    pub fn max_accessed_index(&self) -> Option<usize> {
        self.max_accessed
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The derived object at `index`, materializing it on first access.
    ///
    /// A hit refreshes the entry's recency and recorded index; a miss builds
    /// the object through the factory and may evict the least recently used
    /// entry. Every access raises the high-water mark.
    pub fn at(&mut self, index: usize) -> Result<&V, SyncError> {
        self.guard()?;
        let Some(model) = self.source.get(index) else {
            return Err(SyncError::IndexOutOfBounds {
                index,
                len: self.source.len(),
            });
        };
        let id = model.identity();
        self.max_accessed = Some(self.max_accessed.map_or(index, |m| m.max(index)));

        if self.entries.contains_key(&id) {
            self.touch(&id);
            if let Some(entry) = self.entries.get_mut(&id) {
                if entry.last_index != index {
                    if self.index_to_id.get(&entry.last_index) == Some(&id) {
                        self.index_to_id.remove(&entry.last_index);
                    }
                    entry.last_index = index;
                    self.index_to_id.insert(index, id.clone());
                }
            }
        } else {
            lwtrace!(index, "materializing derived object");
            let view = (self.factory)(&model);
            self.entries.insert(
                id.clone(),
                CacheEntry {
                    view,
                    last_index: index,
                },
            );
            self.index_to_id.insert(index, id.clone());
            self.recency.push_back(id.clone());
            self.evict_overflow();
        }

        self.entries
            .get(&id)
            .map(|entry| &entry.view)
            .ok_or(SyncError::IdentityLookupFailed)
    }

    /// Whether `view`'s underlying model is currently present in the source.
    pub fn contains(&mut self, view: &V) -> Result<bool, SyncError>
    where
        V: HasIdentity<Id = I>,
    {
        Ok(self.index_of(view)?.is_some())
    }

    /// The current source index of `view`'s underlying model.
    ///
    /// If the cache holds the identity but the source does not, the stale
    /// entry is evicted defensively and the lookup re-attempted once against
    /// current source state.
    pub fn index_of(&mut self, view: &V) -> Result<Option<usize>, SyncError>
    where
        V: HasIdentity<Id = I>,
    {
        self.guard()?;
        let id = view.identity();
        if let Some(index) = self.source.position_of(&id) {
            return Ok(Some(index));
        }
        if self.entries.contains_key(&id) {
            lwwarn!("cached identity missing from source; evicting stale entry");
            self.evict_id(&id);
            return Ok(self.source.position_of(&id));
        }
        Ok(None)
    }

    /// Translates one source mutation into the derived space.
    ///
    /// `Remove` evicts and reports the cached entries among the removed
    /// indices; `Add` eagerly materializes only the inserted prefix at or
    /// below the high-water mark; `Reset` evicts everything. `Replace` and
    /// `Move` are rejected and halt the cache until a `Reset`. After every
    /// applied mutation the index ↔ id maps are fully rebuilt against current
    /// source order.
    pub fn apply_source_event(&mut self, event: &SourceEvent<M>) -> Result<(), SyncError> {
        if self.disposed {
            return Err(SyncError::Disposed);
        }
        if self.halted && !matches!(event, SourceEvent::Reset) {
            return Err(SyncError::Halted);
        }
        match event {
            SourceEvent::Add { start_index, items } => {
                let eager_end = match self.max_accessed {
                    Some(hwm) if *start_index <= hwm => {
                        (hwm + 1).min(start_index + items.len())
                    }
                    _ => *start_index,
                };
                let count = eager_end - start_index;
                for (offset, model) in items.iter().take(count).enumerate() {
                    let index = start_index + offset;
                    let id = model.identity();
                    if self.entries.contains_key(&id) {
                        self.touch(&id);
                    } else {
                        let view = (self.factory)(model);
                        self.entries.insert(
                            id.clone(),
                            CacheEntry {
                                view,
                                last_index: index,
                            },
                        );
                        self.recency.push_back(id);
                    }
                }
                self.evict_overflow();
                self.rebuild_maps();
                lwdebug!(start_index, inserted = items.len(), eager = count, "add translated");
                if count > 0 {
                    self.notify(CacheEvent::Added {
                        start_index: *start_index,
                        count,
                    });
                }
                Ok(())
            }
            SourceEvent::Remove { start_index, count } => {
                let mut removed: Vec<(usize, V)> = Vec::new();
                for index in *start_index..start_index.saturating_add(*count) {
                    let Some(id) = self.index_to_id.get(&index).cloned() else {
                        continue;
                    };
                    if let Some(entry) = self.entries.remove(&id) {
                        self.forget_recency(&id);
                        removed.push((index, entry.view));
                    }
                }
                self.rebuild_maps();
                lwdebug!(start_index, count, evicted = removed.len(), "remove translated");
                if !removed.is_empty() {
                    self.notify(CacheEvent::Removed { views: &removed });
                }
                for (_, view) in removed {
                    self.run_disposer(view);
                }
                Ok(())
            }
            SourceEvent::Reset => {
                self.halted = false;
                let views = self.take_all_views();
                self.max_accessed = None;
                lwdebug!(evicted = views.len(), "reset translated");
                self.notify(CacheEvent::Cleared);
                for view in views {
                    self.run_disposer(view);
                }
                Ok(())
            }
            SourceEvent::Replace { .. } | SourceEvent::Move { .. } => {
                lwwarn!(kind = ?event.kind(), "unsupported source mutation");
                self.halted = true;
                Err(SyncError::UnsupportedMutation(event.kind()))
            }
        }
    }

    pub fn subscribe(
        &mut self,
        callback: impl for<'a> Fn(CacheEvent<'a, V>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub, _)| *sub != id);
    }

    /// Evicts and disposes every entry and drops subscribers. Idempotent;
    /// also run by `Drop`.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let views = self.take_all_views();
        lwdebug!(evicted = views.len(), "DerivedViewCache::dispose");
        for view in views {
            self.run_disposer(view);
        }
        self.subscribers.clear();
    }

    fn guard(&self) -> Result<(), SyncError> {
        if self.disposed {
            return Err(SyncError::Disposed);
        }
        if self.halted {
            return Err(SyncError::Halted);
        }
        Ok(())
    }

    fn notify(&self, event: CacheEvent<'_, V>) {
        for (_, callback) in &self.subscribers {
            callback(event);
        }
    }

    fn touch(&mut self, id: &I) {
        self.forget_recency(id);
        self.recency.push_back(id.clone());
    }

    fn forget_recency(&mut self, id: &I) {
        if let Some(pos) = self.recency.iter().position(|known| known == id) {
            self.recency.remove(pos);
        }
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            let Some(id) = self.recency.pop_front() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&id) {
                if self.index_to_id.get(&entry.last_index) == Some(&id) {
                    self.index_to_id.remove(&entry.last_index);
                }
                lwtrace!(index = entry.last_index, "evicting least recently used entry");
                self.run_disposer(entry.view);
            }
        }
    }

    fn evict_id(&mut self, id: &I) {
        if let Some(entry) = self.entries.remove(id) {
            self.forget_recency(id);
            if self.index_to_id.get(&entry.last_index) == Some(id) {
                self.index_to_id.remove(&entry.last_index);
            }
            self.run_disposer(entry.view);
        }
    }

    /// Full recompute of the index ↔ id maps from current cache contents
    /// against current source order. Ids the source no longer knows are
    /// evicted defensively.
    fn rebuild_maps(&mut self) {
        self.index_to_id.clear();
        let ids: Vec<I> = self.entries.keys().cloned().collect();
        let mut stale: Vec<I> = Vec::new();
        for id in ids {
            match self.source.position_of(&id) {
                Some(index) => {
                    if let Some(entry) = self.entries.get_mut(&id) {
                        entry.last_index = index;
                    }
                    self.index_to_id.insert(index, id);
                }
                None => stale.push(id),
            }
        }
        for id in &stale {
            lwwarn!("entry missing from source during map rebuild; evicting");
            self.evict_id(id);
        }
    }

    fn take_all_views(&mut self) -> Vec<V> {
        self.index_to_id.clear();
        self.recency.clear();
        let entries = core::mem::take(&mut self.entries);
        entries.into_iter().map(|(_, entry)| entry.view).collect()
    }

    fn run_disposer(&mut self, view: V) {
        if let Some(disposer) = self.disposer.as_mut() {
            disposer(view);
        }
    }
}

impl<M, V, I> Drop for DerivedViewCache<M, V, I> {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.index_to_id.clear();
        self.recency.clear();
        if let Some(disposer) = self.disposer.as_mut() {
            let entries = core::mem::take(&mut self.entries);
            for (_, entry) in entries {
                disposer(entry.view);
            }
        }
        self.subscribers.clear();
    }
}

impl<M, V, I> core::fmt::Debug for DerivedViewCache<M, V, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DerivedViewCache")
            .field("len", &self.source.len())
            .field("cached", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("max_accessed", &self.max_accessed)
            .field("halted", &self.halted)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
