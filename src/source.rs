use alloc::vec::Vec;

/// An ordered, countable, randomly indexable live collection.
///
/// `get` clones the item out: sources are expected to hand out cheap handles
/// (ids, `Arc`s, row references), not deep copies of payloads.
pub trait LiveSource<T>: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<T>;

    /// Clones out `[start, start + len)`, clamped to the source's current
    /// length.
    fn slice(&self, start: usize, len: usize) -> Vec<T> {
        let end = start.saturating_add(len).min(self.len());
        (start..end).filter_map(|i| self.get(i)).collect()
    }
}

/// A [`LiveSource`] whose items carry a stable identity that can be looked up
/// in reverse (id → current position).
pub trait IdentitySource<T>: LiveSource<T> {
    type Id;

    fn position_of(&self, id: &Self::Id) -> Option<usize>;
}

/// An item (or derived object) exposing a stable, position-independent key.
pub trait HasIdentity {
    type Id;

    fn identity(&self) -> Self::Id;
}

/// An in-memory [`LiveSource`] for drivers and tests.
///
/// Mutators apply the change and return the matching [`SourceEvent`] so the
/// caller can forward it to whatever is synchronizing against this source.
#[cfg(feature = "std")]
pub struct MemorySource<T> {
    items: std::sync::RwLock<Vec<T>>,
}

#[cfg(feature = "std")]
use crate::SourceEvent;

#[cfg(feature = "std")]
impl<T: Clone + Send + Sync> MemorySource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: std::sync::RwLock::new(items),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn insert(&self, start_index: usize, items: Vec<T>) -> SourceEvent<T> {
        let mut guard = self.write();
        let at = start_index.min(guard.len());
        for (offset, item) in items.iter().cloned().enumerate() {
            guard.insert(at + offset, item);
        }
        SourceEvent::Add {
            start_index: at,
            items,
        }
    }

    pub fn remove(&self, start_index: usize, count: usize) -> SourceEvent<T> {
        let mut guard = self.write();
        let end = start_index.saturating_add(count).min(guard.len());
        if start_index < end {
            guard.drain(start_index..end);
        }
        SourceEvent::Remove { start_index, count }
    }

    pub fn reset(&self, items: Vec<T>) -> SourceEvent<T> {
        *self.write() = items;
        SourceEvent::Reset
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.read().clone()
    }
}

#[cfg(feature = "std")]
impl<T: Clone + Send + Sync> LiveSource<T> for MemorySource<T> {
    fn len(&self) -> usize {
        self.read().len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.read().get(index).cloned()
    }

    fn slice(&self, start: usize, len: usize) -> Vec<T> {
        let guard = self.read();
        let end = start.saturating_add(len).min(guard.len());
        if start >= end {
            return Vec::new();
        }
        guard[start..end].to_vec()
    }
}

#[cfg(feature = "std")]
impl<T> IdentitySource<T> for MemorySource<T>
where
    T: Clone + Send + Sync + crate::HasIdentity,
    T::Id: PartialEq,
{
    type Id = T::Id;

    fn position_of(&self, id: &Self::Id) -> Option<usize> {
        self.read().iter().position(|item| item.identity() == *id)
    }
}
