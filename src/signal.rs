use alloc::sync::Arc;
use alloc::vec::Vec;

/// Identifies a subscription to a [`Signal`] or an event stream, for
/// unsubscribing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

pub type SignalCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A single-producer broadcast scalar with replay-last-value semantics.
///
/// The signal holds no value until the first `set`; subscribing replays the
/// current value (if any) immediately, and subsequent distinct values are
/// pushed to every subscriber.
pub struct Signal<T> {
    value: Option<T>,
    subscribers: Vec<(SubscriptionId, SignalCallback<T>)>,
    next_id: u64,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// The current value, or `None` before the first `set`.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn subscribe(&mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let callback: SignalCallback<T> = Arc::new(callback);
        if let Some(value) = &self.value {
            callback(value);
        }
        self.subscribers.push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub, _)| *sub != id);
    }

    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }
}

impl<T: PartialEq> Signal<T> {
    /// Stores `value` and notifies subscribers, unless it equals the current
    /// value.
    pub fn set(&mut self, value: T) {
        if self.value.as_ref() == Some(&value) {
            return;
        }
        self.value = Some(value);
        if let Some(value) = &self.value {
            for (_, callback) in &self.subscribers {
                callback(value);
            }
        }
    }
}

impl<T: Clone> Signal<T> {
    pub fn get_cloned(&self) -> Option<T> {
        self.value.clone()
    }
}
