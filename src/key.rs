use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(feature = "std")]
pub(crate) type KeyEntryMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyEntryMap<K, V> = BTreeMap<K, V>;

pub(crate) type IndexMap<K> = BTreeMap<usize, K>;

#[cfg(feature = "std")]
#[doc(hidden)]
pub trait StableKey: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq + Clone> StableKey for K {}

#[cfg(not(feature = "std"))]
#[doc(hidden)]
pub trait StableKey: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<K: Ord + Clone> StableKey for K {}
