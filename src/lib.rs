//! A headless windowed-synchronization engine for live, mutating ordered collections.
//!
//! This crate focuses on the core bookkeeping needed to consume a large, continuously
//! mutating ordered dataset through a bounded "infinite scroll" window:
//!
//! - a pull-based pagination contract ([`PageRequest`] → [`PageResponse`], driven through
//!   a [`PageFetcher`])
//! - a monotonically growing materialized window over the source ([`WindowedResultSet`])
//! - in-place patching of that window from the source's own structural change stream
//!   ([`LiveWindowSync`])
//! - a lazily materialized, identity-keyed, capacity-bounded collection of derived
//!   objects over a live source ([`DerivedViewCache`])
//!
//! It is storage- and UI-agnostic. A driver layer is expected to provide:
//! - the actual data access (a [`PageFetcher`] / [`LiveSource`] implementation)
//! - delivery of the source's change notifications, in arrival order
//! - completion of suspended page fetches via [`WindowedResultSet::complete_load`]
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod contract;
mod error;
mod event;
mod key;
mod live;
mod signal;
mod source;
mod window;


pub use cache::{CacheEventCallback, DerivedViewCache};
pub use contract::{Fetch, PageFetcher, PageInfo, PageRequest, PageResponse};
pub use error::{FetchError, SyncError};
pub use event::{CacheEvent, MutationKind, SourceEvent, WindowEvent};
pub use live::LiveWindowSync;
pub use signal::{Signal, SignalCallback, SubscriptionId};
pub use source::{HasIdentity, IdentitySource, LiveSource};
pub use window::{LoadId, LoadStatus, WindowEventCallback, WindowedResultSet};

#[cfg(feature = "std")]
pub use source::MemorySource;

#[doc(hidden)]
pub use key::StableKey;
