//! Asset caching layer
//!
//! The named on-disk cache store plus an in-memory metadata index.

pub mod index;
pub mod store;

pub use index::EntryIndex;
pub use store::{AssetStore, CachedResponse, EntryMeta};
