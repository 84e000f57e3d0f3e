//! File-backed, session-partitioned storage for handoff markers.

pub(crate) mod jsonl;
mod markers;
mod query;

pub use markers::MarkerStore;
pub use query::HandoffQuery;
