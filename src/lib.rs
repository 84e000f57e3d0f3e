//! Append-only handoff log for multi-agent workflows.
//!
//! Each handoff is a [`HandshakeMarker`] recording a state transition between two
//! agents. Markers are appended to a per-session JSON Lines log and paired with a
//! plain-language [`TrailEntry`]. [`HandshakeProtocol`] ties the two stores
//! together and adds validation, querying and Mermaid rendering.

pub mod config;
pub mod error;
pub mod handshake;
pub mod storage;
pub mod trail;

pub use config::HandoffConfig;
pub use error::{HandoffError, Result};
pub use handshake::{
    HandoffContext, HandoffState, HandshakeMarker, HandshakeProtocol, ValidationResult,
    parse_timestamp,
};
pub use storage::{HandoffQuery, MarkerStore};
pub use trail::{TrailEntry, TrailLog, TrailOutcome};
