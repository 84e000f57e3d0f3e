use chrono::{DateTime, Utc};

use crate::handshake::{HandoffState, HandshakeMarker, parse_timestamp};

/// Filter criteria for [`MarkerStore::query`](super::MarkerStore::query).
///
/// Every criterion that is set must match. An empty query matches every marker
/// in every session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandoffQuery {
    /// Restricts the scan to one session's log.
    pub session_id: Option<String>,
    pub from_agent: Option<String>,
    pub to_agent: Option<String>,
    pub state: Option<HandoffState>,
    /// Inclusive lower bound on the marker timestamp.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the marker timestamp.
    pub end_time: Option<DateTime<Utc>>,
}

impl HandoffQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn from_agent(mut self, agent: impl Into<String>) -> Self {
        self.from_agent = Some(agent.into());
        self
    }

    pub fn to_agent(mut self, agent: impl Into<String>) -> Self {
        self.to_agent = Some(agent.into());
        self
    }

    pub fn state(mut self, state: HandoffState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Whether `marker` satisfies every agent, state and time criterion.
    ///
    /// `session_id` is not checked here; the store uses it to pick which log to read.
    /// Time bounds only apply to markers whose timestamp parses; a marker with an
    /// unreadable timestamp is kept rather than silently dropped.
    pub fn matches(&self, marker: &HandshakeMarker) -> bool {
        if self
            .from_agent
            .as_ref()
            .is_some_and(|agent| *agent != marker.from_agent)
        {
            return false;
        }
        if self
            .to_agent
            .as_ref()
            .is_some_and(|agent| *agent != marker.to_agent)
        {
            return false;
        }
        if self
            .state
            .is_some_and(|state| state.as_str() != marker.state)
        {
            return false;
        }
        if self.start_time.is_none() && self.end_time.is_none() {
            return true;
        }

        let Some(ts) = parse_timestamp(&marker.timestamp) else {
            return true;
        };
        if self.start_time.is_some_and(|start| ts < start) {
            return false;
        }
        if self.end_time.is_some_and(|end| ts > end) {
            return false;
        }
        true
    }
}
