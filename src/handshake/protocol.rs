use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::diagram;
use super::marker::{
    HandoffContext, HandoffState, HandshakeMarker, ValidationResult, parse_timestamp,
};
use crate::config::HandoffConfig;
use crate::error::Result;
use crate::storage::{HandoffQuery, MarkerStore};
use crate::trail::{TrailEntry, TrailLog};

/// Coordinates handoff creation, validation, retrieval and visualization over
/// the marker store and the rationale trail.
#[derive(Debug, Clone)]
pub struct HandshakeProtocol {
    store: MarkerStore,
    trail: TrailLog,
}

impl HandshakeProtocol {
    pub fn new(config: &HandoffConfig) -> Self {
        Self {
            store: MarkerStore::new(&config.handoff_dir, config.sync_writes),
            trail: TrailLog::new(&config.trail_dir, config.sync_writes),
        }
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn trail(&self) -> &TrailLog {
        &self.trail
    }

    /// Records a handoff from `from_agent` to `to_agent` and returns the new marker.
    ///
    /// The marker is appended to the session log first, then its trail entry.
    /// If the trail append fails the marker stays recorded; nothing is rolled back.
    pub async fn create_handoff(
        &self,
        from_agent: &str,
        to_agent: &str,
        state: HandoffState,
        context: HandoffContext,
        session_id: &str,
        coherence_score: Option<f64>,
    ) -> Result<HandshakeMarker> {
        let marker = HandshakeMarker {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            from_agent: from_agent.to_string(),
            to_agent: to_agent.to_string(),
            state: state.to_string(),
            context,
            trail_id: format!("ATOM-{}", Uuid::new_v4()),
            coherence_score,
            signature: None,
            session_id: session_id.to_string(),
        };

        self.store.append(&marker).await?;

        let entry = TrailEntry::for_marker(&marker)?;
        if let Err(e) = self.trail.append(&entry, &marker.session_id).await {
            warn!(
                id = %marker.id,
                session = %marker.session_id,
                error = %e,
                "marker recorded but trail entry was not written"
            );
            return Err(e);
        }

        info!(
            id = %marker.id,
            session = %marker.session_id,
            from = %marker.from_agent,
            to = %marker.to_agent,
            state = %marker.state,
            "handoff created"
        );
        Ok(marker)
    }

    /// Checks a marker's structure and whether it exists in the store.
    ///
    /// Missing or malformed fields are errors. An out-of-range score, a WAVE
    /// without a score, or a marker absent from the store are warnings only.
    pub async fn validate_handoff(&self, marker: &HandshakeMarker) -> Result<ValidationResult> {
        let errors = structural_errors(marker);
        let mut warnings = score_warnings(marker);

        if self.store.find_by_id(&marker.id).await?.is_none() {
            warnings.push("Marker not found in storage".to_string());
        }

        Ok(ValidationResult::from_issues(errors, warnings))
    }

    pub async fn get_handoff_chain(&self, session_id: &str) -> Result<Vec<HandshakeMarker>> {
        self.store.load_chain(session_id).await
    }

    pub async fn query_handoffs(&self, query: &HandoffQuery) -> Result<Vec<HandshakeMarker>> {
        self.store.query(query).await
    }

    /// Mermaid diagram of the session's chain. Identical chains give identical text.
    pub async fn visualize_workflow(&self, session_id: &str) -> Result<String> {
        let chain = self.get_handoff_chain(session_id).await?;
        Ok(diagram::render_mermaid(&chain))
    }

    pub async fn get_all_sessions(&self) -> Result<BTreeSet<String>> {
        self.store.list_sessions().await
    }

    pub async fn find_marker_by_id(&self, marker_id: &str) -> Result<Option<HandshakeMarker>> {
        self.store.find_by_id(marker_id).await
    }

    pub async fn trail_entries(&self, session_id: &str) -> Result<Vec<TrailEntry>> {
        self.trail.read_entries(session_id).await
    }
}

fn structural_errors(marker: &HandshakeMarker) -> Vec<String> {
    let mut errors = Vec::new();

    if marker.id.is_empty() {
        errors.push("Marker ID is required".to_string());
    }
    if marker.from_agent.trim().is_empty() {
        errors.push("fromAgent is required".to_string());
    }
    if marker.to_agent.trim().is_empty() {
        errors.push("toAgent is required".to_string());
    }
    if marker.state.is_empty() {
        errors.push("state is required".to_string());
    } else if marker.handoff_state().is_none() {
        errors.push(format!("Invalid state: {}", marker.state));
    }
    if marker.timestamp.is_empty() {
        errors.push("timestamp is required".to_string());
    } else if parse_timestamp(&marker.timestamp).is_none() {
        errors.push("Invalid timestamp format".to_string());
    }
    if marker.trail_id.is_empty() {
        errors.push("trailId is required".to_string());
    }
    if marker.session_id.is_empty() {
        errors.push("sessionId is required".to_string());
    }

    errors
}

fn score_warnings(marker: &HandshakeMarker) -> Vec<String> {
    let mut warnings = Vec::new();

    if marker
        .coherence_score
        .is_some_and(|score| !(0.0..=100.0).contains(&score))
    {
        warnings.push("coherenceScore should be between 0 and 100".to_string());
    }
    if marker.handoff_state() == Some(HandoffState::Wave) && marker.coherence_score.is_none() {
        warnings.push("WAVE state typically includes a coherenceScore".to_string());
    }

    warnings
}
