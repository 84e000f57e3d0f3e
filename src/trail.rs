//! Rationale trail written alongside the marker log.
//!
//! Every handoff gets one [`TrailEntry`] in `<trail_dir>/<session>.atom.jsonl`
//! describing who decided what and why, in plain language.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HandoffError, Result};
use crate::handshake::HandshakeMarker;
use crate::storage::jsonl;

const TRAIL_SUFFIX: &str = ".atom.jsonl";

/// Result recorded for a trail entry. Only successful handoffs are ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailOutcome {
    Success,
}

/// A human-readable rationale record, paired one-to-one with a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailEntry {
    pub actor: String,
    pub decision: String,
    pub rationale: String,
    pub outcome: TrailOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coherence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl TrailEntry {
    /// Derives the rationale entry for `marker`.
    ///
    /// Format: decision `H&&S: <STATE> to <toAgent>`, rationale
    /// `Coherence: <score|N/A>%, Context: <json>`.
    pub fn for_marker(marker: &HandshakeMarker) -> Result<Self> {
        let score = marker
            .coherence_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let context = serde_json::to_string(&marker.context)?;

        Ok(Self {
            actor: marker.from_agent.clone(),
            decision: format!("H&&S: {} to {}", marker.state, marker.to_agent),
            rationale: format!("Coherence: {score}%, Context: {context}"),
            outcome: TrailOutcome::Success,
            coherence_score: marker.coherence_score,
            timestamp: Some(marker.timestamp.clone()),
        })
    }
}

/// Append-only trail log, one stream per session under `root`.
#[derive(Debug, Clone)]
pub struct TrailLog {
    root: PathBuf,
    sync: bool,
}

impl TrailLog {
    pub fn new(root: impl Into<PathBuf>, sync: bool) -> Self {
        Self {
            root: root.into(),
            sync,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_file(&self, session_id: &str) -> Result<PathBuf> {
        jsonl::stream_path(&self.root, session_id, TRAIL_SUFFIX)
    }

    /// Appends `entry` to the session's trail. Rejects the same session ids as
    /// [`MarkerStore::append`](crate::MarkerStore::append).
    pub async fn append(&self, entry: &TrailEntry, session_id: &str) -> Result<()> {
        let path = self.session_file(session_id)?;
        jsonl::append_record(&self.root, &path, entry, self.sync).await?;
        debug!(session = session_id, actor = %entry.actor, "appended trail entry");
        Ok(())
    }

    /// All entries for a session in append order; empty when the session has none.
    pub async fn read_entries(&self, session_id: &str) -> Result<Vec<TrailEntry>> {
        match self.session_file(session_id) {
            Ok(path) => jsonl::read_records(&path).await,
            Err(HandoffError::InvalidSession(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
