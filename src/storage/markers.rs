use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::jsonl::{self, EXTENSION};
use super::query::HandoffQuery;
use crate::error::{HandoffError, Result};
use crate::handshake::HandshakeMarker;

/// Append-only marker log, one `<session>.jsonl` file per session under `root`.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    root: PathBuf,
    sync: bool,
}

impl MarkerStore {
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
        jsonl::stream_path(&self.root, session_id, EXTENSION)
    }

    /// Appends `marker` to its session's log, creating the store root if needed.
    ///
    /// Fails with [`HandoffError::InvalidSession`] when the session id cannot name
    /// a file directly under the root.
    pub async fn append(&self, marker: &HandshakeMarker) -> Result<()> {
        let path = self.session_file(&marker.session_id)?;
        jsonl::append_record(&self.root, &path, marker, self.sync).await?;
        debug!(
            session = %marker.session_id,
            id = %marker.id,
            path = %path.display(),
            "appended handoff marker"
        );
        Ok(())
    }

    /// All markers of one session in append order. Unknown sessions are empty,
    /// including ids that [`append`](Self::append) would refuse.
    pub async fn load_chain(&self, session_id: &str) -> Result<Vec<HandshakeMarker>> {
        match self.session_file(session_id) {
            Ok(path) => jsonl::read_records(&path).await,
            Err(HandoffError::InvalidSession(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Scans every session log for a marker with `marker_id`.
    ///
    /// This reads the whole store, session by session in name order, and stops at
    /// the first match. There is no index.
    pub async fn find_by_id(&self, marker_id: &str) -> Result<Option<HandshakeMarker>> {
        for (session, path) in jsonl::list_streams(&self.root, EXTENSION).await? {
            let markers: Vec<HandshakeMarker> = jsonl::read_records(&path).await?;
            if let Some(found) = markers.into_iter().find(|m| m.id == marker_id) {
                debug!(%session, id = marker_id, "found handoff marker");
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Markers matching every criterion in `query`.
    ///
    /// With `session_id` set only that session is read; otherwise every session is
    /// scanned in name order, each contributing its markers in append order.
    pub async fn query(&self, query: &HandoffQuery) -> Result<Vec<HandshakeMarker>> {
        let markers = match &query.session_id {
            Some(session_id) => self.load_chain(session_id).await?,
            None => {
                let mut all = Vec::new();
                for (_, path) in jsonl::list_streams(&self.root, EXTENSION).await? {
                    all.extend(jsonl::read_records::<HandshakeMarker>(&path).await?);
                }
                all
            }
        };
        Ok(markers.into_iter().filter(|m| query.matches(m)).collect())
    }

    /// Session identifiers with a log file under the store root.
    pub async fn list_sessions(&self) -> Result<BTreeSet<String>> {
        Ok(jsonl::list_streams(&self.root, EXTENSION)
            .await?
            .into_iter()
            .map(|(session, _)| session)
            .collect())
    }
}
