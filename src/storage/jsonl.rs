//! JSON Lines streams: one serialized record per line, appended whole.
//!
//! Each append builds the complete line (record plus `\n`) in memory and hands it
//! to a single `write_all` on a file opened in append mode, so a reader sees
//! either the whole record or none of it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{HandoffError, Result};

pub const EXTENSION: &str = ".jsonl";

/// Path of the stream for `session_id` directly under `root`.
///
/// Session ids name a single file, so they must be non-empty, must not be `.`
/// or `..`, and must not contain a path separator.
pub fn stream_path(root: &Path, session_id: &str, suffix: &str) -> Result<PathBuf> {
    if session_id.is_empty()
        || session_id == "."
        || session_id == ".."
        || session_id.contains(['/', '\\'])
    {
        return Err(HandoffError::InvalidSession(session_id.to_string()));
    }
    Ok(root.join(format!("{session_id}{suffix}")))
}

/// Appends `record` as one line to `path`, creating `root` if needed.
///
/// Only `root` itself is created; `path` is expected to come from [`stream_path`].
pub async fn append_record<T: Serialize>(
    root: &Path,
    path: &Path,
    record: &T,
    sync: bool,
) -> Result<()> {
    fs::create_dir_all(root)
        .await
        .map_err(|e| HandoffError::io(root, e))?;

    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| HandoffError::io(path, e))?;
    file.write_all(line.as_bytes())
        .await
        .map_err(|e| HandoffError::io(path, e))?;
    // tokio buffers the write on a blocking thread; flush before the handle drops.
    file.flush().await.map_err(|e| HandoffError::io(path, e))?;
    if sync {
        file.sync_data()
            .await
            .map_err(|e| HandoffError::io(path, e))?;
    }
    Ok(())
}

/// Reads every record from `path` in append order.
///
/// A missing file yields an empty vector. Blank lines are skipped; any other
/// line that fails to parse is reported as [`HandoffError::Corrupt`].
pub async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(HandoffError::io(path, e)),
    };
    parse_lines(path, &content)
}

fn parse_lines<T: DeserializeOwned>(path: &Path, content: &str) -> Result<Vec<T>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| HandoffError::Corrupt {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// Lists the stream files in `dir` whose names end in `suffix`, sorted by name.
///
/// Returns `(stem, path)` pairs where `stem` is the file name with `suffix` removed.
/// A missing directory yields an empty list.
pub async fn list_streams(dir: &Path, suffix: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(HandoffError::io(dir, e)),
    };

    let mut streams = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| HandoffError::io(dir, e))?
    {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(stem) = name.strip_suffix(suffix) {
            streams.push((stem.to_string(), entry.path()));
        }
    }
    streams.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        n: u32,
        label: String,
    }

    #[tokio::test]
    async fn append_creates_root_and_writes_one_line() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested/deeper");
        let path = stream_path(&root, "s1", EXTENSION).unwrap();

        append_record(&root, &path, &Row { n: 1, label: "a".into() }, false)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"n\":1,\"label\":\"a\"}\n");
    }

    #[tokio::test]
    async fn records_come_back_in_append_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s1.jsonl");
        for n in 0..5 {
            append_record(dir.path(), &path, &Row { n, label: format!("r{n}") }, true)
                .await
                .unwrap();
        }

        let rows: Vec<Row> = read_records(&path).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.n).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn stream_path_accepts_plain_ids() {
        let root = Path::new("/data/handoffs");
        assert_eq!(
            stream_path(root, "s1", EXTENSION).unwrap(),
            PathBuf::from("/data/handoffs/s1.jsonl")
        );
        assert_eq!(
            stream_path(root, "team.s1-v2", ".atom.jsonl").unwrap(),
            PathBuf::from("/data/handoffs/team.s1-v2.atom.jsonl")
        );
    }

    #[test]
    fn stream_path_rejects_ids_that_leave_the_root() {
        let root = Path::new("/data/handoffs");
        for bad in ["", ".", "..", "team/s1", "../x", "a\\b", "/abs"] {
            assert!(
                matches!(
                    stream_path(root, bad, EXTENSION),
                    Err(HandoffError::InvalidSession(ref id)) if id == bad
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let rows: Vec<Row> = read_records(&dir.path().join("nope.jsonl")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s1.jsonl");
        std::fs::write(&path, "\n{\"n\":1,\"label\":\"a\"}\n\n   \n{\"n\":2,\"label\":\"b\"}\n").unwrap();

        let rows: Vec<Row> = read_records(&path).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn corrupt_line_reports_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s1.jsonl");
        std::fs::write(&path, "{\"n\":1,\"label\":\"a\"}\n{\"n\":2,\"lab").unwrap();

        let err = read_records::<Row>(&path).await.unwrap_err();
        match err {
            HandoffError::Corrupt { line, path: p, .. } => {
                assert_eq!(line, 2);
                assert_eq!(p, path);
            }
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn directory_in_place_of_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s1.jsonl");
        std::fs::create_dir(&path).unwrap();

        let err = read_records::<Row>(&path).await.unwrap_err();
        assert!(matches!(err, HandoffError::Io { .. }));
    }

    #[tokio::test]
    async fn list_streams_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.jsonl", "a.jsonl", "notes.txt", "c.atom.jsonl"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let streams = list_streams(dir.path(), ".atom.jsonl").await.unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].0, "c");

        let stems: Vec<String> = list_streams(dir.path(), EXTENSION)
            .await
            .unwrap()
            .into_iter()
            .map(|(stem, _)| stem)
            .collect();
        assert_eq!(stems, vec!["a", "b", "c.atom"]);
    }

    #[tokio::test]
    async fn list_streams_on_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let streams = list_streams(&dir.path().join("absent"), EXTENSION).await.unwrap();
        assert!(streams.is_empty());
    }
}
