//! File-backed adapter: one JSON-lines file per result collection, and one
//! JSON array file per export.

use async_trait::async_trait;
use classroom_core::model::{ExportRow, ResultId, ResultKind, ResultSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::repository::{ExportSink, ResultRow, ResultSink, StorageError};

#[derive(Serialize, Deserialize)]
struct StoredResult {
    id: ResultId,
    summary: ResultSummary,
}

fn io_err(e: std::io::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Writes results and exports under a single directory.
///
/// Appends are serialized per store; the next id of each collection is
/// scanned once and then tracked in memory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
    next_ids: Arc<Mutex<HashMap<ResultKind, ResultId>>>,
}

impl JsonFileStore {
    /// Open (and create if needed) the store directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(io_err)?;
        Ok(Self {
            root,
            next_ids: Arc::default(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, kind: ResultKind) -> PathBuf {
        self.root.join(format!("{}.jsonl", kind.collection()))
    }

    /// Every readable record, in file order. Unparseable lines (e.g. a write
    /// torn by a crash) are skipped.
    async fn read_collection(&self, kind: ResultKind) -> Result<Vec<StoredResult>, StorageError> {
        let path = self.collection_path(kind);
        let body = match fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut stored = Vec::new();
        for (index, line) in body.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => stored.push(record),
                Err(e) => log::warn!(
                    "skipping unreadable line {} of {}: {e}",
                    index + 1,
                    path.display()
                ),
            }
        }
        Ok(stored)
    }

    async fn next_id(&self, kind: ResultKind) -> Result<ResultId, StorageError> {
        let max = self
            .read_collection(kind)
            .await?
            .iter()
            .map(|stored| stored.id)
            .max();
        Ok(max.map_or(1, |id| id + 1))
    }
}

/// True when the file exists and its last byte is not a newline.
async fn ends_mid_line(path: &Path) -> Result<bool, StorageError> {
    let mut file = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(io_err(e)),
    };
    if file.metadata().await.map_err(io_err)?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1)).await.map_err(io_err)?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last).await.map_err(io_err)?;
    Ok(last[0] != b'\n')
}

#[async_trait]
impl ResultSink for JsonFileStore {
    async fn append_result(
        &self,
        kind: ResultKind,
        summary: &ResultSummary,
    ) -> Result<ResultId, StorageError> {
        let mut next_ids = self.next_ids.lock().await;
        let id = match next_ids.get(&kind) {
            Some(id) => *id,
            None => self.next_id(kind).await?,
        };

        let mut line = serde_json::to_string(&StoredResult {
            id,
            summary: summary.clone(),
        })
        .map_err(ser)?;
        line.push('\n');

        let path = self.collection_path(kind);
        if ends_mid_line(&path).await? {
            line.insert(0, '\n');
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        next_ids.insert(kind, id + 1);
        log::debug!("appended result {id} to {}", kind.collection());
        Ok(id)
    }

    async fn list_results(
        &self,
        kind: ResultKind,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .read_collection(kind)
            .await?
            .into_iter()
            .rev()
            .take(limit)
            .map(|stored| ResultRow::new(stored.id, kind, stored.summary))
            .collect())
    }
}

#[async_trait]
impl ExportSink for JsonFileStore {
    async fn export_rows(&self, filename: &str, rows: &[ExportRow]) -> Result<(), StorageError> {
        if filename.trim().is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.')
        {
            return Err(StorageError::Serialization(format!(
                "invalid export filename: {filename:?}"
            )));
        }
        let body = serde_json::to_string_pretty(rows).map_err(ser)?;
        fs::write(self.root.join(filename), body)
            .await
            .map_err(io_err)?;
        log::info!("exported {} rows to {filename}", rows.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{Difficulty, RankedEntry, ScoreDetail, ScoreMode, SessionMeta};
    use classroom_core::time::fixed_now;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("classroom-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn summary(team: &str) -> ResultSummary {
        let meta = SessionMeta {
            kind: ResultKind::MemoryMatch,
            difficulty: Difficulty::Normal,
            total_target: 1,
            achieved_count: 1,
            started_at: fixed_now(),
            ended_at: fixed_now() + chrono::Duration::seconds(75),
        };
        ResultSummary::new(
            meta,
            vec![RankedEntry {
                rank: 1,
                name: team.into(),
                metric: 75,
                detail: ScoreDetail::CompletionTime("01:15".into()),
            }],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn results_survive_reopen() {
        let dir = scratch_dir("results");
        let store = JsonFileStore::open(&dir).await.unwrap();
        let first = store
            .append_result(ResultKind::MemoryMatch, &summary("Comets"))
            .await
            .unwrap();
        let second = store
            .append_result(ResultKind::MemoryMatch, &summary("Rockets"))
            .await
            .unwrap();
        assert_eq!((first, second), (1, 2));

        let reopened = JsonFileStore::open(&dir).await.unwrap();
        let rows = reopened
            .list_results(ResultKind::MemoryMatch, 5)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].summary, summary("Rockets"));
        assert!(
            reopened
                .list_results(ResultKind::PlanetQuiz, 5)
                .await
                .unwrap()
                .is_empty()
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn export_writes_named_file() {
        let dir = scratch_dir("export");
        let store = JsonFileStore::open(&dir).await.unwrap();
        let row = ExportRow {
            mode: ScoreMode::Points,
            rank: 1,
            name: "Ada".into(),
            value: "4".into(),
            date: "2023-11-14".into(),
            difficulty: "Easy".into(),
        };
        store.export_rows("board.json", &[row]).await.unwrap();

        let written = std::fs::read_to_string(dir.join("board.json")).unwrap();
        assert!(written.contains("\"Name\": \"Ada\""));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn export_rejects_path_traversal() {
        let dir = scratch_dir("traversal");
        let store = JsonFileStore::open(&dir).await.unwrap();
        let err = store.export_rows("../evil.json", &[]).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn torn_line_is_skipped_and_appends_continue() {
        use std::io::Write;

        let dir = scratch_dir("torn");
        let store = JsonFileStore::open(&dir).await.unwrap();
        store
            .append_result(ResultKind::PlanetQuiz, &summary("Comets"))
            .await
            .unwrap();

        let path = dir.join("planetQuizResults.jsonl");
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        file.write_all(br#"{"id":2,"summ"#).unwrap();
        drop(file);

        let reopened = JsonFileStore::open(&dir).await.unwrap();
        let id = reopened
            .append_result(ResultKind::PlanetQuiz, &summary("Rockets"))
            .await
            .unwrap();
        assert_eq!(id, 2);

        let rows = reopened
            .list_results(ResultKind::PlanetQuiz, 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].summary, summary("Rockets"));
        assert_eq!(rows[1].summary, summary("Comets"));

        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(body.lines().count(), 3);
        assert!(body.ends_with('\n'));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn ids_keep_counting_within_one_store() {
        let dir = scratch_dir("ids");
        let store = JsonFileStore::open(&dir).await.unwrap();
        for expected in 1..=3 {
            let id = store
                .append_result(ResultKind::MemoryMatch, &summary("Comets"))
                .await
                .unwrap();
            assert_eq!(id, expected);
        }
        let other = store
            .append_result(ResultKind::PlanetQuiz, &summary("Rockets"))
            .await
            .unwrap();
        assert_eq!(other, 1);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
