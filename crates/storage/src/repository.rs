use async_trait::async_trait;
use classroom_core::model::{ExportRow, Profile, ResultId, ResultKind, ResultSummary, UserHandle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted result document with its storage id.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub id: ResultId,
    pub kind: ResultKind,
    pub summary: ResultSummary,
}

impl ResultRow {
    #[must_use]
    pub fn new(id: ResultId, kind: ResultKind, summary: ResultSummary) -> Self {
        Self { id, kind, summary }
    }
}

/// Write side of the external document store.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Store a finalized summary in the collection for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn append_result(
        &self,
        kind: ResultKind,
        summary: &ResultSummary,
    ) -> Result<ResultId, StorageError>;

    /// Newest-first results for one collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_results(&self, kind: ResultKind, limit: u32)
    -> Result<Vec<ResultRow>, StorageError>;
}

/// Output boundary for leaderboard exports (the sink owns the file format).
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be written.
    async fn export_rows(&self, filename: &str, rows: &[ExportRow]) -> Result<(), StorageError>;
}

/// Read-only profile lookup backed by the identity provider.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Returns `None` when the handle has no profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup itself fails.
    async fn profile(&self, user: &UserHandle) -> Result<Option<Profile>, StorageError>;
}

/// One export call captured by the in-memory sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBatch {
    pub filename: String,
    pub rows: Vec<ExportRow>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    results: Arc<Mutex<Vec<ResultRow>>>,
    exports: Arc<Mutex<Vec<ExportBatch>>>,
    profiles: Arc<Mutex<HashMap<UserHandle, Profile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_profile(&self, user: UserHandle, profile: Profile) -> Result<(), StorageError> {
        let mut guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(user, profile);
        Ok(())
    }

    /// Every export captured so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn exports(&self) -> Result<Vec<ExportBatch>, StorageError> {
        let guard = self
            .exports
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no result has this id.
    pub fn get_result(&self, id: ResultId) -> Result<ResultRow, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResultSink for InMemoryRepository {
    async fn append_result(
        &self,
        kind: ResultKind,
        summary: &ResultSummary,
    ) -> Result<ResultId, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = guard.last().map_or(1, |row| row.id + 1);
        guard.push(ResultRow::new(id, kind, summary.clone()));
        Ok(id)
    }

    async fn list_results(
        &self,
        kind: ResultKind,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard
            .iter()
            .rev()
            .filter(|row| row.kind == kind)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExportSink for InMemoryRepository {
    async fn export_rows(&self, filename: &str, rows: &[ExportRow]) -> Result<(), StorageError> {
        let mut guard = self
            .exports
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(ExportBatch {
            filename: filename.to_owned(),
            rows: rows.to_vec(),
        });
        Ok(())
    }
}

#[async_trait]
impl ProfileLookup for InMemoryRepository {
    async fn profile(&self, user: &UserHandle) -> Result<Option<Profile>, StorageError> {
        let guard = self
            .profiles
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(user).cloned())
    }
}

/// Aggregates the collaborator contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub results: Arc<dyn ResultSink>,
    pub exports: Arc<dyn ExportSink>,
    pub profiles: Arc<dyn ProfileLookup>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let results: Arc<dyn ResultSink> = Arc::new(repo.clone());
        let exports: Arc<dyn ExportSink> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileLookup> = Arc::new(repo);
        Self {
            results,
            exports,
            profiles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{
        Difficulty, RankedEntry, Role, ScoreDetail, ScoreMode, SessionMeta,
    };
    use classroom_core::time::fixed_now;

    fn summary(kind: ResultKind, winner: &str) -> ResultSummary {
        let meta = SessionMeta {
            kind,
            difficulty: Difficulty::Easy,
            total_target: 4,
            achieved_count: 4,
            started_at: fixed_now(),
            ended_at: fixed_now(),
        };
        let entries = vec![RankedEntry {
            rank: 1,
            name: winner.into(),
            metric: 4,
            detail: ScoreDetail::Percentage(100.0),
        }];
        ResultSummary::new(meta, entries).unwrap()
    }

    #[tokio::test]
    async fn lists_newest_first_per_collection() {
        let repo = InMemoryRepository::new();
        repo.append_result(ResultKind::PlanetQuiz, &summary(ResultKind::PlanetQuiz, "A"))
            .await
            .unwrap();
        repo.append_result(ResultKind::MemoryMatch, &summary(ResultKind::MemoryMatch, "T"))
            .await
            .unwrap();
        let latest = repo
            .append_result(ResultKind::PlanetQuiz, &summary(ResultKind::PlanetQuiz, "B"))
            .await
            .unwrap();

        let rows = repo.list_results(ResultKind::PlanetQuiz, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, latest);
        assert_eq!(rows[0].summary.winner().unwrap().name, "B");

        let limited = repo.list_results(ResultKind::PlanetQuiz, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn profiles_round_trip() {
        let repo = InMemoryRepository::new();
        let handle = UserHandle::new("u-1");
        repo.upsert_profile(
            handle.clone(),
            Profile::new(Some(Role::Teacher), "Ms. Vega", "vega@school.test"),
        )
        .unwrap();

        let found = repo.profile(&handle).await.unwrap().unwrap();
        assert_eq!(found.role, Some(Role::Teacher));
        assert!(repo.profile(&UserHandle::new("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn captures_exports() {
        let repo = InMemoryRepository::new();
        let row = ExportRow {
            mode: ScoreMode::Points,
            rank: 1,
            name: "Ada".into(),
            value: "3".into(),
            date: "2023-11-14".into(),
            difficulty: "Easy".into(),
        };
        repo.export_rows("out.csv", &[row.clone()]).await.unwrap();

        let batches = repo.exports().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].filename, "out.csv");
        assert_eq!(batches[0].rows, vec![row]);
    }

    #[test]
    fn missing_result_is_not_found() {
        let repo = InMemoryRepository::new();
        assert!(matches!(repo.get_result(9), Err(StorageError::NotFound)));
    }
}
