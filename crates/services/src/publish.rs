use chrono::{DateTime, Utc};

use classroom_core::model::{
    Difficulty, Profile, ResultId, ResultKind, ResultSummary, UserHandle,
};
use storage::{ResultRow, Storage};

use crate::error::PublishError;
use crate::summary::ResultSummarizer;

/// Compact row for "recent results" lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultListItem {
    pub id: ResultId,
    pub kind: ResultKind,
    pub difficulty: Difficulty,
    pub ended_at: DateTime<Utc>,
    pub participants: usize,
    pub winner: Option<String>,
}

impl ResultListItem {
    #[must_use]
    pub fn from_row(row: &ResultRow) -> Self {
        let summary = &row.summary;
        Self {
            id: row.id,
            kind: row.kind,
            difficulty: summary.difficulty(),
            ended_at: summary.ended_at(),
            participants: summary.participants_ranked().len(),
            winner: summary.winner().map(|entry| entry.name.clone()),
        }
    }
}

/// Gatekeeper between finished sessions and the external sinks.
///
/// Only teachers and admins may persist or export; everyone else is refused
/// before any sink is touched.
#[derive(Clone)]
pub struct ResultPublisher {
    storage: Storage,
}

impl ResultPublisher {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Append `summary` to the collection for its mode.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::UnknownUser` or `PublishError::NotPermitted` when
    /// the user may not publish, and `PublishError::Persistence` when the sink
    /// fails. A failed write is reported, never retried.
    pub async fn publish(
        &self,
        user: &UserHandle,
        summary: &ResultSummary,
    ) -> Result<ResultId, PublishError> {
        self.authorize(user).await?;
        let kind = summary.kind();
        let id = self
            .storage
            .results
            .append_result(kind, summary)
            .await
            .inspect_err(|e| log::error!("failed to store {kind} result: {e}"))?;
        log::info!("{user} published {kind} result {id}");
        Ok(id)
    }

    /// Hand the ranked rows to the export sink; returns the file name used.
    ///
    /// # Errors
    ///
    /// Same as [`ResultPublisher::publish`].
    pub async fn export(
        &self,
        user: &UserHandle,
        summary: &ResultSummary,
    ) -> Result<String, PublishError> {
        self.authorize(user).await?;
        let filename = ResultSummarizer::export_filename(summary);
        let rows = ResultSummarizer::export_rows(summary);
        self.storage.exports.export_rows(&filename, &rows).await?;
        log::info!("{user} exported {} rows to {filename}", rows.len());
        Ok(filename)
    }

    /// Newest-first results for one mode.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Persistence` on read failures.
    pub async fn list_recent(
        &self,
        kind: ResultKind,
        limit: u32,
    ) -> Result<Vec<ResultListItem>, PublishError> {
        let rows = self.storage.results.list_results(kind, limit).await?;
        Ok(rows.iter().map(ResultListItem::from_row).collect())
    }

    async fn authorize(&self, user: &UserHandle) -> Result<Profile, PublishError> {
        let Some(profile) = self.storage.profiles.profile(user).await? else {
            log::warn!("publish refused: no profile for {user}");
            return Err(PublishError::UnknownUser);
        };
        if !profile.can_publish_results() {
            log::warn!("publish refused: {user} has role {:?}", profile.role);
            return Err(PublishError::NotPermitted { role: profile.role });
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use classroom_core::model::{RankedEntry, Role, ScoreDetail, SessionMeta};
    use classroom_core::time::fixed_now;
    use std::sync::Arc;
    use storage::{InMemoryRepository, ResultSink, StorageError};

    fn summary() -> ResultSummary {
        let meta = SessionMeta {
            kind: ResultKind::PlanetQuiz,
            difficulty: Difficulty::Easy,
            total_target: 4,
            achieved_count: 4,
            started_at: fixed_now(),
            ended_at: fixed_now() + chrono::Duration::minutes(3),
        };
        let entries = vec![RankedEntry {
            rank: 1,
            name: "Ada".into(),
            metric: 3,
            detail: ScoreDetail::Percentage(75.0),
        }];
        ResultSummary::new(meta, entries).unwrap()
    }

    fn repo_with(role: Option<Role>) -> (InMemoryRepository, UserHandle) {
        let repo = InMemoryRepository::new();
        let user = UserHandle::new("ms-frizzle");
        repo.upsert_profile(user.clone(), Profile::new(role, "Ms Frizzle", "mf@school.test"))
            .unwrap();
        (repo, user)
    }

    #[tokio::test]
    async fn teacher_publishes_and_lists() {
        let (repo, user) = repo_with(Some(Role::Teacher));
        let publisher = ResultPublisher::new(Storage::from_repository(repo.clone()));

        let id = publisher.publish(&user, &summary()).await.unwrap();
        assert_eq!(repo.get_result(id).unwrap().summary, summary());

        let recent = publisher
            .list_recent(ResultKind::PlanetQuiz, 10)
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].winner.as_deref(), Some("Ada"));
        assert!(publisher
            .list_recent(ResultKind::MemoryMatch, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn student_and_unknown_users_are_refused() {
        let (repo, student) = repo_with(Some(Role::Student));
        let publisher = ResultPublisher::new(Storage::from_repository(repo.clone()));

        assert!(matches!(
            publisher.publish(&student, &summary()).await,
            Err(PublishError::NotPermitted {
                role: Some(Role::Student)
            })
        ));
        assert!(matches!(
            publisher.export(&UserHandle::new("nobody"), &summary()).await,
            Err(PublishError::UnknownUser)
        ));
        assert!(repo.exports().unwrap().is_empty());
        assert!(repo.get_result(1).is_err());
    }

    #[tokio::test]
    async fn export_uses_summary_filename() {
        let (repo, user) = repo_with(Some(Role::Admin));
        let publisher = ResultPublisher::new(Storage::from_repository(repo.clone()));

        let filename = publisher.export(&user, &summary()).await.unwrap();
        assert_eq!(filename, "planet-quiz-easy-2023-11-14-221620.json");
        let batches = repo.exports().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].rows[0].values()[2], "3");
    }

    struct DownSink;

    #[async_trait]
    impl ResultSink for DownSink {
        async fn append_result(
            &self,
            _kind: ResultKind,
            _summary: &ResultSummary,
        ) -> Result<ResultId, StorageError> {
            Err(StorageError::Connection("store unreachable".into()))
        }

        async fn list_results(
            &self,
            _kind: ResultKind,
            _limit: u32,
        ) -> Result<Vec<ResultRow>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn sink_failure_is_reported() {
        let (repo, user) = repo_with(Some(Role::Teacher));
        let mut storage = Storage::from_repository(repo);
        storage.results = Arc::new(DownSink);
        let publisher = ResultPublisher::new(storage);

        let err = publisher.publish(&user, &summary()).await.unwrap_err();
        assert!(matches!(
            err,
            PublishError::Persistence(StorageError::Connection(_))
        ));
    }
}
