use chrono::{DateTime, Utc};

use classroom_core::Clock;
use classroom_core::model::{Difficulty, ResultId, ResultKind, Topic, UserHandle};
use storage::Storage;

use crate::config::GameConfig;
use crate::error::{PublishError, SessionError};
use crate::publish::{ResultListItem, ResultPublisher};
use crate::sessions::{GameSession, MatchingSession, QuizSession};

/// Entry point for hosts: starts sessions with the configured content and
/// hands finished ones to the publisher, reading time from one clock.
#[derive(Clone)]
pub struct ClassroomService {
    clock: Clock,
    config: GameConfig,
    publisher: ResultPublisher,
}

impl ClassroomService {
    #[must_use]
    pub fn new(clock: Clock, config: GameConfig, storage: Storage) -> Self {
        Self {
            clock,
            config,
            publisher: ResultPublisher::new(storage),
        }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn publisher(&self) -> &ResultPublisher {
        &self.publisher
    }

    /// # Errors
    ///
    /// Returns `SessionError::Config` if the topic's tier cannot be loaded.
    pub fn start_quiz(
        &self,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Result<QuizSession, SessionError> {
        QuizSession::start(
            &self.config.catalog(topic),
            self.config.settings(),
            difficulty,
            self.now(),
        )
    }

    /// Start a memory match using `topic`'s pictures for the cards.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` for missing teams or too small a tier.
    pub fn start_matching(
        &self,
        topic: Topic,
        difficulty: Difficulty,
        teams: &[String],
    ) -> Result<MatchingSession, SessionError> {
        MatchingSession::start(
            &self.config.catalog(topic),
            self.config.settings(),
            difficulty,
            teams,
            self.now(),
        )
    }

    /// Persist a completed session's summary.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::NotCompleted` for sessions still in play,
    /// otherwise as for [`ResultPublisher::publish`].
    pub async fn publish<S>(&self, user: &UserHandle, session: &S) -> Result<ResultId, PublishError>
    where
        S: GameSession + Sync + ?Sized,
    {
        let summary = session.summary().ok_or(PublishError::NotCompleted)?;
        self.publisher.publish(user, summary).await
    }

    /// Export a completed session's ranked rows; returns the file name.
    ///
    /// # Errors
    ///
    /// As for [`ClassroomService::publish`].
    pub async fn export<S>(&self, user: &UserHandle, session: &S) -> Result<String, PublishError>
    where
        S: GameSession + Sync + ?Sized,
    {
        let summary = session.summary().ok_or(PublishError::NotCompleted)?;
        self.publisher.export(user, summary).await
    }

    /// # Errors
    ///
    /// Returns `PublishError::Persistence` on read failures.
    pub async fn recent_results(
        &self,
        kind: ResultKind,
        limit: u32,
    ) -> Result<Vec<ResultListItem>, PublishError> {
        self.publisher.list_recent(kind, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{Profile, Role};
    use classroom_core::time::fixed_clock;
    use storage::InMemoryRepository;

    #[tokio::test]
    async fn unfinished_session_cannot_be_published() {
        let repo = InMemoryRepository::new();
        let teacher = UserHandle::new("t");
        repo.upsert_profile(teacher.clone(), Profile::new(Some(Role::Teacher), "T", "t@x"))
            .unwrap();
        let service = ClassroomService::new(
            fixed_clock(),
            GameConfig::default(),
            Storage::from_repository(repo),
        );

        let quiz = service.start_quiz(Topic::Planets, Difficulty::Easy).unwrap();
        assert_eq!(quiz.started_at(), service.now());
        assert!(matches!(
            service.publish(&teacher, &quiz).await,
            Err(PublishError::NotCompleted)
        ));
    }

    #[test]
    fn matching_needs_a_team() {
        let service = ClassroomService::new(fixed_clock(), GameConfig::default(), Storage::in_memory());
        assert!(service
            .start_matching(Topic::Planets, Difficulty::Easy, &[])
            .is_err());
    }
}
