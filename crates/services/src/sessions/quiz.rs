use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::fmt;

use classroom_core::model::{
    ContentCatalog, Difficulty, GameSettings, ParticipantId, QuestionId, QuestionItem,
    ResultSummary, ScoreBoard, ScoreChange, SessionId, SessionMeta,
};
use classroom_core::time::after_millis;

use super::GameSession;
use super::deferred::{Deferred, DeferredTicket};
use super::policy::ModePolicy;
use super::progress::SessionProgress;
use crate::error::SessionError;
use crate::pool::QuestionPool;
use crate::summary::ResultSummarizer;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    AwaitingAnswer,
    ShowingResult,
    Completed,
}

impl QuizPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizPhase::AwaitingAnswer => "awaiting an answer",
            QuizPhase::ShowingResult => "showing a result",
            QuizPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Outcome of judging a submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerVerdict {
    pub correct: bool,
    pub expected_answer: String,
    pub answered_count: u32,
    /// Fires when the result has been on screen long enough to move on.
    pub reveal: DeferredTicket,
}

/// What `advance` moved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next(QuestionItem),
    Completed(ResultSummary),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One recitation-quiz play-through.
///
/// Correctness is judged before attribution: `submit_answer` decides whether
/// the answer was right, and `credit` then names whoever gave it.
pub struct QuizSession {
    id: SessionId,
    policy: ModePolicy,
    pool: QuestionPool,
    reveal_delay_ms: u32,
    rng: StdRng,
    used: HashSet<QuestionId>,
    current: QuestionItem,
    answered: u32,
    phase: QuizPhase,
    credit_open: bool,
    scoreboard: ScoreBoard,
    reveal: Deferred<()>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    summary: Option<ResultSummary>,
}

impl QuizSession {
    /// Load the pool for `difficulty` and present the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the tier is missing or empty.
    pub fn start(
        catalog: &ContentCatalog,
        settings: &GameSettings,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        Self::start_with_rng(
            catalog,
            settings,
            difficulty,
            started_at,
            StdRng::from_rng(&mut rand::rng()),
        )
    }

    /// Like [`QuizSession::start`] with a caller-supplied random source.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the tier is missing or empty.
    pub fn start_with_rng(
        catalog: &ContentCatalog,
        settings: &GameSettings,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
        mut rng: StdRng,
    ) -> Result<Self, SessionError> {
        let pool = QuestionPool::load(catalog, difficulty)?;
        let policy = ModePolicy::quiz(catalog.topic(), settings, difficulty);
        let (current, used) = pool.pick_next(&HashSet::new(), &mut rng);
        let session = Self {
            id: SessionId::random(),
            policy,
            pool,
            reveal_delay_ms: settings.reveal_delay_ms(),
            rng,
            used,
            current,
            answered: 0,
            phase: QuizPhase::AwaitingAnswer,
            credit_open: false,
            scoreboard: ScoreBoard::new(policy.score_mode()),
            reveal: Deferred::default(),
            started_at,
            completed_at: None,
            summary: None,
        };
        log::info!(
            "quiz {} started: {} {} questions",
            session.id,
            session.target_count(),
            difficulty
        );
        Ok(session)
    }

    /// Same as `start_with_rng` seeded from `seed`, for reproducible runs.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the tier is missing or empty.
    pub fn start_seeded(
        catalog: &ContentCatalog,
        settings: &GameSettings,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
        seed: u64,
    ) -> Result<Self, SessionError> {
        Self::start_with_rng(
            catalog,
            settings,
            difficulty,
            started_at,
            StdRng::seed_from_u64(seed),
        )
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    /// The question on screen; `None` once the quiz has completed.
    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionItem> {
        (self.phase != QuizPhase::Completed).then_some(&self.current)
    }

    #[must_use]
    pub fn answered_count(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn target_count(&self) -> u32 {
        self.policy.completion.target()
    }

    #[must_use]
    pub fn used_question_ids(&self) -> &HashSet<QuestionId> {
        &self.used
    }

    #[must_use]
    pub fn pool(&self) -> &QuestionPool {
        &self.pool
    }

    /// True while a correct answer is waiting for `credit`.
    #[must_use]
    pub fn credit_pending(&self) -> bool {
        self.credit_open
    }

    #[must_use]
    pub fn pending_reveal(&self) -> Option<DeferredTicket> {
        self.reveal.ticket()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Metadata the summary was built from, once the quiz has completed.
    #[must_use]
    pub fn meta(&self) -> Option<SessionMeta> {
        self.completed_at.map(|ended_at| self.meta_at(ended_at))
    }

    /// Judge an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` unless the session is awaiting an answer.
    pub fn submit_answer(
        &mut self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<AnswerVerdict, SessionError> {
        self.require(QuizPhase::AwaitingAnswer, "submit_answer")?;

        let correct = self.current.accepts(raw);
        self.answered += 1;
        self.credit_open = correct;
        self.phase = QuizPhase::ShowingResult;
        let reveal = self
            .reveal
            .schedule(self.id, after_millis(now, self.reveal_delay_ms), ());

        log::debug!(
            "quiz {} answer {}/{} for {}: {}",
            self.id,
            self.answered,
            self.target_count(),
            self.current.id(),
            if correct { "correct" } else { "incorrect" }
        );

        Ok(AnswerVerdict {
            correct,
            expected_answer: self.current.expected_answer().to_owned(),
            answered_count: self.answered,
            reveal,
        })
    }

    /// Attribute the last correct answer to `name`.
    ///
    /// A blank name changes nothing and leaves the credit available.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` outside the result phase, or
    /// `SessionError::NoCreditPending` if the answer was wrong or already credited.
    pub fn credit(&mut self, name: &str) -> Result<ScoreChange, SessionError> {
        self.require(QuizPhase::ShowingResult, "credit")?;
        if !self.credit_open {
            return Err(SessionError::NoCreditPending);
        }

        let change = self
            .scoreboard
            .add_or_increment(name, self.policy.scoring.credit_for_correct());
        if change != ScoreChange::Ignored {
            self.credit_open = false;
        }
        Ok(change)
    }

    /// Move past the result: complete the quiz or show the next question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` unless a result is showing.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        self.require(QuizPhase::ShowingResult, "advance")?;

        if self.policy.completion.is_met(self.answered) {
            let ended_at = now.max(self.started_at);
            let summary = ResultSummarizer::finalize(&self.scoreboard, &self.meta_at(ended_at))?;
            self.reveal.cancel();
            self.credit_open = false;
            self.phase = QuizPhase::Completed;
            self.completed_at = Some(ended_at);
            self.summary = Some(summary.clone());
            log::info!(
                "quiz {} completed with {} participants",
                self.id,
                self.scoreboard.len()
            );
            return Ok(Advance::Completed(summary));
        }

        let (next, used) = self.pool.pick_next(&self.used, &mut self.rng);
        self.used = used;
        self.current = next.clone();
        self.reveal.cancel();
        self.credit_open = false;
        self.phase = QuizPhase::AwaitingAnswer;
        Ok(Advance::Next(next))
    }

    /// Fire a scheduled reveal pause. Stale tickets are ignored (`Ok(None)`),
    /// as are tickets fired before their due time; those stay pending.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`QuizSession::advance`].
    pub fn advance_after(
        &mut self,
        ticket: DeferredTicket,
        now: DateTime<Utc>,
    ) -> Result<Option<Advance>, SessionError> {
        if now < ticket.due_at() {
            log::debug!("quiz {} reveal ticket fired early", self.id);
            return Ok(None);
        }
        if self.reveal.take(ticket).is_none() {
            log::debug!("quiz {} ignored stale reveal ticket", self.id);
            return Ok(None);
        }
        self.advance(now).map(Some)
    }

    /// Begin a new play-through with the same pool and policy.
    ///
    /// Pending tickets from the previous play-through stop being honored.
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.id = SessionId::random();
        self.reveal.cancel();
        let (current, used) = self.pool.pick_next(&HashSet::new(), &mut self.rng);
        self.current = current;
        self.used = used;
        self.answered = 0;
        self.phase = QuizPhase::AwaitingAnswer;
        self.credit_open = false;
        self.scoreboard = ScoreBoard::new(self.policy.score_mode());
        self.started_at = now;
        self.completed_at = None;
        self.summary = None;
        log::info!("quiz restarted as {}", self.id);
    }

    /// Operator action: add a student by hand, or top up an existing one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` once the quiz has completed.
    pub fn add_participant(&mut self, name: &str, points: i64) -> Result<ScoreChange, SessionError> {
        self.require_open("add_participant")?;
        Ok(self.scoreboard.add_or_increment(name, points))
    }

    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` once completed, or
    /// `SessionError::Score` for unknown participants.
    pub fn adjust(&mut self, id: ParticipantId, delta: i64) -> Result<ScoreChange, SessionError> {
        self.require_open("adjust")?;
        Ok(self.scoreboard.adjust(id, delta)?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` once completed, or
    /// `SessionError::Score` for unknown participants.
    pub fn remove(&mut self, id: ParticipantId) -> Result<(), SessionError> {
        self.require_open("remove")?;
        self.scoreboard.remove(id)?;
        Ok(())
    }

    fn meta_at(&self, ended_at: DateTime<Utc>) -> SessionMeta {
        SessionMeta {
            kind: self.policy.kind,
            difficulty: self.policy.difficulty,
            total_target: self.target_count(),
            achieved_count: self.answered,
            started_at: self.started_at,
            ended_at,
        }
    }

    fn require(&self, phase: QuizPhase, operation: &'static str) -> Result<(), SessionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(SessionError::IllegalState {
                operation,
                phase: self.phase.as_str(),
            })
        }
    }

    fn require_open(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.phase == QuizPhase::Completed {
            return Err(SessionError::IllegalState {
                operation,
                phase: self.phase.as_str(),
            });
        }
        Ok(())
    }
}

impl GameSession for QuizSession {
    fn session_id(&self) -> SessionId {
        self.id
    }

    fn policy(&self) -> &ModePolicy {
        &self.policy
    }

    fn progress(&self) -> SessionProgress {
        SessionProgress::new(
            self.target_count(),
            self.answered,
            self.phase == QuizPhase::Completed,
        )
    }

    fn scoreboard(&self) -> &ScoreBoard {
        &self.scoreboard
    }

    fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("kind", &self.policy.kind)
            .field("phase", &self.phase)
            .field("answered", &self.answered)
            .field("target", &self.target_count())
            .field("current", self.current.id())
            .field("participants", &self.scoreboard.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
