mod deferred;
mod matching;
mod policy;
mod progress;
mod quiz;

use classroom_core::model::{Difficulty, ResultKind, ResultSummary, ScoreBoard, SessionId};

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use deferred::DeferredTicket;
pub use matching::{BoardCard, CardFace, MatchPhase, MatchingSession, RevealOutcome, TeamTime};
pub use policy::{CompletionPredicate, ModePolicy, ScoringPolicy};
pub use progress::SessionProgress;
pub use quiz::{Advance, AnswerVerdict, QuizPhase, QuizSession};

/// Read-side view shared by every game mode.
///
/// Publishing and export only need this much, so they work for any mode.
pub trait GameSession {
    fn session_id(&self) -> SessionId;

    fn policy(&self) -> &ModePolicy;

    fn progress(&self) -> SessionProgress;

    fn scoreboard(&self) -> &ScoreBoard;

    /// Frozen result; `Some` only once the session has completed.
    fn summary(&self) -> Option<&ResultSummary>;

    fn kind(&self) -> ResultKind {
        self.policy().kind
    }

    fn difficulty(&self) -> Difficulty {
        self.policy().difficulty
    }

    fn is_complete(&self) -> bool {
        self.summary().is_some()
    }
}
