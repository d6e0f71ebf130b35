#![forbid(unsafe_code)]

pub mod classroom;
pub mod config;
pub mod error;
pub mod pool;
pub mod publish;
pub mod sessions;
pub mod summary;

pub use classroom_core::Clock;

pub use classroom::ClassroomService;
pub use config::GameConfig;
pub use error::{ConfigLoadError, PublishError, SessionError};
pub use pool::QuestionPool;
pub use publish::{ResultListItem, ResultPublisher};
pub use sessions::{
    Advance, AnswerVerdict, BoardCard, CardFace, DeferredTicket, GameSession, MatchPhase,
    MatchingSession, ModePolicy, QuizPhase, QuizSession, RevealOutcome, SessionProgress, TeamTime,
};
pub use summary::ResultSummarizer;
