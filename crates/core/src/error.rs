use thiserror::Error;

use crate::model::{Difficulty, QuestionError, ScoreBoardError, SummaryError};

/// Malformed or missing difficulty/content configuration.
///
/// Fatal to session start; surfaced to the caller immediately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("unknown difficulty: {0:?}")]
    UnknownDifficulty(String),

    #[error("unknown topic: {0:?}")]
    UnknownTopic(String),

    #[error("no content configured for difficulty {difficulty}")]
    EmptyPool { difficulty: Difficulty },

    #[error("duplicate question id {id:?} for difficulty {difficulty}")]
    DuplicateQuestionId { difficulty: Difficulty, id: String },

    #[error("question target for {difficulty} must be > 0")]
    InvalidQuestionTarget { difficulty: Difficulty },

    #[error("pair count for {difficulty} must be > 0")]
    InvalidPairCount { difficulty: Difficulty },

    #[error("{difficulty} needs {pairs} distinct items for a board, only {available} configured")]
    NotEnoughItemsForPairs {
        difficulty: Difficulty,
        pairs: u32,
        available: usize,
    },

    #[error("delay must be between 100 and 10000 ms")]
    InvalidDelay,

    #[error("points per correct answer must be > 0")]
    InvalidPointsPerCorrect,

    #[error("a timed game needs at least one team")]
    NoTeams,

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Any domain error, for callers that do not care which layer failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    ScoreBoard(#[from] ScoreBoardError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, ParticipantId};

    #[test]
    fn domain_errors_convert_into_aggregate() {
        let err: Error = ConfigError::EmptyPool {
            difficulty: Difficulty::Hard,
        }
        .into();
        assert_eq!(err.to_string(), "no content configured for difficulty hard");

        let err: Error = ScoreBoardError::UnknownParticipant(ParticipantId::new(3)).into();
        assert!(matches!(err, Error::ScoreBoard(_)));
    }
}
