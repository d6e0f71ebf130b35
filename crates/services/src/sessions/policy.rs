use classroom_core::model::{Difficulty, GameSettings, ResultKind, ScoreMode, Topic};

/// How a mode turns events into scoreboard metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringPolicy {
    /// Each credited correct answer is worth this many points.
    PointsPerCorrect(u32),
    /// Teams are scored by seconds taken to clear their board.
    ElapsedSeconds,
}

impl ScoringPolicy {
    #[must_use]
    pub fn score_mode(self) -> ScoreMode {
        match self {
            ScoringPolicy::PointsPerCorrect(_) => ScoreMode::Points,
            ScoringPolicy::ElapsedSeconds => ScoreMode::Time,
        }
    }

    /// Points granted for one correct answer; zero for timed modes.
    #[must_use]
    pub fn credit_for_correct(self) -> i64 {
        match self {
            ScoringPolicy::PointsPerCorrect(points) => i64::from(points),
            ScoringPolicy::ElapsedSeconds => 0,
        }
    }
}

/// When a mode is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPredicate {
    /// Quiz: this many questions answered.
    AnsweredTarget { target: u32 },
    /// Memory match: every team cleared a board of `pairs_per_board` pairs.
    BoardsCleared { pairs_per_board: u32, boards: u32 },
}

impl CompletionPredicate {
    /// Units counted towards completion (questions or boards).
    #[must_use]
    pub fn target(self) -> u32 {
        match self {
            CompletionPredicate::AnsweredTarget { target } => target,
            CompletionPredicate::BoardsCleared { boards, .. } => boards,
        }
    }

    #[must_use]
    pub fn is_met(self, achieved: u32) -> bool {
        achieved >= self.target()
    }

    #[must_use]
    pub fn board_cleared(self, matched_pairs: u32) -> bool {
        match self {
            CompletionPredicate::AnsweredTarget { .. } => false,
            CompletionPredicate::BoardsCleared {
                pairs_per_board, ..
            } => matched_pairs >= pairs_per_board,
        }
    }
}

/// Mode-specific policy, kept in one place instead of branching through callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePolicy {
    pub kind: ResultKind,
    pub difficulty: Difficulty,
    pub scoring: ScoringPolicy,
    pub completion: CompletionPredicate,
}

impl ModePolicy {
    #[must_use]
    pub fn quiz(topic: Topic, settings: &GameSettings, difficulty: Difficulty) -> Self {
        let kind = match topic {
            Topic::Planets => ResultKind::PlanetQuiz,
            Topic::Constellations => ResultKind::ConstellationQuiz,
        };
        Self {
            kind,
            difficulty,
            scoring: ScoringPolicy::PointsPerCorrect(settings.points_per_correct()),
            completion: CompletionPredicate::AnsweredTarget {
                target: settings.question_target(difficulty),
            },
        }
    }

    #[must_use]
    pub fn memory_match(settings: &GameSettings, difficulty: Difficulty, teams: u32) -> Self {
        Self {
            kind: ResultKind::MemoryMatch,
            difficulty,
            scoring: ScoringPolicy::ElapsedSeconds,
            completion: CompletionPredicate::BoardsCleared {
                pairs_per_board: settings.pair_count(difficulty),
                boards: teams,
            },
        }
    }

    #[must_use]
    pub fn score_mode(&self) -> ScoreMode {
        self.scoring.score_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_policy_uses_question_target() {
        let settings = GameSettings::default_for_classroom();
        let policy = ModePolicy::quiz(Topic::Constellations, &settings, Difficulty::Normal);
        assert_eq!(policy.kind, ResultKind::ConstellationQuiz);
        assert_eq!(policy.completion.target(), 8);
        assert_eq!(policy.scoring.credit_for_correct(), 1);
        assert_eq!(policy.score_mode(), ScoreMode::Points);
    }

    #[test]
    fn match_policy_counts_boards() {
        let settings = GameSettings::default_for_classroom();
        let policy = ModePolicy::memory_match(&settings, Difficulty::Easy, 3);
        assert_eq!(policy.completion.target(), 3);
        assert!(!policy.completion.board_cleared(3));
        assert!(policy.completion.board_cleared(4));
        assert!(policy.completion.is_met(3));
        assert_eq!(policy.score_mode(), ScoreMode::Time);
    }
}
