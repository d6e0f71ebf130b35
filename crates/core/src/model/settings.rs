use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::difficulty::Difficulty;

/// Per-tier targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultySettings {
    /// Questions asked before a quiz completes.
    pub question_target: u32,
    /// Pairs dealt on a memory board.
    pub pair_count: u32,
}

/// Unvalidated settings as read from a config file. Missing fields fall back
/// to the classroom defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettingsDraft {
    pub easy: DifficultySettings,
    pub normal: DifficultySettings,
    pub hard: DifficultySettings,
    pub flip_back_delay_ms: u32,
    pub reveal_delay_ms: u32,
    pub points_per_correct: u32,
}

impl Default for GameSettingsDraft {
    fn default() -> Self {
        Self {
            easy: DifficultySettings {
                question_target: 4,
                pair_count: 4,
            },
            normal: DifficultySettings {
                question_target: 8,
                pair_count: 6,
            },
            hard: DifficultySettings {
                question_target: 12,
                pair_count: 8,
            },
            flip_back_delay_ms: 1_000,
            reveal_delay_ms: 1_500,
            points_per_correct: 1,
        }
    }
}

impl GameSettingsDraft {
    /// # Errors
    ///
    /// Returns `ConfigError` if any target is zero or a delay is out of range.
    pub fn validate(self) -> Result<GameSettings, ConfigError> {
        for (difficulty, tier) in [
            (Difficulty::Easy, &self.easy),
            (Difficulty::Normal, &self.normal),
            (Difficulty::Hard, &self.hard),
        ] {
            if tier.question_target == 0 {
                return Err(ConfigError::InvalidQuestionTarget { difficulty });
            }
            if tier.pair_count == 0 {
                return Err(ConfigError::InvalidPairCount { difficulty });
            }
        }
        if !DELAY_RANGE_MS.contains(&self.flip_back_delay_ms)
            || !DELAY_RANGE_MS.contains(&self.reveal_delay_ms)
        {
            return Err(ConfigError::InvalidDelay);
        }
        if self.points_per_correct == 0 {
            return Err(ConfigError::InvalidPointsPerCorrect);
        }

        Ok(GameSettings {
            easy: self.easy,
            normal: self.normal,
            hard: self.hard,
            flip_back_delay_ms: self.flip_back_delay_ms,
            reveal_delay_ms: self.reveal_delay_ms,
            points_per_correct: self.points_per_correct,
        })
    }
}

const DELAY_RANGE_MS: std::ops::RangeInclusive<u32> = 100..=10_000;

/// Validated game configuration shared by every mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "GameSettingsDraft")]
pub struct GameSettings {
    easy: DifficultySettings,
    normal: DifficultySettings,
    hard: DifficultySettings,
    flip_back_delay_ms: u32,
    reveal_delay_ms: u32,
    points_per_correct: u32,
}

impl TryFrom<GameSettingsDraft> for GameSettings {
    type Error = ConfigError;

    fn try_from(draft: GameSettingsDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::default_for_classroom()
    }
}

impl GameSettings {
    /// Defaults sized for a single lesson:
    /// - easy: 4 questions, 4 pairs
    /// - normal: 8 questions, 6 pairs
    /// - hard: 12 questions, 8 pairs
    /// - one second before a mismatched pair flips back
    #[must_use]
    pub fn default_for_classroom() -> Self {
        let draft = GameSettingsDraft::default();
        Self {
            easy: draft.easy,
            normal: draft.normal,
            hard: draft.hard,
            flip_back_delay_ms: draft.flip_back_delay_ms,
            reveal_delay_ms: draft.reveal_delay_ms,
            points_per_correct: draft.points_per_correct,
        }
    }

    #[must_use]
    pub fn for_difficulty(&self, difficulty: Difficulty) -> DifficultySettings {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
        }
    }

    #[must_use]
    pub fn question_target(&self, difficulty: Difficulty) -> u32 {
        self.for_difficulty(difficulty).question_target
    }

    #[must_use]
    pub fn pair_count(&self, difficulty: Difficulty) -> u32 {
        self.for_difficulty(difficulty).pair_count
    }

    #[must_use]
    pub fn flip_back_delay_ms(&self) -> u32 {
        self.flip_back_delay_ms
    }

    #[must_use]
    pub fn reveal_delay_ms(&self) -> u32 {
        self.reveal_delay_ms
    }

    #[must_use]
    pub fn points_per_correct(&self) -> u32 {
        self.points_per_correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let settings = GameSettingsDraft::default().validate().unwrap();
        assert_eq!(settings, GameSettings::default_for_classroom());
        assert_eq!(settings.question_target(Difficulty::Easy), 4);
        assert_eq!(settings.pair_count(Difficulty::Easy), 4);
        assert_eq!(settings.flip_back_delay_ms(), 1_000);
    }

    #[test]
    fn zero_target_rejected() {
        let mut draft = GameSettingsDraft::default();
        draft.hard.question_target = 0;
        assert_eq!(
            draft.validate().unwrap_err(),
            ConfigError::InvalidQuestionTarget {
                difficulty: Difficulty::Hard
            }
        );
    }

    #[test]
    fn delay_out_of_range_rejected() {
        let draft = GameSettingsDraft {
            flip_back_delay_ms: 20,
            ..GameSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), ConfigError::InvalidDelay);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{"normal":{"questionTarget":10,"pairCount":5}}"#;
        let settings: GameSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.question_target(Difficulty::Normal), 10);
        assert_eq!(settings.question_target(Difficulty::Easy), 4);
    }
}
