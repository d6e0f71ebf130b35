use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::model::difficulty::Difficulty;
use crate::model::scoreboard::ScoreMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SummaryError {
    #[error("ended_at is before started_at")]
    InvalidTimeRange,

    #[error("achieved count ({achieved}) exceeds target ({target})")]
    AchievedExceedsTarget { achieved: u32, target: u32 },

    #[error("rank {found} at position {position} is out of sequence")]
    RankOutOfSequence { position: usize, found: u32 },

    #[error("too many participants for a single summary: {len}")]
    TooManyParticipants { len: usize },
}

/// Which game produced a result; doubles as the storage collection discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultKind {
    PlanetQuiz,
    ConstellationQuiz,
    MemoryMatch,
}

impl ResultKind {
    pub const ALL: [ResultKind; 3] = [
        ResultKind::PlanetQuiz,
        ResultKind::ConstellationQuiz,
        ResultKind::MemoryMatch,
    ];

    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            ResultKind::PlanetQuiz => "planetQuizResults",
            ResultKind::ConstellationQuiz => "constellationQuizResults",
            ResultKind::MemoryMatch => "memoryMatchResults",
        }
    }

    #[must_use]
    pub fn score_mode(self) -> ScoreMode {
        match self {
            ResultKind::PlanetQuiz | ResultKind::ConstellationQuiz => ScoreMode::Points,
            ResultKind::MemoryMatch => ScoreMode::Time,
        }
    }

    /// Stem used for export file names.
    #[must_use]
    pub fn file_stem(self) -> &'static str {
        match self {
            ResultKind::PlanetQuiz => "planet-quiz",
            ResultKind::ConstellationQuiz => "constellation-quiz",
            ResultKind::MemoryMatch => "memory-match",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Display value derived from a participant's metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreDetail {
    /// Share of achieved questions, rounded to one decimal.
    Percentage(f64),
    /// Elapsed time as zero-padded `mm:ss`.
    CompletionTime(String),
}

impl fmt::Display for ScoreDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreDetail::Percentage(p) => write!(f, "{p:.1}%"),
            ScoreDetail::CompletionTime(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: u32,
    pub name: String,
    pub metric: i64,
    pub detail: ScoreDetail,
}

/// Session facts the summary needs beyond the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMeta {
    pub kind: ResultKind,
    pub difficulty: Difficulty,
    pub total_target: u32,
    pub achieved_count: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// Finalized record of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    kind: ResultKind,
    difficulty: Difficulty,
    participants_ranked: Vec<RankedEntry>,
    total_target: u32,
    achieved_count: u32,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
}

impl ResultSummary {
    /// Assemble a summary from already-ranked entries.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError` if the time range is inverted, the achieved count
    /// exceeds the target, or ranks are not `1..=n` in order.
    pub fn new(meta: SessionMeta, participants_ranked: Vec<RankedEntry>) -> Result<Self, SummaryError> {
        if meta.ended_at < meta.started_at {
            return Err(SummaryError::InvalidTimeRange);
        }
        if meta.achieved_count > meta.total_target {
            return Err(SummaryError::AchievedExceedsTarget {
                achieved: meta.achieved_count,
                target: meta.total_target,
            });
        }
        for (position, entry) in participants_ranked.iter().enumerate() {
            let expected = u32::try_from(position + 1).map_err(|_| {
                SummaryError::TooManyParticipants {
                    len: participants_ranked.len(),
                }
            })?;
            if entry.rank != expected {
                return Err(SummaryError::RankOutOfSequence {
                    position,
                    found: entry.rank,
                });
            }
        }

        Ok(Self {
            kind: meta.kind,
            difficulty: meta.difficulty,
            participants_ranked,
            total_target: meta.total_target,
            achieved_count: meta.achieved_count,
            started_at: meta.started_at,
            ended_at: meta.ended_at,
        })
    }

    #[must_use]
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn participants_ranked(&self) -> &[RankedEntry] {
        &self.participants_ranked
    }

    #[must_use]
    pub fn total_target(&self) -> u32 {
        self.total_target
    }

    #[must_use]
    pub fn achieved_count(&self) -> u32 {
        self.achieved_count
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    #[must_use]
    pub fn winner(&self) -> Option<&RankedEntry> {
        self.participants_ranked.first()
    }
}

//
// ─── EXPORT ROWS ───────────────────────────────────────────────────────────────
//

/// One leaderboard line handed to the export sink.
///
/// Serializes as an ordered map whose keys depend on the mode:
/// `Rank, Name, Points, Date, Difficulty` for quizzes and
/// `Rank, TeamName, CompletionTime, Date, Difficulty` for timed games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub mode: ScoreMode,
    pub rank: u32,
    pub name: String,
    pub value: String,
    pub date: String,
    pub difficulty: String,
}

impl ExportRow {
    #[must_use]
    pub fn columns(mode: ScoreMode) -> [&'static str; 5] {
        match mode {
            ScoreMode::Points => ["Rank", "Name", "Points", "Date", "Difficulty"],
            ScoreMode::Time => ["Rank", "TeamName", "CompletionTime", "Date", "Difficulty"],
        }
    }

    /// Field values in column order.
    #[must_use]
    pub fn values(&self) -> [String; 5] {
        [
            self.rank.to_string(),
            self.name.clone(),
            self.value.clone(),
            self.date.clone(),
            self.difficulty.clone(),
        ]
    }
}

impl Serialize for ExportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let [rank, name, value, date, difficulty] = Self::columns(self.mode);
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry(rank, &self.rank)?;
        map.serialize_entry(name, &self.name)?;
        map.serialize_entry(value, &self.value)?;
        map.serialize_entry(date, &self.date)?;
        map.serialize_entry(difficulty, &self.difficulty)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn meta() -> SessionMeta {
        SessionMeta {
            kind: ResultKind::PlanetQuiz,
            difficulty: Difficulty::Easy,
            total_target: 4,
            achieved_count: 4,
            started_at: fixed_now(),
            ended_at: fixed_now(),
        }
    }

    fn entry(rank: u32, name: &str) -> RankedEntry {
        RankedEntry {
            rank,
            name: name.into(),
            metric: 1,
            detail: ScoreDetail::Percentage(25.0),
        }
    }

    #[test]
    fn rejects_inverted_time_range() {
        let mut m = meta();
        m.ended_at = fixed_now() - chrono::Duration::seconds(1);
        assert_eq!(
            ResultSummary::new(m, Vec::new()).unwrap_err(),
            SummaryError::InvalidTimeRange
        );
    }

    #[test]
    fn rejects_out_of_sequence_ranks() {
        let err = ResultSummary::new(meta(), vec![entry(1, "A"), entry(3, "B")]).unwrap_err();
        assert_eq!(err, SummaryError::RankOutOfSequence { position: 1, found: 3 });
    }

    #[test]
    fn rejects_achieved_over_target() {
        let mut m = meta();
        m.achieved_count = 5;
        assert!(matches!(
            ResultSummary::new(m, Vec::new()),
            Err(SummaryError::AchievedExceedsTarget { .. })
        ));
    }

    #[test]
    fn serializes_camel_case() {
        let summary = ResultSummary::new(meta(), vec![entry(1, "A")]).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["kind"], "planetQuiz");
        assert_eq!(json["participantsRanked"][0]["detail"]["percentage"], 25.0);
        assert_eq!(json["totalTarget"], 4);
    }

    #[test]
    fn export_row_keys_follow_mode() {
        let row = ExportRow {
            mode: ScoreMode::Time,
            rank: 1,
            name: "Rockets".into(),
            value: "01:05".into(),
            date: "2023-11-14".into(),
            difficulty: "Easy".into(),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"Rank":1,"TeamName":"Rockets","CompletionTime":"01:05","Date":"2023-11-14","Difficulty":"Easy"}"#
        );
    }

    #[test]
    fn collections_are_distinct() {
        let names: std::collections::HashSet<_> =
            ResultKind::ALL.iter().map(|k| k.collection()).collect();
        assert_eq!(names.len(), 3);
    }
}
