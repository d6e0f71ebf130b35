use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ParticipantId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreBoardError {
    #[error("participant {0} is not on the scoreboard")]
    UnknownParticipant(ParticipantId),

    #[error("another participant is already called {0:?}")]
    DuplicateName(String),
}

//
// ─── MODES ─────────────────────────────────────────────────────────────────────
//

/// What a participant's metric measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreMode {
    /// Points; higher is better and a participant at zero leaves the board.
    Points,
    /// Elapsed seconds; lower is better and nobody is ever dropped.
    Time,
}

impl ScoreMode {
    #[must_use]
    pub fn rank_order(self) -> RankOrder {
        match self {
            ScoreMode::Points => RankOrder::PointsDesc,
            ScoreMode::Time => RankOrder::TimeAsc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    PointsDesc,
    TimeAsc,
}

//
// ─── PARTICIPANT ───────────────────────────────────────────────────────────────
//

/// A scored entity: a student in point modes, a team in timed mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    metric: i64,
}

impl Participant {
    #[must_use]
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Points, or elapsed seconds for timed boards.
    #[must_use]
    pub fn metric(&self) -> i64 {
        self.metric
    }
}

/// Effect of a scoring call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreChange {
    Created { id: ParticipantId, metric: i64 },
    Updated { id: ParticipantId, metric: i64 },
    Removed { id: ParticipantId },
    /// Blank name, or a non-positive first score in points mode.
    Ignored,
}

//
// ─── SCOREBOARD ────────────────────────────────────────────────────────────────
//

/// Mutable roster for one session.
///
/// Entries are kept in insertion order; the ranked view is derived on every
/// call so it always reflects the latest mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBoard {
    mode: ScoreMode,
    participants: Vec<Participant>,
    next_id: u64,
}

impl ScoreBoard {
    #[must_use]
    pub fn new(mode: ScoreMode) -> Self {
        Self {
            mode,
            participants: Vec::new(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn points() -> Self {
        Self::new(ScoreMode::Points)
    }

    #[must_use]
    pub fn timed() -> Self {
        Self::new(ScoreMode::Time)
    }

    #[must_use]
    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participants in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    #[must_use]
    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Participant> {
        let key = name_key(name);
        self.participants.iter().find(|p| name_key(&p.name) == key)
    }

    #[must_use]
    pub fn total_points(&self) -> i64 {
        self.participants
            .iter()
            .fold(0_i64, |acc, p| acc.saturating_add(p.metric))
    }

    /// Credit `delta` to the participant called `name`, creating them on first use.
    ///
    /// Blank names are ignored. In points mode a participant whose total drops
    /// to zero or below is removed, and a first score of zero or below does not
    /// create anyone.
    pub fn add_or_increment(&mut self, name: &str, delta: i64) -> ScoreChange {
        let name = name.trim();
        if name.is_empty() {
            return ScoreChange::Ignored;
        }

        if let Some(pos) = self.position_by_name(name) {
            return self.apply_delta(pos, delta);
        }

        let metric = match self.mode {
            ScoreMode::Points if delta <= 0 => return ScoreChange::Ignored,
            ScoreMode::Points => delta,
            ScoreMode::Time => delta.max(0),
        };
        let id = ParticipantId::new(self.next_id);
        self.next_id += 1;
        self.participants.push(Participant {
            id,
            name: name.to_owned(),
            metric,
        });
        ScoreChange::Created { id, metric }
    }

    /// Adjust a known participant's metric.
    ///
    /// # Errors
    ///
    /// Returns `ScoreBoardError::UnknownParticipant` if `id` is not on the board.
    pub fn adjust(&mut self, id: ParticipantId, delta: i64) -> Result<ScoreChange, ScoreBoardError> {
        let pos = self
            .position(id)
            .ok_or(ScoreBoardError::UnknownParticipant(id))?;
        Ok(self.apply_delta(pos, delta))
    }

    /// # Errors
    ///
    /// Returns `ScoreBoardError::UnknownParticipant` if `id` is not on the board.
    pub fn remove(&mut self, id: ParticipantId) -> Result<Participant, ScoreBoardError> {
        let pos = self
            .position(id)
            .ok_or(ScoreBoardError::UnknownParticipant(id))?;
        Ok(self.participants.remove(pos))
    }

    /// Fix a misspelt name without losing the score or the tie-break position.
    ///
    /// # Errors
    ///
    /// Returns `ScoreBoardError::UnknownParticipant` if `id` is not on the board,
    /// or `ScoreBoardError::DuplicateName` if another participant owns the name.
    /// A blank name leaves the entry unchanged.
    pub fn rename(&mut self, id: ParticipantId, name: &str) -> Result<(), ScoreBoardError> {
        let pos = self
            .position(id)
            .ok_or(ScoreBoardError::UnknownParticipant(id))?;
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        if let Some(other) = self.find(name) {
            if other.id != id {
                return Err(ScoreBoardError::DuplicateName(name.to_owned()));
            }
        }
        self.participants[pos].name = name.to_owned();
        Ok(())
    }

    /// Participants ordered for display.
    ///
    /// The sort is stable, so exact ties keep insertion order.
    #[must_use]
    pub fn ranked_view(&self, order: RankOrder) -> Vec<&Participant> {
        let mut ranked: Vec<&Participant> = self.participants.iter().collect();
        match order {
            RankOrder::PointsDesc => ranked.sort_by(|a, b| b.metric.cmp(&a.metric)),
            RankOrder::TimeAsc => ranked.sort_by(|a, b| a.metric.cmp(&b.metric)),
        }
        ranked
    }

    /// Ranked view in the board's natural order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&Participant> {
        self.ranked_view(self.mode.rank_order())
    }

    fn position(&self, id: ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| p.id == id)
    }

    fn position_by_name(&self, name: &str) -> Option<usize> {
        let key = name_key(name);
        self.participants
            .iter()
            .position(|p| name_key(&p.name) == key)
    }

    fn apply_delta(&mut self, pos: usize, delta: i64) -> ScoreChange {
        let mode = self.mode;
        let entry = &mut self.participants[pos];
        let id = entry.id;
        let metric = entry.metric.saturating_add(delta);
        match mode {
            ScoreMode::Points if metric <= 0 => {
                self.participants.remove(pos);
                ScoreChange::Removed { id }
            }
            ScoreMode::Points => {
                entry.metric = metric;
                ScoreChange::Updated { id, metric }
            }
            ScoreMode::Time => {
                entry.metric = metric.max(0);
                ScoreChange::Updated {
                    id,
                    metric: entry.metric,
                }
            }
        }
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
