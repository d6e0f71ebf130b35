mod catalog;
mod difficulty;
mod ids;
mod profile;
mod question;
mod scoreboard;
mod settings;
mod summary;

pub use catalog::{ContentCatalog, Topic};
pub use difficulty::Difficulty;
pub use ids::{CardId, ParseIdError, ParticipantId, QuestionId, ResultId, SessionId, UserHandle};
pub use profile::{Profile, Role};
pub use question::{MediaRef, QuestionDraft, QuestionError, QuestionItem, normalize_answer};
pub use scoreboard::{Participant, RankOrder, ScoreBoard, ScoreBoardError, ScoreChange, ScoreMode};
pub use settings::{DifficultySettings, GameSettings, GameSettingsDraft};
pub use summary::{
    ExportRow, RankedEntry, ResultKind, ResultSummary, ScoreDetail, SessionMeta, SummaryError,
};
