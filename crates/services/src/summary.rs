use classroom_core::model::{
    ExportRow, RankedEntry, ResultSummary, ScoreBoard, ScoreDetail, ScoreMode, SessionMeta,
};

use crate::error::SessionError;

/// Turns a finished scoreboard into the persisted summary and export rows.
///
/// Everything here is a pure function of its inputs, so finalizing the same
/// board and metadata twice yields identical documents.
pub struct ResultSummarizer;

impl ResultSummarizer {
    /// # Errors
    ///
    /// Returns `SessionError::Summary` if the metadata is inconsistent
    /// (inverted time range, achieved count above target).
    pub fn finalize(board: &ScoreBoard, meta: &SessionMeta) -> Result<ResultSummary, SessionError> {
        let entries = board
            .ranked()
            .into_iter()
            .zip(1_u32..)
            .map(|(participant, rank)| RankedEntry {
                rank,
                name: participant.name().to_owned(),
                metric: participant.metric(),
                detail: detail_for(board.mode(), participant.metric(), meta.achieved_count),
            })
            .collect();

        Ok(ResultSummary::new(*meta, entries)?)
    }

    /// Flat rows for the export sink, in rank order.
    #[must_use]
    pub fn export_rows(summary: &ResultSummary) -> Vec<ExportRow> {
        let mode = summary.kind().score_mode();
        let date = summary.ended_at().format("%Y-%m-%d").to_string();
        let difficulty = summary.difficulty().label().to_owned();

        summary
            .participants_ranked()
            .iter()
            .map(|entry| ExportRow {
                mode,
                rank: entry.rank,
                name: entry.name.clone(),
                value: match &entry.detail {
                    ScoreDetail::CompletionTime(time) => time.clone(),
                    ScoreDetail::Percentage(_) => entry.metric.to_string(),
                },
                date: date.clone(),
                difficulty: difficulty.clone(),
            })
            .collect()
    }

    /// e.g. `planet-quiz-easy-2023-11-14-221320.json`
    #[must_use]
    pub fn export_filename(summary: &ResultSummary) -> String {
        format!(
            "{}-{}-{}.json",
            summary.kind().file_stem(),
            summary.difficulty(),
            summary.ended_at().format("%Y-%m-%d-%H%M%S")
        )
    }
}

fn detail_for(mode: ScoreMode, metric: i64, achieved: u32) -> ScoreDetail {
    match mode {
        ScoreMode::Points => ScoreDetail::Percentage(percentage(metric, achieved)),
        ScoreMode::Time => ScoreDetail::CompletionTime(format_elapsed(metric)),
    }
}

/// `points / achieved * 100`, rounded to one decimal; `0.0` when nothing was achieved.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(points: i64, achieved: u32) -> f64 {
    if achieved == 0 {
        return 0.0;
    }
    let raw = points as f64 / f64::from(achieved) * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Seconds as zero-padded `mm:ss`; minutes keep growing past 59.
#[must_use]
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
