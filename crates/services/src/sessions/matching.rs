use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;

use classroom_core::ConfigError;
use classroom_core::model::{
    CardId, ContentCatalog, Difficulty, GameSettings, ParticipantId, QuestionItem, ResultSummary,
    ScoreBoard, ScoreChange, SessionId, SessionMeta,
};
use classroom_core::time::{after_millis, elapsed_seconds};

use super::GameSession;
use super::deferred::{Deferred, DeferredTicket};
use super::policy::ModePolicy;
use super::progress::SessionProgress;
use crate::error::SessionError;
use crate::pool::QuestionPool;
use crate::summary::ResultSummarizer;

//
// ─── BOARD ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    Hidden,
    Revealed,
    Matched,
}

/// One face-down tile. Each pair shares the same question item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardCard {
    id: CardId,
    item: QuestionItem,
    face: CardFace,
}

impl BoardCard {
    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn item(&self) -> &QuestionItem {
        &self.item
    }

    #[must_use]
    pub fn face(&self) -> CardFace {
        self.face
    }

    #[must_use]
    pub fn is_face_up(&self) -> bool {
        self.face != CardFace::Hidden
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    AwaitingFlip,
    /// Two mismatched cards are face up until their flip-back fires.
    PairPendingCheck,
    /// The current team cleared its board; `next_team` deals the next one.
    BoardCleared,
    Completed,
}

impl MatchPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MatchPhase::AwaitingFlip => "awaiting a flip",
            MatchPhase::PairPendingCheck => "checking a pair",
            MatchPhase::BoardCleared => "between teams",
            MatchPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A team's finished board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTime {
    pub team: String,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RevealOutcome {
    FirstCard(CardId),
    Matched {
        first: CardId,
        second: CardId,
        matched_pairs: u32,
        /// Set when this pair cleared the board.
        cleared: Option<TeamTime>,
        /// Set when the last team cleared its board.
        summary: Option<ResultSummary>,
    },
    Mismatch {
        first: CardId,
        second: CardId,
        flip_back: DeferredTicket,
    },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Team-timed memory match: each team clears a freshly dealt board in turn
/// and is scored by the seconds it took.
pub struct MatchingSession {
    id: SessionId,
    policy: ModePolicy,
    pool: QuestionPool,
    pair_count: u32,
    flip_back_delay_ms: u32,
    rng: StdRng,
    teams: Vec<String>,
    turn: usize,
    teams_done: u32,
    board: Vec<BoardCard>,
    face_up: Vec<CardId>,
    matched_pairs: u32,
    phase: MatchPhase,
    scoreboard: ScoreBoard,
    flip_back: Deferred<(CardId, CardId)>,
    turn_started_at: DateTime<Utc>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    summary: Option<ResultSummary>,
}

impl MatchingSession {
    /// Deal the first board for the first team.
    ///
    /// Team names are trimmed; blanks and case-insensitive repeats are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if no team remains, the tier is empty,
    /// or it has too few distinct items for the configured pair count.
    pub fn start(
        catalog: &ContentCatalog,
        settings: &GameSettings,
        difficulty: Difficulty,
        teams: &[String],
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        Self::start_with_rng(
            catalog,
            settings,
            difficulty,
            teams,
            started_at,
            StdRng::from_rng(&mut rand::rng()),
        )
    }

    /// # Errors
    ///
    /// See [`MatchingSession::start`].
    pub fn start_seeded(
        catalog: &ContentCatalog,
        settings: &GameSettings,
        difficulty: Difficulty,
        teams: &[String],
        started_at: DateTime<Utc>,
        seed: u64,
    ) -> Result<Self, SessionError> {
        Self::start_with_rng(
            catalog,
            settings,
            difficulty,
            teams,
            started_at,
            StdRng::seed_from_u64(seed),
        )
    }

    /// # Errors
    ///
    /// See [`MatchingSession::start`].
    pub fn start_with_rng(
        catalog: &ContentCatalog,
        settings: &GameSettings,
        difficulty: Difficulty,
        teams: &[String],
        started_at: DateTime<Utc>,
        mut rng: StdRng,
    ) -> Result<Self, SessionError> {
        let teams = clean_team_names(teams);
        if teams.is_empty() {
            return Err(ConfigError::NoTeams.into());
        }
        let pool = QuestionPool::load(catalog, difficulty)?;
        let boards = u32::try_from(teams.len()).unwrap_or(u32::MAX);
        let policy = ModePolicy::memory_match(settings, difficulty, boards);
        let pair_count = settings.pair_count(difficulty);
        let board = deal_board(&pool, pair_count, &mut rng)?;

        log::info!(
            "memory match started: {} teams, {} cards per board",
            teams.len(),
            board.len()
        );
        Ok(Self {
            id: SessionId::random(),
            policy,
            pool,
            pair_count,
            flip_back_delay_ms: settings.flip_back_delay_ms(),
            rng,
            teams,
            turn: 0,
            teams_done: 0,
            board,
            face_up: Vec::with_capacity(2),
            matched_pairs: 0,
            phase: MatchPhase::AwaitingFlip,
            scoreboard: ScoreBoard::new(policy.score_mode()),
            flip_back: Deferred::default(),
            turn_started_at: started_at,
            started_at,
            completed_at: None,
            summary: None,
        })
    }

    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    #[must_use]
    pub fn cards(&self) -> &[BoardCard] {
        &self.board
    }

    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&BoardCard> {
        self.board.get(id.index())
    }

    #[must_use]
    pub fn matched_pairs(&self) -> u32 {
        self.matched_pairs
    }

    #[must_use]
    pub fn pairs_per_board(&self) -> u32 {
        self.pair_count
    }

    #[must_use]
    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    /// The team playing now, or `None` once every team has finished.
    #[must_use]
    pub fn current_team(&self) -> Option<&str> {
        if self.phase == MatchPhase::Completed {
            return None;
        }
        self.teams.get(self.turn).map(String::as_str)
    }

    #[must_use]
    pub fn pending_flip_back(&self) -> Option<DeferredTicket> {
        self.flip_back.ticket()
    }

    #[must_use]
    pub fn flip_back_pending(&self) -> bool {
        self.flip_back.is_pending()
    }

    #[must_use]
    pub fn turn_started_at(&self) -> DateTime<Utc> {
        self.turn_started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn meta(&self) -> Option<SessionMeta> {
        self.completed_at.map(|ended_at| self.meta_at(ended_at))
    }

    /// Turn a hidden card face up.
    ///
    /// The second card of a turn is checked immediately: a match stays face up,
    /// a mismatch schedules a flip-back and blocks further reveals until it fires.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` unless awaiting a flip,
    /// `SessionError::UnknownCard` for ids off the board, and
    /// `SessionError::CardUnavailable` for cards already face up.
    pub fn reveal_card(
        &mut self,
        card: CardId,
        now: DateTime<Utc>,
    ) -> Result<RevealOutcome, SessionError> {
        self.require(MatchPhase::AwaitingFlip, "reveal_card")?;
        let face = self
            .board
            .get(card.index())
            .map(BoardCard::face)
            .ok_or(SessionError::UnknownCard(card))?;
        if face != CardFace::Hidden {
            return Err(SessionError::CardUnavailable(card));
        }

        let first = self.face_up.first().copied();
        let Some(first) = first else {
            self.board[card.index()].face = CardFace::Revealed;
            self.face_up.push(card);
            return Ok(RevealOutcome::FirstCard(card));
        };

        if self.board[first.index()].item.id() != self.board[card.index()].item.id() {
            self.board[card.index()].face = CardFace::Revealed;
            self.face_up.push(card);
            self.phase = MatchPhase::PairPendingCheck;
            let due = after_millis(now, self.flip_back_delay_ms);
            let flip_back = self.flip_back.schedule(self.id, due, (first, card));
            log::debug!("cards {first} and {card} do not match");
            return Ok(RevealOutcome::Mismatch {
                first,
                second: card,
                flip_back,
            });
        }

        let matched_pairs = self.matched_pairs + 1;
        if !self.policy.completion.board_cleared(matched_pairs) {
            self.mark_matched(first, card, matched_pairs);
            return Ok(RevealOutcome::Matched {
                first,
                second: card,
                matched_pairs,
                cleared: None,
                summary: None,
            });
        }

        let team = self.teams[self.turn].clone();
        let seconds = elapsed_seconds(self.turn_started_at, now);
        let teams_done = self.teams_done + 1;
        let mut scoreboard = self.scoreboard.clone();
        scoreboard.add_or_increment(&team, seconds);

        let summary = if self.policy.completion.is_met(teams_done) {
            let ended_at = now.max(self.started_at);
            let meta = SessionMeta {
                achieved_count: teams_done,
                ..self.meta_at(ended_at)
            };
            let summary = ResultSummarizer::finalize(&scoreboard, &meta)?;
            self.completed_at = Some(ended_at);
            self.summary = Some(summary.clone());
            self.phase = MatchPhase::Completed;
            Some(summary)
        } else {
            self.phase = MatchPhase::BoardCleared;
            None
        };

        self.mark_matched(first, card, matched_pairs);
        self.scoreboard = scoreboard;
        self.teams_done = teams_done;
        log::info!("team {team} cleared its board in {seconds}s");

        Ok(RevealOutcome::Matched {
            first,
            second: card,
            matched_pairs,
            cleared: Some(TeamTime { team, seconds }),
            summary,
        })
    }

    /// Hide the mismatched pair named by `ticket`.
    ///
    /// Returns `false` without touching the board when the ticket is stale,
    /// e.g. issued before a restart, or when `now` is before its due time.
    /// An early ticket stays pending.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` if a valid ticket arrives while no
    /// pair is pending.
    pub fn flip_back(
        &mut self,
        ticket: DeferredTicket,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionError> {
        if self.flip_back.ticket() != Some(ticket) {
            log::debug!("memory match {} ignored stale flip-back", self.id);
            return Ok(false);
        }
        if now < ticket.due_at() {
            log::debug!("memory match {} flip-back fired early", self.id);
            return Ok(false);
        }
        self.require(MatchPhase::PairPendingCheck, "flip_back")?;
        if let Some((first, second)) = self.flip_back.take(ticket) {
            self.hide_pair(first, second);
        }
        Ok(true)
    }

    /// Fire the pending flip-back if it is due at `now`.
    pub fn poll_deferred(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != MatchPhase::PairPendingCheck {
            return false;
        }
        match self.flip_back.take_due(now) {
            Some((_, (first, second))) => {
                self.hide_pair(first, second);
                true
            }
            None => false,
        }
    }

    /// Deal a fresh board for the next team and start its clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` unless a board was just cleared.
    pub fn next_team(&mut self, now: DateTime<Utc>) -> Result<&str, SessionError> {
        self.require(MatchPhase::BoardCleared, "next_team")?;
        let board = deal_board(&self.pool, self.pair_count, &mut self.rng)?;
        self.board = board;
        self.turn += 1;
        self.face_up.clear();
        self.matched_pairs = 0;
        self.turn_started_at = now;
        self.phase = MatchPhase::AwaitingFlip;
        Ok(self.teams[self.turn].as_str())
    }

    /// New identity, empty scoreboard, fresh board for the first team.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the board cannot be dealt; the session
    /// is left as it was.
    pub fn restart(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let board = deal_board(&self.pool, self.pair_count, &mut self.rng)?;
        self.id = SessionId::random();
        self.flip_back.cancel();
        self.board = board;
        self.turn = 0;
        self.teams_done = 0;
        self.face_up.clear();
        self.matched_pairs = 0;
        self.phase = MatchPhase::AwaitingFlip;
        self.scoreboard = ScoreBoard::new(self.policy.score_mode());
        self.turn_started_at = now;
        self.started_at = now;
        self.completed_at = None;
        self.summary = None;
        log::info!("memory match restarted as {}", self.id);
        Ok(())
    }

    /// Operator correction of a team's recorded seconds.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` once completed, or
    /// `SessionError::Score` for unknown teams.
    pub fn adjust(&mut self, id: ParticipantId, delta: i64) -> Result<ScoreChange, SessionError> {
        self.require_open("adjust")?;
        Ok(self.scoreboard.adjust(id, delta)?)
    }

    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` once completed, or
    /// `SessionError::Score` for unknown teams.
    pub fn remove(&mut self, id: ParticipantId) -> Result<(), SessionError> {
        self.require_open("remove")?;
        self.scoreboard.remove(id)?;
        Ok(())
    }

    fn mark_matched(&mut self, first: CardId, second: CardId, matched_pairs: u32) {
        self.board[first.index()].face = CardFace::Matched;
        self.board[second.index()].face = CardFace::Matched;
        self.face_up.clear();
        self.matched_pairs = matched_pairs;
    }

    fn hide_pair(&mut self, first: CardId, second: CardId) {
        for id in [first, second] {
            if let Some(card) = self.board.get_mut(id.index()) {
                if card.face == CardFace::Revealed {
                    card.face = CardFace::Hidden;
                }
            }
        }
        self.face_up.clear();
        self.phase = MatchPhase::AwaitingFlip;
    }

    fn meta_at(&self, ended_at: DateTime<Utc>) -> SessionMeta {
        SessionMeta {
            kind: self.policy.kind,
            difficulty: self.policy.difficulty,
            total_target: self.policy.completion.target(),
            achieved_count: self.teams_done,
            started_at: self.started_at,
            ended_at,
        }
    }

    fn require(&self, phase: MatchPhase, operation: &'static str) -> Result<(), SessionError> {
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
        if self.phase == MatchPhase::Completed {
            return Err(SessionError::IllegalState {
                operation,
                phase: self.phase.as_str(),
            });
        }
        Ok(())
    }
}

impl GameSession for MatchingSession {
    fn session_id(&self) -> SessionId {
        self.id
    }

    fn policy(&self) -> &ModePolicy {
        &self.policy
    }

    fn progress(&self) -> SessionProgress {
        SessionProgress::new(
            self.policy.completion.target(),
            self.teams_done,
            self.phase == MatchPhase::Completed,
        )
    }

    fn scoreboard(&self) -> &ScoreBoard {
        &self.scoreboard
    }

    fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }
}

impl fmt::Debug for MatchingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingSession")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("team", &self.teams.get(self.turn))
            .field("matched_pairs", &self.matched_pairs)
            .field("cards", &self.board.len())
            .field("teams_done", &self.teams_done)
            .finish_non_exhaustive()
    }
}

fn clean_team_names(teams: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    teams
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
        .map(str::to_owned)
        .collect()
}

fn deal_board(
    pool: &QuestionPool,
    pairs: u32,
    rng: &mut StdRng,
) -> Result<Vec<BoardCard>, ConfigError> {
    let items = pool.deal_pairs(pairs, rng)?;
    let mut faces: Vec<QuestionItem> = items
        .iter()
        .flat_map(|item| [item.clone(), item.clone()])
        .collect();
    faces.shuffle(rng);
    Ok(faces
        .into_iter()
        .zip(0_u32..)
        .map(|(item, index)| BoardCard {
            id: CardId::new(index),
            item,
            face: CardFace::Hidden,
        })
        .collect())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
