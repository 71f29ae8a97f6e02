//! Tournament, TournamentStatus, and lifecycle transitions.

use crate::error::{EngineError, EngineResult};
use crate::logic::conflicts::{Candidate, ConflictIndex};
use crate::models::game::{Match, MatchId, MatchStatus, Placement};
use crate::models::team::{Level, SexCategory, TeamId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Bracket format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentFormat {
    #[default]
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    GroupStage,
}

impl std::fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TournamentFormat::SingleElimination => "single-elimination",
            TournamentFormat::DoubleElimination => "double-elimination",
            TournamentFormat::RoundRobin => "round-robin",
            TournamentFormat::GroupStage => "group-stage",
        };
        f.write_str(s)
    }
}

/// Lifecycle: Draft -> Open -> Ongoing -> Completed, or Cancelled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Being set up; no bracket.
    #[default]
    Draft,
    /// Bracket exists (or registration open); no match started yet.
    Open,
    /// At least one match has started.
    Ongoing,
    /// Final decided; no further resets.
    Completed,
    Cancelled,
}

/// Default timings used when a match or request does not override them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentSettings {
    /// Minutes per match.
    pub match_duration: u32,
    /// Minutes between consecutive matches on one court.
    pub break_duration: u32,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            match_duration: 40,
            break_duration: 10,
        }
    }
}

/// The name + year pair the registration system keys teams by.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct TournamentContext {
    pub name: String,
    pub year: i32,
}

impl TournamentContext {
    pub fn new(name: impl Into<String>, year: i32) -> Self {
        Self {
            name: name.into(),
            year,
        }
    }
}

/// Snapshot of a team taken when the bracket was built (for name lookup).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub team_id: TeamId,
    pub name: String,
    /// 1-based position in the seeded order.
    pub seed: u32,
}

/// Full tournament state: identity, lifecycle, and the owned match set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub year: i32,
    pub format: TournamentFormat,
    pub level: Level,
    pub sex: SexCategory,
    pub status: TournamentStatus,
    pub settings: TournamentSettings,
    /// Teams placed in the current bracket, in seed order.
    pub participants: Vec<Participant>,
    /// Arena of matches; `next_match` links refer to `Match::number`.
    pub matches: Vec<Match>,
    /// Placements by `(date, court)`. Moves go through `set_placement`;
    /// call `reindex` after replacing `matches` wholesale.
    #[serde(skip)]
    placements: ConflictIndex,
}

impl Tournament {
    /// Create a new tournament in Draft with no matches.
    pub fn new(name: impl Into<String>, year: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            year,
            format: TournamentFormat::default(),
            level: Level::default(),
            sex: SexCategory::default(),
            status: TournamentStatus::Draft,
            settings: TournamentSettings::default(),
            participants: Vec::new(),
            matches: Vec::new(),
            placements: ConflictIndex::new(),
        }
    }

    pub fn context(&self) -> TournamentContext {
        TournamentContext::new(self.name.clone(), self.year)
    }

    pub fn get_match(&self, id: MatchId) -> EngineResult<&Match> {
        self.matches
            .iter()
            .find(|m| m.id == id)
            .ok_or(EngineError::MatchNotFound(id))
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> EngineResult<&mut Match> {
        self.matches
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(EngineError::MatchNotFound(id))
    }

    pub fn placement_index(&self) -> &ConflictIndex {
        &self.placements
    }

    /// Rebuild the placement index from `matches`.
    pub fn reindex(&mut self) {
        self.placements = ConflictIndex::from_matches(&self.matches, self.settings.match_duration);
    }

    /// Move (or clear) one match and keep the placement index in step.
    pub fn set_placement(
        &mut self,
        id: MatchId,
        placement: Option<Placement>,
    ) -> EngineResult<&mut Match> {
        let default_minutes = self.settings.match_duration;
        let m = self
            .matches
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(EngineError::MatchNotFound(id))?;
        m.placement = placement;
        match Candidate::from_match(m, default_minutes) {
            Some(c) => self.placements.insert(c),
            None => self.placements.remove(id),
        }
        Ok(m)
    }

    pub fn match_by_number(&self, number: u32) -> Option<&Match> {
        self.matches.iter().find(|m| m.number == number)
    }

    pub fn match_by_number_mut(&mut self, number: u32) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.number == number)
    }

    /// Matches of one round, in match-number order.
    pub fn round_matches(&self, round: u32) -> Vec<&Match> {
        let mut ms: Vec<_> = self.matches.iter().filter(|m| m.round == round).collect();
        ms.sort_by_key(|m| m.number);
        ms
    }

    pub fn team_name(&self, id: TeamId) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.team_id == id)
            .map(|p| p.name.as_str())
    }

    pub fn round_count(&self) -> u32 {
        self.matches.iter().map(|m| m.round).max().unwrap_or(0)
    }

    pub fn has_completed_matches(&self) -> bool {
        self.matches
            .iter()
            .any(|m| m.status == MatchStatus::Completed)
    }

    /// Draft -> Open.
    pub fn open(&mut self) -> EngineResult<()> {
        if self.status != TournamentStatus::Draft {
            return Err(EngineError::invalid_transition(format!(
                "cannot open a tournament in status {:?}",
                self.status
            )));
        }
        self.status = TournamentStatus::Open;
        Ok(())
    }

    /// Any non-terminal status -> Cancelled.
    pub fn cancel(&mut self) -> EngineResult<()> {
        if matches!(
            self.status,
            TournamentStatus::Completed | TournamentStatus::Cancelled
        ) {
            return Err(EngineError::invalid_transition(format!(
                "cannot cancel a tournament in status {:?}",
                self.status
            )));
        }
        self.status = TournamentStatus::Cancelled;
        Ok(())
    }

    /// Refuse mutations once the tournament has finished or been cancelled.
    pub fn ensure_active(&self) -> EngineResult<()> {
        match self.status {
            TournamentStatus::Completed | TournamentStatus::Cancelled => {
                Err(EngineError::invalid_transition(format!(
                    "tournament is {:?}",
                    self.status
                )))
            }
            _ => Ok(()),
        }
    }
}
