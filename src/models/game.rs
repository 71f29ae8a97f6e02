//! Match, MatchStatus, and Slot for bracket and round-robin play.

use crate::models::team::TeamId;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Identifier of a court (free-form, e.g. "Court 1").
pub type CourtId = String;

/// Which side of a match a team occupies.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    #[default]
    One,
    Two,
}

/// Lifecycle of a single match.
///
/// `Unscheduled` is the state of a generated match with no placement yet.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    #[default]
    Unscheduled,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Walkover,
    Bye,
}

impl MatchStatus {
    pub const ALL: [MatchStatus; 7] = [
        MatchStatus::Unscheduled,
        MatchStatus::Scheduled,
        MatchStatus::InProgress,
        MatchStatus::Completed,
        MatchStatus::Cancelled,
        MatchStatus::Walkover,
        MatchStatus::Bye,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MatchStatus::Completed | MatchStatus::Cancelled | MatchStatus::Walkover | MatchStatus::Bye
        )
    }

    /// Terminal states whose winner moves on to `next_match`.
    pub fn propagates_winner(self) -> bool {
        matches!(
            self,
            MatchStatus::Completed | MatchStatus::Walkover | MatchStatus::Bye
        )
    }
}

/// Court and start time of a scheduled match. Both or neither are set on a match.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub court: CourtId,
    pub start: NaiveDateTime,
}

/// A single match in a tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub round: u32,
    /// Unique within the tournament; bracket links refer to it.
    pub number: u32,
    /// None until the bracket resolves this side (awaiting a bye or a prior winner).
    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,
    pub score1: Option<u32>,
    pub score2: Option<u32>,
    pub winner: Option<TeamId>,
    pub loser: Option<TeamId>,
    pub status: MatchStatus,
    pub placement: Option<Placement>,
    /// Minutes; falls back to the tournament default when None.
    pub duration: Option<u32>,
    /// Number of the match this match's winner feeds into.
    pub next_match: Option<u32>,
    /// Side of `next_match` the winner lands on.
    pub next_slot: Option<Slot>,
}

impl Match {
    pub fn new(round: u32, number: u32, team1: Option<TeamId>, team2: Option<TeamId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            round,
            number,
            team1,
            team2,
            score1: None,
            score2: None,
            winner: None,
            loser: None,
            status: MatchStatus::Unscheduled,
            placement: None,
            duration: None,
            next_match: None,
            next_slot: None,
        }
    }

    /// A match where one side advances without playing.
    pub fn bye(round: u32, number: u32, team: Option<TeamId>) -> Self {
        let mut m = Self::new(round, number, team, None);
        m.status = MatchStatus::Bye;
        m.winner = team;
        m
    }

    pub fn team(&self, slot: Slot) -> Option<TeamId> {
        match slot {
            Slot::One => self.team1,
            Slot::Two => self.team2,
        }
    }

    pub fn set_team(&mut self, slot: Slot, team: Option<TeamId>) {
        match slot {
            Slot::One => self.team1 = team,
            Slot::Two => self.team2 = team,
        }
    }

    pub fn has_both_teams(&self) -> bool {
        self.team1.is_some() && self.team2.is_some()
    }

    pub fn is_scheduled(&self) -> bool {
        self.placement.is_some()
    }

    pub fn court(&self) -> Option<&str> {
        self.placement.as_ref().map(|p| p.court.as_str())
    }

    pub fn scheduled_time(&self) -> Option<NaiveDateTime> {
        self.placement.as_ref().map(|p| p.start)
    }

    /// Effective duration in minutes.
    pub fn duration_or(&self, default_minutes: u32) -> u32 {
        self.duration.unwrap_or(default_minutes)
    }

    /// `[start, end)` of the placement, if scheduled.
    pub fn interval(&self, default_minutes: u32) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.placement.as_ref().map(|p| {
            let end = p.start + Duration::minutes(i64::from(self.duration_or(default_minutes)));
            (p.start, end)
        })
    }
}
