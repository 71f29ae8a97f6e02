//! Scheduling inputs and derived views: window, courts, conflicts, slots.

use crate::models::game::{CourtId, MatchId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How batch generation spreads matches over courts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStrategy {
    /// One match at a time across all courts.
    Sequential,
    /// Round-robin over courts, each court packed back-to-back.
    #[default]
    Parallel,
    /// Fewest-matches-first over courts.
    Balanced,
}

/// Dates and daily hours in which matches may be placed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SchedulingWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_start: NaiveTime,
    pub daily_end: NaiveTime,
}

/// A court available for scheduling. `closes_at` overrides the window's daily end if earlier.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    #[serde(default)]
    pub closes_at: Option<NaiveTime>,
}

impl Court {
    pub fn new(id: impl Into<CourtId>) -> Self {
        Self {
            id: id.into(),
            closes_at: None,
        }
    }

    pub fn closing_at(mut self, time: NaiveTime) -> Self {
        self.closes_at = Some(time);
        self
    }
}

/// Parameters of one batch generation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub window: SchedulingWindow,
    pub courts: Vec<Court>,
    /// Minutes per match.
    pub match_duration: u32,
    /// Minutes between matches on one court.
    pub break_duration: u32,
    #[serde(default)]
    pub strategy: ScheduleStrategy,
}

/// Two matches on one court whose intervals overlap.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    /// The match being placed.
    pub match_id: MatchId,
    /// The match already occupying the court.
    pub conflicting_match_id: MatchId,
    pub court: CourtId,
    /// Start of the overlapping window.
    pub overlap_start: NaiveDateTime,
    /// End (exclusive) of the overlapping window.
    pub overlap_end: NaiveDateTime,
}

/// A free `[start, end)` interval.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Open intervals on one court for one date.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CourtSlots {
    pub court: CourtId,
    pub slots: Vec<TimeSlot>,
}

/// One match as it appears on a court's day sheet.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CourtEntry {
    pub match_id: MatchId,
    pub number: u32,
    pub round: u32,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Per-date view: court -> matches in start order. Always derived from match state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CourtSchedule {
    pub date: NaiveDate,
    pub courts: BTreeMap<CourtId, Vec<CourtEntry>>,
}
