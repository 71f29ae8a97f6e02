//! Conflict detection: same court, overlapping half-open intervals.
//!
//! Advisory only. Nothing here refuses a placement; callers decide.

use crate::models::{CourtId, Match, MatchId, ScheduleConflict};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// A proposed (or existing) occupation of a court.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    pub match_id: MatchId,
    pub court: CourtId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Candidate {
    /// The placement of a scheduled match, using `default_minutes` when it has no duration.
    pub fn from_match(m: &Match, default_minutes: u32) -> Option<Self> {
        let (start, end) = m.interval(default_minutes)?;
        let court = m.court()?.to_string();
        Some(Self {
            match_id: m.id,
            court,
            start,
            end,
        })
    }

    /// Strict overlap of `[start, end)`; touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.court == other.court && self.start < other.end && other.start < self.end
    }

    /// Dates this interval touches (more than one when it runs past midnight).
    fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.start.date();
        // `end` is exclusive.
        let last = (self.end - Duration::nanoseconds(1)).date().max(first);
        first.iter_days().take_while(move |d| *d <= last)
    }

    fn conflict_with(&self, existing: &Candidate) -> ScheduleConflict {
        ScheduleConflict {
            match_id: self.match_id,
            conflicting_match_id: existing.match_id,
            court: self.court.clone(),
            overlap_start: self.start.max(existing.start),
            overlap_end: self.end.min(existing.end),
        }
    }
}

/// Existing placements bucketed by `(date, court)`.
#[derive(Clone, Debug, Default)]
pub struct ConflictIndex {
    buckets: HashMap<(NaiveDate, CourtId), Vec<Candidate>>,
    placed: HashMap<MatchId, Candidate>,
}

impl ConflictIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every scheduled match.
    pub fn from_matches(matches: &[Match], default_minutes: u32) -> Self {
        let mut index = Self::new();
        for c in matches
            .iter()
            .filter_map(|m| Candidate::from_match(m, default_minutes))
        {
            index.insert(c);
        }
        index
    }

    /// Add a placement, replacing any earlier one for the same match.
    pub fn insert(&mut self, placement: Candidate) {
        self.remove(placement.match_id);
        for date in placement.dates() {
            self.buckets
                .entry((date, placement.court.clone()))
                .or_default()
                .push(placement.clone());
        }
        self.placed.insert(placement.match_id, placement);
    }

    /// Drop a match's placement. Only the buckets it occupied are touched.
    pub fn remove(&mut self, match_id: MatchId) {
        let Some(old) = self.placed.remove(&match_id) else {
            return;
        };
        for date in old.dates() {
            let key = (date, old.court.clone());
            if let Some(bucket) = self.buckets.get_mut(&key) {
                bucket.retain(|c| c.match_id != match_id);
                if bucket.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
    }

    pub fn get(&self, match_id: MatchId) -> Option<&Candidate> {
        self.placed.get(&match_id)
    }

    /// Number of indexed placements.
    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Placements on one court for one date.
    pub fn on(&self, date: NaiveDate, court: &str) -> &[Candidate] {
        self.buckets
            .get(&(date, court.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Conflicts between `candidate` and indexed placements. Only buckets the
    /// candidate touches are scanned; its own earlier placement is ignored.
    pub fn find_conflicts(&self, candidate: &Candidate) -> Vec<ScheduleConflict> {
        let mut seen: Vec<MatchId> = Vec::new();
        let mut conflicts = Vec::new();
        for date in candidate.dates() {
            for existing in self.on(date, &candidate.court) {
                if existing.match_id == candidate.match_id || seen.contains(&existing.match_id) {
                    continue;
                }
                if candidate.overlaps(existing) {
                    seen.push(existing.match_id);
                    conflicts.push(candidate.conflict_with(existing));
                }
            }
        }
        conflicts
    }

    /// Every conflicting pair among indexed placements, each reported once.
    pub fn detect_all(&self) -> Vec<ScheduleConflict> {
        let mut conflicts: Vec<ScheduleConflict> = Vec::new();
        let mut reported: Vec<(MatchId, MatchId)> = Vec::new();
        for bucket in self.buckets.values() {
            let mut sorted: Vec<&Candidate> = bucket.iter().collect();
            sorted.sort_by_key(|c| (c.start, c.end));
            for (i, a) in sorted.iter().enumerate() {
                // Sorted by start: once b starts at or after a ends, nothing later overlaps a.
                for b in sorted[i + 1..].iter().take_while(|b| b.start < a.end) {
                    if a.match_id == b.match_id {
                        continue;
                    }
                    let key = if a.match_id < b.match_id {
                        (a.match_id, b.match_id)
                    } else {
                        (b.match_id, a.match_id)
                    };
                    if !reported.contains(&key) {
                        reported.push(key);
                        conflicts.push(b.conflict_with(a));
                    }
                }
            }
        }
        conflicts.sort_by_key(|c| (c.overlap_start, c.court.clone()));
        conflicts
    }
}

/// One-shot form over a plain match list. Only matches on the candidate's
/// court are considered; a tournament's own index is `Tournament::placement_index`.
pub fn find_conflicts(
    candidate: &Candidate,
    existing: &[Match],
    default_minutes: u32,
) -> Vec<ScheduleConflict> {
    let mut index = ConflictIndex::new();
    for c in existing
        .iter()
        .filter(|m| m.court() == Some(candidate.court.as_str()))
        .filter_map(|m| Candidate::from_match(m, default_minutes))
    {
        index.insert(c);
    }
    index.find_conflicts(candidate)
}

/// All conflicts in a match set.
pub fn detect_all(matches: &[Match], default_minutes: u32) -> Vec<ScheduleConflict> {
    ConflictIndex::from_matches(matches, default_minutes).detect_all()
}
