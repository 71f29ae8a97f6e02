//! In-memory tournament store: per-tournament serialization and atomic commits.
//!
//! Each tournament sits behind its own `RwLock`. Mutations run on a clone under
//! the write lock and replace the stored tournament only when they succeed, so
//! a failed operation leaves nothing behind and two writers never interleave.

use crate::error::{EngineError, EngineResult};
use crate::logic::{
    self, EligibilityDecision, ResetAvailability, ResetMode, ResetOutcome, RoundSummary,
    ScheduleMatchOutcome, ScheduleOutcome, SeedingPolicy,
};
use crate::models::{
    CourtId, Match, MatchId, ScheduleRequest, Team, Tournament, TournamentFormat, TournamentId,
};
use crate::roster::{division_roster, RosterSource};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type Entry = Arc<RwLock<Tournament>>;

/// Tournaments by id plus the roster imported from the registration system.
#[derive(Default)]
pub struct TournamentStore {
    tournaments: RwLock<HashMap<TournamentId, Entry>>,
    roster: RwLock<Vec<Team>>,
}

impl TournamentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mut tournament: Tournament) -> TournamentId {
        tournament.reindex();
        let id = tournament.id;
        self.tournaments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(RwLock::new(tournament)));
        id
    }

    fn entry(&self, id: TournamentId) -> EngineResult<Entry> {
        self.tournaments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(EngineError::TournamentNotFound(id))
    }

    /// Run a read-only query. Any number of readers may run at once.
    pub fn read<T>(&self, id: TournamentId, f: impl FnOnce(&Tournament) -> T) -> EngineResult<T> {
        let entry = self.entry(id)?;
        let guard = entry.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&guard))
    }

    /// Run a mutation exclusively; the change is kept only if `f` returns Ok.
    pub fn update<T>(
        &self,
        id: TournamentId,
        f: impl FnOnce(&mut Tournament) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let entry = self.entry(id)?;
        let mut guard = entry.write().unwrap_or_else(PoisonError::into_inner);
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }

    pub fn snapshot(&self, id: TournamentId) -> EngineResult<Tournament> {
        self.read(id, Tournament::clone)
    }

    /// Tournament that owns a match.
    pub fn locate_match(&self, match_id: MatchId) -> EngineResult<TournamentId> {
        let map = self.tournaments.read().unwrap_or_else(PoisonError::into_inner);
        map.iter()
            .find(|(_, entry)| {
                entry
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .matches
                    .iter()
                    .any(|m| m.id == match_id)
            })
            .map(|(id, _)| *id)
            .ok_or(EngineError::MatchNotFound(match_id))
    }

    /// Add or replace roster teams (matched by id). Returns the roster size.
    pub fn upsert_teams(&self, teams: Vec<Team>) -> usize {
        let mut roster = self.roster.write().unwrap_or_else(PoisonError::into_inner);
        for team in teams {
            match roster.iter_mut().find(|t| t.id == team.id) {
                Some(existing) => *existing = team,
                None => roster.push(team),
            }
        }
        roster.len()
    }

    pub fn roster(&self) -> Vec<Team> {
        self.roster
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn division_teams(&self, tournament: &Tournament) -> Vec<Team> {
        let roster = self.roster();
        division_roster(&roster as &dyn RosterSource, tournament)
    }

    pub fn eligibility(&self, id: TournamentId) -> EngineResult<Vec<EligibilityDecision>> {
        let roster = self.roster();
        self.read(id, |t| {
            let teams = division_roster(&roster as &dyn RosterSource, t);
            logic::eligibility_report(&teams, Some(&t.context()))
        })
    }

    pub fn create_bracket(
        &self,
        id: TournamentId,
        format: TournamentFormat,
        seeding: SeedingPolicy,
    ) -> EngineResult<Vec<Match>> {
        self.update(id, |t| {
            let teams = self.division_teams(t);
            logic::create_bracket(t, format, &teams, seeding.seeder().as_mut())
        })
    }

    pub fn recreate_bracket(
        &self,
        id: TournamentId,
        format: TournamentFormat,
        seeding: SeedingPolicy,
        confirm: bool,
    ) -> EngineResult<Vec<Match>> {
        self.update(id, |t| {
            let teams = self.division_teams(t);
            logic::recreate_bracket(t, format, &teams, seeding.seeder().as_mut(), confirm)
        })
    }

    pub fn generate_schedule(
        &self,
        id: TournamentId,
        request: &ScheduleRequest,
    ) -> EngineResult<ScheduleOutcome> {
        self.update(id, |t| logic::generate_schedule(t, request))
    }

    /// `update` on whichever tournament owns the match.
    pub fn update_match<T>(
        &self,
        match_id: MatchId,
        f: impl FnOnce(&mut Tournament) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let id = self.locate_match(match_id)?;
        self.update(id, f)
    }

    pub fn schedule_match(
        &self,
        match_id: MatchId,
        start: NaiveDateTime,
        court: CourtId,
    ) -> EngineResult<ScheduleMatchOutcome> {
        self.update_match(match_id, |t| logic::schedule_match(t, match_id, start, court))
    }

    pub fn remove_schedule(&self, match_id: MatchId) -> EngineResult<Match> {
        self.update_match(match_id, |t| logic::remove_schedule(t, match_id))
    }

    pub fn can_reset(&self, id: TournamentId) -> EngineResult<ResetAvailability> {
        self.read(id, logic::can_reset)
    }

    pub fn reset_schedule(&self, id: TournamentId, mode: ResetMode) -> EngineResult<ResetOutcome> {
        self.update(id, |t| logic::reset_schedule(t, mode))
    }

    pub fn round_summary(&self, id: TournamentId, round: u32) -> EngineResult<RoundSummary> {
        self.read(id, |t| logic::round_summary(t, round))?
    }
}
