//! Schedule and bracket resets: soft, hard, partial.

use crate::error::{EngineError, EngineResult};
use crate::models::{MatchId, MatchStatus, Tournament, TournamentStatus};
use serde::{Deserialize, Serialize};

/// Which state a reset reverts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Clear court and time on every match; results stay.
    Soft,
    /// Delete every match and return the tournament to Draft. Irreversible.
    Hard,
    /// Clear court and time only on matches without a terminal result.
    Partial,
}

/// Whether one mode may run now, and why not.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResetCheck {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl ResetCheck {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn refused(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Per-mode availability, for presenting the choice before resetting.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResetAvailability {
    pub soft: ResetCheck,
    pub hard: ResetCheck,
    pub partial: ResetCheck,
}

impl ResetAvailability {
    pub fn get(&self, mode: ResetMode) -> &ResetCheck {
        match mode {
            ResetMode::Soft => &self.soft,
            ResetMode::Hard => &self.hard,
            ResetMode::Partial => &self.partial,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResetOutcome {
    pub mode: ResetMode,
    pub matches_affected: usize,
    pub affected_ids: Vec<MatchId>,
}

fn check(tournament: &Tournament, mode: ResetMode) -> ResetCheck {
    if tournament.status == TournamentStatus::Completed {
        return ResetCheck::refused("tournament is completed");
    }
    let running = tournament
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::InProgress)
        .count();
    if running > 0 {
        return ResetCheck::refused(format!("{running} match(es) in progress"));
    }
    let completed = tournament
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .count();
    match mode {
        ResetMode::Soft | ResetMode::Hard if completed > 0 => ResetCheck::refused(format!(
            "{completed} match(es) already completed; use a partial reset"
        )),
        _ => ResetCheck::allowed(),
    }
}

pub fn can_reset(tournament: &Tournament) -> ResetAvailability {
    ResetAvailability {
        soft: check(tournament, ResetMode::Soft),
        hard: check(tournament, ResetMode::Hard),
        partial: check(tournament, ResetMode::Partial),
    }
}

/// Apply a reset. Refused resets leave the tournament untouched.
pub fn reset_schedule(tournament: &mut Tournament, mode: ResetMode) -> EngineResult<ResetOutcome> {
    let verdict = check(tournament, mode);
    if !verdict.allowed {
        return Err(EngineError::InvalidTransition(format!(
            "{mode:?} reset refused: {}",
            verdict.reason.unwrap_or_default()
        )));
    }
    let affected_ids = match mode {
        ResetMode::Soft => soft_reset(tournament),
        ResetMode::Hard => hard_reset(tournament),
        ResetMode::Partial => partial_reset(tournament),
    };
    log::info!(
        "{:?} reset on tournament {}: {} match(es) affected",
        mode,
        tournament.id,
        affected_ids.len()
    );
    Ok(ResetOutcome {
        mode,
        matches_affected: affected_ids.len(),
        affected_ids,
    })
}

/// Clear placements where `include` accepts the status; scheduled ones go back to Unscheduled.
fn clear_placements(tournament: &mut Tournament, include: impl Fn(MatchStatus) -> bool) -> Vec<MatchId> {
    let affected: Vec<MatchId> = tournament
        .matches
        .iter()
        .filter(|m| m.placement.is_some() && include(m.status))
        .map(|m| m.id)
        .collect();
    for &id in &affected {
        if let Ok(m) = tournament.set_placement(id, None) {
            if m.status == MatchStatus::Scheduled {
                m.status = MatchStatus::Unscheduled;
            }
        }
    }
    affected
}

fn soft_reset(tournament: &mut Tournament) -> Vec<MatchId> {
    clear_placements(tournament, |_| true)
}

fn partial_reset(tournament: &mut Tournament) -> Vec<MatchId> {
    clear_placements(tournament, |status| !status.is_terminal())
}

fn hard_reset(tournament: &mut Tournament) -> Vec<MatchId> {
    let deleted = tournament.matches.drain(..).map(|m| m.id).collect();
    tournament.reindex();
    tournament.participants.clear();
    tournament.status = TournamentStatus::Draft;
    deleted
}
