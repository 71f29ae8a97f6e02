//! Bracket construction, match results, and round advancement.

use crate::error::{EngineError, EngineResult};
use crate::logic::eligibility::filter_eligible;
use crate::logic::seeding::Seeder;
use crate::models::{
    EligibleTeam, Match, MatchId, MatchStatus, Participant, Slot, Team, TeamId, Tournament,
    TournamentFormat, TournamentStatus,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Single-elimination bracket from seeded teams.
///
/// Round 1 pairs seeds in order; an odd count gives the last seed a bye. Each
/// later round has `ceil(survivors / 2)` matches, one of them a bye when the
/// survivor count is odd. Winners feed the next round in order, two per match.
pub fn build_single_elimination(teams: &[EligibleTeam]) -> Vec<Match> {
    let mut matches: Vec<Match> = Vec::new();
    let mut number = 1;

    let mut previous: Vec<usize> = Vec::new();
    for pair in teams.chunks(2) {
        let m = match pair {
            [a, b] => Match::new(1, number, Some(a.id()), Some(b.id())),
            [last] => Match::bye(1, number, Some(last.id())),
            _ => unreachable!("chunks(2) yields one or two teams"),
        };
        previous.push(matches.len());
        matches.push(m);
        number += 1;
    }

    let mut round = 2;
    while previous.len() > 1 {
        let survivors = previous.len();
        let count = survivors.div_ceil(2);
        // An odd round gives its bye to the first feeder, so the round-1 bye
        // team does not sit out twice in a row.
        let bye_first = survivors % 2 == 1;
        let mut current = Vec::with_capacity(count);
        for j in 0..count {
            let m = if bye_first && j == 0 {
                Match::bye(round, number, None)
            } else {
                Match::new(round, number, None, None)
            };
            current.push(matches.len());
            matches.push(m);
            number += 1;
        }
        for (i, &idx) in previous.iter().enumerate() {
            let (target, slot) = if bye_first && i == 0 {
                (current[0], Slot::One)
            } else {
                let pos = if bye_first { i + 1 } else { i };
                let slot = if pos % 2 == 0 { Slot::One } else { Slot::Two };
                (current[pos / 2], slot)
            };
            matches[idx].next_match = Some(matches[target].number);
            matches[idx].next_slot = Some(slot);
        }
        previous = current;
        round += 1;
    }

    let first_round: Vec<u32> = matches
        .iter()
        .filter(|m| m.round == 1)
        .map(|m| m.number)
        .collect();
    for n in first_round {
        propagate_winner(&mut matches, n);
    }
    matches
}

/// Round-robin by the circle method: every pair meets once.
///
/// With an odd count one team sits out each round; no bye match is created for it.
pub fn build_round_robin(teams: &[EligibleTeam]) -> Vec<Match> {
    let mut ring: Vec<Option<TeamId>> = teams.iter().map(|t| Some(t.id())).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }
    let n = ring.len();
    let mut matches = Vec::new();
    let mut number = 1;
    for round in 1..n as u32 {
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (ring[i], ring[n - 1 - i]) {
                matches.push(Match::new(round, number, Some(a), Some(b)));
                number += 1;
            }
        }
        // Keep the first seat fixed, rotate the rest clockwise.
        ring[1..].rotate_right(1);
    }
    matches
}

fn build_matches(format: TournamentFormat, seeded: &[EligibleTeam]) -> EngineResult<Vec<Match>> {
    match format {
        TournamentFormat::SingleElimination => Ok(build_single_elimination(seeded)),
        TournamentFormat::RoundRobin => Ok(build_round_robin(seeded)),
        TournamentFormat::DoubleElimination | TournamentFormat::GroupStage => {
            Err(EngineError::UnsupportedFormat(format.to_string()))
        }
    }
}

/// Filter, seed, and build; nothing on the tournament is touched.
fn prepare_bracket(
    tournament: &Tournament,
    format: TournamentFormat,
    teams: &[Team],
    seeder: &mut dyn Seeder,
) -> EngineResult<(Vec<Participant>, Vec<Match>)> {
    let context = tournament.context();
    let eligible = filter_eligible(teams, Some(&context))?;
    let seeded = seeder.seed(eligible);
    let matches = build_matches(format, &seeded)?;
    let participants = seeded
        .iter()
        .zip(1u32..)
        .map(|(t, seed)| Participant {
            team_id: t.id(),
            name: t.name().to_string(),
            seed,
        })
        .collect();
    Ok((participants, matches))
}

/// Build the bracket for a tournament that has none (Draft or Open). Moves it to Open.
pub fn create_bracket(
    tournament: &mut Tournament,
    format: TournamentFormat,
    teams: &[Team],
    seeder: &mut dyn Seeder,
) -> EngineResult<Vec<Match>> {
    if !matches!(
        tournament.status,
        TournamentStatus::Draft | TournamentStatus::Open
    ) {
        return Err(EngineError::invalid_transition(format!(
            "cannot create a bracket while tournament is {:?}",
            tournament.status
        )));
    }
    if !tournament.matches.is_empty() {
        return Err(EngineError::invalid_transition(
            "bracket already exists; recreate it explicitly",
        ));
    }
    let (participants, matches) = prepare_bracket(tournament, format, teams, seeder)?;
    tournament.format = format;
    tournament.participants = participants;
    tournament.matches = matches;
    tournament.reindex();
    tournament.status = TournamentStatus::Open;
    log::info!(
        "Created {} bracket for tournament {}: {} team(s), {} match(es)",
        format,
        tournament.id,
        tournament.participants.len(),
        tournament.matches.len()
    );
    Ok(tournament.matches.clone())
}

/// Discard every match and regenerate from the current eligible list. Irreversible.
pub fn recreate_bracket(
    tournament: &mut Tournament,
    format: TournamentFormat,
    teams: &[Team],
    seeder: &mut dyn Seeder,
    confirm: bool,
) -> EngineResult<Vec<Match>> {
    if !confirm {
        return Err(EngineError::invalid_transition(
            "recreating the bracket discards all matches; confirmation required",
        ));
    }
    tournament.ensure_active()?;
    let (participants, matches) = prepare_bracket(tournament, format, teams, seeder)?;
    let discarded = tournament.matches.len();
    tournament.format = format;
    tournament.participants = participants;
    tournament.matches = matches;
    tournament.reindex();
    tournament.status = TournamentStatus::Open;
    log::warn!(
        "Recreated bracket for tournament {}: discarded {} match(es), built {}",
        tournament.id,
        discarded,
        tournament.matches.len()
    );
    Ok(tournament.matches.clone())
}

fn index_by_number(matches: &[Match]) -> HashMap<u32, usize> {
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| (m.number, i))
        .collect()
}

/// Move a resolved winner into `next_match`, continuing through byes it resolves.
fn propagate_winner(matches: &mut [Match], number: u32) {
    let index = index_by_number(matches);
    let mut current = number;
    // Each step moves strictly to a later round, so the walk ends.
    while let Some(&src) = index.get(&current) {
        let m = &matches[src];
        if !m.status.propagates_winner() {
            return;
        }
        let (Some(next), Some(slot)) = (m.next_match, m.next_slot) else {
            return;
        };
        let winner = m.winner;
        let Some(&dst) = index.get(&next) else {
            return;
        };
        let target = &mut matches[dst];
        target.set_team(slot, winner);
        if target.status == MatchStatus::Bye && target.winner != target.team1 {
            target.winner = target.team1;
            current = next;
        } else {
            return;
        }
    }
}

/// Mark the tournament completed once its deciding matches are done.
fn update_completion(tournament: &mut Tournament) {
    let done = match tournament.format {
        TournamentFormat::RoundRobin => tournament.matches.iter().all(|m| m.status.is_terminal()),
        _ => tournament
            .matches
            .iter()
            .filter(|m| m.next_match.is_none())
            .all(|m| m.status.propagates_winner() && m.winner.is_some()),
    };
    if done && !tournament.matches.is_empty() {
        tournament.status = TournamentStatus::Completed;
        log::info!("Tournament {} completed", tournament.id);
    }
}

fn mark_ongoing(tournament: &mut Tournament) {
    if tournament.status == TournamentStatus::Open {
        tournament.status = TournamentStatus::Ongoing;
    }
}

/// Scheduled -> InProgress. Both teams must be known.
pub fn start_match(tournament: &mut Tournament, match_id: MatchId) -> EngineResult<Match> {
    tournament.ensure_active()?;
    let m = tournament.get_match_mut(match_id)?;
    if m.status != MatchStatus::Scheduled {
        return Err(EngineError::invalid_transition(format!(
            "match {} is {:?}; only scheduled matches can start",
            m.number, m.status
        )));
    }
    if !m.has_both_teams() {
        return Err(EngineError::invalid_transition(format!(
            "match {} is still waiting for its teams",
            m.number
        )));
    }
    m.status = MatchStatus::InProgress;
    let started = m.clone();
    mark_ongoing(tournament);
    Ok(started)
}

/// Record a final score. Scheduled or InProgress -> Completed; the higher score wins.
pub fn record_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    score1: u32,
    score2: u32,
) -> EngineResult<Match> {
    tournament.ensure_active()?;
    let m = tournament.get_match_mut(match_id)?;
    if !matches!(m.status, MatchStatus::Scheduled | MatchStatus::InProgress) {
        return Err(EngineError::invalid_transition(format!(
            "cannot record a result for match {} in status {:?}",
            m.number, m.status
        )));
    }
    if score1 == score2 {
        return Err(EngineError::invalid_request("a match needs a winner; scores are tied"));
    }
    let (Some(team1), Some(team2)) = (m.team1, m.team2) else {
        return Err(EngineError::invalid_transition(format!(
            "match {} is still waiting for its teams",
            m.number
        )));
    };
    let (winner, loser) = if score1 > score2 {
        (team1, team2)
    } else {
        (team2, team1)
    };
    m.score1 = Some(score1);
    m.score2 = Some(score2);
    m.winner = Some(winner);
    m.loser = Some(loser);
    m.status = MatchStatus::Completed;
    let number = m.number;
    finish_match(tournament, number);
    tournament.get_match(match_id).cloned()
}

/// One side did not show. Any non-terminal match with both teams -> Walkover.
pub fn record_walkover(
    tournament: &mut Tournament,
    match_id: MatchId,
    winner: Slot,
) -> EngineResult<Match> {
    tournament.ensure_active()?;
    let m = tournament.get_match_mut(match_id)?;
    if m.status.is_terminal() {
        return Err(EngineError::invalid_transition(format!(
            "match {} is already {:?}",
            m.number, m.status
        )));
    }
    let (Some(team1), Some(team2)) = (m.team1, m.team2) else {
        return Err(EngineError::invalid_transition(format!(
            "match {} is still waiting for its teams",
            m.number
        )));
    };
    let (w, l) = match winner {
        Slot::One => (team1, team2),
        Slot::Two => (team2, team1),
    };
    m.winner = Some(w);
    m.loser = Some(l);
    m.status = MatchStatus::Walkover;
    let number = m.number;
    finish_match(tournament, number);
    tournament.get_match(match_id).cloned()
}

/// Non-terminal -> Cancelled. Nothing moves on from a cancelled match.
pub fn cancel_match(tournament: &mut Tournament, match_id: MatchId) -> EngineResult<Match> {
    tournament.ensure_active()?;
    let m = tournament.get_match_mut(match_id)?;
    if m.status.is_terminal() {
        return Err(EngineError::invalid_transition(format!(
            "match {} is already {:?}",
            m.number, m.status
        )));
    }
    m.status = MatchStatus::Cancelled;
    let cancelled = m.clone();
    log::info!("Cancelled match {} in tournament {}", cancelled.number, tournament.id);
    Ok(cancelled)
}

fn finish_match(tournament: &mut Tournament, number: u32) {
    propagate_winner(&mut tournament.matches, number);
    mark_ongoing(tournament);
    update_completion(tournament);
}

/// Per-round progress report.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round: u32,
    pub total_matches: usize,
    pub status_counts: BTreeMap<MatchStatus, usize>,
    pub winners: Vec<RoundWinner>,
    /// Non-bye, non-cancelled matches without a terminal result.
    pub incomplete: Vec<IncompleteMatch>,
    pub complete: bool,
    /// Winners the next round expects from this one.
    pub expected_advancing: usize,
    pub is_final: bool,
    pub can_advance: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RoundWinner {
    pub match_number: u32,
    pub team_id: TeamId,
    pub team_name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IncompleteMatch {
    pub match_id: MatchId,
    pub match_number: u32,
    pub status: MatchStatus,
}

pub fn round_summary(tournament: &Tournament, round: u32) -> EngineResult<RoundSummary> {
    let matches = tournament.round_matches(round);
    if matches.is_empty() {
        return Err(EngineError::RoundNotFound(round));
    }

    let mut status_counts = BTreeMap::new();
    for m in &matches {
        *status_counts.entry(m.status).or_insert(0) += 1;
    }

    let winners: Vec<RoundWinner> = matches
        .iter()
        .filter_map(|m| {
            m.winner.map(|id| RoundWinner {
                match_number: m.number,
                team_id: id,
                team_name: tournament.team_name(id).unwrap_or_default().to_string(),
            })
        })
        .collect();

    let incomplete: Vec<IncompleteMatch> = matches
        .iter()
        .filter(|m| !matches!(m.status, MatchStatus::Bye | MatchStatus::Cancelled))
        .filter(|m| !(m.status.is_terminal() && m.winner.is_some()))
        .map(|m| IncompleteMatch {
            match_id: m.id,
            match_number: m.number,
            status: m.status,
        })
        .collect();

    let feeding: Vec<&&Match> = matches.iter().filter(|m| m.next_match.is_some()).collect();
    let expected_advancing = feeding.len();
    let advancing = feeding.iter().filter(|m| m.winner.is_some()).count();

    let complete = incomplete.is_empty();
    let is_final = round >= tournament.round_count();
    let can_advance = complete && !is_final && advancing == expected_advancing;

    Ok(RoundSummary {
        round,
        total_matches: matches.len(),
        status_counts,
        winners,
        incomplete,
        complete,
        expected_advancing,
        is_final,
        can_advance,
    })
}

/// Confirm a round is done and return the next round with its teams filled in.
pub fn advance_round(tournament: &mut Tournament, round: u32) -> EngineResult<Vec<Match>> {
    let summary = round_summary(tournament, round)?;
    if !summary.can_advance {
        let pending: Vec<String> = summary
            .incomplete
            .iter()
            .map(|m| m.match_number.to_string())
            .collect();
        return Err(EngineError::invalid_transition(if summary.is_final {
            format!("round {round} is the final round")
        } else if pending.is_empty() {
            format!("round {round} does not produce the winners the next round expects")
        } else {
            format!(
                "round {round} is incomplete; matches without a result: {}",
                pending.join(", ")
            )
        }));
    }
    let numbers: Vec<u32> = tournament
        .round_matches(round)
        .iter()
        .map(|m| m.number)
        .collect();
    for n in numbers {
        propagate_winner(&mut tournament.matches, n);
    }
    Ok(tournament
        .round_matches(round + 1)
        .into_iter()
        .cloned()
        .collect())
}

/// Number of the single final match, or an error if links dangle, cycle, or end in several sinks.
pub fn bracket_sink(matches: &[Match]) -> EngineResult<u32> {
    let index = index_by_number(matches);
    if index.len() != matches.len() {
        return Err(EngineError::invalid_request("duplicate match numbers"));
    }
    let mut sinks = Vec::new();
    for m in matches {
        let mut steps = 0;
        let mut current = m;
        while let Some(next) = current.next_match {
            current = index
                .get(&next)
                .map(|&i| &matches[i])
                .ok_or_else(|| EngineError::invalid_request(format!("match {next} does not exist")))?;
            steps += 1;
            if steps > matches.len() {
                return Err(EngineError::invalid_request("bracket links form a cycle"));
            }
        }
        if !sinks.contains(&current.number) {
            sinks.push(current.number);
        }
    }
    match sinks.as_slice() {
        [only] => Ok(*only),
        [] => Err(EngineError::invalid_request("bracket has no matches")),
        _ => Err(EngineError::invalid_request(format!(
            "bracket has {} final matches",
            sinks.len()
        ))),
    }
}
