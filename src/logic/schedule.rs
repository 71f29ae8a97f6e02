//! Schedule generation: place unscheduled matches on courts within a window.
//!
//! Each strategy has its own placement rule; all share the same slot search,
//! which respects daily hours, court closing times, existing placements and
//! the break between matches on one court.

use crate::error::{EngineError, EngineResult};
use crate::logic::conflicts::{Candidate, ConflictIndex};
use crate::models::{
    Court, CourtEntry, CourtId, CourtSchedule, CourtSlots, Match, MatchId, MatchStatus, Placement,
    ScheduleConflict, ScheduleRequest, ScheduleStrategy, SchedulingWindow, TimeSlot, Tournament,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m))
}

/// A match put on a court by the planner.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Assignment {
    pub match_id: MatchId,
    pub court: CourtId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Planner output before it is written to the tournament.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SchedulePlan {
    pub assignments: Vec<Assignment>,
    pub unplaced: Vec<MatchId>,
    pub conflicts: Vec<ScheduleConflict>,
}

/// Result of batch generation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ScheduleOutcome {
    pub scheduled: Vec<Match>,
    /// Matches the window had no room for.
    pub unplaced: Vec<MatchId>,
    pub conflicts: Vec<ScheduleConflict>,
}

impl ScheduleOutcome {
    pub fn window_exhausted(&self) -> bool {
        !self.unplaced.is_empty()
    }

    /// For callers that need every match placed.
    pub fn require_complete(self) -> EngineResult<Self> {
        if self.window_exhausted() {
            return Err(EngineError::SchedulingWindowExhausted {
                unplaced: self.unplaced.len(),
            });
        }
        Ok(self)
    }
}

/// Result of a manual placement. The write has happened even when `conflicts` is non-empty.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ScheduleMatchOutcome {
    #[serde(rename = "match")]
    pub game: Match,
    pub conflicts: Vec<ScheduleConflict>,
}

impl ScheduleMatchOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Turn advisory conflicts into `ConflictDetected` for callers that want a hard stop.
    pub fn require_conflict_free(self) -> EngineResult<Self> {
        if self.has_conflicts() {
            return Err(EngineError::ConflictDetected {
                match_id: self.game.id,
                count: self.conflicts.len(),
            });
        }
        Ok(self)
    }
}

pub fn validate_request(request: &ScheduleRequest) -> EngineResult<()> {
    let w = &request.window;
    if request.courts.is_empty() {
        return Err(EngineError::invalid_request("at least one court is required"));
    }
    let mut ids = HashSet::new();
    if let Some(dup) = request.courts.iter().find(|c| !ids.insert(c.id.as_str())) {
        return Err(EngineError::invalid_request(format!(
            "court {} listed twice",
            dup.id
        )));
    }
    if request.match_duration == 0 {
        return Err(EngineError::invalid_request("match duration must be positive"));
    }
    if w.daily_start >= w.daily_end {
        return Err(EngineError::invalid_request("daily start must be before daily end"));
    }
    if w.start_date > w.end_date {
        return Err(EngineError::invalid_request("start date must not be after end date"));
    }
    Ok(())
}

/// One court's state during planning.
struct CourtBook<'a> {
    court: &'a Court,
    /// Occupied `[start, end)` intervals, sorted by start.
    busy: Vec<(NaiveDateTime, NaiveDateTime)>,
    /// Matches on this court within the window.
    load: usize,
    /// Earliest start for the next match packed on this court.
    cursor: NaiveDateTime,
}

impl CourtBook<'_> {
    fn occupy(&mut self, start: NaiveDateTime, end: NaiveDateTime, gap: Duration) {
        let at = self.busy.partition_point(|(s, _)| *s <= start);
        self.busy.insert(at, (start, end));
        self.load += 1;
        self.cursor = self.cursor.max(end + gap);
    }
}

struct Planner<'a> {
    window: SchedulingWindow,
    duration: Duration,
    gap: Duration,
    books: Vec<CourtBook<'a>>,
    /// Sequential strategy: the single virtual court's next start.
    cursor: NaiveDateTime,
    /// Parallel strategy: next court in rotation.
    rotation: usize,
}

impl<'a> Planner<'a> {
    fn new(request: &'a ScheduleRequest, existing: &[Candidate]) -> Self {
        let window = request.window;
        let start = window.start_date.and_time(window.daily_start);
        let gap = minutes(request.break_duration);
        let books = request
            .courts
            .iter()
            .map(|court| {
                let mut busy: Vec<_> = existing
                    .iter()
                    .filter(|c| c.court == court.id)
                    .map(|c| (c.start, c.end))
                    .collect();
                busy.sort();
                let load = existing
                    .iter()
                    .filter(|c| {
                        c.court == court.id
                            && c.start.date() >= window.start_date
                            && c.start.date() <= window.end_date
                    })
                    .count();
                CourtBook {
                    court,
                    busy,
                    load,
                    cursor: start,
                }
            })
            .collect();
        Self {
            window,
            duration: minutes(request.match_duration),
            gap,
            books,
            cursor: start,
            rotation: 0,
        }
    }

    fn closing_time(&self, court: &Court) -> NaiveTime {
        court
            .closes_at
            .map_or(self.window.daily_end, |t| t.min(self.window.daily_end))
    }

    /// Earliest start `>= earliest` on court `k` inside the window, clear of
    /// busy intervals by at least the break. None once the window runs out.
    fn next_free_slot(&self, k: usize, earliest: NaiveDateTime) -> Option<NaiveDateTime> {
        let w = &self.window;
        let book = &self.books[k];
        let close_time = self.closing_time(book.court);
        let mut t = earliest.max(w.start_date.and_time(w.daily_start));
        loop {
            let date = t.date();
            if date > w.end_date {
                return None;
            }
            let open = date.and_time(w.daily_start);
            if t < open {
                t = open;
            }
            if t + self.duration > date.and_time(close_time) {
                t = date.succ_opt()?.and_time(w.daily_start);
                continue;
            }
            let end = t + self.duration;
            match book
                .busy
                .iter()
                .find(|(s, e)| *s < end + self.gap && t < *e + self.gap)
            {
                Some((_, e)) => t = *e + self.gap,
                None => return Some(t),
            }
        }
    }

    /// Pick a court and start for one match; None if nothing fits.
    fn choose(&mut self, strategy: ScheduleStrategy, ready: NaiveDateTime) -> Option<(usize, NaiveDateTime)> {
        match strategy {
            ScheduleStrategy::Sequential => self.choose_sequential(ready),
            ScheduleStrategy::Parallel => self.choose_parallel(ready),
            ScheduleStrategy::Balanced => self.choose_balanced(ready),
        }
    }

    /// One match at a time: earliest free court after the previous match's end + break.
    fn choose_sequential(&self, ready: NaiveDateTime) -> Option<(usize, NaiveDateTime)> {
        let earliest = self.cursor.max(ready);
        (0..self.books.len())
            .filter_map(|k| self.next_free_slot(k, earliest).map(|t| (k, t)))
            .min_by_key(|&(k, t)| (t, k))
    }

    /// Courts in rotation, each packed from its own cursor. A court with no
    /// room left on the earliest open day passes its turn to the next one.
    fn choose_parallel(&mut self, ready: NaiveDateTime) -> Option<(usize, NaiveDateTime)> {
        let n = self.books.len();
        let first = self.rotation % n;
        self.rotation += 1;
        let options: Vec<(usize, NaiveDateTime)> = (0..n)
            .map(|offset| (first + offset) % n)
            .filter_map(|k| {
                let earliest = self.books[k].cursor.max(ready);
                self.next_free_slot(k, earliest).map(|t| (k, t))
            })
            .collect();
        let day = options.iter().map(|(_, t)| t.date()).min()?;
        options.into_iter().find(|(_, t)| t.date() == day)
    }

    /// Least-loaded court by match count; ties go to the earliest free slot.
    fn choose_balanced(&self, ready: NaiveDateTime) -> Option<(usize, NaiveDateTime)> {
        (0..self.books.len())
            .filter_map(|k| {
                let earliest = self.books[k].cursor.max(ready);
                self.next_free_slot(k, earliest)
                    .map(|t| (k, t, self.books[k].load))
            })
            .min_by_key(|&(k, t, load)| (load, t, k))
            .map(|(k, t, _)| (k, t))
    }
}

/// Matches generation should place: not terminal, not yet placed, not a bye.
pub fn matches_to_place(matches: &[Match]) -> Vec<&Match> {
    let mut pending: Vec<&Match> = matches
        .iter()
        .filter(|m| !m.is_scheduled() && !m.status.is_terminal() && m.status != MatchStatus::InProgress)
        .collect();
    pending.sort_by_key(|m| (m.round, m.number));
    pending
}

/// Plan placements for every unscheduled match in `matches` without mutating anything.
///
/// A bracket match never starts before its feeders have ended plus the break.
pub fn plan_schedule(
    matches: &[Match],
    request: &ScheduleRequest,
    default_minutes: u32,
) -> EngineResult<SchedulePlan> {
    validate_request(request)?;

    let existing: Vec<Candidate> = matches
        .iter()
        .filter_map(|m| Candidate::from_match(m, default_minutes))
        .collect();
    let mut index = ConflictIndex::new();
    for c in &existing {
        index.insert(c.clone());
    }

    let mut ends: HashMap<u32, NaiveDateTime> = matches
        .iter()
        .filter_map(|m| m.interval(default_minutes).map(|(_, end)| (m.number, end)))
        .collect();
    let mut feeders: HashMap<u32, Vec<u32>> = HashMap::new();
    for m in matches {
        if let Some(next) = m.next_match {
            feeders.entry(next).or_default().push(m.number);
        }
    }

    let mut planner = Planner::new(request, &existing);
    let window_start = request.window.start_date.and_time(request.window.daily_start);
    let mut plan = SchedulePlan::default();

    for m in matches_to_place(matches) {
        let ready = feeders
            .get(&m.number)
            .into_iter()
            .flatten()
            .filter_map(|f| ends.get(f))
            .map(|end| *end + planner.gap)
            .fold(window_start, NaiveDateTime::max);

        let Some((k, start)) = planner.choose(request.strategy, ready) else {
            plan.unplaced.push(m.id);
            continue;
        };
        let end = start + planner.duration;
        let gap = planner.gap;
        planner.books[k].occupy(start, end, gap);
        planner.cursor = end + gap;
        ends.insert(m.number, end);

        let candidate = Candidate {
            match_id: m.id,
            court: planner.books[k].court.id.clone(),
            start,
            end,
        };
        plan.conflicts.extend(index.find_conflicts(&candidate));
        index.insert(candidate.clone());
        plan.assignments.push(Assignment {
            match_id: m.id,
            court: candidate.court,
            start,
            end,
        });
    }
    Ok(plan)
}

/// Batch generation on a tournament. Placements are written even when some matches stay unplaced.
pub fn generate_schedule(
    tournament: &mut Tournament,
    request: &ScheduleRequest,
) -> EngineResult<ScheduleOutcome> {
    tournament.ensure_active()?;
    let plan = plan_schedule(
        &tournament.matches,
        request,
        tournament.settings.match_duration,
    )?;

    let mut scheduled = Vec::with_capacity(plan.assignments.len());
    for a in &plan.assignments {
        tournament.get_match_mut(a.match_id)?.duration = Some(request.match_duration);
        let m = tournament.set_placement(
            a.match_id,
            Some(Placement {
                court: a.court.clone(),
                start: a.start,
            }),
        )?;
        if m.status == MatchStatus::Unscheduled {
            m.status = MatchStatus::Scheduled;
        }
        scheduled.push(m.clone());
    }

    log::info!(
        "Generated {:?} schedule for tournament {}: {} placed, {} unplaced, {} conflict(s)",
        request.strategy,
        tournament.id,
        scheduled.len(),
        plan.unplaced.len(),
        plan.conflicts.len()
    );
    if !plan.unplaced.is_empty() {
        log::warn!(
            "Scheduling window exhausted for tournament {}: {} match(es) unplaced",
            tournament.id,
            plan.unplaced.len()
        );
    }

    Ok(ScheduleOutcome {
        scheduled,
        unplaced: plan.unplaced,
        conflicts: plan.conflicts,
    })
}

/// Manual placement. Conflicts are reported, never blocking.
pub fn schedule_match(
    tournament: &mut Tournament,
    match_id: MatchId,
    start: NaiveDateTime,
    court: CourtId,
) -> EngineResult<ScheduleMatchOutcome> {
    tournament.ensure_active()?;
    let default_minutes = tournament.settings.match_duration;
    let m = tournament.get_match(match_id)?;
    if m.status.is_terminal() || m.status == MatchStatus::InProgress {
        return Err(EngineError::invalid_transition(format!(
            "match {} is {:?} and cannot be moved",
            m.number, m.status
        )));
    }
    let candidate = Candidate {
        match_id,
        court: court.clone(),
        start,
        end: start + minutes(m.duration_or(default_minutes)),
    };
    let conflicts = tournament.placement_index().find_conflicts(&candidate);

    let m = tournament.set_placement(match_id, Some(Placement { court, start }))?;
    m.status = MatchStatus::Scheduled;
    if conflicts.is_empty() {
        log::info!("Scheduled match {} at {} on {}", m.number, start, candidate.court);
    } else {
        log::warn!(
            "Scheduled match {} at {} on {} with {} conflict(s)",
            m.number,
            start,
            candidate.court,
            conflicts.len()
        );
    }
    Ok(ScheduleMatchOutcome {
        game: m.clone(),
        conflicts,
    })
}

/// Clear a match's court and time. Started and finished matches keep theirs.
pub fn remove_schedule(tournament: &mut Tournament, match_id: MatchId) -> EngineResult<Match> {
    tournament.ensure_active()?;
    let m = tournament.get_match(match_id)?;
    if m.status.is_terminal() || m.status == MatchStatus::InProgress {
        return Err(EngineError::invalid_transition(format!(
            "match {} is {:?} and keeps its placement",
            m.number, m.status
        )));
    }
    let m = tournament.set_placement(match_id, None)?;
    if m.status == MatchStatus::Scheduled {
        m.status = MatchStatus::Unscheduled;
    }
    Ok(m.clone())
}

/// Courts that appear on any scheduled match, sorted.
pub fn known_courts(matches: &[Match]) -> Vec<CourtId> {
    let mut courts: Vec<CourtId> = matches
        .iter()
        .filter_map(|m| m.court().map(str::to_string))
        .collect();
    courts.sort();
    courts.dedup();
    courts
}

/// Parameters of an available-slot query for one date.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub courts: Vec<CourtId>,
    /// Minutes the slot must hold.
    pub duration: u32,
    /// Minutes to keep clear of scheduled matches.
    #[serde(default)]
    pub break_duration: u32,
}

/// Open `[start, end)` gaps per court long enough for one match, keeping the
/// break from scheduled matches.
pub fn available_slots(
    matches: &[Match],
    default_minutes: u32,
    query: &SlotQuery,
) -> EngineResult<Vec<CourtSlots>> {
    if query.duration == 0 {
        return Err(EngineError::invalid_request("slot duration must be positive"));
    }
    if query.day_start >= query.day_end {
        return Err(EngineError::invalid_request("day start must be before day end"));
    }
    let index = ConflictIndex::from_matches(matches, default_minutes);
    let duration = minutes(query.duration);
    let gap = minutes(query.break_duration);
    let date = query.date;
    let close = date.and_time(query.day_end);

    Ok(query
        .courts
        .iter()
        .map(|court| {
            let mut busy: Vec<(NaiveDateTime, NaiveDateTime)> = index
                .on(date, court)
                .iter()
                .map(|c| (c.start, c.end))
                .collect();
            busy.sort();

            let mut slots = Vec::new();
            let mut cursor = date.and_time(query.day_start);
            for (s, e) in busy {
                let gap_end = (s - gap).min(close);
                if gap_end - cursor >= duration {
                    slots.push(TimeSlot {
                        start: cursor,
                        end: gap_end,
                    });
                }
                cursor = cursor.max(e + gap);
            }
            if close - cursor >= duration {
                slots.push(TimeSlot {
                    start: cursor,
                    end: close,
                });
            }
            CourtSlots {
                court: court.clone(),
                slots,
            }
        })
        .collect())
}

/// Day sheet: every match starting on `date`, grouped by court in start order.
pub fn court_schedule(matches: &[Match], default_minutes: u32, date: NaiveDate) -> CourtSchedule {
    let mut courts: BTreeMap<CourtId, Vec<CourtEntry>> = BTreeMap::new();
    for m in matches {
        let (Some(court), Some((start, end))) = (m.court(), m.interval(default_minutes)) else {
            continue;
        };
        if start.date() != date {
            continue;
        }
        courts.entry(court.to_string()).or_default().push(CourtEntry {
            match_id: m.id,
            number: m.number,
            round: m.round,
            start,
            end,
        });
    }
    for entries in courts.values_mut() {
        entries.sort_by_key(|e| (e.start, e.number));
    }
    CourtSchedule { date, courts }
}
