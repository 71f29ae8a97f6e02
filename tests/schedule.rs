//! Integration tests for court scheduling and conflict detection.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;
use std::collections::HashMap;
use tournament_engine::logic::{Candidate, RankedSeeding, SlotQuery};
use tournament_engine::models::{Placement, Registration, TimeSlot};
use tournament_engine::{
    available_slots, court_schedule, create_bracket, detect_all, find_conflicts,
    generate_schedule, plan_schedule, record_result, remove_schedule, schedule_match, Court,
    EngineError, Match, MatchStatus, ScheduleRequest, ScheduleStrategy, SchedulingWindow, Team,
    Tournament, TournamentFormat,
};
use uuid::Uuid;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    day(10).and_time(time(h, m))
}

fn window(days: u32, open: NaiveTime, close: NaiveTime) -> SchedulingWindow {
    SchedulingWindow {
        start_date: day(10),
        end_date: day(10 + days - 1),
        daily_start: open,
        daily_end: close,
    }
}

fn request(courts: &[&str], strategy: ScheduleStrategy, w: SchedulingWindow) -> ScheduleRequest {
    ScheduleRequest {
        window: w,
        courts: courts.iter().map(|c| Court::new(*c)).collect(),
        match_duration: 40,
        break_duration: 10,
        strategy,
    }
}

/// Independent matches (no bracket links), numbered from 1.
fn loose_matches(m: u32) -> Vec<Match> {
    (1..=m)
        .map(|n| Match::new(1, n, Some(Uuid::new_v4()), Some(Uuid::new_v4())))
        .collect()
}

fn tournament_with(matches: Vec<Match>) -> Tournament {
    let mut t = Tournament::new("Spring Cup", 2025);
    t.matches = matches;
    t
}

fn candidate(court: &str, start: NaiveDateTime, minutes: i64) -> Candidate {
    Candidate {
        match_id: Uuid::new_v4(),
        court: court.to_string(),
        start,
        end: start + chrono::Duration::minutes(minutes),
    }
}

fn per_court(matches: &[Match]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for m in matches {
        if let Some(court) = m.court() {
            *counts.entry(court.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[test]
fn identical_start_on_same_court_conflicts() {
    let a = candidate("A", at(9, 0), 40);
    let b = candidate("A", at(9, 0), 40);
    assert!(a.overlaps(&b));
}

#[test]
fn different_courts_never_conflict() {
    let a = candidate("A", at(9, 0), 40);
    let b = candidate("B", at(9, 0), 40);
    assert!(!a.overlaps(&b));
}

#[test]
fn touching_endpoints_do_not_conflict() {
    let a = candidate("A", at(9, 0), 40);
    let b = candidate("A", at(9, 40), 40);
    assert!(!a.overlaps(&b));
    assert!(!b.overlaps(&a));
}

#[test]
fn detect_all_reports_each_pair_once() {
    let mut t = tournament_with(loose_matches(3));
    let ids: Vec<_> = t.matches.iter().map(|m| m.id).collect();
    schedule_match(&mut t, ids[0], at(9, 0), "A".into()).unwrap();
    schedule_match(&mut t, ids[1], at(9, 20), "A".into()).unwrap();
    schedule_match(&mut t, ids[2], at(9, 20), "B".into()).unwrap();

    let conflicts = detect_all(&t.matches, t.settings.match_duration);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].court, "A");
    assert_eq!(conflicts[0].overlap_start, at(9, 20));
    assert_eq!(conflicts[0].overlap_end, at(9, 40));
}

#[test]
fn conflicts_across_midnight_are_found() {
    let late = candidate("A", day(10).and_time(time(23, 40)), 40);
    let mut existing = loose_matches(1);
    existing[0].placement = Some(Placement {
        court: "A".into(),
        start: day(11).and_time(time(0, 10)),
    });
    assert_eq!(find_conflicts(&late, &existing, 40).len(), 1);
}

#[test]
fn manual_placement_is_saved_even_with_conflicts() {
    let mut t = tournament_with(loose_matches(2));
    let ids: Vec<_> = t.matches.iter().map(|m| m.id).collect();
    let first = schedule_match(&mut t, ids[0], at(9, 0), "A".into()).unwrap();
    assert!(!first.has_conflicts());

    let second = schedule_match(&mut t, ids[1], at(9, 20), "A".into()).unwrap();
    assert_eq!(second.conflicts.len(), 1);
    assert_eq!(second.conflicts[0].conflicting_match_id, ids[0]);
    assert_eq!(second.game.scheduled_time(), Some(at(9, 20)));
    assert_eq!(t.get_match(ids[1]).unwrap().court(), Some("A"));
    assert_eq!(t.get_match(ids[1]).unwrap().status, MatchStatus::Scheduled);

    assert!(matches!(
        second.require_conflict_free(),
        Err(EngineError::ConflictDetected { count: 1, .. })
    ));
}

#[test]
fn rescheduling_a_match_ignores_its_own_old_slot() {
    let mut t = tournament_with(loose_matches(1));
    let id = t.matches[0].id;
    schedule_match(&mut t, id, at(9, 0), "A".into()).unwrap();
    let moved = schedule_match(&mut t, id, at(9, 10), "A".into()).unwrap();
    assert!(moved.conflicts.is_empty());
}

#[test]
fn finished_matches_cannot_be_moved() {
    let mut t = tournament_with(loose_matches(1));
    let id = t.matches[0].id;
    schedule_match(&mut t, id, at(9, 0), "A".into()).unwrap();
    record_result(&mut t, id, 3, 0).unwrap();
    assert!(matches!(
        schedule_match(&mut t, id, at(10, 0), "A".into()),
        Err(EngineError::InvalidTransition(_))
    ));
}

#[test]
fn remove_schedule_returns_match_to_unscheduled() {
    let mut t = tournament_with(loose_matches(1));
    let id = t.matches[0].id;
    schedule_match(&mut t, id, at(9, 0), "A".into()).unwrap();
    let m = remove_schedule(&mut t, id).unwrap();
    assert_eq!(m.placement, None);
    assert_eq!(m.status, MatchStatus::Unscheduled);
}

#[test]
fn parallel_two_courts_four_matches_in_one_day() {
    let mut t = tournament_with(loose_matches(4));
    let req = request(
        &["Court 1", "Court 2"],
        ScheduleStrategy::Parallel,
        window(1, time(9, 0), time(17, 0)),
    );
    let outcome = generate_schedule(&mut t, &req).unwrap();

    assert_eq!(outcome.scheduled.len(), 4);
    assert!(outcome.unplaced.is_empty());
    assert!(outcome.conflicts.is_empty());
    let counts = per_court(&t.matches);
    assert_eq!(counts.get("Court 1"), Some(&2));
    assert_eq!(counts.get("Court 2"), Some(&2));
    assert!(detect_all(&t.matches, 40).is_empty());

    let starts: Vec<_> = t.matches.iter().filter_map(|m| m.scheduled_time()).collect();
    assert_eq!(starts, [at(9, 0), at(9, 0), at(9, 50), at(9, 50)]);
    assert!(t.matches.iter().all(|m| m.status == MatchStatus::Scheduled));
}

#[test]
fn sequential_runs_one_match_at_a_time() {
    let mut t = tournament_with(loose_matches(3));
    let req = request(
        &["Court 1", "Court 2"],
        ScheduleStrategy::Sequential,
        window(1, time(9, 0), time(17, 0)),
    );
    generate_schedule(&mut t, &req).unwrap();
    let starts: Vec<_> = t.matches.iter().filter_map(|m| m.scheduled_time()).collect();
    assert_eq!(starts, [at(9, 0), at(9, 50), at(10, 40)]);
}

#[test]
fn balanced_spreads_matches_evenly() {
    let mut t = tournament_with(loose_matches(6));
    let req = request(
        &["A", "B", "C"],
        ScheduleStrategy::Balanced,
        window(1, time(9, 0), time(17, 0)),
    );
    // An earlier placement on A counts towards its load.
    let mut taken = loose_matches(1).remove(0);
    taken.number = 99;
    taken.placement = Some(Placement {
        court: "A".into(),
        start: at(15, 0),
    });
    taken.status = MatchStatus::Scheduled;
    t.matches.push(taken);

    let outcome = generate_schedule(&mut t, &req).unwrap();
    assert_eq!(outcome.scheduled.len(), 6);
    let counts = per_court(&t.matches);
    assert_eq!(counts.get("A"), Some(&3));
    assert_eq!(counts.get("B"), Some(&2));
    assert_eq!(counts.get("C"), Some(&2));
}

#[test]
fn window_rolls_over_and_reports_unplaced() {
    let mut t = tournament_with(loose_matches(3));
    let req = request(
        &["A"],
        ScheduleStrategy::Parallel,
        window(2, time(9, 0), time(10, 0)),
    );
    let outcome = generate_schedule(&mut t, &req).unwrap();

    assert_eq!(outcome.scheduled.len(), 2);
    assert_eq!(outcome.scheduled[0].scheduled_time(), Some(at(9, 0)));
    assert_eq!(
        outcome.scheduled[1].scheduled_time(),
        Some(day(11).and_time(time(9, 0)))
    );
    assert_eq!(outcome.unplaced, vec![t.matches[2].id]);
    assert_eq!(t.matches[2].placement, None);
    assert!(matches!(
        outcome.require_complete(),
        Err(EngineError::SchedulingWindowExhausted { unplaced: 1 })
    ));
}

#[test]
fn court_closing_time_limits_its_day() {
    let mut t = tournament_with(loose_matches(3));
    let mut req = request(
        &[],
        ScheduleStrategy::Parallel,
        window(1, time(9, 0), time(17, 0)),
    );
    req.courts = vec![Court::new("Early").closing_at(time(10, 0)), Court::new("Late")];
    generate_schedule(&mut t, &req).unwrap();

    let counts = per_court(&t.matches);
    assert_eq!(counts.get("Early"), Some(&1));
    assert_eq!(counts.get("Late"), Some(&2));
}

#[test]
fn closed_court_hands_its_turn_to_an_open_one_on_the_same_day() {
    let mut t = tournament_with(loose_matches(3));
    let mut req = request(
        &[],
        ScheduleStrategy::Parallel,
        window(2, time(9, 0), time(17, 0)),
    );
    req.courts = vec![Court::new("Early").closing_at(time(10, 0)), Court::new("Late")];
    let outcome = generate_schedule(&mut t, &req).unwrap();
    assert_eq!(outcome.scheduled.len(), 3);

    let third = t.match_by_number(3).unwrap();
    assert_eq!(third.court(), Some("Late"));
    assert_eq!(third.scheduled_time(), Some(at(9, 50)));
    assert!(t
        .matches
        .iter()
        .all(|m| m.scheduled_time().is_some_and(|s| s.date() == day(10))));
}

#[test]
fn bracket_matches_wait_for_their_feeders() {
    let teams: Vec<Team> = (1..=4)
        .map(|i| {
            Team::new(format!("T{i}")).with_registration(Registration {
                payment_complete: true,
                ..Registration::new("Spring Cup", 2025)
            })
        })
        .collect();
    let mut t = Tournament::new("Spring Cup", 2025);
    create_bracket(&mut t, TournamentFormat::SingleElimination, &teams, &mut RankedSeeding).unwrap();

    let req = request(
        &["A", "B"],
        ScheduleStrategy::Parallel,
        window(1, time(9, 0), time(17, 0)),
    );
    generate_schedule(&mut t, &req).unwrap();
    let final_start = t.match_by_number(3).unwrap().scheduled_time().unwrap();
    assert_eq!(final_start, at(9, 50));
}

#[test]
fn invalid_requests_are_refused() {
    let matches = loose_matches(2);
    let no_courts = request(&[], ScheduleStrategy::Parallel, window(1, time(9, 0), time(17, 0)));
    assert!(matches!(
        plan_schedule(&matches, &no_courts, 40),
        Err(EngineError::InvalidRequest(_))
    ));
    let backwards = request(&["A"], ScheduleStrategy::Parallel, window(1, time(17, 0), time(9, 0)));
    assert!(matches!(
        plan_schedule(&matches, &backwards, 40),
        Err(EngineError::InvalidRequest(_))
    ));
    let twice = request(&["A", "A"], ScheduleStrategy::Parallel, window(1, time(9, 0), time(17, 0)));
    assert!(plan_schedule(&matches, &twice, 40).is_err());
}

#[test]
fn available_slots_leave_room_for_breaks() {
    let mut t = tournament_with(loose_matches(1));
    let id = t.matches[0].id;
    schedule_match(&mut t, id, at(10, 0), "A".into()).unwrap();

    let query = SlotQuery {
        date: day(10),
        day_start: time(9, 0),
        day_end: time(12, 0),
        courts: vec!["A".into(), "B".into()],
        duration: 40,
        break_duration: 10,
    };
    let slots = available_slots(&t.matches, 40, &query).unwrap();
    assert_eq!(
        slots[0].slots,
        [
            TimeSlot { start: at(9, 0), end: at(9, 50) },
            TimeSlot { start: at(10, 50), end: at(12, 0) },
        ]
    );
    assert_eq!(slots[1].slots, [TimeSlot { start: at(9, 0), end: at(12, 0) }]);
}

#[test]
fn slot_queries_need_a_duration_and_an_open_day() {
    let t = tournament_with(loose_matches(1));
    let query = SlotQuery {
        date: day(10),
        day_start: time(9, 0),
        day_end: time(12, 0),
        courts: vec!["A".into()],
        duration: 0,
        break_duration: 10,
    };
    assert!(matches!(
        available_slots(&t.matches, 40, &query),
        Err(EngineError::InvalidRequest(_))
    ));

    let closed = SlotQuery {
        duration: 40,
        day_end: time(9, 0),
        ..query
    };
    assert!(matches!(
        available_slots(&t.matches, 40, &closed),
        Err(EngineError::InvalidRequest(_))
    ));
}

#[test]
fn placement_index_follows_moves_and_removals() {
    let mut t = tournament_with(loose_matches(2));
    let ids: Vec<_> = t.matches.iter().map(|m| m.id).collect();
    schedule_match(&mut t, ids[0], at(9, 0), "A".into()).unwrap();
    schedule_match(&mut t, ids[1], at(9, 0), "B".into()).unwrap();
    assert_eq!(t.placement_index().len(), 2);
    assert_eq!(t.placement_index().on(day(10), "A").len(), 1);

    schedule_match(&mut t, ids[0], day(11).and_time(time(9, 0)), "B".into()).unwrap();
    assert!(t.placement_index().on(day(10), "A").is_empty());
    assert_eq!(t.placement_index().on(day(11), "B").len(), 1);

    remove_schedule(&mut t, ids[1]).unwrap();
    assert_eq!(t.placement_index().len(), 1);
    assert!(t.placement_index().get(ids[1]).is_none());

    // The old slot is free again; the new one is taken.
    let free = schedule_match(&mut t, ids[1], at(9, 20), "B".into()).unwrap();
    assert!(free.conflicts.is_empty());
    let taken = schedule_match(&mut t, ids[1], day(11).and_time(time(9, 20)), "B".into()).unwrap();
    assert_eq!(taken.conflicts.len(), 1);
    assert_eq!(taken.conflicts[0].conflicting_match_id, ids[0]);
}

#[test]
fn one_shot_lookup_only_considers_the_candidate_court() {
    let mut existing = loose_matches(2);
    existing[0].placement = Some(Placement {
        court: "A".into(),
        start: at(9, 0),
    });
    existing[1].placement = Some(Placement {
        court: "B".into(),
        start: at(9, 0),
    });
    let on_a = candidate("A", at(9, 20), 40);
    let conflicts = find_conflicts(&on_a, &existing, 40);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].conflicting_match_id, existing[0].id);
}

#[test]
fn court_schedule_groups_by_court_in_start_order() {
    let mut t = tournament_with(loose_matches(3));
    let ids: Vec<_> = t.matches.iter().map(|m| m.id).collect();
    schedule_match(&mut t, ids[0], at(11, 0), "A".into()).unwrap();
    schedule_match(&mut t, ids[1], at(9, 0), "A".into()).unwrap();
    schedule_match(&mut t, ids[2], day(11).and_time(time(9, 0)), "B".into()).unwrap();

    let sheet = court_schedule(&t.matches, 40, day(10));
    assert_eq!(sheet.courts.len(), 1);
    let a = &sheet.courts["A"];
    assert_eq!(a[0].match_id, ids[1]);
    assert_eq!(a[1].match_id, ids[0]);
    assert_eq!(a[1].end, at(11, 40));
}

proptest! {
    #[test]
    fn sequential_span_is_matches_plus_breaks(
        m in 1u32..12,
        duration in 10u32..60,
        gap in 0u32..20,
        courts in 1usize..4,
    ) {
        let matches = loose_matches(m);
        let names: Vec<String> = (1..=courts).map(|k| format!("Court {k}")).collect();
        let req = ScheduleRequest {
            window: window(1, time(6, 0), time(23, 0)),
            courts: names.iter().map(|c| Court::new(c.as_str())).collect(),
            match_duration: duration,
            break_duration: gap,
            strategy: ScheduleStrategy::Sequential,
        };
        let plan = plan_schedule(&matches, &req, duration).unwrap();
        prop_assert!(plan.unplaced.is_empty());
        prop_assert!(plan.conflicts.is_empty());

        let first = plan.assignments.iter().map(|a| a.start).min().unwrap();
        let last = plan.assignments.iter().map(|a| a.end).max().unwrap();
        let span = (last - first).num_minutes();
        prop_assert_eq!(span, i64::from(m * duration + (m - 1) * gap));

        let mut intervals: Vec<_> = plan.assignments.iter().map(|a| (a.start, a.end)).collect();
        intervals.sort();
        for pair in intervals.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0);
        }
    }

    #[test]
    fn conflict_rules_hold_for_any_times(
        start in 0i64..600,
        len1 in 1i64..120,
        len2 in 1i64..120,
    ) {
        let base = at(6, 0) + chrono::Duration::minutes(start);
        let a = candidate("A", base, len1);
        let same = candidate("A", base, len2);
        let other = candidate("B", base, len2);
        let after = candidate("A", a.end, len2);
        prop_assert!(a.overlaps(&same));
        prop_assert!(!a.overlaps(&other));
        prop_assert!(!a.overlaps(&after));
    }
}
