//! Engine logic: eligibility, brackets, conflicts, scheduling, resets.

pub mod bracket;
pub mod conflicts;
pub mod eligibility;
pub mod reset;
pub mod schedule;
pub mod seeding;

pub use bracket::{
    advance_round, bracket_sink, build_round_robin, build_single_elimination, cancel_match,
    create_bracket, recreate_bracket, record_result, record_walkover, round_summary, start_match,
    IncompleteMatch, RoundSummary, RoundWinner,
};
pub use conflicts::{detect_all, find_conflicts, Candidate, ConflictIndex};
pub use eligibility::{
    check_eligibility, eligibility_reason, eligibility_report, filter_eligible, is_eligible,
    EligibilityDecision, MIN_BRACKET_TEAMS,
};
pub use reset::{can_reset, reset_schedule, ResetAvailability, ResetCheck, ResetMode, ResetOutcome};
pub use schedule::{
    available_slots, court_schedule, generate_schedule, known_courts, plan_schedule,
    remove_schedule, schedule_match, Assignment, ScheduleMatchOutcome, ScheduleOutcome,
    SchedulePlan, SlotQuery,
};
pub use seeding::{RandomSeeding, RankedSeeding, Seeder, SeedingPolicy};
