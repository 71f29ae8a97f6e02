//! Tournament bracket and schedule engine: eligibility, brackets, court scheduling, resets.

pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod models;
pub mod roster;
pub mod store;

pub use config::ServerConfig;
pub use error::{EngineError, EngineResult};
pub use logic::{
    advance_round, available_slots, bracket_sink, can_reset, cancel_match, court_schedule,
    create_bracket, detect_all, eligibility_report, filter_eligible, find_conflicts,
    generate_schedule, is_eligible, plan_schedule, recreate_bracket, record_result,
    record_walkover, remove_schedule, reset_schedule, round_summary, schedule_match, start_match,
    ResetMode, SeedingPolicy,
};
pub use models::{
    Court, EligibilityReason, EligibleTeam, Match, MatchId, MatchStatus, ScheduleConflict,
    ScheduleRequest, ScheduleStrategy, SchedulingWindow, Team, Tournament, TournamentContext,
    TournamentFormat, TournamentId, TournamentStatus,
};
pub use roster::{read_teams_csv, RosterSource};
pub use store::TournamentStore;
