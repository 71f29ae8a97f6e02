//! Data structures for the engine: teams, matches, tournaments, schedule views.

mod game;
mod schedule;
mod team;
mod tournament;

pub use game::{CourtId, Match, MatchId, MatchStatus, Placement, Slot};
pub use schedule::{
    Court, CourtEntry, CourtSchedule, CourtSlots, ScheduleConflict, ScheduleRequest,
    ScheduleStrategy, SchedulingWindow, TimeSlot,
};
pub use team::{
    EligibilityReason, EligibleTeam, Level, PaymentStatus, Registration, SexCategory, Team, TeamId,
};
pub use tournament::{
    Participant, Tournament, TournamentContext, TournamentFormat, TournamentId, TournamentSettings,
    TournamentStatus,
};
