//! Eligibility: which registered teams may play, based on payment state.
//!
//! Evidence is checked in a fixed order. Tournament-scoped registration first,
//! then the legacy root-level fields, then (only without a tournament) any
//! registration at all. The first rule that finds payment admits the team.

use crate::error::{EngineError, EngineResult};
use crate::models::{EligibilityReason, EligibleTeam, Team, TeamId, TournamentContext};
use serde::Serialize;

/// Fewest teams that make a bracket.
pub const MIN_BRACKET_TEAMS: usize = 2;

/// One source of payment evidence, in precedence order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PaymentEvidence {
    TournamentRegistration,
    LegacyRoot,
    AnyRegistration,
}

const PRECEDENCE: [PaymentEvidence; 3] = [
    PaymentEvidence::TournamentRegistration,
    PaymentEvidence::LegacyRoot,
    PaymentEvidence::AnyRegistration,
];

impl PaymentEvidence {
    /// Some(reason) if this rule admits the team.
    fn admits(self, team: &Team, context: Option<&TournamentContext>) -> Option<EligibilityReason> {
        let paid = match (self, context) {
            (PaymentEvidence::TournamentRegistration, Some(ctx)) => team
                .registration_for(&ctx.name, ctx.year)
                .is_some_and(|r| r.shows_payment()),
            (PaymentEvidence::TournamentRegistration, None) => false,
            (PaymentEvidence::LegacyRoot, _) => team.root_shows_payment(),
            (PaymentEvidence::AnyRegistration, None) => {
                team.registrations.iter().any(|r| r.shows_payment())
            }
            // Registrations for other tournaments never count once a tournament is named.
            (PaymentEvidence::AnyRegistration, Some(_)) => false,
        };
        paid.then_some(match self {
            PaymentEvidence::TournamentRegistration => EligibilityReason::TournamentRegistrationPaid,
            PaymentEvidence::LegacyRoot => EligibilityReason::LegacyRootPayment,
            PaymentEvidence::AnyRegistration => EligibilityReason::AnyRegistrationPaid,
        })
    }
}

/// Outcome of checking one team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EligibilityDecision {
    pub team_id: TeamId,
    pub team_name: String,
    pub eligible: bool,
    pub reason: EligibilityReason,
}

/// Reason a team is (or is not) eligible.
pub fn eligibility_reason(team: &Team, context: Option<&TournamentContext>) -> EligibilityReason {
    if let Some(reason) = PRECEDENCE.iter().find_map(|rule| rule.admits(team, context)) {
        return reason;
    }
    match context {
        Some(ctx) if team.registration_for(&ctx.name, ctx.year).is_some() => {
            EligibilityReason::RegistrationUnpaid
        }
        Some(_) => EligibilityReason::NoRegistration,
        None => EligibilityReason::NoPaymentRecorded,
    }
}

pub fn is_eligible(team: &Team, context: Option<&TournamentContext>) -> bool {
    eligibility_reason(team, context).is_eligible()
}

pub fn check_eligibility(team: &Team, context: Option<&TournamentContext>) -> EligibilityDecision {
    let reason = eligibility_reason(team, context);
    EligibilityDecision {
        team_id: team.id,
        team_name: team.name.clone(),
        eligible: reason.is_eligible(),
        reason,
    }
}

/// One decision per team, admitted and rejected alike.
pub fn eligibility_report(
    teams: &[Team],
    context: Option<&TournamentContext>,
) -> Vec<EligibilityDecision> {
    teams.iter().map(|t| check_eligibility(t, context)).collect()
}

/// Eligible teams, or `InsufficientTeams` when fewer than 2 qualify.
pub fn filter_eligible(
    teams: &[Team],
    context: Option<&TournamentContext>,
) -> EngineResult<Vec<EligibleTeam>> {
    let eligible: Vec<EligibleTeam> = teams
        .iter()
        .filter_map(|team| {
            let reason = eligibility_reason(team, context);
            reason.is_eligible().then(|| EligibleTeam {
                team: team.clone(),
                reason,
            })
        })
        .collect();
    log::debug!(
        "Eligibility: {} of {} team(s) eligible",
        eligible.len(),
        teams.len()
    );
    if eligible.len() < MIN_BRACKET_TEAMS {
        return Err(EngineError::InsufficientTeams {
            eligible: eligible.len(),
        });
    }
    Ok(eligible)
}
