//! Integration tests for eligibility: payment precedence and filtering.

use proptest::prelude::*;
use tournament_engine::logic::{check_eligibility, eligibility_reason, eligibility_report};
use tournament_engine::models::{PaymentStatus, Registration};
use tournament_engine::{
    filter_eligible, is_eligible, EligibilityReason, EngineError, Team, TournamentContext,
};

fn ctx() -> TournamentContext {
    TournamentContext::new("Spring Cup", 2025)
}

fn paid_registration(name: &str, year: i32) -> Registration {
    Registration {
        payment_complete: true,
        ..Registration::new(name, year)
    }
}

fn paid_team(name: &str) -> Team {
    Team::new(name).with_registration(paid_registration("Spring Cup", 2025))
}

#[test]
fn tournament_registration_paid_is_eligible() {
    let team = paid_team("Aces");
    assert_eq!(
        eligibility_reason(&team, Some(&ctx())),
        EligibilityReason::TournamentRegistrationPaid
    );
}

#[test]
fn any_payment_signal_on_the_registration_counts() {
    let by_status = Team::new("A").with_registration(Registration {
        payment_status: PaymentStatus::Completed,
        ..Registration::new("Spring Cup", 2025)
    });
    let by_amount = Team::new("B").with_registration(Registration {
        amount_paid: 25.0,
        ..Registration::new("Spring Cup", 2025)
    });
    assert!(is_eligible(&by_status, Some(&ctx())));
    assert!(is_eligible(&by_amount, Some(&ctx())));
}

#[test]
fn registration_name_matches_trimmed_and_case_insensitive() {
    let team = Team::new("Aces").with_registration(paid_registration("  spring CUP ", 2025));
    assert!(is_eligible(&team, Some(&ctx())));
    let wrong_year = Team::new("Aces").with_registration(paid_registration("Spring Cup", 2024));
    assert!(!is_eligible(&wrong_year, Some(&ctx())));
}

#[test]
fn unpaid_registration_falls_back_to_legacy_root_fields() {
    let mut team = Team::new("Legacy").with_registration(Registration::new("Spring Cup", 2025));
    assert_eq!(
        eligibility_reason(&team, Some(&ctx())),
        EligibilityReason::RegistrationUnpaid
    );
    team.payment_status = Some(PaymentStatus::Paid);
    assert_eq!(
        eligibility_reason(&team, Some(&ctx())),
        EligibilityReason::LegacyRootPayment
    );
}

#[test]
fn other_tournament_payment_only_counts_without_context() {
    let team = Team::new("Elsewhere").with_registration(paid_registration("Fall Classic", 2025));
    assert_eq!(
        eligibility_reason(&team, Some(&ctx())),
        EligibilityReason::NoRegistration
    );
    assert_eq!(
        eligibility_reason(&team, None),
        EligibilityReason::AnyRegistrationPaid
    );
}

#[test]
fn nothing_paid_without_context_reports_no_payment() {
    let team = Team::new("Nobody").with_registration(Registration::new("Spring Cup", 2025));
    let decision = check_eligibility(&team, None);
    assert!(!decision.eligible);
    assert_eq!(decision.reason, EligibilityReason::NoPaymentRecorded);
}

#[test]
fn refunded_or_failed_status_is_not_payment() {
    for status in [PaymentStatus::Refunded, PaymentStatus::Failed, PaymentStatus::Other] {
        let team = Team::new("X").with_registration(Registration {
            payment_status: status,
            ..Registration::new("Spring Cup", 2025)
        });
        assert!(!is_eligible(&team, Some(&ctx())));
    }
}

#[test]
fn filter_requires_two_eligible_teams() {
    let teams = vec![paid_team("Aces"), Team::new("Unpaid")];
    assert!(matches!(
        filter_eligible(&teams, Some(&ctx())),
        Err(EngineError::InsufficientTeams { eligible: 1 })
    ));
}

#[test]
fn filter_keeps_input_order_and_reasons() {
    let mut legacy = Team::new("Legacy");
    legacy.payment_complete = true;
    let teams = vec![paid_team("Aces"), Team::new("Unpaid"), legacy];
    let eligible = filter_eligible(&teams, Some(&ctx())).unwrap();
    let names: Vec<&str> = eligible.iter().map(|t| t.name()).collect();
    assert_eq!(names, ["Aces", "Legacy"]);
    assert_eq!(eligible[1].reason, EligibilityReason::LegacyRootPayment);
}

#[test]
fn report_includes_rejected_teams() {
    let teams = vec![paid_team("Aces"), Team::new("Unpaid")];
    let report = eligibility_report(&teams, Some(&ctx()));
    assert_eq!(report.len(), 2);
    assert!(report[0].eligible);
    assert_eq!(report[1].reason, EligibilityReason::NoRegistration);
}

fn team_strategy() -> impl Strategy<Value = Team> {
    (
        any::<bool>(),
        any::<bool>(),
        prop::option::of(any::<bool>()),
        0u8..3,
    )
        .prop_map(|(reg_complete, root_complete, root_paid, which)| {
            let mut team = Team::new("T");
            team.payment_complete = root_complete;
            team.payment_status = root_paid.map(|paid| {
                if paid {
                    PaymentStatus::Paid
                } else {
                    PaymentStatus::Pending
                }
            });
            let name = match which {
                0 => "Spring Cup",
                1 => "Fall Classic",
                _ => return team,
            };
            team.with_registration(Registration {
                payment_complete: reg_complete,
                ..Registration::new(name, 2025)
            })
        })
}

proptest! {
    #[test]
    fn filtering_is_idempotent(teams in prop::collection::vec(team_strategy(), 0..12)) {
        let context = ctx();
        for scope in [Some(&context), None] {
            let once: Vec<Team> = teams
                .iter()
                .filter(|t| is_eligible(t, scope))
                .cloned()
                .collect();
            let twice: Vec<Team> = once
                .iter()
                .filter(|t| is_eligible(t, scope))
                .cloned()
                .collect();
            prop_assert_eq!(&once, &twice);

            if let Ok(first) = filter_eligible(&teams, scope) {
                let kept: Vec<Team> = first.iter().map(|e| e.team.clone()).collect();
                let second = filter_eligible(&kept, scope).unwrap();
                prop_assert_eq!(first, second);
            }
        }
    }
}
