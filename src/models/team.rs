//! Team, Registration, and EligibleTeam data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team (used in matches and lookups).
pub type TeamId = Uuid;

/// Competition level a team (or tournament) plays at.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[default]
    Gold,
    Silver,
}

/// Sex category of a team (or tournament).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SexCategory {
    Boys,
    Girls,
    #[default]
    Mixed,
}

/// Payment state as reported by the registration system.
///
/// Unknown strings deserialize to `Other` so a new status upstream never breaks an import.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Completed,
    Refunded,
    Failed,
    #[serde(other)]
    Other,
}

impl PaymentStatus {
    /// `paid` and `completed` both count as money received.
    pub fn indicates_payment(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Completed)
    }

    /// Parse a loosely formatted status (trimmed, case-insensitive).
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "pending" => PaymentStatus::Pending,
            "paid" => PaymentStatus::Paid,
            "completed" | "complete" => PaymentStatus::Completed,
            "refunded" => PaymentStatus::Refunded,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Other,
        }
    }
}

/// A team's registration for one tournament (name + year).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub tournament_name: String,
    pub year: i32,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_complete: bool,
    #[serde(default)]
    pub amount_paid: f64,
}

impl Registration {
    pub fn new(tournament_name: impl Into<String>, year: i32) -> Self {
        Self {
            tournament_name: tournament_name.into(),
            year,
            ..Self::default()
        }
    }

    /// True if this record is for the given tournament (name compared trimmed, case-insensitive).
    pub fn is_for(&self, tournament_name: &str, year: i32) -> bool {
        self.year == year
            && self
                .tournament_name
                .trim()
                .eq_ignore_ascii_case(tournament_name.trim())
    }

    /// Any of the three payment signals on this record.
    pub fn shows_payment(&self) -> bool {
        self.payment_complete || self.payment_status.indicates_payment() || self.amount_paid > 0.0
    }
}

/// A team as delivered by the registration system. The engine only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub sex: SexCategory,
    #[serde(default)]
    pub level: Level,
    /// Seeding rank (1 = strongest). Unranked teams seed after ranked ones.
    #[serde(default)]
    pub rank: Option<u32>,
    /// Legacy root-level payment flag, predating per-tournament registrations.
    #[serde(default)]
    pub payment_complete: bool,
    /// Legacy root-level payment status.
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub registrations: Vec<Registration>,
}

impl Team {
    /// Create a new team with the given name. Other fields start empty/default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            grade: String::new(),
            sex: SexCategory::default(),
            level: Level::default(),
            rank: None,
            payment_complete: false,
            payment_status: None,
            registrations: Vec::new(),
        }
    }

    /// Builder-style helper: attach a registration record.
    pub fn with_registration(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Builder-style helper: set the seeding rank.
    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    /// The registration record for one tournament, if the team has one.
    pub fn registration_for(&self, tournament_name: &str, year: i32) -> Option<&Registration> {
        self.registrations
            .iter()
            .find(|r| r.is_for(tournament_name, year))
    }

    /// Legacy root-level fields indicate payment.
    pub fn root_shows_payment(&self) -> bool {
        self.payment_complete
            || self
                .payment_status
                .as_ref()
                .is_some_and(PaymentStatus::indicates_payment)
    }
}

/// Why a team was admitted to (or kept out of) a tournament.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityReason {
    /// The registration for this tournament shows payment.
    TournamentRegistrationPaid,
    /// Legacy root-level payment fields show payment.
    LegacyRootPayment,
    /// No tournament given; some registration on the team shows payment.
    AnyRegistrationPaid,
    /// Registered for this tournament, but nothing shows payment.
    RegistrationUnpaid,
    /// Not registered for this tournament and no legacy payment.
    NoRegistration,
    /// No tournament given and nothing anywhere shows payment.
    NoPaymentRecorded,
}

impl EligibilityReason {
    pub fn is_eligible(self) -> bool {
        matches!(
            self,
            EligibilityReason::TournamentRegistrationPaid
                | EligibilityReason::LegacyRootPayment
                | EligibilityReason::AnyRegistrationPaid
        )
    }
}

/// A team known to satisfy the payment predicate at computation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EligibleTeam {
    pub team: Team,
    pub reason: EligibilityReason,
}

impl EligibleTeam {
    pub fn id(&self) -> TeamId {
        self.team.id
    }

    pub fn name(&self) -> &str {
        &self.team.name
    }
}
