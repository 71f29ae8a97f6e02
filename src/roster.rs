//! Roster input from the registration system: CSV import and division filtering.
//!
//! The CSV carries one row per registration. Rows sharing a `team_id` (or, when
//! that column is empty, a team name) are merged into one team.

use crate::error::EngineResult;
use crate::models::{
    Level, PaymentStatus, Registration, SexCategory, Team, Tournament, TournamentContext,
};
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

/// Anything that can list the teams registered with the external system.
pub trait RosterSource {
    /// Teams to consider for a tournament. Payment is not checked here.
    fn teams(&self, context: &TournamentContext) -> Vec<Team>;
}

impl RosterSource for [Team] {
    fn teams(&self, _context: &TournamentContext) -> Vec<Team> {
        self.to_vec()
    }
}

impl RosterSource for Vec<Team> {
    fn teams(&self, context: &TournamentContext) -> Vec<Team> {
        self.as_slice().teams(context)
    }
}

/// Team plays in the tournament's level and sex category (mixed tournaments take everyone).
pub fn in_division(team: &Team, tournament: &Tournament) -> bool {
    team.level == tournament.level
        && (tournament.sex == SexCategory::Mixed || team.sex == tournament.sex)
}

/// Roster teams for a tournament: division match only; eligibility is decided later.
pub fn division_roster(source: &dyn RosterSource, tournament: &Tournament) -> Vec<Team> {
    let mut teams = source.teams(&tournament.context());
    teams.retain(|t| in_division(t, tournament));
    log::debug!(
        "{} roster team(s) in division for tournament {}",
        teams.len(),
        tournament.id
    );
    teams
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    team_id: Option<Uuid>,
    name: String,
    #[serde(default)]
    grade: String,
    #[serde(default)]
    sex: String,
    #[serde(default)]
    level: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    rank: Option<u32>,
    #[serde(default)]
    tournament: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    year: Option<i32>,
    #[serde(default)]
    payment_status: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    payment_complete: Option<bool>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount_paid: Option<f64>,
    /// Legacy root-level flag.
    #[serde(default, deserialize_with = "csv::invalid_option")]
    team_payment_complete: Option<bool>,
    /// Legacy root-level status.
    #[serde(default)]
    team_payment_status: String,
}

fn parse_level(raw: &str) -> Level {
    match raw.trim().to_ascii_lowercase().as_str() {
        "silver" => Level::Silver,
        _ => Level::Gold,
    }
}

fn parse_sex(raw: &str) -> SexCategory {
    match raw.trim().to_ascii_lowercase().as_str() {
        "boys" | "boy" | "male" | "m" => SexCategory::Boys,
        "girls" | "girl" | "female" | "f" => SexCategory::Girls,
        _ => SexCategory::Mixed,
    }
}

impl RosterRow {
    fn key(&self) -> String {
        match self.team_id {
            Some(id) => id.to_string(),
            None => self.name.trim().to_lowercase(),
        }
    }

    fn registration(&self) -> Option<Registration> {
        let year = self.year?;
        if self.tournament.trim().is_empty() {
            return None;
        }
        Some(Registration {
            tournament_name: self.tournament.trim().to_string(),
            year,
            payment_status: PaymentStatus::parse(&self.payment_status),
            payment_complete: self.payment_complete.unwrap_or(false),
            amount_paid: self.amount_paid.unwrap_or(0.0),
        })
    }

    fn into_team(self) -> Team {
        let mut team = Team::new(self.name.trim());
        // Rows without an id get one derived from the name, so re-imports replace.
        team.id = self
            .team_id
            .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, self.key().as_bytes()));
        team.grade = self.grade.trim().to_string();
        team.sex = parse_sex(&self.sex);
        team.level = parse_level(&self.level);
        team.rank = self.rank;
        team.payment_complete = self.team_payment_complete.unwrap_or(false);
        if !self.team_payment_status.trim().is_empty() {
            team.payment_status = Some(PaymentStatus::parse(&self.team_payment_status));
        }
        team.registrations.extend(self.registration());
        team
    }
}

/// Read teams from CSV (with header). Rows for the same team are merged in file order.
pub fn read_teams_csv<R: Read>(reader: R) -> EngineResult<Vec<Team>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut keys: Vec<String> = Vec::new();
    let mut teams: Vec<Team> = Vec::new();
    for row in rdr.deserialize::<RosterRow>() {
        let row = row?;
        let key = row.key();
        match keys.iter().position(|k| *k == key) {
            Some(i) => teams[i].registrations.extend(row.registration()),
            None => {
                keys.push(key);
                teams.push(row.into_team());
            }
        }
    }
    log::info!("Imported {} team(s) from roster CSV", teams.len());
    Ok(teams)
}
