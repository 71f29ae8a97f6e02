//! REST API over the engine. Handlers only parse, call the store, and map errors.

use crate::config::ServerConfig;
use crate::error::{EngineError, EngineResult};
use crate::logic::{self, ResetMode, SeedingPolicy, SlotQuery};
use crate::models::{
    CourtId, Level, MatchId, ScheduleRequest, SexCategory, Slot, Team, Tournament,
    TournamentFormat, TournamentId, TournamentSettings,
};
use crate::roster::read_teams_csv;
use crate::store::TournamentStore;
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    HttpResponse, Responder,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

type AppState = Data<TournamentStore>;
type AppConfig = Data<ServerConfig>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    year: i32,
    #[serde(default)]
    format: TournamentFormat,
    #[serde(default)]
    level: Level,
    #[serde(default)]
    sex: SexCategory,
    #[serde(default)]
    settings: Option<TournamentSettings>,
}

#[derive(Deserialize)]
struct BracketBody {
    #[serde(default)]
    format: Option<TournamentFormat>,
    #[serde(default)]
    seeding: SeedingPolicy,
}

#[derive(Deserialize)]
struct RecreateBracketBody {
    #[serde(default)]
    format: Option<TournamentFormat>,
    #[serde(default)]
    seeding: SeedingPolicy,
    #[serde(default)]
    confirm: bool,
}

#[derive(Deserialize)]
struct ScheduleMatchBody {
    time: NaiveDateTime,
    court: CourtId,
}

#[derive(Deserialize)]
struct ResultBody {
    score1: u32,
    score2: u32,
}

#[derive(Deserialize)]
struct WalkoverBody {
    winner: Slot,
}

#[derive(Deserialize)]
struct ResetBody {
    mode: ResetMode,
}

#[derive(Serialize)]
struct RosterResponse {
    imported: usize,
    roster_size: usize,
}

/// Query string for free slots; `courts` is comma separated and defaults to courts already in use.
#[derive(Deserialize)]
struct SlotsParams {
    date: NaiveDate,
    day_start: NaiveTime,
    day_end: NaiveTime,
    #[serde(default)]
    courts: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    break_duration: Option<u32>,
}

#[derive(Deserialize)]
struct DateParams {
    date: NaiveDate,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and round (e.g. /api/tournaments/{id}/rounds/{round})
#[derive(Deserialize)]
struct RoundPath {
    id: TournamentId,
    round: u32,
}

/// Path segment: match id (e.g. /api/matches/{match_id})
#[derive(Deserialize)]
struct MatchPath {
    match_id: MatchId,
}

fn error_response(e: &EngineError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        e if e.is_not_found() => HttpResponse::NotFound().json(body),
        EngineError::InvalidTransition(_) => HttpResponse::Conflict().json(body),
        EngineError::InsufficientTeams { .. }
        | EngineError::SchedulingWindowExhausted { .. }
        | EngineError::ConflictDetected { .. } => HttpResponse::UnprocessableEntity().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn respond<T: Serialize>(result: EngineResult<T>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => {
            log::debug!("Request failed: {e}");
            error_response(&e)
        }
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-engine",
    })
}

/// Create a tournament in Draft (returns it with id).
#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    config: AppConfig,
    body: Json<CreateTournamentBody>,
) -> HttpResponse {
    let body = body.into_inner();
    if body.name.trim().is_empty() {
        return error_response(&EngineError::invalid_request("tournament name is required"));
    }
    let mut tournament = Tournament::new(body.name.trim(), body.year);
    tournament.format = body.format;
    tournament.level = body.level;
    tournament.sex = body.sex;
    tournament.settings = body.settings.unwrap_or(config.settings);
    let id = state.insert(tournament);
    log::info!("Created tournament {id}");
    respond(state.snapshot(id))
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.snapshot(path.id))
}

/// Draft -> Open.
#[post("/api/tournaments/{id}/open")]
async fn api_open_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.update(path.id, |t| {
        t.open()?;
        Ok(t.clone())
    }))
}

#[post("/api/tournaments/{id}/cancel")]
async fn api_cancel_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.update(path.id, |t| {
        t.cancel()?;
        Ok(t.clone())
    }))
}

/// Add or replace roster teams (JSON array).
#[post("/api/teams")]
async fn api_add_teams(state: AppState, body: Json<Vec<Team>>) -> HttpResponse {
    let teams = body.into_inner();
    let imported = teams.len();
    let roster_size = state.upsert_teams(teams);
    HttpResponse::Ok().json(RosterResponse {
        imported,
        roster_size,
    })
}

/// Import roster teams from CSV text.
#[post("/api/teams/import")]
async fn api_import_teams(state: AppState, body: String) -> HttpResponse {
    match read_teams_csv(body.as_bytes()) {
        Ok(teams) => {
            let imported = teams.len();
            let roster_size = state.upsert_teams(teams);
            HttpResponse::Ok().json(RosterResponse {
                imported,
                roster_size,
            })
        }
        Err(e) => error_response(&e),
    }
}

#[get("/api/teams")]
async fn api_list_teams(state: AppState) -> HttpResponse {
    HttpResponse::Ok().json(state.roster())
}

/// Per-team eligibility decisions for the tournament's division.
#[get("/api/tournaments/{id}/eligibility")]
async fn api_eligibility(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.eligibility(path.id))
}

/// Build the bracket from eligible teams (fails with 422 below 2 teams).
#[post("/api/tournaments/{id}/bracket")]
async fn api_create_bracket(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<BracketBody>,
) -> HttpResponse {
    let format = match body.format {
        Some(f) => f,
        None => match state.read(path.id, |t| t.format) {
            Ok(f) => f,
            Err(e) => return error_response(&e),
        },
    };
    respond(state.create_bracket(path.id, format, body.seeding))
}

/// Discard and rebuild the bracket. Requires `confirm: true`.
#[post("/api/tournaments/{id}/bracket/recreate")]
async fn api_recreate_bracket(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<RecreateBracketBody>,
) -> HttpResponse {
    let format = match body.format {
        Some(f) => f,
        None => match state.read(path.id, |t| t.format) {
            Ok(f) => f,
            Err(e) => return error_response(&e),
        },
    };
    respond(state.recreate_bracket(path.id, format, body.seeding, body.confirm))
}

#[get("/api/tournaments/{id}/rounds/{round}")]
async fn api_round_summary(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    respond(state.round_summary(path.id, path.round))
}

#[post("/api/tournaments/{id}/rounds/{round}/advance")]
async fn api_advance_round(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    let round = path.round;
    respond(state.update(path.id, |t| logic::advance_round(t, round)))
}

/// Batch schedule generation. Unplaced matches are reported, not an error.
#[post("/api/tournaments/{id}/schedule/generate")]
async fn api_generate_schedule(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<ScheduleRequest>,
) -> HttpResponse {
    respond(state.generate_schedule(path.id, &body))
}

#[get("/api/tournaments/{id}/schedule/conflicts")]
async fn api_conflicts(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.read(path.id, |t| {
        logic::detect_all(&t.matches, t.settings.match_duration)
    }))
}

#[get("/api/tournaments/{id}/schedule/slots")]
async fn api_available_slots(
    state: AppState,
    path: Path<TournamentPath>,
    params: Query<SlotsParams>,
) -> HttpResponse {
    let params = params.into_inner();
    let slots = state.read(path.id, |t| {
        let courts = match &params.courts {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            None => logic::known_courts(&t.matches),
        };
        let query = SlotQuery {
            date: params.date,
            day_start: params.day_start,
            day_end: params.day_end,
            courts,
            duration: params.duration.unwrap_or(t.settings.match_duration),
            break_duration: params.break_duration.unwrap_or(t.settings.break_duration),
        };
        logic::available_slots(&t.matches, t.settings.match_duration, &query)
    });
    respond(slots.and_then(|slots| slots))
}

#[get("/api/tournaments/{id}/schedule/courts")]
async fn api_court_schedule(
    state: AppState,
    path: Path<TournamentPath>,
    params: Query<DateParams>,
) -> HttpResponse {
    let date = params.date;
    respond(state.read(path.id, |t| {
        logic::court_schedule(&t.matches, t.settings.match_duration, date)
    }))
}

#[get("/api/tournaments/{id}/reset")]
async fn api_can_reset(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.can_reset(path.id))
}

#[post("/api/tournaments/{id}/reset")]
async fn api_reset(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<ResetBody>,
) -> HttpResponse {
    respond(state.reset_schedule(path.id, body.mode))
}

/// Manual placement. Conflicts come back alongside the saved match.
#[put("/api/matches/{match_id}/schedule")]
async fn api_schedule_match(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<ScheduleMatchBody>,
) -> HttpResponse {
    let body = body.into_inner();
    respond(state.schedule_match(path.match_id, body.time, body.court))
}

#[delete("/api/matches/{match_id}/schedule")]
async fn api_remove_schedule(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.remove_schedule(path.match_id))
}

#[post("/api/matches/{match_id}/start")]
async fn api_start_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let id = path.match_id;
    respond(state.update_match(id, |t| logic::start_match(t, id)))
}

#[put("/api/matches/{match_id}/result")]
async fn api_record_result(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<ResultBody>,
) -> HttpResponse {
    let id = path.match_id;
    respond(state.update_match(id, |t| logic::record_result(t, id, body.score1, body.score2)))
}

#[post("/api/matches/{match_id}/walkover")]
async fn api_record_walkover(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<WalkoverBody>,
) -> HttpResponse {
    let id = path.match_id;
    respond(state.update_match(id, |t| logic::record_walkover(t, id, body.winner)))
}

#[post("/api/matches/{match_id}/cancel")]
async fn api_cancel_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let id = path.match_id;
    respond(state.update_match(id, |t| logic::cancel_match(t, id)))
}

/// Register every API service on an app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_create_tournament)
        .service(api_get_tournament)
        .service(api_open_tournament)
        .service(api_cancel_tournament)
        .service(api_add_teams)
        .service(api_import_teams)
        .service(api_list_teams)
        .service(api_eligibility)
        .service(api_create_bracket)
        .service(api_recreate_bracket)
        .service(api_round_summary)
        .service(api_advance_round)
        .service(api_generate_schedule)
        .service(api_conflicts)
        .service(api_available_slots)
        .service(api_court_schedule)
        .service(api_can_reset)
        .service(api_reset)
        .service(api_schedule_match)
        .service(api_remove_schedule)
        .service(api_start_match)
        .service(api_record_result)
        .service(api_record_walkover)
        .service(api_cancel_match);
}
