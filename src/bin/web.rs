//! HTTP host for the draw engine: tournament records kept in memory, REST API on top.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 127.0.0.1), PORT (e.g. 8080).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use draw_progression::logic::{
    qualified_participants, random_qualifier_order, set_draw_position,
    tournament_qualifier_progression, LookupPath, MatchUpHints, MatchUpOutcome, PositionRequest,
    SetMatchUpStatusParams,
};
use draw_progression::models::{DrawId, DrawPosition, EventId, MatchUpId, ParticipantId, StructureId, TournamentId};
use draw_progression::{
    find_match_up, set_tournament_match_up_status, validate_draw, Context, Notice, PolicySet,
    ProgressionError, TournamentRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-tournament entry: record, its resolved policies, and last activity (for auto-cleanup).
struct TournamentEntry {
    record: TournamentRecord,
    policies: PolicySet,
    last_activity: Instant,
}

/// One lock around the whole store; every mutation of a draw runs under it.
type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;

/// Inactivity threshold: tournaments not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct OperationResponse<T: Serialize> {
    result: T,
    aborted_branches: Vec<&'static str>,
    notices: Vec<Notice>,
}

#[derive(Deserialize)]
struct StatusBody {
    draw_id: Option<DrawId>,
    #[serde(default)]
    outcome: MatchUpOutcome,
}

#[derive(Deserialize)]
struct PositionBody {
    structure_id: StructureId,
    draw_position: DrawPosition,
    request: PositionRequest,
}

#[derive(Deserialize)]
struct QualifierBody {
    target_round_number: u32,
    order: Option<Vec<ParticipantId>>,
    /// Shuffle qualifiers into placeholders when no order is given.
    #[serde(default)]
    random: bool,
}

#[derive(Deserialize)]
struct LookupQuery {
    tournament_id: Option<TournamentId>,
    event_id: Option<EventId>,
    draw_id: Option<DrawId>,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct MatchUpPath {
    match_up_id: MatchUpId,
}

#[derive(Deserialize)]
struct TournamentMatchUpPath {
    id: TournamentId,
    match_up_id: MatchUpId,
}

#[derive(Deserialize)]
struct TournamentDrawPath {
    id: TournamentId,
    draw_id: DrawId,
}

fn error_response(e: &ProgressionError) -> HttpResponse {
    log::info!("rejected: {}", e);
    let body = serde_json::json!({ "error": e.to_string(), "code": e.code() });
    if e.is_not_found() {
        HttpResponse::NotFound().json(body)
    } else {
        HttpResponse::BadRequest().json(body)
    }
}

fn no_tournament() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
}

fn log_notices(notices: &[Notice]) {
    for notice in notices {
        log::debug!("notice: {:?}", notice);
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "draw-progression",
    })
}

/// Register a tournament record (draws already synthesized). Every draw is validated first.
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<TournamentRecord>) -> HttpResponse {
    let record = body.into_inner();
    for draw in record.events.iter().flat_map(|e| e.draw_definitions.iter()) {
        if let Err(e) = validate_draw(draw) {
            return error_response(&e);
        }
    }
    let id = record.tournament_id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    log::info!("Registered tournament {} ({})", id, record.tournament_name);
    let response = HttpResponse::Ok().json(&record);
    g.insert(
        id,
        TournamentEntry {
            record,
            policies: PolicySet::default(),
            last_activity: Instant::now(),
        },
    );
    response
}

/// Get a tournament by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(&entry.record)
        }
        None => no_tournament(),
    }
}

/// Replace the tournament's resolved policies.
#[put("/api/tournaments/{id}/policies")]
async fn api_set_policies(state: AppState, path: Path<TournamentPath>, body: Json<PolicySet>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    entry.policies = body.into_inner();
    HttpResponse::Ok().json(&entry.policies)
}

/// Find a match-up in any stored tournament; optional owner hints skip the full scan.
#[get("/api/matchups/{match_up_id}")]
async fn api_find_match_up(state: AppState, path: Path<MatchUpPath>, query: Query<LookupQuery>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let hints = MatchUpHints {
        tournament_id: query.tournament_id,
        event_id: query.event_id,
        draw_id: query.draw_id,
    };
    match find_match_up(g.values().map(|e| &e.record), path.match_up_id, &hints) {
        Ok(found) => {
            if found.path == LookupPath::BruteForce {
                log::debug!("match-up {} found by full scan", path.match_up_id);
            }
            HttpResponse::Ok().json(serde_json::json!({
                "match_up": found.location.match_up,
                "structure_id": found.location.structure.structure_id,
                "tie_parent_id": found.location.tie_parent.map(|p| p.match_up_id),
                "tournament_id": found.tournament_id,
                "event_id": found.event_id,
                "draw_id": found.draw_id,
                "path": found.path,
            }))
        }
        Err(e) => error_response(&e),
    }
}

/// Record a match-up outcome and run progression.
#[put("/api/tournaments/{id}/matchups/{match_up_id}/status")]
async fn api_set_status(state: AppState, path: Path<TournamentMatchUpPath>, body: Json<StatusBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let body = body.into_inner();
    let params = SetMatchUpStatusParams {
        draw_id: body.draw_id,
        match_up_id: Some(path.match_up_id),
        outcome: body.outcome,
    };
    let mut notices: Vec<Notice> = Vec::new();
    let result = {
        let mut ctx = Context::new(&mut notices).with_policies(entry.policies.clone());
        set_tournament_match_up_status(Some(&mut entry.record), &params, &mut ctx)
    };
    log_notices(&notices);
    match result {
        Ok(change) => {
            log::info!(
                "match-up {} set to {}",
                path.match_up_id,
                change.match_up.match_up_status
            );
            HttpResponse::Ok().json(OperationResponse {
                aborted_branches: change.aborted_branches.iter().map(ProgressionError::code).collect(),
                result: change.match_up,
                notices,
            })
        }
        Err(e) => error_response(&e),
    }
}

/// Assign, bye, reserve for a qualifier, or clear one draw position.
#[put("/api/tournaments/{id}/draws/{draw_id}/positions")]
async fn api_set_position(state: AppState, path: Path<TournamentDrawPath>, body: Json<PositionBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let tournament_id = entry.record.tournament_id;
    let policies = entry.policies.clone();
    let (event_id, draw) = match entry.record.draw_mut(path.draw_id) {
        Some(found) => found,
        None => return error_response(&ProgressionError::DrawDefinitionNotFound(path.draw_id)),
    };
    let owner = draw_progression::notify::Owner {
        tournament_id: Some(tournament_id),
        event_id: Some(event_id),
        draw_id: Some(path.draw_id),
    };
    let mut notices: Vec<Notice> = Vec::new();
    let result = {
        let mut ctx = Context::new(&mut notices)
            .with_policies(policies)
            .with_owner(owner);
        set_draw_position(draw, body.structure_id, body.draw_position, body.request, &mut ctx)
    };
    log_notices(&notices);
    match result {
        Ok(change) => HttpResponse::Ok().json(OperationResponse {
            aborted_branches: change.aborted_branches.iter().map(ProgressionError::code).collect(),
            result: change.assignment,
            notices,
        }),
        Err(e) => error_response(&e),
    }
}

/// Move qualifiers into the main structure's placeholders at the given round.
#[post("/api/tournaments/{id}/draws/{draw_id}/qualifiers")]
async fn api_qualifiers(state: AppState, path: Path<TournamentDrawPath>, body: Json<QualifierBody>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return no_tournament(),
    };
    entry.last_activity = Instant::now();
    let body = body.into_inner();
    let order = match (body.order, body.random) {
        (Some(order), _) => Some(order),
        (None, true) => {
            let draw = entry
                .record
                .events
                .iter()
                .find_map(|e| e.draw(path.draw_id));
            match draw.map(|d| qualified_participants(d, body.target_round_number, &entry.policies)) {
                Some(Ok(candidates)) => Some(random_qualifier_order(&candidates, &mut rand::thread_rng())),
                Some(Err(e)) => return error_response(&e),
                None => None,
            }
        }
        (None, false) => None,
    };
    let mut notices: Vec<Notice> = Vec::new();
    let result = {
        let mut ctx = Context::new(&mut notices).with_policies(entry.policies.clone());
        tournament_qualifier_progression(
            Some(&mut entry.record),
            Some(path.draw_id),
            body.target_round_number,
            order.as_deref(),
            &mut ctx,
        )
    };
    log_notices(&notices);
    match result {
        Ok(progression) => {
            log::info!("{} qualifier(s) placed", progression.assignments.len());
            HttpResponse::Ok().json(OperationResponse {
                aborted_branches: progression.aborted_branches.iter().map(ProgressionError::code).collect(),
                result: progression.assignments,
                notices,
            })
        }
        Err(e) => error_response(&e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));

    // Background task: every 30 minutes, remove tournaments inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_set_policies)
            .service(api_find_match_up)
            .service(api_set_status)
            .service(api_set_position)
            .service(api_qualifiers)
    })
    .bind(bind)?
    .run()
    .await
}
