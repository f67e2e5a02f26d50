use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::cards::cards_notation_upper;
use crate::concurrency::run_blocking;
use crate::error::EngineError;
use crate::rival::RivalStyle;
use crate::scoring::SummaryStats;
use crate::session::{NodeOutcome, NodeView, SessionConfig, SessionManager};

#[derive(Clone)]
struct AppState {
    sessions: Arc<SessionManager>,
}

impl AppState {
    fn new() -> Self {
        Self { sessions: Arc::new(SessionManager::new()) }
    }
}

#[derive(Debug, Deserialize)]
struct StartSessionRequest {
    hands: Option<u32>,
    mc_trials: Option<u32>,
    seed: Option<u64>,
    rival_style: Option<RivalStyle>,
}

#[derive(Debug, Deserialize)]
struct ChoiceRequest {
    choice_index: usize,
}

#[derive(Debug, Serialize)]
struct OptionPayload {
    key: String,
    label: String,
    ev: f64,
    why: String,
    ends_hand: bool,
    gto_freq: Option<f64>,
}

#[derive(Debug, Serialize)]
struct NodePayload {
    street: String,
    description: String,
    pot_bb: f64,
    effective_bb: f64,
    hero_cards: Vec<String>,
    board_cards: Vec<String>,
    actor: String,
    hand_no: u32,
    total_hands: u32,
}

#[derive(Debug, Serialize)]
struct SummaryPayload {
    hands: usize,
    decisions: usize,
    hits: f64,
    ev_lost: f64,
    score: f64,
}

impl From<SummaryStats> for SummaryPayload {
    fn from(stats: SummaryStats) -> Self {
        Self { hands: stats.hands, decisions: stats.decisions, hits: stats.hits, ev_lost: stats.ev_lost, score: stats.score }
    }
}

#[derive(Debug, Serialize)]
struct NodeResponse {
    done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    node: Option<NodePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<OptionPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SummaryPayload>,
}

#[derive(Debug, Serialize)]
struct ChoiceResponse {
    correct: bool,
    ev_loss: f64,
    resolution_note: Option<String>,
    ended: bool,
    next: NodeResponse,
}

#[derive(Debug, Serialize)]
struct SessionCreatedResponse {
    session_id: Uuid,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

enum ApiError {
    Engine(EngineError),
    /// The blocking task panicked or was cancelled before it could finish.
    TaskFailed(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Engine(EngineError::SessionNotFound) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Engine(EngineError::InvalidChoice(_)) | ApiError::Engine(EngineError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Engine(EngineError::InvalidDeal(_)) | ApiError::Engine(EngineError::InvalidBoard(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ApiError::TaskFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Engine(err) => write!(f, "{err}"),
            ApiError::TaskFailed(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

fn node_response(outcome: NodeOutcome) -> NodeResponse {
    match outcome {
        NodeOutcome::Done(summary) => NodeResponse { done: true, node: None, options: None, summary: Some(summary.into()) },
        NodeOutcome::Node(node) => {
            let options = node.options.iter().map(option_payload).collect();
            NodeResponse { done: false, node: Some(node_payload(&node)), options: Some(options), summary: None }
        }
    }
}

fn node_payload(node: &NodeView) -> NodePayload {
    NodePayload {
        street: node.street.as_str().to_string(),
        description: node.description.clone(),
        pot_bb: node.pot_bb,
        effective_bb: node.effective_bb,
        hero_cards: cards_notation_upper(&node.hero_cards),
        board_cards: cards_notation_upper(&node.board_cards),
        actor: node.actor.clone(),
        hand_no: node.hand_no,
        total_hands: node.total_hands,
    }
}

fn option_payload(opt: &crate::episode::Option) -> OptionPayload {
    OptionPayload { key: opt.key.clone(), label: opt.why.clone(), ev: opt.ev, why: opt.why.clone(), ends_hand: opt.ends_hand, gto_freq: opt.gto_freq }
}

pub async fn serve(addr: SocketAddr) -> Result<()> {
    let state = AppState::new();
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(start_session))
        .route("/sessions/:id", get(fetch_node))
        .route("/sessions/:id/choices", post(choose))
        .route("/sessions/:id/summary", get(fetch_summary))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        // `/api` is the canonical surface; `/api/v1` is kept as an alias so
        // clients pinned to a versioned path keep working.
        .nest("/api", session_routes())
        .nest("/api/v1", session_routes())
        .nest_service("/", ServeDir::new("public"))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn router() -> Router {
    build_router(AppState::new())
}

async fn health() -> &'static str {
    "ok"
}

/// An `HX-Request: true` header asks for an HTML fragment instead of JSON.
/// No templating engine lives in this crate, so recognizing the header is
/// as far as that negotiation goes — every response still degrades to JSON.
fn wants_html_fragment(headers: &HeaderMap) -> bool {
    headers.get("hx-request").and_then(|v| v.to_str().ok()).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

async fn start_session(State(state): State<AppState>, Json(req): Json<StartSessionRequest>) -> Result<Json<SessionCreatedResponse>, ApiError> {
    let config = SessionConfig {
        hands: req.hands.unwrap_or(1),
        mc_trials: req.mc_trials.unwrap_or(200),
        rival_style: req.rival_style.unwrap_or(RivalStyle::Balanced),
        seed: req.seed,
    };
    let sessions = state.sessions.clone();
    let session_id = run_blocking(move || sessions.create_session(config)).await?;
    Ok(Json(SessionCreatedResponse { session_id }))
}

async fn fetch_node(State(state): State<AppState>, Path(id): Path<Uuid>, headers: HeaderMap) -> Result<Response, ApiError> {
    let _fragment_requested = wants_html_fragment(&headers);
    let sessions = state.sessions.clone();
    let outcome = run_blocking(move || sessions.get_node(id)).await??;
    Ok(([("vary", "HX-Request")], Json(node_response(outcome))).into_response())
}

async fn choose(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<ChoiceRequest>,
) -> Result<Response, ApiError> {
    let _fragment_requested = wants_html_fragment(&headers);
    let sessions = state.sessions.clone();
    let outcome = run_blocking(move || sessions.choose(id, req.choice_index)).await??;
    let body = ChoiceResponse {
        correct: outcome.correct,
        ev_loss: outcome.ev_loss,
        resolution_note: outcome.resolution_note,
        ended: outcome.hand_ended,
        next: node_response(outcome.next),
    };
    Ok(([("vary", "HX-Request")], Json(body)).into_response())
}

async fn fetch_summary(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SummaryPayload>, ApiError> {
    let sessions = state.sessions.clone();
    let summary = run_blocking(move || sessions.summary(id)).await??;
    Ok(Json(summary.into()))
}
