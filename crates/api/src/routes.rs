use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use oddspulse_models::{FilterCriteria, Match, PulseError, SortDirection, SortKey};
use oddspulse_services::{
    DerivedView, DerivedViewEngine, FilterStore, HighlightLifecycle, MatchStore,
    OddsUpdateScheduler, SchedulerStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub match_store: Arc<MatchStore>,
    pub filter_store: Arc<FilterStore>,
    pub views: Arc<DerivedViewEngine>,
    pub scheduler: OddsUpdateScheduler,
    pub highlights: HighlightLifecycle,
    pub started_at: Instant,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        })
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub matches: Vec<Arc<Match>>,
    pub is_updating: bool,
    pub updating_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatusResponse {
    #[serde(flatten)]
    pub scheduler: SchedulerStatus,
    pub pending_highlights: usize,
    pub highlight_delay_ms: u64,
}

#[derive(Deserialize)]
pub struct TextFilterRequest {
    pub value: String,
}

#[derive(Deserialize)]
pub struct SortRequest {
    #[serde(default)]
    pub key: Option<SortKey>,
}

#[derive(Deserialize)]
pub struct SortDirectionRequest {
    pub direction: SortDirection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalRequest {
    pub interval_ms: u64,
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Board
        .route("/api/v1/matches", get(get_match_view))
        .route("/api/v1/matches/all", get(get_all_matches))
        .route("/api/v1/matches/updated", get(get_updated_matches))
        .route("/api/v1/matches/:match_id", get(get_match_by_id))
        // Filters
        .route("/api/v1/filters", get(get_filters).delete(clear_filters))
        .route("/api/v1/filters/team-search", put(set_team_search))
        .route("/api/v1/filters/date", put(set_date_filter))
        .route("/api/v1/filters/league", put(set_league_filter))
        .route("/api/v1/filters/sort", put(set_sort_by))
        .route("/api/v1/filters/sort-direction", put(set_sort_direction))
        // Simulation controls
        .route("/api/v1/simulation/status", get(get_simulation_status))
        .route("/api/v1/simulation/start", post(start_simulation))
        .route("/api/v1/simulation/stop", post(stop_simulation))
        .route("/api/v1/simulation/trigger", post(trigger_update))
        .route("/api/v1/simulation/interval", put(change_interval))
}

/// The full router with tracing and permissive CORS for the board frontend.
pub fn build_router(state: AppState) -> Router {
    create_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

// Filtered, sorted board plus the values for the filter dropdowns
async fn get_match_view(State(state): State<AppState>) -> Json<ApiResponse<DerivedView>> {
    let matches = state.match_store.snapshot();
    let criteria = state.filter_store.snapshot();
    ApiResponse::ok(state.views.view(&matches, &criteria))
}

async fn get_all_matches(State(state): State<AppState>) -> Json<ApiResponse<BoardResponse>> {
    let snapshot = state.match_store.snapshot();
    ApiResponse::ok(BoardResponse {
        matches: snapshot.matches().to_vec(),
        is_updating: snapshot.is_updating(),
        updating_count: snapshot.updating_count(),
    })
}

async fn get_updated_matches(State(state): State<AppState>) -> Json<ApiResponse<Vec<Arc<Match>>>> {
    let updated = state.match_store.snapshot().updated_matches();
    let count = updated.len();
    ApiResponse::with_message(updated, format!("{count} matches with fresh odds"))
}

async fn get_match_by_id(
    Path(match_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Arc<Match>>>, ApiError> {
    let fixture = state
        .match_store
        .match_by_id(&match_id)
        .ok_or(PulseError::MatchNotFound { match_id })?;
    Ok(ApiResponse::ok(fixture))
}

async fn get_filters(State(state): State<AppState>) -> Json<ApiResponse<Arc<FilterCriteria>>> {
    ApiResponse::ok(state.filter_store.snapshot())
}

async fn clear_filters(State(state): State<AppState>) -> Json<ApiResponse<Arc<FilterCriteria>>> {
    ApiResponse::with_message(state.filter_store.clear_all_filters(), "Filters cleared")
}

async fn set_team_search(
    State(state): State<AppState>,
    Json(request): Json<TextFilterRequest>,
) -> Json<ApiResponse<Arc<FilterCriteria>>> {
    ApiResponse::ok(state.filter_store.set_team_search(request.value))
}

async fn set_date_filter(
    State(state): State<AppState>,
    Json(request): Json<TextFilterRequest>,
) -> Json<ApiResponse<Arc<FilterCriteria>>> {
    ApiResponse::ok(state.filter_store.set_date_filter(request.value))
}

async fn set_league_filter(
    State(state): State<AppState>,
    Json(request): Json<TextFilterRequest>,
) -> Json<ApiResponse<Arc<FilterCriteria>>> {
    ApiResponse::ok(state.filter_store.set_league_filter(request.value))
}

async fn set_sort_by(
    State(state): State<AppState>,
    Json(request): Json<SortRequest>,
) -> Json<ApiResponse<Arc<FilterCriteria>>> {
    ApiResponse::ok(state.filter_store.set_sort_by(request.key))
}

async fn set_sort_direction(
    State(state): State<AppState>,
    Json(request): Json<SortDirectionRequest>,
) -> Json<ApiResponse<Arc<FilterCriteria>>> {
    ApiResponse::ok(state.filter_store.set_sort_direction(request.direction))
}

fn simulation_status(state: &AppState) -> SimulationStatusResponse {
    SimulationStatusResponse {
        scheduler: state.scheduler.status(),
        pending_highlights: state.highlights.pending_count(),
        highlight_delay_ms: u64::try_from(state.highlights.clear_delay().as_millis())
            .unwrap_or(u64::MAX),
    }
}

async fn get_simulation_status(
    State(state): State<AppState>,
) -> Json<ApiResponse<SimulationStatusResponse>> {
    ApiResponse::ok(simulation_status(&state))
}

async fn start_simulation(
    State(state): State<AppState>,
) -> Json<ApiResponse<SimulationStatusResponse>> {
    state.scheduler.start();
    ApiResponse::with_message(simulation_status(&state), "Odds pulse started")
}

async fn stop_simulation(
    State(state): State<AppState>,
) -> Json<ApiResponse<SimulationStatusResponse>> {
    state.scheduler.stop();
    ApiResponse::with_message(simulation_status(&state), "Odds pulse stopped")
}

async fn trigger_update(
    State(state): State<AppState>,
) -> Json<ApiResponse<SimulationStatusResponse>> {
    let message = if state.scheduler.trigger_update() {
        "Odds update triggered"
    } else if state.scheduler.is_running() {
        "Maximum updates reached"
    } else {
        "Odds pulse is not running"
    };
    ApiResponse::with_message(simulation_status(&state), message)
}

async fn change_interval(
    State(state): State<AppState>,
    Json(request): Json<IntervalRequest>,
) -> Result<Json<ApiResponse<SimulationStatusResponse>>, ApiError> {
    if request.interval_ms == 0 {
        return Err(PulseError::InvalidInterval { interval_ms: 0 }.into());
    }
    state
        .scheduler
        .change_interval(Duration::from_millis(request.interval_ms))?;
    Ok(ApiResponse::with_message(
        simulation_status(&state),
        format!("Update interval set to {}ms", request.interval_ms),
    ))
}
