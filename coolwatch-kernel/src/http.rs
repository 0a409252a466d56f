/**
 * API REST COOLWATCH - Serveur HTTP principal du kernel
 *
 * RÔLE :
 * Ce module expose l'API REST de Coolwatch pour les consommateurs de
 * présentation (dashboard, CLI, scripts). Interface unique entre le
 * frontend et le moteur de simulation.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum sur port 8080 avec middleware auth API key
 * - Routes organisées : /health, /system, /racks, /alerts, /events,
 *   /energy, /trends, /simulation, /export
 * - Lecture seule = snapshots commités post-tick (lock court, clone)
 * - Gestion erreurs HTTP standardisée (404, 401, 500...)
 *
 * SÉCURITÉ :
 * - Header x-api-key obligatoire sur toutes routes sauf /health
 * - Validation côté middleware avant traitement métier
 */

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use coolwatch_engine::energy::cost_for;
use coolwatch_engine::{
    export, Alert, EngineError, EventLogEntry, EventStats, Rack, RackStats, SimConfig,
};

use crate::health::{HealthTracker, KernelHealth};
use crate::state::EngineHandle;

#[derive(Clone)]
pub struct AppState {
    pub handle: EngineHandle,
    pub health_tracker: HealthTracker,
}

#[derive(serde::Serialize)]
struct RackView {
    id: String,
    name: String,
    temperature: f64,
    humidity: f64,
    airflow_delta: f64,
    uptime: f64,
    status: &'static str,
    fan_speed: u8,
    power_watts: f64,
    last_alert: Option<String>, // format RFC3339 pour l'API
}

fn to_view(rack: &Rack) -> RackView {
    RackView {
        id: rack.id.clone(),
        name: rack.name.clone(),
        temperature: rack.temperature,
        humidity: rack.humidity,
        airflow_delta: rack.airflow_delta,
        uptime: rack.uptime,
        status: rack.status.as_str(),
        fan_speed: rack.fan_speed,
        power_watts: rack.power_watts,
        last_alert: rack.last_alert.map(rfc3339_ms),
    }
}

fn rfc3339_ms(timestamp_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(timestamp_ms) * 1_000_000)
        .ok()
        .and_then(|datetime| datetime.format(&Rfc3339).ok())
        .unwrap_or_default()
}

async fn require_api_key(req: Request, next: Next) -> Result<Response, StatusCode> {
    let path = req.uri().path();

    // Health check toujours accessible
    if path.starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let expected = std::env::var("COOLWATCH_API_KEY").unwrap_or_default();
    if expected.is_empty() {
        eprintln!("SECURITY: COOLWATCH_API_KEY not set - API access denied");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let ok = req.headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/racks", get(get_racks))
        .route("/racks/{id}", get(get_rack))
        .route("/alerts", get(get_alerts))
        .route("/alerts/{id}/dismiss", post(dismiss_alert))
        .route("/alerts/{id}/boost", post(boost_alert))
        .route("/events", get(get_events))
        .route("/events/stats", get(get_event_stats))
        .route("/energy", get(get_energy))
        .route("/trends/climate", get(get_trends_climate))
        .route("/trends/energy", get(get_trends_energy))
        .route("/trends/efficiency", get(get_trends_efficiency))
        .route("/simulation", get(get_simulation))
        .route("/simulation/start", post(start_simulation))
        .route("/simulation/stop", post(stop_simulation))
        .route("/simulation/config", put(put_sim_config))
        .route("/export/racks.csv", get(export_racks_csv))
        .route("/export/events.csv", get(export_events_csv))
        .with_state(app_state)
        .layer(middleware::from_fn(require_api_key))
}

// GET /racks (snapshot complet de la grille)
async fn get_racks(State(app): State<AppState>) -> Json<Vec<RackView>> {
    let sim = app.handle.sim.lock();
    Json(sim.racks.iter().map(to_view).collect())
}

#[derive(serde::Serialize)]
struct RackDetail {
    rack: RackView,
    stats: Option<RackStats>,
}

// GET /racks/:id (détail + stats dérivées)
async fn get_rack(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RackDetail>, StatusCode> {
    let sim = app.handle.sim.lock();
    let Some(rack) = sim.racks.iter().find(|rack| rack.id == id) else {
        return Err(StatusCode::NOT_FOUND);
    };
    Ok(Json(RackDetail {
        rack: to_view(rack),
        stats: sim.tracking.rack_stats(&id, sim.now_ms),
    }))
}

// GET /alerts (actives uniquement, les dismissed restent en mémoire)
async fn get_alerts(State(app): State<AppState>) -> Json<Vec<Alert>> {
    Json(app.handle.sim.lock().alerts.active())
}

fn engine_error_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::UnknownAlert(_) => StatusCode::NOT_FOUND,
        EngineError::UnknownRack(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// POST /alerts/:id/dismiss
async fn dismiss_alert(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    app.handle
        .sim
        .lock()
        .dismiss_alert(&id)
        .map_err(|e| engine_error_status(&e))?;
    Ok(Json(serde_json::json!({ "ok": true, "dismissed": id })))
}

// POST /alerts/:id/boost (remédiation manuelle "increase fan")
async fn boost_alert(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let rate = app.handle.knobs.lock().electricity_rate;
    app.handle
        .sim
        .lock()
        .manual_fan_boost(&id, rate)
        .map_err(|e| engine_error_status(&e))?;
    Ok(Json(serde_json::json!({ "ok": true, "boosted": id })))
}

#[derive(Debug, Deserialize)]
struct EventsParams {
    limit: Option<usize>,
}

// GET /events?limit=N (queue du journal, plus ancien en premier)
async fn get_events(
    State(app): State<AppState>,
    Query(params): Query<EventsParams>,
) -> Json<Vec<EventLogEntry>> {
    let sim = app.handle.sim.lock();
    let limit = params.limit.unwrap_or(sim.journal.len());
    Json(sim.journal.tail(limit))
}

// GET /events/stats
async fn get_event_stats(State(app): State<AppState>) -> Json<EventStats> {
    Json(app.handle.sim.lock().journal.stats())
}

#[derive(serde::Serialize)]
struct EnergyView {
    session_kwh: f64,
    baseline_kwh: f64,
    savings_kwh: f64,
    session_cost: f64,
    baseline_cost: f64,
    electricity_rate: Option<f64>,
}

// GET /energy (compteurs + coûts au tarif courant)
async fn get_energy(State(app): State<AppState>) -> Json<EnergyView> {
    let rate = app.handle.knobs.lock().electricity_rate;
    let meter = app.handle.sim.lock().energy;
    Json(EnergyView {
        session_kwh: meter.session_kwh,
        baseline_kwh: meter.baseline_kwh,
        savings_kwh: meter.savings_kwh(),
        session_cost: cost_for(meter.session_kwh, rate),
        baseline_cost: cost_for(meter.baseline_kwh, rate),
        electricity_rate: rate,
    })
}

async fn get_trends_climate(
    State(app): State<AppState>,
) -> Json<Vec<coolwatch_engine::trends::ClimatePoint>> {
    Json(app.handle.sim.lock().trends.climate())
}

async fn get_trends_energy(
    State(app): State<AppState>,
) -> Json<Vec<coolwatch_engine::trends::EnergyPoint>> {
    Json(app.handle.sim.lock().trends.energy())
}

async fn get_trends_efficiency(
    State(app): State<AppState>,
) -> Json<coolwatch_engine::EfficiencyMetrics> {
    Json(app.handle.sim.lock().trends.efficiency())
}

#[derive(serde::Serialize)]
struct SimulationView {
    running: bool,
    tick_count: u64,
    now_ms: i64,
    config: SimConfig,
}

// GET /simulation (état du scheduler + knobs courants)
async fn get_simulation(State(app): State<AppState>) -> Json<SimulationView> {
    let sim = app.handle.sim.lock();
    Json(SimulationView {
        running: app.handle.is_running(),
        tick_count: sim.tick_count,
        now_ms: sim.now_ms,
        config: *app.handle.knobs.lock(),
    })
}

async fn start_simulation(State(app): State<AppState>) -> Json<serde_json::Value> {
    app.handle.set_running(true);
    println!("[kernel] simulation started");
    Json(serde_json::json!({ "running": true }))
}

async fn stop_simulation(State(app): State<AppState>) -> Json<serde_json::Value> {
    app.handle.set_running(false);
    println!("[kernel] simulation stopped");
    Json(serde_json::json!({ "running": false }))
}

#[derive(Debug, Deserialize)]
struct SimConfigPatch {
    intensity_percent: Option<f64>,
    auto_mode: Option<bool>,
    electricity_rate: Option<f64>,
}

// PUT /simulation/config (intensité 0-100, auto-mode, tarif)
async fn put_sim_config(
    State(app): State<AppState>,
    Json(patch): Json<SimConfigPatch>,
) -> Json<SimConfig> {
    let mut knobs = app.handle.knobs.lock();
    if let Some(intensity) = patch.intensity_percent {
        knobs.intensity_percent = intensity.clamp(0.0, 100.0);
    }
    if let Some(auto_mode) = patch.auto_mode {
        knobs.auto_mode = auto_mode;
    }
    if let Some(rate) = patch.electricity_rate {
        // tarif négatif ou NaN = flux externe dégradé, on retombe à zéro
        knobs.electricity_rate = if rate.is_finite() && rate >= 0.0 {
            Some(rate)
        } else {
            None
        };
    }
    Json(*knobs)
}

fn csv_response(body: String) -> ([(header::HeaderName, &'static str); 1], String) {
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body)
}

// GET /export/racks.csv
async fn export_racks_csv(
    State(app): State<AppState>,
) -> ([(header::HeaderName, &'static str); 1], String) {
    let sim = app.handle.sim.lock();
    csv_response(export::racks_csv(&sim.racks, sim.now_ms))
}

// GET /export/events.csv
async fn export_events_csv(
    State(app): State<AppState>,
) -> ([(header::HeaderName, &'static str); 1], String) {
    let sim = app.handle.sim.lock();
    csv_response(export::journal_csv(sim.journal.iter()))
}

// GET /system/health (état infrastructure)
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health_tracker.get_health(&app.handle))
}
