/**
 * COOLWATCH KERNEL - Point d'entrée principal du serveur Coolwatch
 *
 * RÔLE : Orchestration de tous les modules : config, moteur de simulation,
 * scheduler de ticks, HTTP, health, télémétrie MQTT.
 *
 * ARCHITECTURE : moteur mono-writer derrière un mutex + API REST en
 * lecture de snapshots + publication health périodique.
 * UTILITÉ : Cerveau central de Coolwatch, point d'administration unique.
 */

mod config;
mod health;
mod http;
mod scheduler;
mod state;

use crate::config::load_config;
use crate::health::HealthTracker;
use crate::http::AppState;
use crate::state::EngineHandle;

use coolwatch_engine::SimulationState;
use std::net::SocketAddr;
use time::OffsetDateTime;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok(); // Ok si .env n'existe pas

    // logs du moteur (RUST_LOG=debug pour le détail des ticks)
    tracing_subscriber::fmt::init();

    let cfg = load_config().await;
    println!(
        "[kernel] grid {}x{}, tick {}ms, auto_mode={}",
        cfg.grid_size, cfg.grid_size, cfg.tick_ms, cfg.auto_mode
    );

    // moteur de simulation, horloge logique calée sur l'heure murale
    let now_ms = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    let sim = SimulationState::new(cfg.engine_settings(), now_ms);
    let handle = EngineHandle::new(sim, cfg.sim_config());
    if cfg.autostart {
        handle.set_running(true);
        println!("[kernel] simulation autostarted");
    }

    // health tracker + télémétrie MQTT
    let health_tracker = HealthTracker::new();
    health_tracker.spawn_health_publisher(cfg.mqtt.clone(), handle.clone());

    // scheduler de ticks (2s par défaut)
    scheduler::spawn_tick_loop(handle.clone());

    // fabrique l'état unique pour Axum
    let app_state = AppState {
        handle,
        health_tracker,
    };

    // HTTP
    let app = http::build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    println!("[kernel] listening on http://{addr}");
    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
