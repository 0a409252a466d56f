use coolwatch_engine::{SimConfig, SimulationState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Poignée unique sur le moteur, partagée entre scheduler, HTTP et télémétrie.
/// Un seul writer (la task de tick) ; les lecteurs ne font que cloner des
/// snapshots commités.
#[derive(Clone)]
pub struct EngineHandle {
    pub sim: Shared<SimulationState>,
    pub knobs: Shared<SimConfig>,
    running: Arc<AtomicBool>,
}

impl EngineHandle {
    pub fn new(sim: SimulationState, knobs: SimConfig) -> Self {
        Self {
            sim: new_state(sim),
            knobs: new_state(knobs),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, on: bool) {
        self.running.store(on, Ordering::Relaxed);
    }
}
