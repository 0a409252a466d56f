//! Simulation state and the per-tick transition.
//!
//! The host owns a single `SimulationState` and drives it from one place
//! only; `advance_tick` applies the whole pipeline (thermal step, tracking,
//! alerts, auto remediation, energy, trends) as one atomic mutation, so
//! readers always see a committed post-tick snapshot.

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::alerts::{self, AlertBook, CRITICAL_TEMP_C};
use crate::energy::{cost_for, EnergyMeter};
use crate::journal::{EventJournal, EventLogEntry, EventSeverity, EventType};
use crate::rack::Rack;
use crate::remediation;
use crate::thermal::ThermalDraw;
use crate::tracking::TrackerRegistry;
use crate::trends::TrendBook;

/// Coût énergétique forfaitaire d'une détection de surchauffe (kWh)
const OVERHEAT_DETECTION_KWH: f64 = 0.05;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown alert: {0}")]
    UnknownAlert(String),
    #[error("internal consistency fault, no rack for id: {0}")]
    UnknownRack(String),
}

/// Immutable construction parameters of a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineSettings {
    pub grid_size: usize,
    pub journal_cap: usize,
    /// Fixed seed for reproducible sessions; None draws from the OS
    pub seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            grid_size: 4,
            journal_cap: crate::journal::DEFAULT_JOURNAL_CAP,
            seed: None,
        }
    }
}

/// Per-tick knobs, adjustable at runtime by the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimConfig {
    /// Slider position, 0-100
    pub intensity_percent: f64,
    pub auto_mode: bool,
    /// Currency per kWh from the external rate feed; absent reads as 0
    pub electricity_rate: Option<f64>,
    /// Wall period of one tick, also the simulated duration it represents
    pub tick_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            intensity_percent: 50.0,
            auto_mode: false,
            electricity_rate: None,
            tick_ms: 2000,
        }
    }
}

/// What one tick did, for host-side logging.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub new_alerts: usize,
    pub auto_actions: usize,
}

/// The whole mutable state of a monitoring session.
pub struct SimulationState {
    pub racks: Vec<Rack>,
    pub tracking: TrackerRegistry,
    pub alerts: AlertBook,
    pub journal: EventJournal,
    pub energy: EnergyMeter,
    pub trends: TrendBook,
    pub now_ms: i64,
    pub tick_count: u64,
    rng: Pcg64,
}

impl SimulationState {
    /// Builds the rack grid and one tracking record per rack. `now_ms` is
    /// the logical clock origin, normally wall time at startup.
    pub fn new(settings: EngineSettings, now_ms: i64) -> Self {
        let mut rng = match settings.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_os_rng(),
        };
        let racks = Rack::spawn_grid(settings.grid_size, &mut rng);
        let mut tracking = TrackerRegistry::new();
        for rack in &racks {
            tracking.register(&rack.id, now_ms, &mut rng);
        }
        Self {
            racks,
            tracking,
            alerts: AlertBook::new(),
            journal: EventJournal::new(settings.journal_cap),
            energy: EnergyMeter::new(),
            trends: TrendBook::new(),
            now_ms,
            tick_count: 0,
            rng,
        }
    }

    /// One atomic simulation step. Ordering: thermal step for every rack,
    /// tracker observation, alert scan, auto remediation on the fresh
    /// alerts, energy integration (on the wattage drawn before
    /// remediation), trend buffers.
    pub fn advance_tick(&mut self, knobs: &SimConfig) -> TickSummary {
        self.tick_count += 1;
        self.now_ms += knobs.tick_ms as i64;
        let now = self.now_ms;
        let rate = knobs.electricity_rate;
        let intensity = (knobs.intensity_percent / 100.0).clamp(0.0, 1.0);

        // Phase thermique + observation tracker, rack par rack
        for rack in &mut self.racks {
            let temp_before = rack.temperature;
            let draw = ThermalDraw::sample(&mut self.rng, intensity);
            crate::thermal::apply(rack, &draw);

            let Some(record) = self.tracking.get_mut(&rack.id) else {
                // invariant cassé : enregistré à l'init, jamais retiré
                error!(rack_id = %rack.id, "tracking record missing, rack skipped this tick");
                continue;
            };

            if record.note_temperature(rack.temperature, now) {
                let energy_delta = OVERHEAT_DETECTION_KWH;
                self.journal.push(EventLogEntry {
                    id: EventLogEntry::new_id(),
                    timestamp: now,
                    rack_id: rack.id.clone(),
                    rack_name: rack.name.clone(),
                    event_type: EventType::Overheat,
                    cause: format!(
                        "Temperature rose from {temp_before:.1}°C to {:.1}°C",
                        rack.temperature
                    ),
                    action_taken: "Alert generated, monitoring increased".to_string(),
                    outcome: "System flagged for intervention".to_string(),
                    energy_delta,
                    cost_delta: cost_for(energy_delta, rate),
                    severity: if rack.temperature > CRITICAL_TEMP_C {
                        EventSeverity::Critical
                    } else {
                        EventSeverity::Warning
                    },
                    duration: None,
                    temp_before: Some(temp_before),
                    temp_after: Some(rack.temperature),
                });
            }

            if let Some(recovered) = record.poll_recovery(rack.temperature, now) {
                let seconds = recovered.recovery_time as f64 / 1000.0;
                self.journal.push(EventLogEntry {
                    id: EventLogEntry::new_id(),
                    timestamp: now,
                    rack_id: rack.id.clone(),
                    rack_name: rack.name.clone(),
                    event_type: EventType::TempRecovery,
                    cause: "Cooling intervention completed".to_string(),
                    action_taken: "Temperature monitoring during recovery".to_string(),
                    outcome: format!(
                        "Stabilized from {:.1}°C to {:.1}°C in {}s",
                        recovered.start_temp,
                        recovered.end_temp,
                        seconds.round()
                    ),
                    energy_delta: 0.0,
                    cost_delta: 0.0,
                    severity: EventSeverity::Info,
                    duration: Some(seconds),
                    temp_before: Some(recovered.start_temp),
                    temp_after: Some(recovered.end_temp),
                });
            }
        }

        // Consommation du tick, avant remédiation
        let total_watts: f64 = self.racks.iter().map(|rack| rack.power_watts).sum();

        let new_alerts = alerts::scan_for_alerts(&mut self.racks, now);

        let mut auto_actions = 0;
        if knobs.auto_mode {
            for alert in &new_alerts {
                if remediation::auto_remediate(
                    &mut self.racks,
                    &mut self.tracking,
                    &mut self.journal,
                    alert,
                    rate,
                    now,
                ) {
                    auto_actions += 1;
                }
            }
        }

        let summary = TickSummary {
            tick: self.tick_count,
            new_alerts: new_alerts.len(),
            auto_actions,
        };
        self.alerts.extend(new_alerts);

        let interval_hours = knobs.tick_ms as f64 / 1000.0 / 3600.0;
        self.energy.integrate(total_watts, self.racks.len(), interval_hours);

        self.trends.observe(&self.racks, &self.energy, now);

        debug!(
            tick = summary.tick,
            new_alerts = summary.new_alerts,
            auto_actions = summary.auto_actions,
            session_kwh = self.energy.session_kwh,
            "tick complete"
        );
        summary
    }

    /// Operator "increase fan" action on a specific alert: dismisses it and
    /// applies a manual boost to its rack.
    pub fn manual_fan_boost(
        &mut self,
        alert_id: &str,
        rate: Option<f64>,
    ) -> Result<(), EngineError> {
        let now = self.now_ms;
        let alert = self
            .alerts
            .get(alert_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownAlert(alert_id.to_string()))?;
        self.alerts.dismiss(alert_id);

        let rack = self
            .racks
            .iter_mut()
            .find(|rack| rack.id == alert.rack_id)
            .ok_or_else(|| {
                error!(rack_id = %alert.rack_id, "manual boost: rack not found");
                EngineError::UnknownRack(alert.rack_id.clone())
            })?;
        let record = self.tracking.get_mut(&rack.id).ok_or_else(|| {
            error!(rack_id = %rack.id, "manual boost: tracking record missing");
            EngineError::UnknownRack(rack.id.clone())
        })?;

        remediation::manual_boost(rack, record, &mut self.journal, rate, now);
        Ok(())
    }

    pub fn dismiss_alert(&mut self, alert_id: &str) -> Result<(), EngineError> {
        if self.alerts.dismiss(alert_id) {
            Ok(())
        } else {
            Err(EngineError::UnknownAlert(alert_id.to_string()))
        }
    }
}
