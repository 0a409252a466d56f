//! Overheat and recovery tracking per rack.
//!
//! Two interacting automata per rack:
//! - an edge detector around the 28°C threshold (one event per upward
//!   crossing, history never pruned)
//! - a recovery window opened by any fan boost, resolved by a temperature
//!   drop or abandoned on timeout
//!
//! Maintenance and efficiency figures are derived on demand from the raw
//! history, never cached.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seuil de surchauffe (°C), partagé avec la classification "hot"
pub const OVERHEAT_THRESHOLD_C: f64 = 28.0;
/// Minimum time after a fan boost before a drop counts as a recovery
pub const RECOVERY_MIN_WAIT_MS: i64 = 60 * 1000;
/// After this the pending recovery is abandoned without a record
pub const RECOVERY_TIMEOUT_MS: i64 = 5 * 60 * 1000;
/// Trailing window for maintenance predictions
pub const MAINTENANCE_WINDOW_HOURS: i64 = 72;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const THIRTY_DAYS_MS: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;
const DEFAULT_EFFICIENCY: f64 = 85.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverheatEvent {
    pub timestamp: i64,
    pub temperature: f64,
}

/// Edge-detector state around the overheat threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverheatState {
    Normal,
    Overheating,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FanBoost {
    pub timestamp: i64,
    pub percent_boost: f64,
    pub initial_temp: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PendingRecovery {
    pub start_time: i64,
    pub initial_temp: f64,
    pub fan_boost_time: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TempRecovery {
    pub start_temp: f64,
    pub end_temp: f64,
    pub timestamp: i64,
    /// Elapsed ms between the fan boost and the recorded drop
    pub recovery_time: i64,
}

/// Full tracking history for one rack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RackTracking {
    pub overheat_events: Vec<OverheatEvent>,
    pub last_maintenance: i64,
    pub fan_boost_actions: Vec<FanBoost>,
    pub temp_recovery_records: Vec<TempRecovery>,
    pub overheat_state: OverheatState,
    pub last_fan_boost: Option<FanBoost>,
    pub pending_recovery: Option<PendingRecovery>,
}

impl RackTracking {
    /// Fresh record; last maintenance falls at a random point in the
    /// trailing 30 days.
    pub fn new<R: Rng>(now_ms: i64, rng: &mut R) -> Self {
        Self {
            overheat_events: Vec::new(),
            last_maintenance: now_ms - (rng.random::<f64>() * THIRTY_DAYS_MS) as i64,
            fan_boost_actions: Vec::new(),
            temp_recovery_records: Vec::new(),
            overheat_state: OverheatState::Normal,
            last_fan_boost: None,
            pending_recovery: None,
        }
    }

    /// Edge detector. Returns true exactly when the temperature crosses
    /// above the threshold coming from at or below it; staying hot does
    /// not re-fire. Dropping back only transitions the state, history is
    /// never pruned.
    pub fn note_temperature(&mut self, temperature: f64, now_ms: i64) -> bool {
        let overheating = temperature > OVERHEAT_THRESHOLD_C;
        match self.overheat_state {
            OverheatState::Normal if overheating => {
                self.overheat_events.push(OverheatEvent {
                    timestamp: now_ms,
                    temperature,
                });
                self.overheat_state = OverheatState::Overheating;
                true
            }
            OverheatState::Overheating if !overheating => {
                self.overheat_state = OverheatState::Normal;
                false
            }
            _ => false,
        }
    }

    /// Records a fan boost (manual or automated). Any pending recovery
    /// window is overwritten rather than kept, matching the observed
    /// behaviour of the monitoring floor.
    pub fn record_fan_boost(&mut self, percent_boost: f64, initial_temp: f64, now_ms: i64) {
        let boost = FanBoost {
            timestamp: now_ms,
            percent_boost,
            initial_temp,
        };
        self.fan_boost_actions.push(boost);
        self.last_fan_boost = Some(boost);
        self.pending_recovery = Some(PendingRecovery {
            start_time: now_ms,
            initial_temp,
            fan_boost_time: now_ms,
        });
    }

    /// Resolves an outstanding recovery window against the current
    /// temperature. Success (drop below threshold at least one minute
    /// after the boost) appends a record and returns it; a five minute
    /// timeout abandons the window silently.
    pub fn poll_recovery(&mut self, current_temp: f64, now_ms: i64) -> Option<TempRecovery> {
        let pending = self.pending_recovery?;
        let since_boost = now_ms - pending.fan_boost_time;

        if current_temp < OVERHEAT_THRESHOLD_C && since_boost > RECOVERY_MIN_WAIT_MS {
            let record = TempRecovery {
                start_temp: pending.initial_temp,
                end_temp: current_temp,
                timestamp: now_ms,
                recovery_time: since_boost,
            };
            self.temp_recovery_records.push(record);
            self.pending_recovery = None;
            return Some(record);
        }

        if since_boost > RECOVERY_TIMEOUT_MS {
            // fenêtre expirée, aucun enregistrement
            debug!(since_boost, "recovery window abandoned");
            self.pending_recovery = None;
        }
        None
    }

    pub fn overheat_count(&self, hours: i64, now_ms: i64) -> usize {
        let cutoff = now_ms - hours * MS_PER_HOUR;
        self.overheat_events
            .iter()
            .filter(|event| event.timestamp > cutoff)
            .count()
    }

    /// Maintenance forecast from the trailing 72h overheat count.
    pub fn maintenance_prediction(&self, now_ms: i64) -> MaintenancePrediction {
        match self.overheat_count(MAINTENANCE_WINDOW_HOURS, now_ms) {
            n if n >= 4 => MaintenancePrediction {
                days: 1,
                status: MaintenanceStatus::Critical,
                message: "Immediate maintenance required",
            },
            n if n >= 2 => MaintenancePrediction {
                days: 3,
                status: MaintenanceStatus::Warning,
                message: "Schedule maintenance soon",
            },
            _ => MaintenancePrediction {
                days: 28,
                status: MaintenanceStatus::Good,
                message: "Normal maintenance schedule",
            },
        }
    }

    /// Temperature drop obtained per unit of fan boost over the last ten
    /// recoveries, as a 0-100 score. Racks without history score the 85
    /// default.
    pub fn cooling_efficiency(&self) -> f64 {
        if self.temp_recovery_records.is_empty() {
            return DEFAULT_EFFICIENCY;
        }
        let recent = last_n(&self.temp_recovery_records, 10);
        let total_drop: f64 = recent
            .iter()
            .map(|record| record.start_temp - record.end_temp)
            .sum();
        let total_boost: f64 = last_n(&self.fan_boost_actions, 10)
            .iter()
            .map(|boost| boost.percent_boost)
            .sum();
        if total_boost == 0.0 {
            return DEFAULT_EFFICIENCY;
        }
        ((total_drop / total_boost) * 100.0).clamp(0.0, 100.0).round()
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceStatus {
    Good,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MaintenancePrediction {
    pub days: u32,
    pub status: MaintenanceStatus,
    pub message: &'static str,
}

/// Per-rack aggregate served to API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct RackStats {
    pub overheat_events: usize,
    pub recent_overheats: usize,
    pub fan_boosts: usize,
    pub temp_recoveries: usize,
    pub last_maintenance: i64,
    pub maintenance_prediction: MaintenancePrediction,
    pub cooling_efficiency: f64,
}

/// Registry mapping rack id to tracking record.
///
/// Total by construction: every rack id is registered exactly once at
/// initialization and there is no removal. A miss at lookup time is an
/// internal-consistency fault, handled by the caller.
#[derive(Debug, Clone, Default)]
pub struct TrackerRegistry {
    records: HashMap<String, RackTracking>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: Rng>(&mut self, rack_id: &str, now_ms: i64, rng: &mut R) {
        self.records
            .entry(rack_id.to_string())
            .or_insert_with(|| RackTracking::new(now_ms, rng));
    }

    pub fn get(&self, rack_id: &str) -> Option<&RackTracking> {
        self.records.get(rack_id)
    }

    pub fn get_mut(&mut self, rack_id: &str) -> Option<&mut RackTracking> {
        self.records.get_mut(rack_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rack_stats(&self, rack_id: &str, now_ms: i64) -> Option<RackStats> {
        let record = self.records.get(rack_id)?;
        Some(RackStats {
            overheat_events: record.overheat_events.len(),
            recent_overheats: record.overheat_count(MAINTENANCE_WINDOW_HOURS, now_ms),
            fan_boosts: record.fan_boost_actions.len(),
            temp_recoveries: record.temp_recovery_records.len(),
            last_maintenance: record.last_maintenance,
            maintenance_prediction: record.maintenance_prediction(now_ms),
            cooling_efficiency: record.cooling_efficiency(),
        })
    }
}
