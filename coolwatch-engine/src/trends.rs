//! Fleet trend buffers: per-tick climate and energy aggregates plus the
//! rolling efficiency figure, kept in bounded rings for API consumers.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::energy::EnergyMeter;
use crate::rack::{Rack, RackStatus};
use crate::thermal::BASE_FAN_POWER_W;

/// Points conservés par série (~10 minutes au tick de 2s)
pub const MAX_TREND_POINTS: usize = 300;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClimatePoint {
    pub timestamp: i64,
    pub avg_temp: f64,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_humidity: f64,
    pub avg_airflow: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnergyPoint {
    pub timestamp: i64,
    pub actual_kwh: f64,
    pub baseline_kwh: f64,
    pub savings_kwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EfficiencyMetrics {
    /// Percent below the full-fan baseline right now
    pub current: f64,
    /// Headroom if every hot rack were brought back to nominal
    pub potential: f64,
    pub savings_kwh: f64,
    pub trend: Trend,
}

impl Default for EfficiencyMetrics {
    fn default() -> Self {
        Self {
            current: 0.0,
            potential: 0.0,
            savings_kwh: 0.0,
            trend: Trend::Stable,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrendBook {
    climate: VecDeque<ClimatePoint>,
    energy: VecDeque<EnergyPoint>,
    efficiency: EfficiencyMetrics,
}

impl TrendBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the committed post-tick snapshot into the rings and refreshes
    /// the efficiency summary.
    pub fn observe(&mut self, racks: &[Rack], meter: &EnergyMeter, now_ms: i64) {
        if racks.is_empty() {
            return;
        }
        let count = racks.len() as f64;
        let temps: Vec<f64> = racks.iter().map(|rack| rack.temperature).collect();
        let avg_temp = temps.iter().sum::<f64>() / count;
        let max_temp = temps.iter().cloned().fold(f64::MIN, f64::max);
        let min_temp = temps.iter().cloned().fold(f64::MAX, f64::min);
        let avg_humidity = racks.iter().map(|rack| rack.humidity).sum::<f64>() / count;
        let avg_airflow = racks.iter().map(|rack| rack.airflow_delta).sum::<f64>() / count;

        push_capped(
            &mut self.climate,
            ClimatePoint {
                timestamp: now_ms,
                avg_temp,
                max_temp,
                min_temp,
                avg_humidity,
                avg_airflow,
            },
        );
        push_capped(
            &mut self.energy,
            EnergyPoint {
                timestamp: now_ms,
                actual_kwh: meter.session_kwh,
                baseline_kwh: meter.baseline_kwh,
                savings_kwh: meter.savings_kwh(),
            },
        );

        let total_kw = racks.iter().map(|rack| rack.power_watts).sum::<f64>() / 1000.0;
        let baseline_kw = BASE_FAN_POWER_W * count / 1000.0;
        let current = ((1.0 - total_kw / baseline_kw) * 100.0).max(0.0);
        let hot_racks = racks
            .iter()
            .filter(|rack| rack.status == RackStatus::Hot)
            .count() as f64;

        let previous = self.efficiency.current;
        let trend = if current > previous + 2.0 {
            Trend::Improving
        } else if current < previous - 2.0 {
            Trend::Declining
        } else {
            Trend::Stable
        };
        self.efficiency = EfficiencyMetrics {
            current,
            potential: (current + hot_racks * 0.15).min(100.0),
            savings_kwh: meter.savings_kwh(),
            trend,
        };
    }

    pub fn climate(&self) -> Vec<ClimatePoint> {
        self.climate.iter().copied().collect()
    }

    pub fn energy(&self) -> Vec<EnergyPoint> {
        self.energy.iter().copied().collect()
    }

    pub fn efficiency(&self) -> EfficiencyMetrics {
        self.efficiency
    }
}

fn push_capped<T>(ring: &mut VecDeque<T>, point: T) {
    if ring.len() == MAX_TREND_POINTS {
        ring.pop_front();
    }
    ring.push_back(point);
}
