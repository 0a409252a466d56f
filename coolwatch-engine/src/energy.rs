//! Session energy accounting against a full-fan baseline.

use serde::{Deserialize, Serialize};

use crate::thermal::BASE_FAN_POWER_W;

/// Running kWh totals for the session. Both counters only ever grow;
/// savings are derived, never stored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EnergyMeter {
    pub session_kwh: f64,
    pub baseline_kwh: f64,
}

impl EnergyMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrates one tick of consumption. The baseline assumes every rack
    /// permanently at 100% fan, the comparison point for savings.
    pub fn integrate(&mut self, total_watts: f64, rack_count: usize, interval_hours: f64) {
        self.session_kwh += (total_watts / 1000.0) * interval_hours;
        self.baseline_kwh += (BASE_FAN_POWER_W * rack_count as f64 / 1000.0) * interval_hours;
    }

    pub fn savings_kwh(&self) -> f64 {
        self.baseline_kwh - self.session_kwh
    }
}

/// Cost of a kWh figure at the externally supplied rate; a missing rate
/// degrades to zero instead of failing.
pub fn cost_for(kwh: f64, rate: Option<f64>) -> f64 {
    kwh * rate.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL_HOURS: f64 = 2.0 / 3600.0;

    #[test]
    fn test_totals_are_monotonically_non_decreasing() {
        let mut meter = EnergyMeter::new();
        let mut last_session = 0.0;
        let mut last_baseline = 0.0;
        for tick in 0..100 {
            meter.integrate(4000.0 + tick as f64, 16, INTERVAL_HOURS);
            assert!(meter.session_kwh >= last_session);
            assert!(meter.baseline_kwh >= last_baseline);
            last_session = meter.session_kwh;
            last_baseline = meter.baseline_kwh;
        }
    }

    #[test]
    fn test_one_tick_integration() {
        let mut meter = EnergyMeter::new();
        meter.integrate(4000.0, 16, INTERVAL_HOURS);
        // 4 kW over 2 simulated seconds
        assert!((meter.session_kwh - 4.0 * INTERVAL_HOURS).abs() < 1e-12);
        // baseline: 16 racks * 500 W = 8 kW
        assert!((meter.baseline_kwh - 8.0 * INTERVAL_HOURS).abs() < 1e-12);
        assert!((meter.savings_kwh() - 4.0 * INTERVAL_HOURS).abs() < 1e-12);
    }

    #[test]
    fn test_cost_degrades_to_zero_without_rate() {
        assert_eq!(cost_for(12.5, None), 0.0);
        assert_eq!(cost_for(12.5, Some(0.0)), 0.0);
        assert!((cost_for(10.0, Some(0.12)) - 1.2).abs() < 1e-12);
    }
}
