//! Thermal model: the per-tick state transition of a single rack.
//!
//! Pure given its random draw: sampling and application are split so that
//! tests can force exact jitters while the engine samples from its own
//! seedable RNG.

use rand::Rng;

use crate::rack::{Rack, RackStatus};

pub const TEMP_MIN_C: f64 = 15.0;
pub const TEMP_MAX_C: f64 = 40.0;
pub const HUMIDITY_MIN: f64 = 30.0;
pub const HUMIDITY_MAX: f64 = 80.0;
pub const UPTIME_FLOOR: f64 = 95.0;
/// Puissance ventilation de référence à 100% (watts)
pub const BASE_FAN_POWER_W: f64 = 500.0;
const AMBIENT_C: f64 = 20.0;

/// One tick worth of stochastic deltas for a single rack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalDraw {
    pub temp_jitter: f64,     // [-1, 1) * intensity
    pub humidity_jitter: f64, // [-2, 2) * intensity
    pub airflow_jitter: f64,  // [-0.25, 0.25)
    pub uptime_jitter: f64,   // [-0.05, 0.05)
}

impl ThermalDraw {
    /// Samples a draw for the given intensity in [0, 1].
    pub fn sample<R: Rng>(rng: &mut R, intensity: f64) -> Self {
        Self {
            temp_jitter: (rng.random::<f64>() - 0.5) * 2.0 * intensity,
            humidity_jitter: (rng.random::<f64>() - 0.5) * 4.0 * intensity,
            airflow_jitter: (rng.random::<f64>() - 0.5) * 0.5,
            uptime_jitter: (rng.random::<f64>() - 0.5) * 0.1,
        }
    }
}

pub fn fan_speed_percent(status: RackStatus) -> u8 {
    match status {
        RackStatus::Hot => 100,
        RackStatus::Warm => 75,
        RackStatus::Cool => 50,
    }
}

/// Instantaneous power draw: base fan power scaled by fan speed, corrected
/// for how far the intake runs above the 20°C ambient.
pub fn power_watts(status: RackStatus, temperature: f64) -> f64 {
    let fan = f64::from(fan_speed_percent(status)) / 100.0;
    BASE_FAN_POWER_W * fan * (1.0 + (temperature - AMBIENT_C) / 100.0)
}

/// Applies one draw to a rack: clamped temperature/humidity walk, unclamped
/// airflow drift, floored uptime, then reclassification and power update.
pub fn apply(rack: &mut Rack, draw: &ThermalDraw) {
    rack.temperature = (rack.temperature + draw.temp_jitter).clamp(TEMP_MIN_C, TEMP_MAX_C);
    rack.humidity = (rack.humidity + draw.humidity_jitter).clamp(HUMIDITY_MIN, HUMIDITY_MAX);
    rack.airflow_delta += draw.airflow_jitter;
    rack.uptime = (rack.uptime + draw.uptime_jitter).max(UPTIME_FLOOR);
    rack.status = RackStatus::from_temperature(rack.temperature);
    rack.fan_speed = fan_speed_percent(rack.status);
    rack.power_watts = power_watts(rack.status, rack.temperature);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn test_rack(temperature: f64) -> Rack {
        let mut rng = Pcg64::seed_from_u64(1);
        let mut rack = Rack::spawn_grid(1, &mut rng).remove(0);
        rack.temperature = temperature;
        rack.reclassify();
        rack
    }

    #[test]
    fn test_temperature_and_humidity_are_clamped() {
        let mut rack = test_rack(39.9);
        rack.humidity = 79.9;
        let draw = ThermalDraw {
            temp_jitter: 5.0,
            humidity_jitter: 5.0,
            airflow_jitter: 0.2,
            uptime_jitter: 0.0,
        };
        apply(&mut rack, &draw);
        assert_eq!(rack.temperature, TEMP_MAX_C);
        assert_eq!(rack.humidity, HUMIDITY_MAX);

        let draw_down = ThermalDraw {
            temp_jitter: -50.0,
            humidity_jitter: -90.0,
            airflow_jitter: 0.0,
            uptime_jitter: 0.0,
        };
        apply(&mut rack, &draw_down);
        assert_eq!(rack.temperature, TEMP_MIN_C);
        assert_eq!(rack.humidity, HUMIDITY_MIN);
    }

    #[test]
    fn test_airflow_drift_is_unclamped() {
        let mut rack = test_rack(20.0);
        rack.airflow_delta = 10.0;
        let draw = ThermalDraw {
            temp_jitter: 0.0,
            humidity_jitter: 0.0,
            airflow_jitter: 0.25,
            uptime_jitter: 0.0,
        };
        for _ in 0..100 {
            apply(&mut rack, &draw);
        }
        assert!((rack.airflow_delta - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_uptime_never_drops_below_floor() {
        let mut rack = test_rack(20.0);
        rack.uptime = 95.01;
        let draw = ThermalDraw {
            temp_jitter: 0.0,
            humidity_jitter: 0.0,
            airflow_jitter: 0.0,
            uptime_jitter: -0.05,
        };
        for _ in 0..10 {
            apply(&mut rack, &draw);
        }
        assert_eq!(rack.uptime, UPTIME_FLOOR);
    }

    #[test]
    fn test_power_formula_per_status() {
        // 500 * (fan/100) * (1 + (t - 20)/100)
        assert!((power_watts(RackStatus::Hot, 30.0) - 550.0).abs() < 1e-9);
        assert!((power_watts(RackStatus::Warm, 26.0) - 397.5).abs() < 1e-9);
        assert!((power_watts(RackStatus::Cool, 20.0) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_scales_with_intensity() {
        let mut rng = Pcg64::seed_from_u64(42);
        let zero = ThermalDraw::sample(&mut rng, 0.0);
        assert_eq!(zero.temp_jitter, 0.0);
        assert_eq!(zero.humidity_jitter, 0.0);
        // airflow and uptime drift do not depend on intensity
        assert!(zero.airflow_jitter.abs() <= 0.25);
        assert!(zero.uptime_jitter.abs() <= 0.05);

        for _ in 0..200 {
            let draw = ThermalDraw::sample(&mut rng, 1.0);
            assert!(draw.temp_jitter.abs() <= 1.0);
            assert!(draw.humidity_jitter.abs() <= 2.0);
        }
    }

    #[test]
    fn test_sampling_is_deterministic_for_a_seed() {
        let mut a = Pcg64::seed_from_u64(9);
        let mut b = Pcg64::seed_from_u64(9);
        for _ in 0..10 {
            assert_eq!(
                ThermalDraw::sample(&mut a, 0.5),
                ThermalDraw::sample(&mut b, 0.5)
            );
        }
    }
}
