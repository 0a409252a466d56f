//! Rack data model and status classification.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::thermal;

/// Threshold classification of a rack, derived from temperature alone.
/// `hot` above 28°C, `warm` above 24°C, `cool` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RackStatus {
    Cool,
    Warm,
    Hot,
}

impl RackStatus {
    pub fn from_temperature(temperature: f64) -> Self {
        if temperature > 28.0 {
            RackStatus::Hot
        } else if temperature > 24.0 {
            RackStatus::Warm
        } else {
            RackStatus::Cool
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RackStatus::Cool => "cool",
            RackStatus::Warm => "warm",
            RackStatus::Hot => "hot",
        }
    }
}

/// Live state of a single equipment rack.
/// Created once at initialization, mutated in place every tick, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rack {
    pub id: String,
    pub name: String,               // ex: "Rack A1"
    pub temperature: f64,           // °C
    pub humidity: f64,              // %
    pub status: RackStatus,
    pub uptime: f64,                // %
    pub airflow_delta: f64,         // CFM offset vs nominal
    pub power_watts: f64,
    pub fan_speed: u8,              // %
    /// Horodatage (ms epoch) de la dernière alerte émise pour ce rack
    pub last_alert: Option<i64>,
}

impl Rack {
    /// Builds the initial rack grid with randomized baseline values.
    /// Names follow the floor plan: row letter + column number ("Rack A1").
    pub fn spawn_grid<R: Rng>(grid_size: usize, rng: &mut R) -> Vec<Rack> {
        let mut racks = Vec::with_capacity(grid_size * grid_size);
        for i in 0..grid_size * grid_size {
            let base_temp = 18.0 + rng.random::<f64>() * 8.0; // 18-26°C
            let row = (b'A' + (i / grid_size) as u8) as char;
            let col = (i % grid_size) + 1;
            let status = RackStatus::from_temperature(base_temp);
            racks.push(Rack {
                id: format!("rack-{i}"),
                name: format!("Rack {row}{col}"),
                temperature: base_temp,
                humidity: 45.0 + rng.random::<f64>() * 20.0, // 45-65%
                status,
                uptime: 99.2 + rng.random::<f64>() * 0.7,
                airflow_delta: -2.0 + rng.random::<f64>() * 4.0,
                power_watts: thermal::power_watts(status, base_temp),
                fan_speed: thermal::fan_speed_percent(status),
                last_alert: None,
            });
        }
        racks
    }

    /// Reclassifies the rack and refreshes the power model after a
    /// temperature change outside the thermal step (remediation).
    pub fn reclassify(&mut self) {
        self.status = RackStatus::from_temperature(self.temperature);
        self.fan_speed = thermal::fan_speed_percent(self.status);
        self.power_watts = thermal::power_watts(self.status, self.temperature);
    }
}
