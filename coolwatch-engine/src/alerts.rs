//! Alert generation with cooldown deduplication.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rack::{Rack, RackStatus};

/// Délai minimum entre deux alertes pour un même rack (ms)
pub const ALERT_COOLDOWN_MS: i64 = 30_000;
/// Above this an alert is critical instead of warning
pub const CRITICAL_TEMP_C: f64 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn from_temperature(temperature: f64) -> Self {
        if temperature > CRITICAL_TEMP_C {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub rack_id: String,
    pub rack_name: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: i64,
    pub dismissed: bool,
}

/// Scans the fleet and emits one alert per hot rack whose cooldown has
/// elapsed, stamping `last_alert` as the sole dedup mechanism. Warm and
/// cool racks never alert; an elapsed cooldown always re-alerts even if
/// the severity did not change.
pub fn scan_for_alerts(racks: &mut [Rack], now_ms: i64) -> Vec<Alert> {
    let mut new_alerts = Vec::new();
    for rack in racks.iter_mut() {
        if rack.status != RackStatus::Hot {
            continue;
        }
        let cooled_down = match rack.last_alert {
            None => true,
            Some(last) => now_ms - last > ALERT_COOLDOWN_MS,
        };
        if !cooled_down {
            continue;
        }
        new_alerts.push(Alert {
            id: Uuid::new_v4().to_string(),
            rack_id: rack.id.clone(),
            rack_name: rack.name.clone(),
            severity: AlertSeverity::from_temperature(rack.temperature),
            message: format!("Temperature critical: {:.1}°C", rack.temperature),
            timestamp: now_ms,
            dismissed: false,
        });
        rack.last_alert = Some(now_ms);
    }
    new_alerts
}

/// All alerts of the session, dismissed ones included (kept for audit).
#[derive(Debug, Clone, Default)]
pub struct AlertBook {
    alerts: Vec<Alert>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, new_alerts: Vec<Alert>) {
        self.alerts.extend(new_alerts);
    }

    pub fn get(&self, alert_id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|alert| alert.id == alert_id)
    }

    /// One-way transition; returns false for an unknown id.
    pub fn dismiss(&mut self, alert_id: &str) -> bool {
        match self.alerts.iter_mut().find(|alert| alert.id == alert_id) {
            Some(alert) => {
                alert.dismissed = true;
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> Vec<Alert> {
        self.alerts
            .iter()
            .filter(|alert| !alert.dismissed)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn fleet() -> Vec<Rack> {
        let mut rng = Pcg64::seed_from_u64(2);
        Rack::spawn_grid(2, &mut rng)
    }

    fn force_temp(rack: &mut Rack, temperature: f64) {
        rack.temperature = temperature;
        rack.reclassify();
    }

    #[test]
    fn test_only_hot_racks_alert() {
        let mut racks = fleet();
        force_temp(&mut racks[0], 29.0);
        force_temp(&mut racks[1], 27.0); // warm
        force_temp(&mut racks[2], 20.0); // cool
        force_temp(&mut racks[3], 33.0);

        let alerts = scan_for_alerts(&mut racks, 1000);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].rack_id, racks[0].id);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[1].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].message, "Temperature critical: 29.0°C");
    }

    #[test]
    fn test_cooldown_suppresses_then_realerts() {
        let mut racks = fleet();
        force_temp(&mut racks[0], 30.0);

        let first = scan_for_alerts(&mut racks, 1000);
        assert_eq!(first.len(), 1);
        assert_eq!(racks[0].last_alert, Some(1000));

        // still hot inside the cooldown window: nothing
        assert!(scan_for_alerts(&mut racks, 1000 + ALERT_COOLDOWN_MS).is_empty());

        // one past the window: re-alert even with unchanged severity
        let again = scan_for_alerts(&mut racks, 1001 + ALERT_COOLDOWN_MS);
        assert_eq!(again.len(), 1);
        assert_eq!(racks[0].last_alert, Some(1001 + ALERT_COOLDOWN_MS));
    }

    #[test]
    fn test_severity_boundary_at_32() {
        let mut racks = fleet();
        force_temp(&mut racks[0], 32.0);
        let alerts = scan_for_alerts(&mut racks, 1000);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);

        force_temp(&mut racks[1], 32.01);
        let alerts = scan_for_alerts(&mut racks, 2000);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_dismiss_is_one_way_and_audit_keeps_everything() {
        let mut racks = fleet();
        force_temp(&mut racks[0], 30.0);
        let mut book = AlertBook::new();
        book.extend(scan_for_alerts(&mut racks, 1000));

        let id = book.active()[0].id.clone();
        assert!(book.dismiss(&id));
        assert!(book.active().is_empty());
        assert_eq!(book.len(), 1); // retained for audit
        assert!(book.get(&id).unwrap().dismissed);
        assert!(!book.dismiss("no-such-alert"));
    }
}
