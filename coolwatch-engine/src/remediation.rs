//! Corrective actions: automated fan boosts driven by fresh alerts, and
//! operator-requested boosts on a specific alert.

use tracing::{error, info};

use crate::alerts::Alert;
use crate::energy::cost_for;
use crate::journal::{EventJournal, EventLogEntry, EventSeverity, EventType};
use crate::rack::Rack;
use crate::thermal::BASE_FAN_POWER_W;
use crate::tracking::{RackTracking, TrackerRegistry};

/// Boost enregistré côté tracking pour une action automatique
pub const AUTO_BOOST_PERCENT: f64 = 15.0;
pub const AUTO_BOOST_DURATION_S: f64 = 120.0;
/// Boost enregistré côté tracking pour une action manuelle
pub const MANUAL_BOOST_PERCENT: f64 = 35.0;
pub const MANUAL_BOOST_DURATION_S: f64 = 90.0;
/// Baisse appliquée immédiatement par un boost, en °C
pub const COOLING_DELTA_C: f64 = 2.0;

const MANUAL_BOOST_POWER_KW: f64 = 0.01;

// TODO: align the operator-facing boost percentages in the log strings
// ("90%", "85%") with the recorded percent_boost values (15, 35); product
// has not yet said which one is authoritative.

/// Applies the automated response to one freshly generated alert: cool the
/// rack by a fixed delta, record the fan boost, journal the action. Runs
/// once per alert, not once per rack. Returns false when the rack cannot
/// be found, which means a broken registry invariant; the alert is then
/// skipped for this tick.
pub fn auto_remediate(
    racks: &mut [Rack],
    tracking: &mut TrackerRegistry,
    journal: &mut EventJournal,
    alert: &Alert,
    rate: Option<f64>,
    now_ms: i64,
) -> bool {
    let Some(rack) = racks.iter_mut().find(|rack| rack.id == alert.rack_id) else {
        error!(rack_id = %alert.rack_id, "auto remediation: rack not found, alert skipped");
        return false;
    };
    let Some(record) = tracking.get_mut(&rack.id) else {
        error!(rack_id = %rack.id, "auto remediation: tracking record missing, alert skipped");
        return false;
    };

    let temp_before = rack.temperature;
    rack.temperature -= COOLING_DELTA_C;
    rack.reclassify();
    let temp_after = rack.temperature;

    record.record_fan_boost(AUTO_BOOST_PERCENT, temp_before, now_ms);

    let energy_delta =
        (AUTO_BOOST_PERCENT / 100.0) * (BASE_FAN_POWER_W / 1000.0) * (AUTO_BOOST_DURATION_S / 3600.0);
    journal.push(EventLogEntry {
        id: EventLogEntry::new_id(),
        timestamp: now_ms,
        rack_id: rack.id.clone(),
        rack_name: rack.name.clone(),
        event_type: EventType::AutoAction,
        cause: format!("Temperature at {temp_before:.1}°C exceeded threshold"),
        action_taken: "Auto increased fan to 90% for 2 minutes".to_string(),
        outcome: format!("Stabilized at {temp_after:.1}°C"),
        energy_delta,
        cost_delta: cost_for(energy_delta, rate),
        severity: EventSeverity::Info,
        duration: Some(AUTO_BOOST_DURATION_S),
        temp_before: Some(temp_before),
        temp_after: Some(temp_after),
    });

    info!(rack = %rack.name, temp_before, temp_after, "auto fan boost applied");
    true
}

/// Operator-requested boost on the rack behind an alert. The caller has
/// already resolved the alert and dismissed it.
pub fn manual_boost(
    rack: &mut Rack,
    record: &mut RackTracking,
    journal: &mut EventJournal,
    rate: Option<f64>,
    now_ms: i64,
) {
    let temp_before = rack.temperature;
    rack.temperature -= COOLING_DELTA_C;
    rack.reclassify();
    let temp_after = rack.temperature;

    record.record_fan_boost(MANUAL_BOOST_PERCENT, temp_before, now_ms);

    let energy_delta = MANUAL_BOOST_POWER_KW * (MANUAL_BOOST_DURATION_S / 3600.0);
    journal.push(EventLogEntry {
        id: EventLogEntry::new_id(),
        timestamp: now_ms,
        rack_id: rack.id.clone(),
        rack_name: rack.name.clone(),
        event_type: EventType::FanBoost,
        cause: format!("Manual intervention requested for {temp_before:.1}°C"),
        action_taken: "Manual fan boost to 85% for 90 seconds".to_string(),
        outcome: format!("Temperature reduced to {temp_after:.1}°C"),
        energy_delta,
        cost_delta: cost_for(energy_delta, rate),
        severity: EventSeverity::Info,
        duration: Some(MANUAL_BOOST_DURATION_S),
        temp_before: Some(temp_before),
        temp_after: Some(temp_after),
    });

    info!(rack = %rack.name, temp_before, temp_after, "manual fan boost applied");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertSeverity;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn setup() -> (Vec<Rack>, TrackerRegistry, EventJournal) {
        let mut rng = Pcg64::seed_from_u64(6);
        let racks = Rack::spawn_grid(2, &mut rng);
        let mut tracking = TrackerRegistry::new();
        for rack in &racks {
            tracking.register(&rack.id, 0, &mut rng);
        }
        (racks, tracking, EventJournal::new(100))
    }

    fn alert_for(rack: &Rack, now_ms: i64) -> Alert {
        Alert {
            id: "alert-1".into(),
            rack_id: rack.id.clone(),
            rack_name: rack.name.clone(),
            severity: AlertSeverity::Critical,
            message: String::new(),
            timestamp: now_ms,
            dismissed: false,
        }
    }

    #[test]
    fn test_auto_remediation_cools_records_and_journals() {
        let (mut racks, mut tracking, mut journal) = setup();
        racks[0].temperature = 33.0;
        racks[0].reclassify();
        let alert = alert_for(&racks[0], 5000);

        assert!(auto_remediate(
            &mut racks,
            &mut tracking,
            &mut journal,
            &alert,
            Some(0.1),
            5000
        ));

        assert!((racks[0].temperature - 31.0).abs() < 1e-9);
        let record = tracking.get(&racks[0].id).unwrap();
        assert_eq!(record.fan_boost_actions.len(), 1);
        assert_eq!(record.fan_boost_actions[0].percent_boost, AUTO_BOOST_PERCENT);
        assert_eq!(record.fan_boost_actions[0].initial_temp, 33.0);
        assert!(record.pending_recovery.is_some());

        assert_eq!(journal.len(), 1);
        let entry = journal.iter().next().unwrap();
        assert_eq!(entry.event_type, EventType::AutoAction);
        assert_eq!(entry.duration, Some(120.0));
        assert!((entry.energy_delta - 0.0025).abs() < 1e-12);
        assert!((entry.cost_delta - 0.00025).abs() < 1e-12);
        assert_eq!(entry.action_taken, "Auto increased fan to 90% for 2 minutes");
        assert_eq!(entry.temp_before, Some(33.0));
        assert_eq!(entry.temp_after, Some(31.0));
    }

    #[test]
    fn test_auto_remediation_skips_unknown_rack() {
        let (mut racks, mut tracking, mut journal) = setup();
        let mut alert = alert_for(&racks[0], 5000);
        alert.rack_id = "rack-404".into();

        assert!(!auto_remediate(
            &mut racks,
            &mut tracking,
            &mut journal,
            &alert,
            None,
            5000
        ));
        assert!(journal.is_empty());
    }

    #[test]
    fn test_manual_boost_records_35_percent_and_90s() {
        let (mut racks, mut tracking, mut journal) = setup();
        racks[1].temperature = 30.0;
        racks[1].reclassify();
        let rack_id = racks[1].id.clone();
        manual_boost(
            &mut racks[1],
            tracking.get_mut(&rack_id).unwrap(),
            &mut journal,
            None,
            7000,
        );

        assert!((racks[1].temperature - 28.0).abs() < 1e-9);
        let record = tracking.get(&rack_id).unwrap();
        assert_eq!(record.fan_boost_actions[0].percent_boost, MANUAL_BOOST_PERCENT);

        let entry = journal.iter().next().unwrap();
        assert_eq!(entry.event_type, EventType::FanBoost);
        assert_eq!(entry.duration, Some(90.0));
        assert!((entry.energy_delta - 0.00025).abs() < 1e-12);
        assert_eq!(entry.cost_delta, 0.0);
        assert_eq!(entry.action_taken, "Manual fan boost to 85% for 90 seconds");
    }
}
