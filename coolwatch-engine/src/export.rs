//! CSV serialization of rack snapshots and the event journal.
//!
//! Free-text cells are quoted (inner quotes doubled) so every journal field
//! survives as a text cell; numeric fields use fixed precisions chosen to
//! round-trip the original values.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::journal::EventLogEntry;
use crate::rack::Rack;

fn rfc3339(timestamp_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(timestamp_ms) * 1_000_000)
        .ok()
        .and_then(|datetime| datetime.format(&Rfc3339).ok())
        .unwrap_or_default()
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Snapshot of the fleet as one CSV row per rack.
pub fn racks_csv(racks: &[Rack], now_ms: i64) -> String {
    let mut out = String::from("Timestamp,Rack ID,Rack Name,Temperature,Humidity,Airflow,Status\n");
    let stamp = rfc3339(now_ms);
    for rack in racks {
        out.push_str(&format!(
            "{},{},{},{:.2},{:.2},{:.2},{}\n",
            stamp,
            rack.id,
            rack.name,
            rack.temperature,
            rack.humidity,
            rack.airflow_delta,
            rack.status.as_str(),
        ));
    }
    out
}

/// The full journal as CSV, oldest entry first.
pub fn journal_csv<'a>(entries: impl Iterator<Item = &'a EventLogEntry>) -> String {
    let mut out = String::from(
        "Timestamp,Rack ID,Rack Name,Event Type,Cause,Action Taken,Outcome,\
         Energy Delta (kWh),Cost Delta ($),Severity,Duration (s),\
         Temp Before (°C),Temp After (°C)\n",
    );
    for entry in entries {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{:.6},{:.4},{},{},{},{}\n",
            rfc3339(entry.timestamp),
            entry.rack_id,
            quote(&entry.rack_name),
            entry.event_type,
            quote(&entry.cause),
            quote(&entry.action_taken),
            quote(&entry.outcome),
            entry.energy_delta,
            entry.cost_delta,
            entry.severity,
            entry
                .duration
                .map(|seconds| format!("{seconds:.1}"))
                .unwrap_or_default(),
            entry
                .temp_before
                .map(|temp| format!("{temp:.1}"))
                .unwrap_or_default(),
            entry
                .temp_after
                .map(|temp| format!("{temp:.1}"))
                .unwrap_or_default(),
        ));
    }
    out
}
