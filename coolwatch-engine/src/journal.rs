//! Append-only causal event journal, bounded FIFO.
//!
//! Entries describe what happened, why, what was done and what resulted,
//! with the energy and cost attributed to the event. They are immutable
//! once appended and only ever leave by capacity eviction.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Nombre d'entrées conservées par défaut
pub const DEFAULT_JOURNAL_CAP: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Overheat,
    FanBoost,
    AutoAction,
    TempRecovery,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Overheat => write!(f, "Overheat"),
            EventType::FanBoost => write!(f, "FanBoost"),
            EventType::AutoAction => write!(f, "AutoAction"),
            EventType::TempRecovery => write!(f, "TempRecovery"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for EventSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSeverity::Info => write!(f, "info"),
            EventSeverity::Warning => write!(f, "warning"),
            EventSeverity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: String,
    pub timestamp: i64,
    pub rack_id: String,
    pub rack_name: String,
    pub event_type: EventType,
    pub cause: String,
    pub action_taken: String,
    pub outcome: String,
    pub energy_delta: f64, // kWh
    pub cost_delta: f64,
    pub severity: EventSeverity,
    pub duration: Option<f64>, // seconds
    pub temp_before: Option<f64>,
    pub temp_after: Option<f64>,
}

impl EventLogEntry {
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Totaux agrégés sur le journal courant
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EventStats {
    pub total_events: usize,
    pub total_energy: f64,
    pub total_cost: f64,
    pub critical_events: usize,
    pub warning_events: usize,
}

#[derive(Debug, Clone)]
pub struct EventJournal {
    entries: VecDeque<EventLogEntry>,
    cap: usize,
}

impl EventJournal {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap.min(DEFAULT_JOURNAL_CAP)),
            cap: cap.max(1),
        }
    }

    /// Appends an entry, evicting the oldest once the cap is reached.
    pub fn push(&mut self, entry: EventLogEntry) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventLogEntry> {
        self.entries.iter()
    }

    /// The most recent `limit` entries, oldest first.
    pub fn tail(&self, limit: usize) -> Vec<EventLogEntry> {
        self.entries
            .iter()
            .skip(self.entries.len().saturating_sub(limit))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> EventStats {
        EventStats {
            total_events: self.entries.len(),
            total_energy: self.entries.iter().map(|entry| entry.energy_delta).sum(),
            total_cost: self.entries.iter().map(|entry| entry.cost_delta).sum(),
            critical_events: self
                .entries
                .iter()
                .filter(|entry| entry.severity == EventSeverity::Critical)
                .count(),
            warning_events: self
                .entries
                .iter()
                .filter(|entry| entry.severity == EventSeverity::Warning)
                .count(),
        }
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize, severity: EventSeverity) -> EventLogEntry {
        EventLogEntry {
            id: format!("entry-{n}"),
            timestamp: n as i64,
            rack_id: "rack-0".into(),
            rack_name: "Rack A1".into(),
            event_type: EventType::Overheat,
            cause: "Temperature rose".into(),
            action_taken: "Alert generated".into(),
            outcome: "Flagged".into(),
            energy_delta: 0.05,
            cost_delta: 0.005,
            severity,
            duration: None,
            temp_before: Some(27.0),
            temp_after: Some(29.0),
        }
    }

    #[test]
    fn test_fifo_eviction_keeps_most_recent() {
        let mut journal = EventJournal::new(3);
        for n in 0..5 {
            journal.push(entry(n, EventSeverity::Info));
        }
        assert_eq!(journal.len(), 3);
        let ids: Vec<_> = journal.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["entry-2", "entry-3", "entry-4"]);
    }

    #[test]
    fn test_tail_returns_newest_in_order() {
        let mut journal = EventJournal::new(10);
        for n in 0..6 {
            journal.push(entry(n, EventSeverity::Info));
        }
        let tail = journal.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].id, "entry-4");
        assert_eq!(tail[1].id, "entry-5");
        assert_eq!(journal.tail(100).len(), 6);
    }

    #[test]
    fn test_stats_totals_and_severity_counts() {
        let mut journal = EventJournal::new(10);
        journal.push(entry(0, EventSeverity::Warning));
        journal.push(entry(1, EventSeverity::Critical));
        journal.push(entry(2, EventSeverity::Info));

        let stats = journal.stats();
        assert_eq!(stats.total_events, 3);
        assert!((stats.total_energy - 0.15).abs() < 1e-12);
        assert!((stats.total_cost - 0.015).abs() < 1e-12);
        assert_eq!(stats.critical_events, 1);
        assert_eq!(stats.warning_events, 1);
    }

    #[test]
    fn test_event_type_serializes_to_exact_names() {
        assert_eq!(
            serde_json::to_string(&EventType::AutoAction).unwrap(),
            "\"AutoAction\""
        );
        assert_eq!(
            serde_json::to_string(&EventType::TempRecovery).unwrap(),
            "\"TempRecovery\""
        );
        assert_eq!(
            serde_json::to_string(&EventSeverity::Warning).unwrap(),
            "\"warning\""
        );
    }
}
