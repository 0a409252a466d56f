/*!
Harness de scénarios pour le moteur Coolwatch

Facilite l'écriture de tests pilotés:
- Session seedée, horloge logique à origine fixe (pas d'heure murale)
- Intensité 0 par défaut pour que les températures forcées restent en place
- Avance tick par tick, exactement comme le scheduler du kernel
*/

use anyhow::{Context, Result};
use coolwatch_engine::{
    Alert, EngineSettings, EventLogEntry, EventType, SimConfig, SimulationState, TickSummary,
};

/// Origine de l'horloge logique des scénarios (ms epoch, arbitraire)
pub const SCENARIO_EPOCH_MS: i64 = 1_700_000_000_000;

/// Session de simulation pilotée pour les tests.
pub struct ScenarioHarness {
    pub state: SimulationState,
    pub knobs: SimConfig,
}

impl ScenarioHarness {
    /// Grille 4x4 seedée, jitters coupés (intensité 0).
    pub fn new(seed: u64) -> Self {
        Self::with_grid(seed, 4)
    }

    pub fn with_grid(seed: u64, grid_size: usize) -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        let settings = EngineSettings {
            grid_size,
            journal_cap: 200,
            seed: Some(seed),
        };
        Self {
            state: SimulationState::new(settings, SCENARIO_EPOCH_MS),
            knobs: SimConfig {
                intensity_percent: 0.0,
                ..SimConfig::default()
            },
        }
    }

    /// Rétablit le comportement stochastique (curseur d'intensité en %).
    pub fn intensity(mut self, percent: f64) -> Self {
        self.knobs.intensity_percent = percent;
        self
    }

    pub fn auto_mode(mut self, enabled: bool) -> Self {
        self.knobs.auto_mode = enabled;
        self
    }

    pub fn rate(mut self, rate: f64) -> Self {
        self.knobs.electricity_rate = Some(rate);
        self
    }

    /// Force la température d'un rack, classification recalculée.
    pub fn force_temperature(&mut self, rack_idx: usize, temperature: f64) {
        let rack = &mut self.state.racks[rack_idx];
        rack.temperature = temperature;
        rack.reclassify();
    }

    pub fn tick(&mut self) -> TickSummary {
        let summary = self.state.advance_tick(&self.knobs);
        log::debug!(
            "tick {} -> {} alert(s), {} auto action(s)",
            summary.tick,
            summary.new_alerts,
            summary.auto_actions
        );
        summary
    }

    /// N ticks d'affilée; retourne le total d'alertes émises.
    pub fn run_ticks(&mut self, n: usize) -> usize {
        (0..n).map(|_| self.tick().new_alerts).sum()
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.state.alerts.active()
    }

    /// Action opérateur "increase fan" sur une alerte donnée.
    pub fn boost_alert(&mut self, alert_id: &str) -> Result<()> {
        let rate = self.knobs.electricity_rate;
        self.state
            .manual_fan_boost(alert_id, rate)
            .context("manual fan boost failed")
    }

    pub fn events_of_type(&self, event_type: EventType) -> Vec<EventLogEntry> {
        self.state
            .journal
            .iter()
            .filter(|entry| entry.event_type == event_type)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_is_deterministic() {
        let mut a = ScenarioHarness::new(99).intensity(80.0);
        let mut b = ScenarioHarness::new(99).intensity(80.0);
        a.run_ticks(20);
        b.run_ticks(20);
        assert_eq!(a.state.racks[0].temperature, b.state.racks[0].temperature);
        assert_eq!(a.state.journal.len(), b.state.journal.len());
    }

    #[test]
    fn test_forced_temperature_survives_calm_ticks() {
        let mut harness = ScenarioHarness::new(1);
        harness.force_temperature(0, 35.0);
        harness.run_ticks(3);
        assert_eq!(harness.state.racks[0].temperature, 35.0);
    }
}
