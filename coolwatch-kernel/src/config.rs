use coolwatch_engine::{EngineSettings, SimConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct KernelConfig {
    /// Grille carrée de racks (4 => 16 racks)
    pub grid_size: usize,
    pub tick_ms: u64,
    pub journal_cap: usize,
    /// Seed RNG fixe pour sessions reproductibles
    pub seed: Option<u64>,
    pub intensity_percent: f64,
    pub auto_mode: bool,
    /// Tarif électricité (devise par kWh), fourni par le flux externe
    pub electricity_rate: Option<f64>,
    /// Démarre la simulation sans attendre POST /simulation/start
    pub autostart: bool,
    pub mqtt: Option<MqttConf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            grid_size: 4,
            tick_ms: 2000,
            journal_cap: 1000,
            seed: None,
            intensity_percent: 50.0,
            auto_mode: false,
            electricity_rate: None,
            autostart: false,
            mqtt: Some(MqttConf { host: "localhost".into(), port: 1883 }),
        }
    }
}

impl KernelConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            grid_size: self.grid_size,
            journal_cap: self.journal_cap,
            seed: self.seed,
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            intensity_percent: self.intensity_percent.clamp(0.0, 100.0),
            auto_mode: self.auto_mode,
            electricity_rate: self.electricity_rate,
            tick_ms: self.tick_ms,
        }
    }
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("COOLWATCH_KERNEL_CONFIG").unwrap_or_else(|_| "coolwatch.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() { return KernelConfig::default(); }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            eprintln!("[kernel] config invalide: {e}");
            KernelConfig::default()
        })
    } else {
        eprintln!("[kernel] pas de coolwatch.yaml, usage config par défaut");
        KernelConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_falls_back_on_defaults() {
        let cfg: KernelConfig = serde_yaml::from_str("grid_size: 2\nauto_mode: true\n").unwrap();
        assert_eq!(cfg.grid_size, 2);
        assert!(cfg.auto_mode);
        assert_eq!(cfg.tick_ms, 2000);
        assert_eq!(cfg.journal_cap, 1000);
        assert!(cfg.electricity_rate.is_none());
    }

    #[test]
    fn test_intensity_clamped_into_slider_range() {
        let mut cfg = KernelConfig::default();
        cfg.intensity_percent = 250.0;
        assert_eq!(cfg.sim_config().intensity_percent, 100.0);
    }
}
