/*!
# Coolwatch Engine - Moteur de simulation des racks et dérivation d'événements

Cette crate contient tout le coeur métier de Coolwatch : l'avancement
thermique par tick, le suivi surchauffe/récupération, les alertes,
la remédiation automatique, la comptabilité énergie/coût et le journal
d'événements causal.

FONCTIONNEMENT :
- SimulationState = état unique possédé par l'hôte (kernel ou tests)
- advance_tick() = transition atomique, un seul writer, pas de réentrance
- RNG Pcg64 seedable : même seed + même séquence de ticks = même résultat

UTILITÉ DANS COOLWATCH :
- 🎯 Kernel : le scheduler verrouille l'état, avance d'un tick, publie
- 🎯 Devkit : les scénarios de test pilotent le même état sans timer
- 🎯 Export : snapshots racks + journal sérialisés en CSV
*/

pub mod alerts;
pub mod energy;
pub mod engine;
pub mod export;
pub mod journal;
pub mod rack;
pub mod remediation;
pub mod thermal;
pub mod tracking;
pub mod trends;

pub use alerts::{Alert, AlertBook, AlertSeverity, ALERT_COOLDOWN_MS};
pub use energy::EnergyMeter;
pub use engine::{EngineError, EngineSettings, SimConfig, SimulationState, TickSummary};
pub use journal::{EventJournal, EventLogEntry, EventSeverity, EventStats, EventType};
pub use rack::{Rack, RackStatus};
pub use thermal::ThermalDraw;
pub use tracking::{MaintenancePrediction, MaintenanceStatus, RackStats, TrackerRegistry};
pub use trends::{EfficiencyMetrics, TrendBook};
