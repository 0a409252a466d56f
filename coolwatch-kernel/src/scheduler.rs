/**
 * TICK SCHEDULER - Horloge de simulation du kernel
 *
 * RÔLE : Déclenche l'avancement du moteur à période fixe (2s par défaut).
 * Un tick = une mutation atomique de l'état complet, aucun chevauchement.
 *
 * FONCTIONNEMENT : interval tokio + flag running. Simulation en pause =
 * l'interval continue de battre mais le moteur n'est pas touché ; stopper
 * ne fait qu'arrêter la planification, l'état reste celui du dernier tick.
 */

use std::time::Duration;
use tokio::task;
use tokio::time::MissedTickBehavior;

use crate::state::EngineHandle;

pub fn spawn_tick_loop(handle: EngineHandle) {
    task::spawn(async move {
        let tick_ms = handle.knobs.lock().tick_ms;
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
        // tick en retard = tick sauté, jamais deux ticks accolés
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if !handle.is_running() {
                continue;
            }
            let knobs = *handle.knobs.lock();
            let summary = handle.sim.lock().advance_tick(&knobs);
            if summary.new_alerts > 0 || summary.auto_actions > 0 {
                println!(
                    "[kernel] tick {}: {} alert(s), {} auto action(s)",
                    summary.tick, summary.new_alerts, summary.auto_actions
                );
            }
        }
    });
}
