use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::task;

use crate::config::MqttConf;
use crate::state::EngineHandle;

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub ticks_completed: u64,
    pub simulation_running: bool,
    pub racks_tracked: u32,
    pub active_alerts: u32,
    pub journal_entries: u32,
    pub memory_usage_mb: f32,
    pub mqtt_status: String,
    pub mqtt_reconnects: u32,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    mqtt_reconnects: std::sync::Arc<std::sync::atomic::AtomicU32>,
    mqtt_status: std::sync::Arc<parking_lot::Mutex<String>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            mqtt_reconnects: std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0)),
            mqtt_status: std::sync::Arc::new(parking_lot::Mutex::new("connecting".to_string())),
        }
    }

    pub fn mark_mqtt_connected(&self) {
        *self.mqtt_status.lock() = "connected".to_string();
    }

    pub fn increment_reconnects(&self) {
        self.mqtt_reconnects.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        *self.mqtt_status.lock() = "reconnecting".to_string();
    }

    pub fn get_health(&self, handle: &EngineHandle) -> KernelHealth {
        let uptime = self.start_time.elapsed().as_secs();
        let sim = handle.sim.lock();
        KernelHealth {
            uptime_seconds: uptime,
            ticks_completed: sim.tick_count,
            simulation_running: handle.is_running(),
            racks_tracked: sim.tracking.len() as u32,
            active_alerts: sim.alerts.active().len() as u32,
            journal_entries: sim.journal.len() as u32,
            memory_usage_mb: get_memory_usage_mb(),
            mqtt_status: self.mqtt_status.lock().clone(),
            mqtt_reconnects: self.mqtt_reconnects.load(std::sync::atomic::Ordering::Relaxed),
        }
    }

    /// Démarre la publication auto du health kernel sur MQTT
    pub fn spawn_health_publisher(&self, mqtt_cfg: Option<MqttConf>, handle: EngineHandle) {
        let health_tracker = self.clone();

        task::spawn(async move {
            let mqtt_cfg = mqtt_cfg.unwrap_or(MqttConf {
                host: "localhost".into(),
                port: 1883,
            });

            let mut opts = MqttOptions::new("coolwatch-kernel-health", &mqtt_cfg.host, mqtt_cfg.port);
            opts.set_keep_alive(Duration::from_secs(15));

            let (client, mut eventloop) = AsyncClient::new(opts, 10);

            // Boucle principale : publish health toutes les 30s
            let mut interval = tokio::time::interval(Duration::from_secs(30));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let health = health_tracker.get_health(&handle);
                        if let Ok(payload) = serde_json::to_string(&health) {
                            if let Err(e) = client.publish("coolwatch/kernel/health@v1", QoS::AtLeastOnce, false, payload).await {
                                eprintln!("[health] failed to publish: {:?}", e);
                            } else {
                                println!("[health] published kernel health (uptime: {}s, ticks: {})",
                                        health.uptime_seconds, health.ticks_completed);
                            }
                        }
                    },
                    event = eventloop.poll() => {
                        match event {
                            Ok(Event::Incoming(Incoming::ConnAck(_))) => health_tracker.mark_mqtt_connected(),
                            Ok(_) => {}, // Ignore normal MQTT events
                            Err(e) => {
                                eprintln!("[health] MQTT error: {:?}", e);
                                health_tracker.increment_reconnects();
                                tokio::time::sleep(Duration::from_secs(2)).await;
                            }
                        }
                    }
                }
            }
        });
    }
}

fn get_memory_usage_mb() -> f32 {
    // Simple approximation - en production on pourrait utiliser sysinfo
    let pid = std::process::id();

    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string(format!("/proc/{}/status", pid)) {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<u64>() {
                            return (kb as f32) / 1024.0; // KB -> MB
                        }
                    }
                }
            }
        }
    }

    // Fallback approximatif
    12.0
}
