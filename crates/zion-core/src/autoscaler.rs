//! The Autoscaler: threshold-based scale up/down with hysteresis, and the
//! Reaper subtask that reclaims cooling workers on TTL expiry.

use crate::config::SupervisorConfig;
use crate::cooling::AutoscalerState;
use crate::dispatcher::Dispatcher;
use crate::monitoring::MonitoringTable;
use crate::pool::SupervisorSpawner;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zion_common::{FunctionName, SlotName};
use zion_store::CoordinationStore;

enum GrowAction {
    None,
    Reuse(String),
    StartFresh,
}

enum CoolAction {
    None,
    Cool(String),
}

/// One function's decision for a tick, computed while holding the shared
/// cooling/grow-counter lock. IO (store writes, Dispatcher calls) happens
/// after the lock is released.
struct Decision {
    grow: GrowAction,
    cool: CoolAction,
    rescued: Vec<String>,
}

/// Drives per-function scale up/down decisions once per tick.
pub struct Autoscaler {
    monitoring: Arc<MonitoringTable>,
    state: Arc<AutoscalerState>,
    store: Arc<dyn CoordinationStore>,
    dispatcher: Arc<Dispatcher>,
    config: Arc<SupervisorConfig>,
}

impl Autoscaler {
    /// Construct an Autoscaler sharing the monitoring table, cooling/grow
    /// state, coordination store, Dispatcher, and config with the rest of
    /// the supervisor.
    pub fn new(
        monitoring: Arc<MonitoringTable>,
        state: Arc<AutoscalerState>,
        store: Arc<dyn CoordinationStore>,
        dispatcher: Arc<Dispatcher>,
        config: Arc<SupervisorConfig>,
    ) -> Self {
        Self {
            monitoring,
            state,
            store,
            dispatcher,
            config,
        }
    }

    /// Run one tick: inspect every function in the monitoring table and
    /// adjust its active worker count.
    pub async fn tick(&self) {
        let snapshot = self.monitoring.snapshot().await;
        for (function, workers) in snapshot {
            self.tick_function(&function, &workers).await;
        }
    }

    async fn tick_function(&self, function: &str, workers: &std::collections::HashMap<String, f64>) {
        let mut sorted: Vec<(String, f64)> = workers.iter().map(|(k, v)| (k.clone(), *v)).collect();
        sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

        let decision = self
            .state
            .with_state(|s| {
                let mut function_cpu = 0.0;
                let mut active = 0u32;
                let mut last_active: Option<String> = None;
                let mut rescued = Vec::new();
                let cooling = s.cooling_of(function);

                for (slot, cpu) in &sorted {
                    let is_cooling = cooling.contains_key(slot);
                    if is_cooling {
                        if active == 0 && *cpu > self.config.low {
                            s.uncool(function, slot);
                            rescued.push(slot.clone());
                            function_cpu += cpu;
                            active += 1;
                            last_active = Some(slot.clone());
                        }
                    } else {
                        function_cpu += cpu;
                        active += 1;
                        last_active = Some(slot.clone());
                    }
                }

                if active == 0 {
                    return Decision {
                        grow: GrowAction::None,
                        cool: CoolAction::None,
                        rescued,
                    };
                }

                let mean = function_cpu / active as f64;

                if mean > self.config.high {
                    let grow = if s.grow_counter(function) >= self.config.timeout_to_grow_up {
                        s.reset_grow_counter(function);
                        match s.any_cooling(function) {
                            Some(slot) => {
                                s.uncool(function, &slot);
                                GrowAction::Reuse(slot)
                            }
                            None => GrowAction::StartFresh,
                        }
                    } else {
                        s.incr_grow_counter(function);
                        GrowAction::None
                    };
                    return Decision {
                        grow,
                        cool: CoolAction::None,
                        rescued,
                    };
                }

                s.reset_grow_counter(function);

                let cool = if active > 1 && function_cpu < (active - 1) as f64 * self.config.high {
                    CoolAction::Cool(last_active.clone().expect("active > 1 implies a last_active"))
                } else if active == 1 && mean < self.config.low {
                    CoolAction::Cool(last_active.expect("active == 1 implies a last_active"))
                } else {
                    CoolAction::None
                };

                Decision {
                    grow: GrowAction::None,
                    cool,
                    rescued,
                }
            })
            .await;

        for slot in &decision.rescued {
            debug!(function, slot, "rescuing cooling worker back to active");
            if let Err(e) = self.store.zadd(&format!("workers:{function}"), slot, 0.0).await {
                warn!(function, slot, error = %e, "failed to re-register rescued worker");
            }
        }

        match decision.grow {
            GrowAction::None => {}
            GrowAction::Reuse(slot) => {
                info!(function, slot, "scale-up: reusing cooling worker");
                if let Err(e) = self.store.zadd(&format!("workers:{function}"), &slot, 0.0).await {
                    warn!(function, slot, error = %e, "failed to re-register reused worker");
                }
            }
            GrowAction::StartFresh => {
                info!(function, "scale-up: starting a fresh worker");
                let name = FunctionName::new(function);
                if let Err(e) = self.dispatcher.start_worker(&name).await {
                    warn!(function, error = %e, "scale-up dispatch failed");
                }
            }
        }

        if let CoolAction::Cool(slot) = decision.cool {
            info!(function, slot, "scaling down: cooling worker");
            if let Err(e) = self.store.zrem(&format!("workers:{function}"), &slot).await {
                warn!(function, slot, error = %e, "failed to remove cooling worker from workers set");
            }
            self.state
                .with_state(|s| s.cool(function, &slot, self.config.worker_timeout_ticks))
                .await;
        }
    }
}

/// Walks the cooling set once per tick, reclaiming workers whose TTL has
/// reached zero: stops the old Sandbox Supervisor, then rebuilds a fresh
/// one on the same slot id (which re-registers the slot into
/// `available_dockers`).
pub struct Reaper {
    state: Arc<AutoscalerState>,
    spawner: SupervisorSpawner,
}

impl Reaper {
    /// Construct a Reaper sharing the cooling/grow state and supervisor
    /// spawner with the Autoscaler and Pool Manager.
    pub fn new(state: Arc<AutoscalerState>, spawner: SupervisorSpawner) -> Self {
        Self { state, spawner }
    }

    /// Run one TTL sweep.
    pub async fn tick(&self) {
        let expired = self.state.with_state(|s| s.tick_ttls()).await;

        for (function, slot_name) in expired {
            let Some(slot_id) = SlotName::new(&slot_name).parse_slot_id() else {
                warn!(slot = %slot_name, "reaper: expired slot has malformed name, dropping");
                continue;
            };

            info!(function = %function, slot = %slot_name, "reaper: worker timeout, recycling slot");

            if let Some(supervisor) = self.spawner.slots().get(slot_id).await {
                supervisor.stop("worker timeout").await;
            }

            self.state
                .with_state(|s| s.uncool(&function, &slot_name))
                .await;

            self.spawner.spawn(slot_id).await;
        }
    }
}
