//! The cooling set and the scale-up hysteresis counter.
//!
//! Both are written by the Autoscaler during its tick and by the Reaper
//! during its own 1 Hz walk, so they share one mutex — guarding each
//! Autoscaler tick's decision phase and each Reaper tick's TTL sweep
//! against each other is simpler and cheaper than per-function locks for
//! data this small.

use std::collections::HashMap;
use tokio::sync::Mutex;

/// `function -> (slot name -> ttl_ticks)` plus `function -> consecutive_high_ticks`.
#[derive(Default)]
struct State {
    cooling: HashMap<String, HashMap<String, u32>>,
    grow_counter: HashMap<String, u32>,
}

/// Shared autoscaler bookkeeping: the cooling set and the grow counter.
#[derive(Default)]
pub struct AutoscalerState {
    state: Mutex<State>,
}

impl AutoscalerState {
    /// Construct empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to both maps. Used by the Autoscaler
    /// to hold the lock across its whole per-function decision, and by the
    /// Reaper to hold it across its whole TTL sweep.
    pub async fn with_state<R>(&self, f: impl FnOnce(&mut AutoscalerStateGuard) -> R) -> R {
        let mut guard = self.state.lock().await;
        let mut wrapper = AutoscalerStateGuard { inner: &mut guard };
        f(&mut wrapper)
    }
}

/// Mutable access to the cooling set and grow counter within a locked
/// section.
pub struct AutoscalerStateGuard<'a> {
    inner: &'a mut State,
}

impl AutoscalerStateGuard<'_> {
    /// `function`'s cooling map (slot -> ttl_ticks), empty if none.
    pub fn cooling_of(&self, function: &str) -> HashMap<String, u32> {
        self.inner.cooling.get(function).cloned().unwrap_or_default()
    }

    /// Add `slot` to `function`'s cooling set with `ttl_ticks`.
    pub fn cool(&mut self, function: &str, slot: &str, ttl_ticks: u32) {
        self.inner
            .cooling
            .entry(function.to_string())
            .or_default()
            .insert(slot.to_string(), ttl_ticks);
    }

    /// Remove `slot` from `function`'s cooling set (used on rescue and on
    /// Reaper expiry). Prunes the function's key if it becomes empty.
    pub fn uncool(&mut self, function: &str, slot: &str) {
        if let Some(slots) = self.inner.cooling.get_mut(function) {
            slots.remove(slot);
            if slots.is_empty() {
                self.inner.cooling.remove(function);
            }
        }
    }

    /// Pick any one slot currently cooling under `function`, or `None` if
    /// none are cooling. Used by the scale-up reuse path: the source
    /// samples randomly, but since every cooling slot is an equally valid
    /// reuse candidate, picking any element is equivalent and avoids
    /// conflating the sampled value with the set's keys.
    pub fn any_cooling(&self, function: &str) -> Option<String> {
        self.inner
            .cooling
            .get(function)
            .and_then(|slots| slots.keys().next().cloned())
    }

    /// Decrement the TTL of every cooling worker by one tick. Returns the
    /// `(function, slot)` pairs whose TTL just reached zero.
    pub fn tick_ttls(&mut self) -> Vec<(String, String)> {
        let mut expired = Vec::new();
        for (function, slots) in self.inner.cooling.iter_mut() {
            for (slot, ttl) in slots.iter_mut() {
                *ttl = ttl.saturating_sub(1);
                if *ttl == 0 {
                    expired.push((function.clone(), slot.clone()));
                }
            }
        }
        expired
    }

    /// Current grow counter for `function` (0 if never incremented).
    pub fn grow_counter(&self, function: &str) -> u32 {
        self.inner.grow_counter.get(function).copied().unwrap_or(0)
    }

    /// Increment `function`'s grow counter by one.
    pub fn incr_grow_counter(&mut self, function: &str) {
        *self.inner.grow_counter.entry(function.to_string()).or_insert(0) += 1;
    }

    /// Reset `function`'s grow counter to zero.
    pub fn reset_grow_counter(&mut self, function: &str) {
        self.inner.grow_counter.insert(function.to_string(), 0);
    }
}
