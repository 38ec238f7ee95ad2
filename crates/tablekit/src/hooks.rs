//! Lifecycle hook dispatch.
//!
//! The host fires named events once per run; deferred work (like the
//! upgrade check) registers against an event name and priority.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Boxed future returned by hook callbacks.
pub type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Callback registered against a named lifecycle event.
pub type HookCallback = Arc<dyn Fn() -> HookFuture + Send + Sync>;

/// Registration surface for deferred work.
pub trait LifecycleHooks: Send + Sync {
    /// Register `callback` to run when `event` is dispatched. Lower
    /// priorities run first; ties keep registration order.
    fn register(&self, event: &str, priority: i32, callback: HookCallback);
}

struct HookEntry {
    event: String,
    priority: i32,
    seq: usize,
    callback: HookCallback,
}

/// In-process hook bus.
#[derive(Default)]
pub struct HookBus {
    entries: Mutex<Vec<HookEntry>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire all callbacks registered for `event`, in priority order.
    pub async fn dispatch(&self, event: &str) {
        let mut selected: Vec<(i32, usize, HookCallback)> = {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries
                .iter()
                .filter(|entry| entry.event == event)
                .map(|entry| (entry.priority, entry.seq, entry.callback.clone()))
                .collect()
        };
        selected.sort_by_key(|(priority, seq, _)| (*priority, *seq));

        for (_, _, callback) in selected {
            callback().await;
        }
    }
}

impl LifecycleHooks for HookBus {
    fn register(&self, event: &str, priority: i32, callback: HookCallback) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let seq = entries.len();
        entries.push(HookEntry {
            event: event.to_string(),
            priority,
            seq,
            callback,
        });
    }
}
