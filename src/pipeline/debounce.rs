use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::trace;

use crate::surface::surface::ControlId;

/// Delay before a debounced action fires.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

struct Pending {
    ticket: u64,
    timer: AbortHandle,
}

/// Collapses bursts of events per key into one delayed action.
///
/// Only the waiting timer is ever cancelled. Once an action has fired it
/// runs to completion even if new events arrive for its key.
pub struct Debouncer {
    delay: Duration,
    tickets: AtomicU64,
    pending: Arc<Mutex<HashMap<ControlId, Pending>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            tickets: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action` for `key`, replacing any action still waiting there.
    pub fn schedule<F, Fut>(&self, key: ControlId, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        let fired_key = key.clone();

        let mut map = match self.pending.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Claim the slot; a newer ticket means this timer was superseded.
            {
                let mut map = match pending.lock() {
                    Ok(map) => map,
                    Err(poisoned) => poisoned.into_inner(),
                };
                match map.get(&fired_key) {
                    Some(entry) if entry.ticket == ticket => {
                        map.remove(&fired_key);
                    }
                    _ => return,
                }
            }

            trace!(key = %fired_key, "debounced action fired");
            action().await;
        });

        if let Some(previous) = map.insert(
            key.clone(),
            Pending {
                ticket,
                timer: task.abort_handle(),
            },
        ) {
            previous.timer.abort();
            trace!(key = %key, "pending action superseded");
        }
    }

    /// Drop the waiting action for `key`. Returns whether one was pending.
    pub fn cancel(&self, key: &ControlId) -> bool {
        let mut map = match self.pending.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        match map.remove(key) {
            Some(entry) => {
                entry.timer.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &ControlId) -> bool {
        self.pending
            .lock()
            .map(|map| map.contains_key(key))
            .unwrap_or(false)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_DELAY)
    }
}
