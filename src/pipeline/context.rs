use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::pipeline::debounce::Debouncer;
use crate::surface::surface::ControlId;

/// Server endpoints the account pages talk to.
///
/// `revoke_session` and `initiate_payment` are templates with an `{id}` /
/// `{plan}` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_update_preferences")]
    pub update_preferences: String,

    #[serde(default = "default_update_billing_address")]
    pub update_billing_address: String,

    #[serde(default = "default_enable_2fa")]
    pub enable_2fa: String,

    #[serde(default = "default_disable_2fa")]
    pub disable_2fa: String,

    #[serde(default = "default_revoke_session")]
    pub revoke_session: String,

    #[serde(default = "default_initiate_payment")]
    pub initiate_payment: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            update_preferences: default_update_preferences(),
            update_billing_address: default_update_billing_address(),
            enable_2fa: default_enable_2fa(),
            disable_2fa: default_disable_2fa(),
            revoke_session: default_revoke_session(),
            initiate_payment: default_initiate_payment(),
        }
    }
}

impl Endpoints {
    pub fn revoke_session_url(&self, session_id: u64) -> String {
        self.revoke_session.replace("{id}", &session_id.to_string())
    }

    pub fn initiate_payment_url(&self, plan_id: u64) -> String {
        self.initiate_payment.replace("{plan}", &plan_id.to_string())
    }

    pub fn two_factor_url(&self, enable: bool) -> &str {
        if enable { &self.enable_2fa } else { &self.disable_2fa }
    }
}

fn default_update_preferences() -> String { "/accounts/update-preferences/".into() }
fn default_update_billing_address() -> String { "/accounts/update-billing-address/".into() }
fn default_enable_2fa() -> String { "/accounts/enable-2fa/".into() }
fn default_disable_2fa() -> String { "/accounts/disable-2fa/".into() }
fn default_revoke_session() -> String { "/accounts/sessions/revoke/{id}/".into() }
fn default_initiate_payment() -> String { "/accounts/paystack/initiate-payment/{plan}/".into() }

/// Fixed delays of the pipeline, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,

    #[serde(default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            notification_ms: default_notification_ms(),
            redirect_delay_ms: default_redirect_delay_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Timings {
    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_notification_ms() -> u64 { 5000 }
fn default_redirect_delay_ms() -> u64 { 1500 }
fn default_debounce_ms() -> u64 { 500 }

/// State of one page session: where to send things, the token to send
/// with them, and the bookkeeping shared by every submission.
pub struct SessionContext {
    endpoints: Endpoints,
    token: String,
    timings: Timings,
    debouncer: Debouncer,
    in_flight: Mutex<HashSet<ControlId>>,
    settled: Notify,
    navigation: Mutex<Option<JoinHandle<()>>>,
}

impl SessionContext {
    pub fn new(endpoints: Endpoints, token: impl Into<String>) -> Self {
        Self::with_timings(endpoints, token, Timings::default())
    }

    pub fn with_timings(endpoints: Endpoints, token: impl Into<String>, timings: Timings) -> Self {
        Self {
            endpoints,
            token: token.into(),
            timings,
            debouncer: Debouncer::new(timings.debounce()),
            in_flight: Mutex::new(HashSet::new()),
            settled: Notify::new(),
            navigation: Mutex::new(None),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Mark `control` as submitting. False if it already is.
    pub(crate) fn begin(&self, control: &ControlId) -> bool {
        match self.in_flight.lock() {
            Ok(mut in_flight) => in_flight.insert(control.clone()),
            Err(poisoned) => poisoned.into_inner().insert(control.clone()),
        }
    }

    pub(crate) fn finish(&self, control: &ControlId) {
        match self.in_flight.lock() {
            Ok(mut in_flight) => in_flight.remove(control),
            Err(poisoned) => poisoned.into_inner().remove(control),
        };
        self.settled.notify_waiters();
    }

    pub fn is_busy(&self, control: &ControlId) -> bool {
        self.in_flight
            .lock()
            .map(|in_flight| in_flight.contains(control))
            .unwrap_or(false)
    }

    /// Wait until `control` has no submission in flight.
    pub async fn wait_until_idle(&self, control: &ControlId) {
        loop {
            // Registered before the check so a finish in between is not missed.
            let settled = self.settled.notified();
            if !self.is_busy(control) {
                return;
            }
            settled.await;
        }
    }

    /// Record a scheduled navigation. The page unloads once it fires, so a
    /// second one replaces the first.
    pub(crate) fn set_navigation(&self, handle: JoinHandle<()>) {
        let mut slot = match self.navigation.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    pub fn navigation_pending(&self) -> bool {
        self.navigation
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// Wait until a scheduled navigation has fired. Returns immediately when
    /// none is scheduled.
    pub async fn wait_for_navigation(&self) {
        let handle = match self.navigation.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
