use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use account_forms::form::error::FormError;
use account_forms::form::request::{FieldValue, SubmissionRequest};
use account_forms::form::response::Status;
use account_forms::notify::notification::{Notification, NotificationId};
use account_forms::pipeline::transport::Transport;
use account_forms::surface::surface::{ControlId, ControlState, Navigation, Surface};

// =========================================================================
// Recording surface
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Busy { control: String, label: String },
    Restored { control: String, state: ControlState },
    Shown { id: NotificationId, message: String, kind: Status },
    Removed(NotificationId),
    Navigated(Navigation),
    Confirm(String),
    Text { element: String, text: String },
}

pub struct FakeSurface {
    fields: Mutex<HashMap<String, FieldValue>>,
    controls: Mutex<HashMap<ControlId, ControlState>>,
    visible: Mutex<BTreeMap<NotificationId, (String, Status)>>,
    events: Mutex<Vec<(Instant, SurfaceEvent)>>,
    confirm_answer: AtomicBool,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            fields: Mutex::new(HashMap::new()),
            controls: Mutex::new(HashMap::new()),
            visible: Mutex::new(BTreeMap::new()),
            events: Mutex::new(Vec::new()),
            confirm_answer: AtomicBool::new(true),
        }
    }

    pub fn with_field(self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.lock().unwrap().insert(name.to_string(), value.into());
        self
    }

    pub fn with_control(self, control: &str, state: ControlState) -> Self {
        self.controls.lock().unwrap().insert(ControlId::new(control), state);
        self
    }

    pub fn declining(self) -> Self {
        self.confirm_answer.store(false, Ordering::SeqCst);
        self
    }

    fn record(&self, event: SurfaceEvent) {
        self.events.lock().unwrap().push((Instant::now(), event));
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn timed_events(&self) -> Vec<(Instant, SurfaceEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn control(&self, control: &str) -> ControlState {
        self.controls
            .lock()
            .unwrap()
            .get(&ControlId::new(control))
            .cloned()
            .unwrap_or_else(|| ControlState::enabled(control))
    }

    /// Banners currently on screen, oldest first.
    pub fn visible(&self) -> Vec<(String, Status)> {
        self.visible.lock().unwrap().values().cloned().collect()
    }

    /// Every banner ever shown, in order.
    pub fn shown(&self) -> Vec<(String, Status)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Shown { message, kind, .. } => Some((message, kind)),
                _ => None,
            })
            .collect()
    }

    pub fn removals(&self) -> Vec<NotificationId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Removed(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Navigated(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    pub fn navigation_times(&self) -> Vec<Instant> {
        self.timed_events()
            .into_iter()
            .filter_map(|(at, e)| matches!(e, SurfaceEvent::Navigated(_)).then_some(at))
            .collect()
    }
}

impl Surface for FakeSurface {
    fn read_field(&self, name: &str) -> Option<FieldValue> {
        self.fields.lock().unwrap().get(name).cloned()
    }

    fn set_busy(&self, control: &ControlId, busy_label: &str) -> ControlState {
        let prior = self.control(control.as_str());
        self.controls.lock().unwrap().insert(
            control.clone(),
            ControlState {
                label: busy_label.to_string(),
                disabled: true,
            },
        );
        self.record(SurfaceEvent::Busy {
            control: control.to_string(),
            label: busy_label.to_string(),
        });
        prior
    }

    fn clear_busy(&self, control: &ControlId, prior: ControlState) {
        self.controls.lock().unwrap().insert(control.clone(), prior.clone());
        self.record(SurfaceEvent::Restored {
            control: control.to_string(),
            state: prior,
        });
    }

    fn render_notification(&self, id: NotificationId, notification: &Notification) {
        self.visible
            .lock()
            .unwrap()
            .insert(id, (notification.message.clone(), notification.kind));
        self.record(SurfaceEvent::Shown {
            id,
            message: notification.message.clone(),
            kind: notification.kind,
        });
    }

    fn remove_notification(&self, id: NotificationId) {
        self.visible.lock().unwrap().remove(&id);
        self.record(SurfaceEvent::Removed(id));
    }

    fn navigate(&self, target: &Navigation) {
        self.record(SurfaceEvent::Navigated(target.clone()));
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.record(SurfaceEvent::Confirm(prompt.to_string()));
        self.confirm_answer.load(Ordering::SeqCst)
    }

    fn set_text(&self, element: &str, text: &str) {
        self.record(SurfaceEvent::Text {
            element: element.to_string(),
            text: text.to_string(),
        });
    }
}

// =========================================================================
// Scripted transport
// =========================================================================

enum Scripted {
    Body(String),
    Fail(String),
}

/// Answers submissions from a queue and remembers what was sent.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<SubmissionRequest>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn reply_json(self, value: serde_json::Value) -> Self {
        self.reply_body(&value.to_string())
    }

    pub fn reply_body(self, body: &str) -> Self {
        self.replies.lock().unwrap().push_back(Scripted::Body(body.to_string()));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies.lock().unwrap().push_back(Scripted::Fail(message.to_string()));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn sent(&self) -> Vec<SubmissionRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &SubmissionRequest) -> Result<String, FormError> {
        self.sent.lock().unwrap().push(request.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Fail(message)) => Err(FormError::Network {
                endpoint: request.endpoint().to_string(),
                message,
            }),
            None => Err(FormError::Network {
                endpoint: request.endpoint().to_string(),
                message: "no scripted reply".into(),
            }),
        }
    }
}
