use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::form::error::FormError;
use crate::form::request::{FieldValue, Method, SubmissionRequest};
use crate::form::response::{Status, SubmissionResponse};
use crate::notify::notification::{NotificationHandle, Notifier};
use crate::pipeline::context::SessionContext;
use crate::pipeline::transport::Transport;
use crate::surface::surface::{ControlId, ControlState, Navigation, Surface};
use crate::trace::trace::SubmissionTrace;

pub const DEFAULT_BUSY_LABEL: &str = "Processing...";
pub const GENERIC_FAILURE: &str = "An error occurred. Please try again.";
pub const ALREADY_BUSY: &str = "A submission is already in progress.";

/// The control a submission is attributed to, and how it reports itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub control: ControlId,
    pub busy_label: String,
    pub failure_message: String,
}

impl Trigger {
    pub fn new(control: impl Into<ControlId>) -> Self {
        Self {
            control: control.into(),
            busy_label: DEFAULT_BUSY_LABEL.to_string(),
            failure_message: GENERIC_FAILURE.to_string(),
        }
    }

    pub fn with_busy_label(mut self, label: impl Into<String>) -> Self {
        self.busy_label = label.into();
        self
    }

    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }
}

/// A page form marked for AJAX submission: where it posts and which fields
/// it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct AjaxForm {
    pub endpoint: String,
    pub method: Method,
    pub fields: Vec<String>,
}

impl AjaxForm {
    pub fn post(endpoint: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Post,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Busy,
    /// A redirect is scheduled; the page is about to unload.
    Navigating,
}

/// Submits forms without a page reload and reports the outcome.
///
/// Cheap to clone; clones share the session context and surface.
#[derive(Clone)]
pub struct FormPipeline {
    context: Arc<SessionContext>,
    surface: Arc<dyn Surface>,
    transport: Arc<dyn Transport>,
    notifier: Notifier,
}

impl FormPipeline {
    pub fn new(
        context: Arc<SessionContext>,
        surface: Arc<dyn Surface>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let notifier = Notifier::with_display(Arc::clone(&surface), context.timings().notification());
        Self {
            context,
            surface,
            transport,
            notifier,
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    pub fn state(&self, control: &ControlId) -> PipelineState {
        if self.context.is_busy(control) {
            PipelineState::Busy
        } else if self.context.navigation_pending() {
            PipelineState::Navigating
        } else {
            PipelineState::Idle
        }
    }

    pub fn notify(&self, message: impl Into<String>, kind: Status) -> NotificationHandle {
        self.notifier.notify(message, kind)
    }

    /// Send `request`, show the outcome and follow a success redirect.
    ///
    /// Never fails: network errors and unreadable replies come back as a
    /// synthetic `error` response. A control that is already submitting is
    /// left alone and an `info` response is returned without any request.
    pub async fn submit(&self, trigger: &Trigger, request: SubmissionRequest) -> SubmissionResponse {
        match self.exchange(trigger, &request).await {
            Some(reply) => {
                self.report(trigger, &reply.response);
                reply.response
            }
            None => SubmissionResponse::new(Status::Info, ALREADY_BUSY),
        }
    }

    /// Like [`submit`](Self::submit), but a control that is still busy is
    /// waited for instead of skipped, so the request is always sent.
    pub async fn submit_when_idle(
        &self,
        trigger: &Trigger,
        request: SubmissionRequest,
    ) -> SubmissionResponse {
        loop {
            if self.context.is_busy(&trigger.control) {
                info!(control = %trigger.control, "previous submission in flight, queueing");
                self.context.wait_until_idle(&trigger.control).await;
            }
            if let Some(reply) = self.exchange(trigger, &request).await {
                self.report(trigger, &reply.response);
                return reply.response;
            }
        }
    }

    /// Submit explicit fields to `endpoint` with the session token.
    pub async fn submit_fields<I, K, V>(
        &self,
        trigger: &Trigger,
        endpoint: &str,
        method: Method,
        fields: I,
    ) -> SubmissionResponse
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        match self.request(endpoint, method, fields) {
            Ok(request) => self.submit(trigger, request).await,
            Err(e) => self.unsendable(trigger, e),
        }
    }

    /// Read the form's fields off the surface and submit them.
    pub async fn submit_form(&self, trigger: &Trigger, form: &AjaxForm) -> SubmissionResponse {
        let fields: Vec<(String, FieldValue)> = form
            .fields
            .iter()
            .filter_map(|name| self.surface.read_field(name).map(|value| (name.clone(), value)))
            .collect();

        self.submit_fields(trigger, &form.endpoint, form.method, fields).await
    }

    pub(crate) fn request<I, K, V>(
        &self,
        endpoint: &str,
        method: Method,
        fields: I,
    ) -> Result<SubmissionRequest, FormError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        SubmissionRequest::builder(endpoint)
            .method(method)
            .fields(fields)
            .build(self.context.token())
    }

    /// Report a request that could not even be built.
    pub(crate) fn unsendable(&self, trigger: &Trigger, error: FormError) -> SubmissionResponse {
        warn!(control = %trigger.control, error = %error, "submission not sent");
        let response = SubmissionResponse::failure(trigger.failure_message.clone());
        self.report(trigger, &response);
        response
    }

    /// Busy the trigger, send, parse, restore. None when the trigger was
    /// already busy.
    pub(crate) async fn exchange(
        &self,
        trigger: &Trigger,
        request: &SubmissionRequest,
    ) -> Option<Reply> {
        if !self.context.begin(&trigger.control) {
            debug!(control = %trigger.control, "submission ignored, control is busy");
            return None;
        }

        let busy = BusyGuard::acquire(self, &trigger.control, &trigger.busy_label);
        let started = Instant::now();
        let trace = SubmissionTrace::start(&trigger.control, request.endpoint(), request.method());

        let outcome = match self.transport.send(request).await {
            Ok(body) => SubmissionResponse::from_body(&body),
            Err(e) => Err(e),
        };

        busy.release();

        let reply = match outcome {
            Ok(response) => {
                trace.with_response(&response).with_elapsed(started.elapsed()).emit();
                Reply {
                    response,
                    synthetic: false,
                }
            }
            Err(e) => {
                let response = SubmissionResponse::failure(trigger.failure_message.clone());
                trace
                    .with_response(&response)
                    .with_failure(&e)
                    .with_elapsed(started.elapsed())
                    .emit();
                Reply {
                    response,
                    synthetic: true,
                }
            }
        };

        Some(reply)
    }

    /// Show the response and schedule its redirect, if any.
    ///
    /// An error without a message still gets a banner, worded with the
    /// trigger's failure text.
    pub(crate) fn report(&self, trigger: &Trigger, response: &SubmissionResponse) {
        if !response.message.trim().is_empty() {
            self.notifier.notify(response.message.clone(), response.status);
        } else if response.status == Status::Error {
            self.notifier.notify(trigger.failure_message.clone(), Status::Error);
        }

        if response.is_success() {
            if let Some(target) = response.redirect_target() {
                self.navigate_after(
                    Navigation::Url(target.to_string()),
                    self.context.timings().redirect_delay(),
                );
            }
        }
    }

    /// Navigate once `delay` has passed, leaving time to read the banner.
    pub fn navigate_after(&self, target: Navigation, delay: Duration) {
        let surface = Arc::clone(&self.surface);
        debug!(target = ?target, delay_ms = delay.as_millis() as u64, "navigation scheduled");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            surface.navigate(&target);
        });
        self.context.set_navigation(handle);
    }

    pub fn navigate_now(&self, target: Navigation) {
        self.surface.navigate(&target);
    }
}

/// Settled exchange. `synthetic` marks a response made up locally after a
/// network or parse failure.
pub(crate) struct Reply {
    pub response: SubmissionResponse,
    pub synthetic: bool,
}

/// Holds a control in its busy state; restores it on release or drop.
struct BusyGuard<'a> {
    pipeline: &'a FormPipeline,
    control: &'a ControlId,
    prior: Option<ControlState>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(pipeline: &'a FormPipeline, control: &'a ControlId, busy_label: &str) -> Self {
        let prior = pipeline.surface.set_busy(control, busy_label);
        Self {
            pipeline,
            control,
            prior: Some(prior),
        }
    }

    fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if let Some(prior) = self.prior.take() {
            self.pipeline.surface.clear_busy(self.control, prior);
            self.pipeline.context.finish(self.control);
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}
