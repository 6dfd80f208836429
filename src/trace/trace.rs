use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::form::response::{Status, SubmissionResponse};
use crate::surface::surface::ControlId;

/// One record per completed submission, emitted as a structured event.
#[derive(Debug, Serialize)]
pub struct SubmissionTrace {
    pub timestamp_ms: u128,
    pub control: String,
    pub endpoint: String,
    pub method: String,

    pub status: Option<Status>,
    pub elapsed_ms: u128,

    pub redirect: Option<String>,
    pub failure: Option<String>,
}

impl SubmissionTrace {
    pub fn start(control: &ControlId, endpoint: &str, method: impl ToString) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            control: control.to_string(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            status: None,
            elapsed_ms: 0,
            redirect: None,
            failure: None,
        }
    }

    pub fn with_response(mut self, response: &SubmissionResponse) -> Self {
        self.status = Some(response.status);
        self.redirect = response.redirect_target().map(str::to_string);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = elapsed.as_millis();
        self
    }

    pub fn with_failure(mut self, failure: impl ToString) -> Self {
        self.failure = Some(failure.to_string());
        self
    }

    /// Log the record: transport/parse failures at warn, everything else at info.
    pub fn emit(&self) {
        let status = self.status.map(|s| s.to_string()).unwrap_or_default();
        let redirect = self.redirect.as_deref().unwrap_or("");

        match &self.failure {
            Some(failure) => warn!(
                control = %self.control,
                endpoint = %self.endpoint,
                method = %self.method,
                elapsed_ms = self.elapsed_ms as u64,
                failure = %failure,
                "submission failed"
            ),
            None => info!(
                control = %self.control,
                endpoint = %self.endpoint,
                method = %self.method,
                status = %status,
                redirect = %redirect,
                elapsed_ms = self.elapsed_ms as u64,
                "submission completed"
            ),
        }
    }
}
