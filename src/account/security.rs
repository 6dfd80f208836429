use tracing::debug;

use crate::form::request::{FieldValue, Method};
use crate::form::response::SubmissionResponse;
use crate::pipeline::submit::{FormPipeline, Trigger};
use crate::surface::surface::Navigation;

pub const ENABLE_2FA_PROMPT: &str = "Are you sure you want to enable two-factor authentication?";
pub const DISABLE_2FA_PROMPT: &str =
    "Are you sure you want to disable two-factor authentication? This will reduce your account security.";
pub const REVOKE_PROMPT: &str = "Are you sure you want to revoke this session?";

pub fn two_factor_trigger(enable: bool) -> Trigger {
    let control = if enable { "enable-2fa-btn" } else { "disable-2fa-btn" };
    Trigger::new(control).with_failure_message("Error updating 2FA settings")
}

pub fn revoke_trigger(session_id: u64) -> Trigger {
    Trigger::new(format!("revoke-session-{}", session_id))
        .with_busy_label("Revoking...")
        .with_failure_message("Error revoking session")
}

/// Turn two-factor authentication on or off after confirmation.
///
/// Returns None when the user declines. On success the page reloads after
/// the redirect delay so the security panel reflects the new setting.
pub async fn toggle_two_factor(pipeline: &FormPipeline, enable: bool) -> Option<SubmissionResponse> {
    let prompt = if enable { ENABLE_2FA_PROMPT } else { DISABLE_2FA_PROMPT };
    if !pipeline.surface().confirm(prompt) {
        debug!(enable, "two-factor change declined");
        return None;
    }

    let endpoint = pipeline.context().endpoints().two_factor_url(enable).to_string();
    let response = pipeline
        .submit_fields(&two_factor_trigger(enable), &endpoint, Method::Post, no_fields())
        .await;

    reload_on_success(pipeline, &response);
    Some(response)
}

/// Revoke another login session after confirmation.
pub async fn revoke_session(pipeline: &FormPipeline, session_id: u64) -> Option<SubmissionResponse> {
    if !pipeline.surface().confirm(REVOKE_PROMPT) {
        debug!(session_id, "session revocation declined");
        return None;
    }

    let endpoint = pipeline.context().endpoints().revoke_session_url(session_id);
    let response = pipeline
        .submit_fields(&revoke_trigger(session_id), &endpoint, Method::Post, no_fields())
        .await;

    reload_on_success(pipeline, &response);
    Some(response)
}

fn reload_on_success(pipeline: &FormPipeline, response: &SubmissionResponse) {
    // An explicit redirect was already scheduled by the pipeline.
    if response.is_success() && response.redirect_target().is_none() {
        pipeline.navigate_after(Navigation::Reload, pipeline.context().timings().redirect_delay());
    }
}

fn no_fields() -> Vec<(String, FieldValue)> {
    Vec::new()
}
