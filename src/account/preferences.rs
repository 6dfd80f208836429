use tracing::debug;

use crate::form::request::{FieldValue, Method};
use crate::form::response::SubmissionResponse;
use crate::pipeline::submit::{FormPipeline, Trigger};
use crate::surface::surface::{ControlId, Surface};

pub const SAVE_BUTTON: &str = "save-preferences-btn";

/// Select inputs, sent only when they hold a value.
pub const CHOICE_FIELDS: [&str; 3] = ["language", "timezone", "date_format"];

pub const DARK_MODE: &str = "dark_mode";

/// Notification toggles; a toggle missing from the page counts as off.
pub const NOTIFICATION_TOGGLES: [&str; 5] = [
    "email_notifications",
    "sms_notifications",
    "billing_reminders",
    "service_updates",
    "promotional_offers",
];

pub fn trigger() -> Trigger {
    Trigger::new(SAVE_BUTTON)
        .with_busy_label("Saving...")
        .with_failure_message("Error updating preferences")
}

pub fn collect(surface: &dyn Surface) -> Vec<(String, FieldValue)> {
    let mut fields = Vec::new();

    for name in CHOICE_FIELDS {
        if let Some(value) = surface.read_field(name).filter(|v| !v.is_blank()) {
            fields.push((name.to_string(), value));
        }
    }

    if let Some(dark_mode) = surface.read_field(DARK_MODE) {
        fields.push((DARK_MODE.to_string(), FieldValue::Flag(dark_mode.is_checked())));
    }

    for name in NOTIFICATION_TOGGLES {
        let checked = surface
            .read_field(name)
            .is_some_and(|value| value.is_checked());
        fields.push((name.to_string(), FieldValue::Flag(checked)));
    }

    fields
}

/// Save every preference on the page at once.
pub async fn update_preferences(pipeline: &FormPipeline) -> SubmissionResponse {
    let fields = collect(pipeline.surface().as_ref());
    let endpoint = pipeline.context().endpoints().update_preferences.clone();
    pipeline
        .submit_fields(&trigger(), &endpoint, Method::Post, fields)
        .await
}

/// Save from a debounced change. If the previous save is still in flight
/// this one waits for it rather than being dropped.
async fn save_latest(pipeline: &FormPipeline) -> SubmissionResponse {
    let trigger = trigger();
    let endpoint = pipeline.context().endpoints().update_preferences.clone();
    let fields = collect(pipeline.surface().as_ref());

    match pipeline.request(&endpoint, Method::Post, fields) {
        Ok(request) => pipeline.submit_when_idle(&trigger, request).await,
        Err(e) => pipeline.unsendable(&trigger, e),
    }
}

/// A toggle or dropdown changed. Saves once the page has been quiet for
/// the debounce delay; all preference inputs share one timer.
pub fn preference_changed(pipeline: &FormPipeline) {
    let saver = pipeline.clone();
    debug!("preference change queued");
    pipeline
        .context()
        .debouncer()
        .schedule(ControlId::new(SAVE_BUTTON), move || async move {
            save_latest(&saver).await;
        });
}
