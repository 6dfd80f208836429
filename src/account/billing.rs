use crate::form::request::{FieldValue, Method};
use crate::form::response::SubmissionResponse;
use crate::pipeline::submit::{FormPipeline, Trigger};
use crate::surface::surface::Surface;

pub const UPDATE_BUTTON: &str = "update-billing-address-btn";
pub const ADDRESS_DISPLAY: &str = "billing-address-display";
pub const ADDRESS_FIELDS: [&str; 5] = ["address", "city", "state", "zip_code", "country"];

pub fn trigger() -> Trigger {
    Trigger::new(UPDATE_BUTTON)
        .with_busy_label("Updating...")
        .with_failure_message("Error updating billing address")
}

/// Non-empty address fields; empty ones leave the stored value alone.
pub fn collect(surface: &dyn Surface) -> Vec<(String, FieldValue)> {
    ADDRESS_FIELDS
        .iter()
        .filter_map(|name| {
            surface
                .read_field(name)
                .filter(|value| !value.is_blank())
                .map(|value| (name.to_string(), value))
        })
        .collect()
}

/// Save the billing address and refresh the displayed copy from the
/// server's formatted version.
pub async fn update_billing_address(pipeline: &FormPipeline) -> SubmissionResponse {
    let fields = collect(pipeline.surface().as_ref());
    let endpoint = pipeline.context().endpoints().update_billing_address.clone();

    let response = pipeline
        .submit_fields(&trigger(), &endpoint, Method::Post, fields)
        .await;

    if response.is_success() {
        if let Some(address) = response.extra_str("billing_address") {
            pipeline.surface().set_text(ADDRESS_DISPLAY, address);
        }
    }

    response
}
