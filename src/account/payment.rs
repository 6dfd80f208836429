use tracing::warn;

use crate::form::request::{FieldValue, Method};
use crate::form::response::{Status, SubmissionResponse};
use crate::pipeline::submit::{ALREADY_BUSY, FormPipeline, Trigger};
use crate::surface::surface::Navigation;

pub fn trigger(plan_id: u64) -> Trigger {
    Trigger::new(format!("pay-plan-{}", plan_id))
        .with_busy_label("Redirecting...")
        .with_failure_message("Error initiating payment")
}

/// Ask the server to open a payment for `plan_id` and hand the page over
/// to the payment provider.
///
/// The server answers success with a `payment_url` and no message, so this
/// does its own reporting instead of the pipeline's.
pub async fn initiate_payment(pipeline: &FormPipeline, plan_id: u64) -> SubmissionResponse {
    let trigger = trigger(plan_id);
    let endpoint = pipeline.context().endpoints().initiate_payment_url(plan_id);

    let request = match pipeline.request(&endpoint, Method::Post, Vec::<(String, FieldValue)>::new()) {
        Ok(request) => request,
        Err(e) => return pipeline.unsendable(&trigger, e),
    };

    let Some(reply) = pipeline.exchange(&trigger, &request).await else {
        return SubmissionResponse::new(Status::Info, ALREADY_BUSY);
    };
    let response = reply.response;

    match response.status {
        Status::Success => match response.extra_str("payment_url") {
            Some(url) => pipeline.navigate_now(Navigation::Url(url.to_string())),
            None => {
                warn!(plan_id, "payment initiated without a payment_url");
                pipeline.notify(trigger.failure_message.clone(), Status::Error);
            }
        },
        Status::Error if reply.synthetic => {
            pipeline.notify(response.message.clone(), Status::Error);
        }
        Status::Error if response.message.trim().is_empty() => {
            pipeline.notify(trigger.failure_message.clone(), Status::Error);
        }
        Status::Error => {
            pipeline.notify(format!("Failed to initiate payment: {}", response.message), Status::Error);
        }
        Status::Info => {
            if !response.message.trim().is_empty() {
                pipeline.notify(response.message.clone(), Status::Info);
            }
        }
    }

    response
}
