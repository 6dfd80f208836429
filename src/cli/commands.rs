use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::account::{billing, payment, preferences, security};
use crate::cli::config::{Settings, TwoFactorAction};
use crate::form::request::{FieldValue, Method};
use crate::form::response::SubmissionResponse;
use crate::pipeline::context::SessionContext;
use crate::pipeline::submit::{AjaxForm, FormPipeline, Trigger};
use crate::pipeline::transport::HttpTransport;
use crate::surface::terminal::TerminalSurface;

/// Control the generic `submit` command is attributed to.
pub const SUBMIT_CONTROL: &str = "submit";

// ============================================================================
// pipeline construction
// ============================================================================

/// Build a pipeline that talks HTTP and renders to the terminal.
pub fn build_pipeline(
    settings: &Settings,
    page_fields: &[(String, FieldValue)],
    assume_yes: bool,
) -> Result<FormPipeline, Box<dyn std::error::Error>> {
    let token = settings
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or("No anti-forgery token: pass --token or set `token` in the config file")?;

    let transport = HttpTransport::new(settings.base_url.as_deref(), settings.encoding)?;
    let fields: HashMap<String, FieldValue> = page_fields.iter().cloned().collect();
    let surface = TerminalSurface::new(fields, assume_yes);
    let context = SessionContext::with_timings(settings.endpoints.clone(), token, settings.timings);

    Ok(FormPipeline::new(
        Arc::new(context),
        Arc::new(surface),
        Arc::new(transport),
    ))
}

/// Let a scheduled redirect fire before the process exits.
async fn finish(pipeline: &FormPipeline, response: &SubmissionResponse) -> bool {
    pipeline.context().wait_for_navigation().await;
    response.is_success()
}

// ============================================================================
// submit subcommand
// ============================================================================

/// Submit page fields to `endpoint` and return whether the server accepted them.
pub async fn cmd_submit(
    pipeline: &FormPipeline,
    endpoint: &str,
    method: &str,
    send: &[String],
    page_fields: &[(String, FieldValue)],
) -> Result<bool, Box<dyn std::error::Error>> {
    let method = Method::from_str(method)?;
    let names: Vec<&str> = if send.is_empty() {
        page_fields.iter().map(|(name, _)| name.as_str()).collect()
    } else {
        send.iter().map(String::as_str).collect()
    };

    let form = AjaxForm {
        endpoint: endpoint.to_string(),
        method,
        fields: names.iter().map(|name| name.to_string()).collect(),
    };

    info!(endpoint, fields = names.len(), "submitting form");
    let response = pipeline.submit_form(&Trigger::new(SUBMIT_CONTROL), &form).await;
    Ok(finish(pipeline, &response).await)
}

// ============================================================================
// account page subcommands
// ============================================================================

pub async fn cmd_preferences(pipeline: &FormPipeline) -> Result<bool, Box<dyn std::error::Error>> {
    let response = preferences::update_preferences(pipeline).await;
    Ok(finish(pipeline, &response).await)
}

pub async fn cmd_billing(pipeline: &FormPipeline) -> Result<bool, Box<dyn std::error::Error>> {
    let response = billing::update_billing_address(pipeline).await;
    Ok(finish(pipeline, &response).await)
}

pub async fn cmd_two_factor(
    pipeline: &FormPipeline,
    action: TwoFactorAction,
) -> Result<bool, Box<dyn std::error::Error>> {
    let enable = action == TwoFactorAction::Enable;
    match security::toggle_two_factor(pipeline, enable).await {
        Some(response) => Ok(finish(pipeline, &response).await),
        None => {
            eprintln!("Cancelled.");
            Ok(true)
        }
    }
}

pub async fn cmd_revoke_session(
    pipeline: &FormPipeline,
    session_id: u64,
) -> Result<bool, Box<dyn std::error::Error>> {
    match security::revoke_session(pipeline, session_id).await {
        Some(response) => Ok(finish(pipeline, &response).await),
        None => {
            eprintln!("Cancelled.");
            Ok(true)
        }
    }
}

pub async fn cmd_pay(pipeline: &FormPipeline, plan_id: u64) -> Result<bool, Box<dyn std::error::Error>> {
    let response = payment::initiate_payment(pipeline, plan_id).await;
    Ok(response.is_success())
}
