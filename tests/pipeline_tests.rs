use std::sync::Arc;
use std::time::Duration;

use account_forms::form::request::{Method, SubmissionRequest, TOKEN_FIELD};
use account_forms::form::response::Status;
use account_forms::pipeline::context::{Endpoints, SessionContext};
use account_forms::pipeline::submit::{
    ALREADY_BUSY, AjaxForm, FormPipeline, GENERIC_FAILURE, PipelineState, Trigger,
};
use account_forms::surface::surface::{ControlId, ControlState, Navigation};
use serde_json::json;
use tokio::time::Instant;

use crate::common::fakes::{FakeSurface, ScriptedTransport, SurfaceEvent};
use crate::common::{TOKEN, advance, pipeline_with, settle};

mod common;

fn city_request() -> SubmissionRequest {
    SubmissionRequest::builder("/update/")
        .field("city", "Lagos")
        .build(TOKEN)
        .unwrap()
}

// =========================================================================
// Outcome scenarios
// =========================================================================

#[tokio::test(start_paused = true)]
async fn success_shows_message_and_restores_trigger() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(
        ScriptedTransport::new().reply_json(json!({ "status": "success", "message": "Saved" })),
    );
    let pipeline = pipeline_with(&surface, &transport);

    let response = pipeline.submit(&Trigger::new("save"), city_request()).await;

    assert_eq!(response.status, Status::Success);
    assert_eq!(surface.shown(), vec![("Saved".to_string(), Status::Success)]);
    assert_eq!(surface.control("save"), ControlState::enabled("save"));
    assert_eq!(pipeline.state(&ControlId::new("save")), PipelineState::Idle);

    advance(10_000).await;
    assert!(surface.navigations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn network_failure_becomes_generic_error() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().fail("connection refused"));
    let pipeline = pipeline_with(&surface, &transport);

    let response = pipeline.submit(&Trigger::new("save"), city_request()).await;

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.message, GENERIC_FAILURE);
    assert_eq!(surface.shown(), vec![(GENERIC_FAILURE.to_string(), Status::Error)]);
    assert!(!surface.control("save").disabled);

    advance(10_000).await;
    assert!(surface.navigations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn malformed_body_becomes_error_with_trigger_failure_text() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_body("<html>Server Error</html>"));
    let pipeline = pipeline_with(&surface, &transport);

    let trigger = Trigger::new("save").with_failure_message("Error updating preferences");
    let response = pipeline.submit(&trigger, city_request()).await;

    assert_eq!(response.status, Status::Error);
    assert_eq!(
        surface.shown(),
        vec![("Error updating preferences".to_string(), Status::Error)]
    );
    assert!(!surface.control("save").disabled);
}

#[tokio::test(start_paused = true)]
async fn server_error_message_is_shown_as_is() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_json(json!({
        "status": "error",
        "message": "Zip code is invalid",
        "redirect": "/should-not-follow/"
    })));
    let pipeline = pipeline_with(&surface, &transport);

    let response = pipeline.submit(&Trigger::new("save"), city_request()).await;

    assert_eq!(response.message, "Zip code is invalid");
    assert_eq!(surface.shown(), vec![("Zip code is invalid".to_string(), Status::Error)]);

    advance(5000).await;
    assert!(surface.navigations().is_empty(), "redirects are only followed on success");
}

#[tokio::test(start_paused = true)]
async fn success_redirect_navigates_after_delay() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_json(json!({
        "status": "success",
        "message": "Updated",
        "redirect": "/home/"
    })));
    let pipeline = pipeline_with(&surface, &transport);

    let received = Instant::now();
    pipeline.submit(&Trigger::new("save"), city_request()).await;

    assert_eq!(surface.shown(), vec![("Updated".to_string(), Status::Success)]);
    assert_eq!(pipeline.state(&ControlId::new("save")), PipelineState::Navigating);

    advance(1499).await;
    assert!(surface.navigations().is_empty());

    advance(1).await;
    assert_eq!(surface.navigations(), vec![Navigation::Url("/home/".into())]);
    let navigated = surface.navigation_times()[0];
    assert!(navigated - received >= Duration::from_millis(1500));
    assert_eq!(pipeline.state(&ControlId::new("save")), PipelineState::Idle);
}

#[tokio::test(start_paused = true)]
async fn info_status_is_shown_without_navigation() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_json(json!({
        "status": "info",
        "message": "Nothing changed",
        "redirect": "/home/"
    })));
    let pipeline = pipeline_with(&surface, &transport);

    pipeline.submit(&Trigger::new("save"), city_request()).await;

    assert_eq!(surface.shown(), vec![("Nothing changed".to_string(), Status::Info)]);
    advance(2000).await;
    assert!(surface.navigations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_message_shows_no_banner() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_json(json!({ "status": "success" })));
    let pipeline = pipeline_with(&surface, &transport);

    let response = pipeline.submit(&Trigger::new("save"), city_request()).await;

    assert!(response.is_success());
    assert!(surface.shown().is_empty());
}

#[tokio::test(start_paused = true)]
async fn error_without_message_shows_trigger_failure_text() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_json(json!({ "status": "error" })));
    let pipeline = pipeline_with(&surface, &transport);
    let trigger = Trigger::new("save").with_failure_message("Error updating preferences");

    let response = pipeline.submit(&trigger, city_request()).await;

    assert_eq!(response.status, Status::Error);
    assert_eq!(
        surface.shown(),
        vec![("Error updating preferences".to_string(), Status::Error)]
    );
    assert!(!surface.control("save").disabled);
}

#[tokio::test(start_paused = true)]
async fn numeric_redirect_is_ignored_not_a_failure() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_json(json!({
        "status": "success",
        "message": "Saved",
        "redirect": 42
    })));
    let pipeline = pipeline_with(&surface, &transport);

    let response = pipeline.submit(&Trigger::new("save"), city_request()).await;

    assert!(response.is_success());
    assert_eq!(surface.shown(), vec![("Saved".to_string(), Status::Success)]);
    advance(2000).await;
    assert!(surface.navigations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn extra_fields_reach_the_caller() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_json(json!({
        "status": "success",
        "message": "Two-factor authentication enabled successfully!",
        "two_factor_enabled": true
    })));
    let pipeline = pipeline_with(&surface, &transport);

    let response = pipeline.submit(&Trigger::new("enable"), city_request()).await;

    assert_eq!(response.extra.get("two_factor_enabled"), Some(&json!(true)));
}

// =========================================================================
// Busy state
// =========================================================================

#[tokio::test(start_paused = true)]
async fn prior_control_state_is_restored_exactly() {
    let prior = ControlState {
        label: "Save Preferences".into(),
        disabled: false,
    };
    let surface = Arc::new(FakeSurface::new().with_control("save", prior.clone()));
    let transport = Arc::new(
        ScriptedTransport::new().reply_json(json!({ "status": "success", "message": "Saved" })),
    );
    let pipeline = pipeline_with(&surface, &transport);

    let trigger = Trigger::new("save").with_busy_label("Saving...");
    pipeline.submit(&trigger, city_request()).await;

    assert_eq!(surface.control("save"), prior);
    assert_eq!(
        surface.events()[0],
        SurfaceEvent::Busy {
            control: "save".into(),
            label: "Saving...".into()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn control_is_busy_while_request_is_in_flight() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_latency(Duration::from_millis(200))
            .reply_json(json!({ "status": "success", "message": "Saved" })),
    );
    let pipeline = pipeline_with(&surface, &transport);

    let task = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.submit(&Trigger::new("save"), city_request()).await }
    });

    advance(100).await;
    let busy = surface.control("save");
    assert!(busy.disabled);
    assert_eq!(busy.label, "Processing...");
    assert_eq!(pipeline.state(&ControlId::new("save")), PipelineState::Busy);
    assert!(surface.shown().is_empty());

    let response = task.await.unwrap();
    assert!(response.is_success());
    assert!(!surface.control("save").disabled);
}

#[tokio::test(start_paused = true)]
async fn second_submission_on_busy_control_is_ignored() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_latency(Duration::from_millis(200))
            .reply_json(json!({ "status": "success", "message": "Saved" })),
    );
    let pipeline = pipeline_with(&surface, &transport);

    let first = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.submit(&Trigger::new("save"), city_request()).await }
    });
    advance(50).await;

    let second = pipeline.submit(&Trigger::new("save"), city_request()).await;
    assert_eq!(second.status, Status::Info);
    assert_eq!(second.message, ALREADY_BUSY);
    assert_eq!(transport.sent_count(), 1);

    first.await.unwrap();
    assert_eq!(surface.shown(), vec![("Saved".to_string(), Status::Success)]);
    assert!(!surface.control("save").disabled);
}

#[tokio::test(start_paused = true)]
async fn different_controls_may_submit_concurrently() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_latency(Duration::from_millis(100))
            .reply_json(json!({ "status": "success", "message": "One" }))
            .reply_json(json!({ "status": "success", "message": "Two" })),
    );
    let pipeline = pipeline_with(&surface, &transport);

    let trigger_a = Trigger::new("a");
    let trigger_b = Trigger::new("b");
    let (a, b) = tokio::join!(
        pipeline.submit(&trigger_a, city_request()),
        pipeline.submit(&trigger_b, city_request()),
    );

    assert!(a.is_success() && b.is_success());
    assert_eq!(transport.sent_count(), 2);
    assert_eq!(surface.shown().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn restore_precedes_redirect() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new().reply_json(json!({
        "status": "success",
        "message": "Updated",
        "redirect": "/home/"
    })));
    let pipeline = pipeline_with(&surface, &transport);

    pipeline.submit(&Trigger::new("save"), city_request()).await;
    advance(1500).await;

    let events = surface.events();
    let busy = events.iter().position(|e| matches!(e, SurfaceEvent::Busy { .. })).unwrap();
    let restored = events.iter().position(|e| matches!(e, SurfaceEvent::Restored { .. })).unwrap();
    let navigated = events.iter().position(|e| matches!(e, SurfaceEvent::Navigated(_))).unwrap();
    assert!(busy < restored && restored < navigated);
}

#[tokio::test(start_paused = true)]
async fn cancelled_submission_still_restores_trigger() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_latency(Duration::from_millis(1000))
            .reply_json(json!({ "status": "success", "message": "Saved" })),
    );
    let pipeline = pipeline_with(&surface, &transport);

    let task = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.submit(&Trigger::new("save"), city_request()).await }
    });
    advance(100).await;
    assert!(surface.control("save").disabled);

    task.abort();
    let _ = task.await;
    settle().await;

    assert!(!surface.control("save").disabled);
    assert_eq!(pipeline.state(&ControlId::new("save")), PipelineState::Idle);
}

// =========================================================================
// Request assembly
// =========================================================================

#[tokio::test(start_paused = true)]
async fn submit_form_reads_named_fields_from_surface() {
    let surface = Arc::new(
        FakeSurface::new()
            .with_field("city", "Lagos")
            .with_field("country", "Nigeria")
            .with_field("unrelated", "x"),
    );
    let transport = Arc::new(
        ScriptedTransport::new().reply_json(json!({ "status": "success", "message": "Saved" })),
    );
    let pipeline = pipeline_with(&surface, &transport);

    let form = AjaxForm::post("/update/", &["city", "country", "missing"]);
    pipeline.submit_form(&Trigger::new("save"), &form).await;

    let sent = &transport.sent()[0];
    assert_eq!(sent.endpoint(), "/update/");
    assert_eq!(sent.method(), Method::Post);
    assert_eq!(sent.token(), TOKEN);
    assert_eq!(sent.fields().len(), 2);
    assert!(sent.form_pairs().contains(&(TOKEN_FIELD.to_string(), TOKEN.to_string())));
}

#[tokio::test(start_paused = true)]
async fn missing_token_reports_failure_without_request() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(ScriptedTransport::new());
    let context = SessionContext::new(Endpoints::default(), "");
    let pipeline = FormPipeline::new(Arc::new(context), surface.clone(), transport.clone());

    let response = pipeline
        .submit_fields(&Trigger::new("save"), "/update/", Method::Post, [("city", "Lagos")])
        .await;

    assert_eq!(response.status, Status::Error);
    assert_eq!(transport.sent_count(), 0);
    assert_eq!(surface.shown(), vec![(GENERIC_FAILURE.to_string(), Status::Error)]);
    assert!(!surface.events().iter().any(|e| matches!(e, SurfaceEvent::Busy { .. })));
}

#[tokio::test(start_paused = true)]
async fn notification_from_submission_expires() {
    let surface = Arc::new(FakeSurface::new());
    let transport = Arc::new(
        ScriptedTransport::new().reply_json(json!({ "status": "success", "message": "Saved" })),
    );
    let pipeline = pipeline_with(&surface, &transport);

    pipeline.submit(&Trigger::new("save"), city_request()).await;
    assert_eq!(surface.visible().len(), 1);

    advance(5000).await;
    assert!(surface.visible().is_empty());
}
