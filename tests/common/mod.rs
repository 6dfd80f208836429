#![allow(dead_code)]

pub mod fakes;

use std::sync::Arc;
use std::time::Duration;

use account_forms::pipeline::context::{Endpoints, SessionContext};
use account_forms::pipeline::submit::FormPipeline;

use crate::common::fakes::{FakeSurface, ScriptedTransport};

pub const TOKEN: &str = "test-token";

pub fn pipeline_with(surface: &Arc<FakeSurface>, transport: &Arc<ScriptedTransport>) -> FormPipeline {
    let context = SessionContext::new(Endpoints::default(), TOKEN);
    FormPipeline::new(Arc::new(context), surface.clone(), transport.clone())
}

/// Let spawned timer tasks that are due run to completion.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock and let due tasks run.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    settle().await;
}
