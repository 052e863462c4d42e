//! Scripted gateway for step tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mapprobe_core::{HttpMethod, RequestOutcome};
use mapprobe_fetch::{ApiRequest, Gateway, RecordingSleeper, endpoint};
use mapprobe_metrics::RecordingSink;
use serde_json::Value;

use crate::context::{Credentials, ProbeContext, WorkflowSettings};

pub(crate) const BASE_URL: &str = "https://getapp.test";

/// One call seen by [`ScriptedGateway`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
    pub token: Option<String>,
    pub label: String,
}

/// Gateway that answers from per-URL queues.
///
/// The last queued outcome for a URL repeats forever. Unscripted URLs get a
/// 404.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    script: Mutex<HashMap<(HttpMethod, String), VecDeque<RequestOutcome>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: HttpMethod, endpoint: &str, outcomes: Vec<RequestOutcome>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .insert((method, endpoint::resolve(BASE_URL, endpoint)), outcomes.into());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        let url = endpoint::resolve(BASE_URL, endpoint);
        self.calls().iter().filter(|c| c.url == url).count()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn call(&self, request: ApiRequest<'_>) -> RequestOutcome {
        let url = endpoint::resolve(BASE_URL, request.endpoint);
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method,
            url: url.clone(),
            body: request.body.cloned(),
            token: request.token.map(ToString::to_string),
            label: request.metric_label(),
        });

        let mut script = self.script.lock().unwrap();
        match script.get_mut(&(request.method, url)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or(RequestOutcome::ClientError { status_code: 404 }),
            None => RequestOutcome::ClientError { status_code: 404 },
        }
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }
}

pub(crate) fn ok(body: Value) -> RequestOutcome {
    RequestOutcome::Success {
        status_code: 200,
        body: serde_json::to_vec(&body).unwrap(),
    }
}

pub(crate) fn ok_empty() -> RequestOutcome {
    RequestOutcome::Success {
        status_code: 200,
        body: Vec::new(),
    }
}

/// Everything a step test needs to inspect afterwards.
pub(crate) struct Harness {
    pub ctx: ProbeContext,
    pub gateway: Arc<ScriptedGateway>,
    pub sink: Arc<RecordingSink>,
    pub sleeper: Arc<RecordingSleeper>,
}

impl Harness {
    pub fn new(gateway: ScriptedGateway) -> Self {
        let gateway = Arc::new(gateway);
        let sink = Arc::new(RecordingSink::new());
        let sleeper = Arc::new(RecordingSleeper::new());
        let settings = WorkflowSettings::default().with_credentials(Credentials::new(
            Some("probe".into()),
            Some("secret".into()),
        ));
        let ctx = ProbeContext::new(gateway.clone(), sink.clone())
            .with_sleeper(sleeper.clone())
            .with_settings(settings);

        Self {
            ctx,
            gateway,
            sink,
            sleeper,
        }
    }
}
