//! Full probe runs against a mock GetApp server.

use std::sync::Arc;
use std::time::Duration;

use mapprobe_core::metric_names;
use mapprobe_fetch::{HttpGateway, RecordingSleeper};
use mapprobe_metrics::RecordingSink;
use mapprobe_workflow::{
    Credentials, ProbeContext, ProbePipeline, RunOutcome, StepId, WorkflowSettings,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Probe {
    ctx: ProbeContext,
    sink: Arc<RecordingSink>,
    sleeper: Arc<RecordingSleeper>,
}

fn probe(server: &MockServer) -> Probe {
    let sink = Arc::new(RecordingSink::new());
    let sleeper = Arc::new(RecordingSleeper::new());
    let gateway = HttpGateway::new(&server.uri(), sink.clone()).unwrap();
    let settings = WorkflowSettings::default().with_credentials(Credentials::new(
        Some("probe".into()),
        Some("secret".into()),
    ));
    let ctx = ProbeContext::new(Arc::new(gateway), sink.clone())
        .with_sleeper(sleeper.clone())
        .with_settings(settings);

    Probe { ctx, sink, sleeper }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "t-1"})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_import(server: &MockServer, status: &str) {
    Mock::given(method("POST"))
        .and(path("/api/device/discover"))
        .and(header("authorization", "Bearer t-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/map/import/create"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"importRequestId": "abc123"})),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/map/import/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": status})))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts everything after the import except the status reports.
async fn mount_delivery(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/delivery/prepareDelivery"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/delivery/preparedDelivery/abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "/files/abc123.gpkg"})),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/abc123.gpkg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 128]))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/abc123.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc123"})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/map/inventory/updates"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
    for endpoint in [
        "/api/delivery/checkHealth",
        "/api/device/checkHealth",
        "/api/offering/checkHealth",
        "/api/map/checkHealth",
    ] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_full_run_completes() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_import(&server, "Done").await;
    mount_delivery(&server).await;

    // One gating report, one after polling, five after the download.
    Mock::given(method("POST"))
        .and(path("/api/delivery/updateDownloadStatus"))
        .respond_with(ResponseTemplate::new(200))
        .expect(7)
        .mount(&server)
        .await;

    let probe = probe(&server);
    let report = ProbePipeline::full().run(&probe.ctx).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.steps.len(), 11);
    assert!(report.steps.iter().all(|s| s.success));
    assert_eq!(probe.sleeper.sleeps(), vec![Duration::from_secs(2); 4]);
    assert!(probe.sink.named(metric_names::TEST_FAILURES_TOTAL).is_empty());

    let downloads = probe.sink.named(metric_names::DOWNLOADS_TOTAL);
    assert_eq!(downloads.len(), 2);
    assert!(downloads.iter().all(|e| e.label("outcome") == Some("success")));

    let runs = probe.sink.named(metric_names::RUNS_TOTAL);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].label("outcome"), Some("completed"));
}

#[tokio::test]
async fn test_failed_repeated_updates_are_recorded() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_import(&server, "Done").await;
    mount_delivery(&server).await;

    // The gating and post-poll reports succeed, every repeat fails.
    Mock::given(method("POST"))
        .and(path("/api/delivery/updateDownloadStatus"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/delivery/updateDownloadStatus"))
        .respond_with(ResponseTemplate::new(500))
        .expect(5)
        .mount(&server)
        .await;

    let probe = probe(&server);
    let report = ProbePipeline::full().run(&probe.ctx).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(probe.sleeper.sleeps(), vec![Duration::from_secs(2); 4]);

    let failed = probe.sink.named(metric_names::FAILED_REQUESTS_TOTAL);
    assert_eq!(failed.len(), 5);
    for event in &failed {
        assert_eq!(
            event.label("endpoint"),
            Some("api/delivery/updateDownloadStatus")
        );
        assert_eq!(event.label("status_code"), Some("500"));
    }

    let failures = probe.sink.named(metric_names::TEST_FAILURES_TOTAL);
    assert_eq!(failures.len(), 5);
    for event in &failures {
        assert_eq!(event.label("test_name"), Some("repeat_download_status"));
        assert_eq!(
            event.label("failure_reason"),
            Some("status_update_failed_Start")
        );
    }
}

#[tokio::test]
async fn test_import_error_aborts_run() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_import(&server, "Error").await;

    // Only the gating report runs before the poll.
    Mock::given(method("POST"))
        .and(path("/api/delivery/updateDownloadStatus"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/delivery/checkHealth"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let probe = probe(&server);
    let report = ProbePipeline::full().run(&probe.ctx).await;

    assert_eq!(report.failed_step(), Some(StepId::ImportStatus));
    assert!(probe.sleeper.sleeps().is_empty());

    let failures = probe.sink.named(metric_names::TEST_FAILURES_TOTAL);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].label("test_name"), Some("import_status"));
    assert_eq!(failures[0].label("failure_reason"), Some("import_failed"));
}

#[tokio::test]
async fn test_health_only_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/map/checkHealth"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let probe = probe(&server);
    let report = ProbePipeline::health_only().run(&probe.ctx).await;

    assert_eq!(report.failed_step(), Some(StepId::HealthCheck));
    let failures = probe.sink.named(metric_names::HEALTH_CHECK_FAILURES_TOTAL);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].label("endpoint"), Some("api/map/checkHealth"));

    // Per-endpoint failure first, then the step-level one.
    let step_failures = probe.sink.named(metric_names::TEST_FAILURES_TOTAL);
    assert_eq!(step_failures.len(), 2);
    assert!(step_failures.iter().all(|e| e.label("test_name") == Some("health_check")));
    assert_eq!(
        step_failures[0].label("failure_reason"),
        Some("/api/map/checkHealth")
    );
    assert_eq!(step_failures[1].label("failure_reason"), Some("unhealthy"));
}
