//! Exporter tests over a real listener.

use std::sync::Arc;

use mapprobe_core::{MetricEvent, MetricsSink};
use mapprobe_metrics::PrometheusSink;
use mapprobe_metrics::exporter::serve_on;
use tokio::net::TcpListener;

async fn start(sink: Arc<PrometheusSink>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_on(listener, sink));
    format!("http://{addr}")
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text_format() {
    let sink = Arc::new(PrometheusSink::new().unwrap());
    sink.record(MetricEvent::test_failure("login", "auth_failed"));
    let base = start(sink.clone()).await;

    let response = reqwest::get(format!("{base}/metrics")).await.unwrap();
    assert!(response.status().is_success());
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.unwrap();
    assert!(body.contains("# TYPE getapp_test_failures_total counter"));
    assert!(body.contains(r#"failure_reason="auth_failed""#));
}

#[tokio::test]
async fn test_metrics_reflect_later_events() {
    let sink = Arc::new(PrometheusSink::new().unwrap());
    let base = start(sink.clone()).await;

    let before = reqwest::get(format!("{base}/metrics")).await.unwrap().text().await.unwrap();
    assert!(!before.contains("getapp_runs_total{"));

    sink.record(MetricEvent::run("completed"));
    let after = reqwest::get(format!("{base}/metrics")).await.unwrap().text().await.unwrap();
    assert!(after.contains(r#"getapp_runs_total{outcome="completed"} 1"#));
}

#[tokio::test]
async fn test_health_endpoint() {
    let sink = Arc::new(PrometheusSink::new().unwrap());
    let base = start(sink).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}
