//! Serialization tests for wire-facing model types.

use super::*;

#[test]
fn test_import_status_from_response_json() {
    #[derive(serde::Deserialize)]
    struct StatusResponse {
        status: ImportStatus,
    }

    let done: StatusResponse = serde_json::from_str(r#"{"status":"Done"}"#).unwrap();
    assert_eq!(done.status, ImportStatus::Done);

    let odd: StatusResponse = serde_json::from_str(r#"{"status":"Queued"}"#).unwrap();
    assert_eq!(odd.status, ImportStatus::Unknown("Queued".to_string()));
}

#[test]
fn test_import_status_serializes_as_wire_string() {
    let json = serde_json::to_string(&ImportStatus::Unknown("Queued".to_string())).unwrap();
    assert_eq!(json, r#""Queued""#);
    assert_eq!(serde_json::to_string(&ImportStatus::Done).unwrap(), r#""Done""#);
}

#[test]
fn test_metric_event_json_shape() {
    let event = MetricEvent::download("gpkg", false);
    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(value["name"], "getapp_downloads_total");
    assert_eq!(value["kind"], "counter");
    assert_eq!(value["labels"]["file_type"], "gpkg");
    assert_eq!(value["labels"]["outcome"], "failure");
}

#[test]
fn test_transport_kind_snake_case() {
    let json = serde_json::to_string(&TransportKind::UnexpectedStatus).unwrap();
    assert_eq!(json, r#""unexpected_status""#);
}

#[test]
fn test_http_method_uppercase() {
    assert_eq!(serde_json::to_string(&HttpMethod::Post).unwrap(), r#""POST""#);
}
