use std::time::Duration;

use discovery_core::{JobId, JobStatus, Query};
use discovery_engine::{ClientSettings, FailureKind, JobClient, LegacyClient, ReqwestJobClient};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestJobClient {
    ReqwestJobClient::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("client")
}

#[tokio::test]
async fn submit_posts_query_and_fills_missing_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/query/async"))
        .and(body_json(json!({"component": "bolts", "country": "usa"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "J1"})))
        .expect(1)
        .mount(&server)
        .await;

    let job = client_for(&server)
        .submit(&Query::new("bolts", "usa"))
        .await
        .expect("submit ok");

    assert_eq!(job.id, JobId::new("J1"));
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.component, "bolts");
    assert_eq!(job.country, "usa");
}

#[tokio::test]
async fn submit_rejects_empty_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/query/async"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "  "})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit(&Query::new("bolts", "usa"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn submit_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discovery/query/async"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit(&Query::new("bolts", "usa"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn poll_status_reads_job_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discovery/tasks/T9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "T9",
            "component": "valve",
            "country": "germany",
            "status": "completed",
            "message": "Found 3 suppliers",
            "search_result_id": "R1",
            "supplier_count": 3,
            "started_at": "2024-03-01T10:00:00",
            "completed_at": "2024-03-01T10:02:30.500"
        })))
        .mount(&server)
        .await;

    let job = client_for(&server)
        .poll_status(&JobId::new("T9"))
        .await
        .expect("poll ok");

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.component, "valve");
    assert_eq!(job.result_ref.as_deref(), Some("R1"));
    assert_eq!(job.supplier_count, Some(3));
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn poll_status_rejects_garbage_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discovery/tasks/J1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .poll_status(&JobId::new("J1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn fetch_results_returns_suppliers_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discovery/tasks/J1/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "S1", "name": "Tata Steel", "certifications": ["ISO 9001"]},
            {"_id": "S2", "name": "JSW Steel", "certifications": null, "lead_time_days": 21}
        ])))
        .mount(&server)
        .await;

    let suppliers = client_for(&server)
        .fetch_results(&JobId::new("J1"))
        .await
        .expect("results ok");

    let names: Vec<_> = suppliers.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Tata Steel", "JSW Steel"]);
    assert!(suppliers[1].certifications.is_empty());
    assert_eq!(suppliers[1].lead_time_days, Some(21));
}

#[tokio::test]
async fn fetch_results_not_found_is_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discovery/tasks/J1/results"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_results(&JobId::new("J1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discovery/tasks/J1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"_id": "J1", "status": "processing"})),
        )
        .mount(&server)
        .await;

    let client = ReqwestJobClient::new(ClientSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    })
    .unwrap();

    let err = client.poll_status(&JobId::new("J1")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn legacy_results_accepts_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/discovery/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/discovery/results"))
        .and(query_param("component", "carbon steel sheets"))
        .and(query_param("country", "india"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"name": "Tata Steel"}])),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = Query::new("carbon steel sheets", "india");
    client.legacy_query(&query).await.expect("query ok");
    let results = client.legacy_results(&query).await.expect("results ok");

    assert_eq!(results.suppliers.len(), 1);
    assert_eq!(results.summary, None);
}

#[tokio::test]
async fn legacy_results_accepts_wrapped_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/discovery/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "suppliers": [{"name": "Nippon Gear"}, {"name": "Osaka Drive"}],
            "summary": "Two gear makers in Kansai."
        })))
        .mount(&server)
        .await;

    let results = client_for(&server)
        .legacy_results(&Query::new("gears", "japan"))
        .await
        .expect("results ok");

    assert_eq!(results.suppliers.len(), 2);
    assert_eq!(results.summary.as_deref(), Some("Two gear makers in Kansai."));
}
