// HttpSource against a wiremock server. The source is blocking, so calls run on the
// blocking pool while the runtime keeps serving the mock.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use itr_client::http::HttpSource;
use itr_client::source::IncidentSource;
use itr_core::domain::Severity;
use itr_core::query::{IncidentQuery, Pagination, SortDirection, SortKey};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HttpSource) {
    let server = MockServer::start().await;
    let source = HttpSource::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap();
    (server, source)
}

async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_sends_query_params_and_decodes_page() {
    let (server, source) = setup().await;

    let mut conn = itr_core::db::open_in_memory_migrated().unwrap();
    itr_core::demo::seed_demo_dataset(&mut conn).unwrap();
    let mut query = IncidentQuery::default();
    query.page = 2;
    query.severity = Some(Severity::Sev1);
    query.sort_by = SortKey::Title;
    query.sort_order = SortDirection::Asc;
    let expected = itr_core::repo::search_incidents(&conn, &query).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/incidents"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .and(query_param("severity", "SEV1"))
        .and(query_param("sortBy", "title"))
        .and(query_param("sortOrder", "asc"))
        .and(query_param_is_missing("search"))
        .and(query_param_is_missing("status"))
        .and(query_param_is_missing("service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&expected))
        .expect(1)
        .mount(&server)
        .await;

    let page = blocking(move || source.fetch_incidents(&query)).await.unwrap();
    assert_eq!(page, expected);
}

#[tokio::test]
async fn search_text_is_url_encoded() {
    let (server, source) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/incidents"))
        .and(query_param("search", "Échec & 100%"))
        .and(query_param("service", "API Gateway"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [],
            "pagination": { "page": 1, "limit": 10, "total": 0, "totalPages": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = IncidentQuery::default();
    query.search = Some("Échec & 100%".to_string());
    query.service = Some("API Gateway".to_string());
    let page = blocking(move || source.fetch_incidents(&query)).await.unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.pagination, Pagination::new(1, 10, 0));
}

#[tokio::test]
async fn services_are_unwrapped_from_envelope() {
    let (server, source) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": ["API Gateway", "CDN"] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let services = blocking(move || source.list_services()).await.unwrap();
    assert_eq!(services, vec!["API Gateway", "CDN"]);
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn validation_failure_carries_field_errors() {
    let (server, source) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/incidents"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Validation failed",
            "errors": [{ "field": "limit", "message": "Limit must be between 1 and 100" }]
        })))
        .mount(&server)
        .await;

    let err = blocking(move || source.fetch_incidents(&IncidentQuery::default()))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(!err.retryable);
    assert_eq!(err.message, "Validation failed");
    assert_eq!(err.errors[0].field, "limit");
}

#[tokio::test]
async fn validation_body_without_message_keeps_field_errors() {
    let (server, source) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/incidents"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "errors": [{ "field": "page", "message": "Page must be a positive integer" }]
        })))
        .mount(&server)
        .await;

    let err = blocking(move || source.fetch_incidents(&IncidentQuery::default()))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.message, "Validation failed");
    assert_eq!(err.errors.len(), 1);
    assert_eq!(err.errors[0].message, "Page must be a positive integer");
}

#[tokio::test]
async fn not_found_and_server_errors_map_to_codes() {
    let (server, source) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/incidents"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "Failed to fetch incidents"
        })))
        .mount(&server)
        .await;

    let (missing, broken) = blocking(move || {
        (
            source.list_services().unwrap_err(),
            source.fetch_incidents(&IncidentQuery::default()).unwrap_err(),
        )
    })
    .await;

    assert!(missing.is_not_found());
    assert!(!missing.retryable);
    assert_eq!(broken.code, "HTTP_STATUS_FAILED");
    assert_eq!(broken.message, "Failed to fetch incidents");
    assert!(broken.retryable);
}

#[test]
fn unreachable_server_is_retryable() {
    // Mock servers are pooled, so take a port that nothing listens on instead.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let source = HttpSource::new(&format!("http://127.0.0.1:{port}"), Duration::from_millis(500)).unwrap();

    let err = source.fetch_incidents(&IncidentQuery::default()).unwrap_err();
    assert_eq!(err.code, "HTTP_UNREACHABLE");
    assert!(err.retryable);
}
