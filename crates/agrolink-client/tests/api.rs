//! HTTP collaborator tests against a mock backend.

use agrolink_client::ApiClient;
use agrolink_core::ClientError;
use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn upload_image_posts_multipart_and_decodes_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "analysis_id": 42,
            "filename": "leaf.jpg",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let response = api.upload_image("leaf.jpg", b"\xff\xd8fakejpeg".to_vec()).await.unwrap();

    assert_eq!(response.analysis_id, 42);
    assert_eq!(response.filename.as_deref(), Some("leaf.jpg"));

    // The backend expects a multipart body with the file part.
    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn start_analysis_hits_the_analyze_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyses/7/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "status": "processing",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let detail = api.start_analysis(7).await.unwrap();
    assert_eq!(detail.id, 7);
    assert_eq!(detail.status, "processing");
    assert!(detail.results.is_empty());
}

#[tokio::test]
async fn list_analyses_passes_limit_and_decodes_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyses"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "filename": "campo.jpg", "status": "completed", "analysis_date": "2026-08-29 10:00:00"},
            {"id": 2, "filename": null, "status": "failed"},
        ])))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let rows = api.list_analyses(10).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, 3);
    assert_eq!(rows[0].status, "completed");
    assert_eq!(rows[1].filename, None);
    assert_eq!(rows[1].analysis_date, None);
}

#[tokio::test]
async fn get_analysis_decodes_agent_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyses/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "status": "completed",
            "results": [
                {"agent": "AgriVision", "data": {"plaga": false}},
                {"agent": "SoilSense", "data": {"ph": 6.7}},
            ],
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let detail = api.get_analysis(3).await.unwrap();

    assert_eq!(detail.results.len(), 2);
    assert_eq!(detail.results[1].agent, "SoilSense");
    assert_eq!(detail.results[1].data, json!({"ph": 6.7}));
}

#[tokio::test]
async fn health_reports_runtime_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "ollama": "available",
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let health = api.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.ollama.as_deref(), Some("available"));
}

#[tokio::test]
async fn error_status_maps_to_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analyses/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detail": "Analysis not found",
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let err = api.get_analysis(99).await.unwrap_err();
    assert_matches!(err, ClientError::Http(message) if message.contains("404"));
}
