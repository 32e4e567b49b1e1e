//! # API REST
//!
//! REST API implementation for Guidebook.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, multipart uploads, static upload serving)
//!
//! Uses `api-shared` for wire types and `guidebook-core` for storage. Handlers call the
//! synchronous store directly.

#![warn(rust_2018_idioms)]

mod error;
mod guides;
mod tags;
mod uploads;

use std::sync::Arc;

use api_shared::{
    CreateGuideReq, CreateTagReq, DocumentRes, DocumentStatsRes, ErrorRes, GuideRes,
    HealthRes, HealthService, TagRes, TocEntryRes, UpdateGuideReq, UpdateTagReq, UploadForm,
    UploadRes, UploadedFile,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use guidebook_core::{CoreConfig, Store};
use guidebook_files::{ImageStore, UPLOADS_URL_PREFIX};
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Headroom above the image size cap for multipart boundaries and part headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub images: Arc<ImageStore>,
}

impl AppState {
    /// Builds the state from a resolved configuration.
    ///
    /// # Errors
    /// Returns an error if the uploads directory cannot be created.
    pub fn new(cfg: Arc<CoreConfig>) -> anyhow::Result<Self> {
        let images = ImageStore::new(&cfg.uploads_dir(), cfg.max_upload_bytes())?;
        Ok(Self {
            store: Store::new(cfg),
            images: Arc::new(images),
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        guides::list_guides,
        guides::create_guide,
        guides::get_guide,
        guides::get_guide_by_slug,
        guides::update_guide,
        guides::delete_guide,
        guides::get_document,
        guides::view_guide,
        guides::export_guide,
        tags::list_tags,
        tags::create_tag,
        tags::get_tag,
        tags::update_tag,
        tags::delete_tag,
        uploads::upload_image,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        GuideRes,
        CreateGuideReq,
        UpdateGuideReq,
        TagRes,
        CreateTagReq,
        UpdateTagReq,
        DocumentRes,
        DocumentStatsRes,
        TocEntryRes,
        UploadForm,
        UploadRes,
        UploadedFile,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router.
///
/// # Arguments
/// * `state` - Store and image storage shared by every handler
///
/// # Returns
/// A router serving the JSON API, uploaded files under `/uploads`, the OpenAPI document and
/// Swagger UI, with permissive CORS.
pub fn router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.images.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let uploads = ServeDir::new(state.images.uploads_root());

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/guides",
            get(guides::list_guides).post(guides::create_guide),
        )
        .route("/api/guides/slug/:slug", get(guides::get_guide_by_slug))
        .route(
            "/api/guides/:id",
            get(guides::get_guide)
                .put(guides::update_guide)
                .delete(guides::delete_guide),
        )
        .route("/api/guides/:id/document", get(guides::get_document))
        .route("/api/guides/:id/view", get(guides::view_guide))
        .route("/api/guides/:id/export", get(guides::export_guide))
        .route("/api/tags", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/api/tags/:id",
            get(tags::get_tag)
                .put(tags::update_tag)
                .delete(tags::delete_tag),
        )
        .route(
            "/api/upload/image",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const PNG: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
        b'R',
    ];
    const BOUNDARY: &str = "guidebook-test-boundary";

    fn test_state(temp_dir: &TempDir, max_upload_bytes: u64) -> AppState {
        let cfg = CoreConfig::new(temp_dir.path().to_path_buf(), max_upload_bytes, false)
            .expect("CoreConfig::new should succeed");
        AppState::new(Arc::new(cfg)).expect("AppState::new should succeed")
    }

    async fn send(
        app: &Router,
        request: Request<Body>,
    ) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body.to_vec())
    }

    async fn send_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, _, bytes) = send(app, request).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn multipart_request(field: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload/image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let (status, body) = send_json(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn test_guide_crud_and_tag_semantics() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let (status, tag) = send_json(&app, "POST", "/api/tags", Some(json!({"name": "PvM"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tag["color"], "#58a6ff");
        let tag_id = tag["id"].as_str().unwrap().to_string();

        let (status, guide) = send_json(
            &app,
            "POST",
            "/api/guides",
            Some(json!({"title": "Zulrah Guide", "tag_ids": [tag_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(guide["slug"], "zulrah-guide");
        assert_eq!(guide["tags"][0]["name"], "PvM");
        let id = guide["id"].as_str().unwrap().to_string();

        let (status, updated) = send_json(
            &app,
            "PUT",
            &format!("/api/guides/{id}"),
            Some(json!({"description": "Phases"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["tags"].as_array().unwrap().len(), 1);

        let (_, cleared) = send_json(
            &app,
            "PUT",
            &format!("/api/guides/{id}"),
            Some(json!({"tag_ids": []})),
        )
        .await;
        assert!(cleared["tags"].as_array().unwrap().is_empty());

        let (status, by_slug) = send_json(&app, "GET", "/api/guides/slug/zulrah-guide", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_slug["id"], json!(id));

        let (status, _) = send_json(&app, "DELETE", &format!("/api/guides/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send_json(&app, "GET", &format!("/api/guides/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_validation_and_conflict_statuses() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let (status, body) = send_json(&app, "POST", "/api/guides", Some(json!({"title": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0], "title must not be empty");

        let (status, _) = send_json(
            &app,
            "POST",
            "/api/guides",
            Some(json!({"title": "A", "tag_ids": ["0123456789abcdef0123456789abcdef"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(&app, "POST", "/api/guides", Some(json!({"title": "Same"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send_json(&app, "POST", "/api/guides", Some(json!({"title": "Same"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send_json(
            &app,
            "POST",
            "/api/tags",
            Some(json!({"name": "Bad", "color": "red"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(&app, "GET", "/api/tags/not-an-id", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_json_validation_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        for body in [json!({}), json!({"title": 5})] {
            let (status, err) = send_json(&app, "POST", "/api/guides", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(err["message"], "Validation error");
            assert_eq!(err["errors"].as_array().unwrap().len(), 1);
        }

        let (status, err) = send_json(&app, "POST", "/api/tags", Some(json!({"name": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["message"], "Validation error");

        let (status, tag) = send_json(&app, "POST", "/api/tags", Some(json!({"name": "Raids"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, err) = send_json(
            &app,
            "PUT",
            &format!("/api/tags/{}", tag["id"].as_str().unwrap()),
            Some(json!({"color": false})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["errors"].is_array());

        let request = Request::builder()
            .method("POST")
            .uri("/api/guides")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"title\":"))
            .unwrap();
        let (status, headers, bytes) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        let err: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(err["message"], "Validation error");
    }

    #[tokio::test]
    async fn test_guide_tags_accept_camel_case_field() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let (_, tag) = send_json(&app, "POST", "/api/tags", Some(json!({"name": "Bossing"}))).await;
        let tag_id = tag["id"].as_str().unwrap().to_string();

        let (status, guide) = send_json(
            &app,
            "POST",
            "/api/guides",
            Some(json!({"title": "Vorkath", "tagIds": [tag_id]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(guide["tags"][0]["id"], json!(tag_id));

        let (status, cleared) = send_json(
            &app,
            "PUT",
            &format!("/api/guides/{}", guide["id"].as_str().unwrap()),
            Some(json!({"tagIds": []})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(cleared["tags"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_search_and_tag() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let (_, tag) = send_json(&app, "POST", "/api/tags", Some(json!({"name": "Skilling"}))).await;
        let tag_id = tag["id"].as_str().unwrap().to_string();
        send_json(&app, "POST", "/api/guides", Some(json!({"title": "Agility", "tag_ids": [tag_id]}))).await;
        send_json(&app, "POST", "/api/guides", Some(json!({"title": "Agility pyramid"}))).await;

        let (_, all) = send_json(&app, "GET", "/api/guides?search=AGILITY", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, tagged) =
            send_json(&app, "GET", &format!("/api/guides?search=agility&tag={tag_id}"), None).await;
        assert_eq!(tagged.as_array().unwrap().len(), 1);
        assert_eq!(tagged[0]["title"], "Agility");
    }

    #[tokio::test]
    async fn test_document_view_and_export() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let content = json!({"blocks": [
            {"type": "header", "data": {"text": "Setup", "level": 1}},
            {"type": "paragraph", "data": {"text": ""}},
            {"type": "code", "data": {"code": "", "language": "bash"}}
        ]});
        let (_, guide) = send_json(
            &app,
            "POST",
            "/api/guides",
            Some(json!({"title": "Setup Guide", "content": content})),
        )
        .await;
        let id = guide["id"].as_str().unwrap().to_string();

        let (status, doc) = send_json(&app, "GET", &format!("/api/guides/{id}/document"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["document"]["blocks"].as_array().unwrap().len(), 2);
        assert_eq!(
            doc["toc"],
            json!([{"anchorId": "section-0", "text": "Setup", "level": 1, "sourceIndex": 0}])
        );
        assert_eq!(doc["stats"], json!({"sections": 1, "blocks": 2}));

        let request = Request::builder()
            .uri(format!("/api/guides/{id}/view"))
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        assert!(String::from_utf8(body).unwrap().contains("section-0"));

        let request = Request::builder()
            .uri(format!("/api/guides/{id}/export"))
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"setup-guide.html\""
        );
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("id=\"section-0\""));
        assert!(!html.contains("prism-core"));

        let (status, _) = send_json(
            &app,
            "GET",
            "/api/guides/0123456789abcdef0123456789abcdef/export",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tag_delete_cascades_over_http() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let (_, tag) = send_json(&app, "POST", "/api/tags", Some(json!({"name": "Temp"}))).await;
        let tag_id = tag["id"].as_str().unwrap().to_string();
        let (_, guide) =
            send_json(&app, "POST", "/api/guides", Some(json!({"title": "G", "tag_ids": [tag_id]}))).await;
        let id = guide["id"].as_str().unwrap().to_string();

        let (status, _) = send_json(&app, "DELETE", &format!("/api/tags/{tag_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, reloaded) = send_json(&app, "GET", &format!("/api/guides/{id}"), None).await;
        assert!(reloaded["tags"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_stores_and_serves_image() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let (status, _, body) = send(&app, multipart_request("image", PNG)).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], 1);
        let url = body["file"]["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/images/"));

        let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
        let (status, _, served) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(served, PNG);
    }

    #[tokio::test]
    async fn test_upload_failures() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let app = router(test_state(&temp_dir, 1024));

        let (status, _, body) = send(&app, multipart_request("file", PNG)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"success": 0, "message": "No file uploaded"}));

        let (status, _, body) = send(&app, multipart_request("image", b"plain text")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], 0);

        let mut oversized = PNG.to_vec();
        oversized.resize(2048, 0);
        let (status, _, _) = send(&app, multipart_request("image", &oversized)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/api/guides/{id}/export"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/upload/image"));

        let doc = serde_json::to_value(&doc).unwrap();
        let form = &doc["paths"]["/api/upload/image"]["post"]["requestBody"]["content"]
            ["multipart/form-data"]["schema"];
        assert_eq!(form["$ref"], "#/components/schemas/UploadForm");
        let image = &doc["components"]["schemas"]["UploadForm"]["properties"]["image"];
        assert_eq!(image["format"], "binary");
    }
}
