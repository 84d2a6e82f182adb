//! HTTP surface: live preview, full export and a health check.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::error::ReportError;
use crate::images::{DefaultMediaReader, MediaReader};
use crate::model::{Evidence, ReportConfig};
use crate::report::{self, ByteSink, FsByteSink, ReportFormat};

const REPORT_PATH: &str = "x-report-path";

#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<dyn MediaReader>,
    pub sink: Arc<dyn ByteSink>,
}

impl AppState {
    pub fn from_config(config: &ServiceConfig) -> Self {
        AppState {
            reader: Arc::new(DefaultMediaReader::new(&config.media_root, config.allow_remote_media)),
            sink: Arc::new(FsByteSink::new(&config.output_dir)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub config: ReportConfig,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub config: ReportConfig,
    /// Also write the report into the service output directory.
    #[serde(default)]
    pub save: bool,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/render-pdf", post(render_pdf))
        .route("/generate", post(generate))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn render_pdf(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Response, ReportError> {
    info!(items = request.evidence.len(), "render-pdf");
    let bytes = report::generate_pdf(&request.evidence, &request.config, state.reader.as_ref()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"preview.pdf\""),
        ],
        bytes,
    )
        .into_response())
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, ReportError> {
    info!(items = request.evidence.len(), format = ?request.format, "generate");
    let bytes = report::generate(
        &request.evidence,
        &request.author,
        request.format,
        &request.config,
        state.reader.as_ref(),
    )
    .await?;

    let date = request
        .config
        .date
        .clone()
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
    let file_name = report::file_name(&request.config, &date, request.format);

    let saved = if request.save {
        Some(report::export(&bytes, &file_name, state.sink.as_ref()).await?)
    } else {
        None
    };

    let mut response = (
        [
            (header::CONTENT_TYPE, request.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        bytes,
    )
        .into_response();

    if let Some(path) = saved {
        match HeaderValue::from_str(&path.display().to_string()) {
            Ok(value) => {
                response.headers_mut().insert(REPORT_PATH, value);
            }
            Err(_) => warn!(path = %path.display(), "saved path is not a valid header value"),
        }
    }
    Ok(response)
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            error!(error = %self, "report generation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state(dir: &std::path::Path) -> AppState {
        AppState {
            reader: Arc::new(DefaultMediaReader::new(dir, false)),
            sink: Arc::new(FsByteSink::new(dir.join("reports"))),
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(state(dir.path()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"ok");
    }

    #[tokio::test]
    async fn test_render_pdf_preview() {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({
            "evidence": [{ "id": "1", "title": "Open page", "status": "success" }],
            "config": { "title": "Preview", "templateId": "modern" }
        });
        let response = router(state(dir.path()))
            .oneshot(post_json("/render-pdf", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert!(body_bytes(response).await.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_generate_docx_with_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({
            "evidence": [{ "id": "1", "title": "Open page" }],
            "author": "Robin",
            "format": "docx",
            "config": { "title": "Login Flow", "date": "2026-03-01" }
        });
        let response = router(state(dir.path()))
            .oneshot(post_json("/generate", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"login-flow-2026-03-01.docx\""
        );
        assert!(response.headers().get(REPORT_PATH).is_none());
        assert!(body_bytes(response).await.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_generate_embeds_evidence_image() {
        use base64::Engine;

        let dir = tempfile::tempdir().unwrap();
        let png = crate::images::LoadedImage::blank(8, 4).to_png().unwrap();
        let image = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        );
        let body = json!({
            "evidence": [
                { "id": "1", "title": "Inline shot", "image": image },
                { "id": "2", "title": "Stored shot", "image": "missing.png" }
            ],
            "format": "docx",
            "config": { "date": "2026-03-01" }
        });
        let response = router(state(dir.path()))
            .oneshot(post_json("/generate", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body_bytes(response).await;
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("word/media/image1.png").is_ok());
        assert!(archive.by_name("word/media/image2.png").is_err());
    }

    #[tokio::test]
    async fn test_generate_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({
            "config": { "title": "Saved", "date": "2026-03-01" },
            "save": true
        });
        let response = router(state(dir.path()))
            .oneshot(post_json("/generate", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let expected = dir.path().join("reports").join("saved-2026-03-01.pdf");
        assert_eq!(
            response.headers()[REPORT_PATH].to_str().unwrap(),
            expected.display().to_string()
        );
        assert!(std::fs::read(&expected).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_custom_without_template_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({ "config": { "templateId": "custom" } });
        let response = router(state(dir.path()))
            .oneshot(post_json("/render-pdf", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(error["error"].as_str().unwrap().contains("custom"));
    }
}
