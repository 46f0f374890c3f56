//! HTTP front end.
//!
//! `POST /dump` takes a JSON [`DumpRequest`] and answers with the rendered
//! dump; `GET /health` reports liveness. Dumps run on tokio's blocking pool.

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_TYPE, Response as HttpResponse, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{DumpOptions, DEFAULT_MAX_SIZE};
use crate::dump::dump_repo;
use crate::output::OutputFormat;

/// Body of `POST /dump`. Exactly one of `path`, `local_path` and
/// `remote_url` must be set; `path` may be either a directory or a URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DumpRequest {
    pub path: Option<String>,
    pub local_path: Option<String>,
    pub remote_url: Option<String>,
    pub private_token: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub max_size: u64,
    pub max_tokens: Option<usize>,
    pub format: OutputFormat,
    pub binary_strict: bool,
    pub exclude_comments: bool,
    /// Do not respect `.gitignore` rules.
    pub not_ignore: bool,
}

impl Default for DumpRequest {
    fn default() -> Self {
        Self {
            path: None,
            local_path: None,
            remote_url: None,
            private_token: None,
            include: vec!["*".to_string()],
            exclude: Vec::new(),
            max_size: DEFAULT_MAX_SIZE,
            max_tokens: None,
            format: OutputFormat::default(),
            binary_strict: true,
            exclude_comments: false,
            not_ignore: false,
        }
    }
}

impl DumpRequest {
    /// The single requested source.
    pub fn source(&self) -> Result<&str, String> {
        let sources: Vec<&str> = [&self.path, &self.local_path, &self.remote_url]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .collect();
        match sources.as_slice() {
            [one] => Ok(*one),
            [] => Err("One of path, local_path, or remote_url is required".to_string()),
            _ => Err("Only one of path, local_path, or remote_url can be used".to_string()),
        }
    }

    pub fn options(&self) -> DumpOptions {
        DumpOptions {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            max_size: self.max_size,
            max_tokens: self.max_tokens,
            format: self.format,
            binary_strict: self.binary_strict,
            exclude_comments: self.exclude_comments,
            respect_gitignore: !self.not_ignore,
            private_token: self.private_token.clone(),
            ..DumpOptions::default()
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    version: &'static str,
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorBody { detail })).into_response()
}

/// Build the application router.
pub fn router() -> Router {
    Router::new()
        .route("/dump", post(dump_handler))
        .route("/health", get(health_handler))
}

/// Serve the router on `bind` until the process is stopped.
pub async fn serve(bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    let local_addr = listener.local_addr()?;
    info!("serving dump API on http://{local_addr}/dump");
    info!("health endpoint: http://{local_addr}/health");
    axum::serve(listener, router()).await
}

async fn health_handler() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn dump_handler(body: Bytes) -> Response {
    let request: DumpRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON request: {err}"))
        }
    };
    let source = match request.source() {
        Ok(source) => source.to_string(),
        Err(detail) => return error_response(StatusCode::BAD_REQUEST, detail),
    };
    let options = request.options();
    let format = options.format;

    let result = tokio::task::spawn_blocking(move || dump_repo(&source, &options)).await;
    match result {
        Ok(Ok(content)) => HttpResponse::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, format.media_type())
            .body(Body::from(content))
            .unwrap_or_else(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
        Ok(Err(e)) => {
            warn!("dump failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    async fn call(body: String) -> (StatusCode, String, String) {
        let response = dump_handler(Bytes::from(body)).await;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "x = 1  # one\n").unwrap();
        dir
    }

    #[test]
    fn test_request_defaults() {
        let request: DumpRequest = serde_json::from_str(r#"{"path": "."}"#).unwrap();
        assert_eq!(request.include, vec!["*"]);
        assert_eq!(request.max_size, DEFAULT_MAX_SIZE);
        assert!(request.binary_strict);
        assert!(request.options().respect_gitignore);
        assert_eq!(request.source().unwrap(), ".");
    }

    #[test]
    fn test_request_source_must_be_unique() {
        let none = DumpRequest::default();
        assert!(none.source().unwrap_err().contains("required"));

        let both = DumpRequest {
            path: Some("a".into()),
            remote_url: Some("b".into()),
            ..Default::default()
        };
        assert!(both.source().unwrap_err().contains("Only one"));
    }

    #[tokio::test]
    async fn test_dump_local_path() {
        let dir = project();
        let body = serde_json::json!({
            "local_path": dir.path(),
            "exclude_comments": true,
        });
        let (status, content_type, text) = call(body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains("### main.py\nx = 1\n"));
    }

    #[tokio::test]
    async fn test_dump_json_media_type() {
        let dir = project();
        let body = serde_json::json!({ "path": dir.path(), "format": "json" });
        let (status, content_type, text) = call(body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["files"][0]["path"], "main.py");
    }

    #[tokio::test]
    async fn test_missing_source_is_bad_request() {
        let (status, _, text) = call("{}".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["detail"].as_str().unwrap().contains("required"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let (status, _, _) = call("not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pipeline_error_is_server_error() {
        let body = serde_json::json!({ "remote_url": "https://example.com/owner/repo" });
        let (status, _, text) = call(body.to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text.contains("unsupported host"));
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health_handler().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
