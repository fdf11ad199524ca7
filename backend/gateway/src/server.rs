//! Main HTTP Gateway Server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use docverify_core::InferenceProvider;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::control_ui;
use crate::handlers;
use crate::health_api;
use crate::session_cookie::CookieSigner;
use crate::session_registry::SessionStore;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub sessions: SessionStore,
    pub cookies: CookieSigner,
    pub provider: Arc<dyn InferenceProvider>,
}

/// Router-level settings.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub max_upload_bytes: usize,
    /// Frontend directory served for unmatched paths.
    pub static_dir: Option<PathBuf>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            static_dir: None,
        }
    }
}

/// Build the router with every API route.
pub fn build_router(state: GatewayState, options: &GatewayOptions) -> Router {
    let mut app = Router::new()
        .route("/analyze-document", post(handlers::analyze_document))
        .route("/get-session-data", get(handlers::get_session_data))
        .route("/get-consolidated-data", get(handlers::get_consolidated_data))
        .route("/submit-form", post(handlers::submit_form))
        .route(
            "/validate-handwritten-form",
            post(handlers::validate_handwritten_form),
        )
        .route("/api/health", get(health_api::get_health));

    if let Some(dir) = &options.static_dir {
        app = control_ui::with_static_assets(app, dir);
    }

    app.layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on an already-bound listener until Ctrl-C.
#[instrument(skip(listener, app))]
pub async fn start_server(listener: TcpListener, app: Router) -> Result<()> {
    info!("Gateway HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docverify_understanding::MockProvider;
    use reqwest::multipart::{Form, Part};
    use serde_json::Value;
    use std::time::Duration;

    struct TestServer {
        base: String,
        client: reqwest::Client,
        provider: Arc<MockProvider>,
    }

    async fn spawn(provider: MockProvider) -> TestServer {
        let provider = Arc::new(provider);
        let state = GatewayState {
            sessions: SessionStore::new(Duration::from_secs(3600)),
            cookies: CookieSigner::new("test-secret", Duration::from_secs(3600)).unwrap(),
            provider: provider.clone(),
        };
        let app = build_router(state, &GatewayOptions::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        TestServer {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            provider,
        }
    }

    fn image_part() -> Part {
        Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00])
            .file_name("scan.jpg")
            .mime_str("image/jpeg")
            .unwrap()
    }

    fn session_cookie(resp: &reqwest::Response) -> Option<String> {
        resp.headers()
            .get(reqwest::header::SET_COOKIE)?
            .to_str()
            .ok()?
            .split(';')
            .next()
            .map(str::to_string)
    }

    impl TestServer {
        async fn upload(&self, doc_type: &str, cookie: Option<&str>) -> reqwest::Response {
            let form = Form::new()
                .text("docType", doc_type.to_string())
                .part("document", image_part());
            let mut req = self
                .client
                .post(format!("{}/analyze-document", self.base))
                .multipart(form);
            if let Some(cookie) = cookie {
                req = req.header(reqwest::header::COOKIE, cookie);
            }
            req.send().await.unwrap()
        }

        async fn get_json(&self, path: &str, cookie: Option<&str>) -> Value {
            let mut req = self.client.get(format!("{}{}", self.base, path));
            if let Some(cookie) = cookie {
                req = req.header(reqwest::header::COOKIE, cookie);
            }
            req.send().await.unwrap().json().await.unwrap()
        }

        async fn validate(&self, cookie: Option<&str>) -> reqwest::Response {
            let form = Form::new().part("handwrittenForm", image_part());
            let mut req = self
                .client
                .post(format!("{}/validate-handwritten-form", self.base))
                .multipart(form);
            if let Some(cookie) = cookie {
                req = req.header(reqwest::header::COOKIE, cookie);
            }
            req.send().await.unwrap()
        }
    }

    #[tokio::test]
    async fn session_data_absent_before_upload() {
        let server = spawn(MockProvider::new("mock")).await;
        let body = server.get_json("/get-session-data", None).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn validate_without_uploads_is_rejected_without_calls() {
        let server = spawn(MockProvider::new("mock")).await;
        let resp = server.validate(None).await;
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("No master document data"));
        assert_eq!(server.provider.calls(), 0);
    }

    #[tokio::test]
    async fn upload_requires_doc_type() {
        let server = spawn(MockProvider::new("mock")).await;
        let form = Form::new().part("document", image_part());
        let resp = server
            .client
            .post(format!("{}/analyze-document", server.base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert_eq!(server.provider.calls(), 0);
    }

    #[tokio::test]
    async fn uploads_accumulate_and_consolidate() {
        let server = spawn(
            MockProvider::new("mock")
                .with_response(r#"{"name":"A","dob":"1990-01-01"}"#)
                .with_response("```json\n{\"name\":\"A\",\"panNumber\":\"X1\"}\n```"),
        )
        .await;

        let first = server.upload("aadhar", None).await;
        assert_eq!(first.status(), 200);
        let cookie = session_cookie(&first).unwrap();
        let body: Value = first.json().await.unwrap();
        assert_eq!(body["message"], "aadhar uploaded successfully.");
        assert_eq!(body["extractedData"]["dob"], "1990-01-01");

        let second = server.upload("pan", Some(&cookie)).await;
        assert_eq!(second.status(), 200);

        let session = server.get_json("/get-session-data", Some(&cookie)).await;
        assert_eq!(session["success"], true);
        assert_eq!(session["data"]["pan"]["panNumber"], "X1");

        let merged = server.get_json("/get-consolidated-data", Some(&cookie)).await;
        assert_eq!(
            merged["data"],
            serde_json::json!({"name": "A", "dob": "1990-01-01", "panNumber": "X1"})
        );
        assert_eq!(merged["documents"], serde_json::json!(["aadhar", "pan"]));
    }

    #[tokio::test]
    async fn failed_extraction_leaves_no_session() {
        let server = spawn(MockProvider::new("mock").with_response("I could not read it")).await;
        let resp = server.upload("aadhar", None).await;
        assert_eq!(resp.status(), 500);
        assert!(session_cookie(&resp).is_none());
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Failed to analyze the document.");
    }

    #[tokio::test]
    async fn validates_handwritten_form() {
        let server = spawn(
            MockProvider::new("mock")
                .with_response(r#"{"name":"A","dob":"1990-01-01"}"#)
                .with_response(r#"{"Full Name":"A"}"#)
                .with_response(
                    r#"[{"field":"name","masterValue":"A","handwrittenValue":"A","similarity":1.0},
                        {"field":"dob","masterValue":"1990-01-01","handwrittenValue":"Not Found","similarity":0.0}]"#,
                ),
        )
        .await;
        let cookie = session_cookie(&server.upload("aadhar", None).await).unwrap();

        let resp = server.validate(Some(&cookie)).await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["overallSimilarity"], 0.5);
        assert_eq!(body["decision"], "flagged");
        assert_eq!(body["comparison"][1]["handwrittenValue"], "Not Found");
        assert_eq!(body["comparison"][0]["decision"], "accepted");
        assert_eq!(body["comparison"][1]["decision"], "flagged");
    }

    #[tokio::test]
    async fn bodiless_posts_get_json_errors() {
        let server = spawn(MockProvider::new("mock")).await;

        let resp = server
            .client
            .post(format!("{}/validate-handwritten-form", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], handlers::NO_MASTER_DATA);

        let resp = server
            .client
            .post(format!("{}/analyze-document", server.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], handlers::MISSING_UPLOAD);
        assert_eq!(server.provider.calls(), 0);
    }

    #[tokio::test]
    async fn bodiless_validate_with_session_asks_for_the_form() {
        let server = spawn(MockProvider::new("mock").with_response(r#"{"name":"A"}"#)).await;
        let cookie = session_cookie(&server.upload("aadhar", None).await).unwrap();

        let resp = server
            .client
            .post(format!("{}/validate-handwritten-form", server.base))
            .header(reqwest::header::COOKIE, &cookie)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], handlers::NO_HANDWRITTEN_FORM);
        assert_eq!(server.provider.calls(), 1);
    }

    #[tokio::test]
    async fn mismatched_arbitration_is_processing_error() {
        let server = spawn(
            MockProvider::new("mock")
                .with_response(r#"{"name":"A","dob":"1990-01-01"}"#)
                .with_response(r#"{"Full Name":"A"}"#)
                .with_response(r#"[]"#),
        )
        .await;
        let cookie = session_cookie(&server.upload("aadhar", None).await).unwrap();
        let resp = server.validate(Some(&cookie)).await;
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Failed to process the handwritten form.");
    }

    #[tokio::test]
    async fn submit_destroys_session() {
        let server = spawn(MockProvider::new("mock").with_response(r#"{"casteName":"C"}"#)).await;
        let cookie = session_cookie(&server.upload("caste_certificate", None).await).unwrap();

        let resp = server
            .client
            .post(format!("{}/submit-form", server.base))
            .header(reqwest::header::COOKIE, &cookie)
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);

        let session = server.get_json("/get-session-data", Some(&cookie)).await;
        assert_eq!(session["success"], false);
    }

    #[tokio::test]
    async fn forged_cookie_is_ignored() {
        let server = spawn(MockProvider::new("mock").with_response(r#"{"name":"A"}"#)).await;
        let cookie = session_cookie(&server.upload("aadhar", None).await).unwrap();
        let forged = format!("{}0", cookie);
        let session = server.get_json("/get-session-data", Some(&forged)).await;
        assert_eq!(session["success"], false);
    }
}
