//! Route handlers for document upload, session access, form submission,
//! and handwritten-form validation.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use docverify_core::{DocumentType, FieldSet, InlineImage, SessionRecord, VerifyError};
use docverify_understanding::{compare_handwritten, extract_document, resolve_mime_type};
use serde_json::json;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::server::GatewayState;
use crate::session_cookie::{CookieSigner, SessionCookie};

pub(crate) const MISSING_UPLOAD: &str = "File or document type missing.";
pub(crate) const NO_MASTER_DATA: &str =
    "No master document data found in session. Please upload original documents first.";
pub(crate) const NO_HANDWRITTEN_FORM: &str = "No handwritten form image uploaded.";
const NO_SESSION_DATA: &str = "No document data found in session.";
const ANALYZE_FAILED: &str = "Failed to analyze the document.";
const VALIDATE_FAILED: &str = "Failed to process the handwritten form.";

struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

impl UploadedFile {
    fn into_image(self) -> InlineImage {
        let mime = resolve_mime_type(
            self.content_type.as_deref(),
            self.file_name.as_deref(),
            &self.data,
        );
        InlineImage::new(mime, self.data)
    }
}

/// Parsed multipart body: file parts and text parts by field name.
#[derive(Default)]
struct UploadForm {
    files: HashMap<String, UploadedFile>,
    texts: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of the body. A request that is not multipart at all
    /// yields an empty form, so the caller reports the missing upload.
    async fn read(multipart: Result<Multipart, MultipartRejection>) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        let mut multipart = match multipart {
            Ok(multipart) => multipart,
            Err(rejection) => {
                debug!(reason = %rejection.body_text(), "Request has no multipart body");
                return Ok(form);
            }
        };
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            if file_name.is_some() {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            } else {
                let text = field.text().await?;
                form.texts.insert(name, text);
            }
        }
        Ok(form)
    }

    /// A non-empty uploaded file by field name.
    fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.data.is_empty())
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }
}

async fn current_record(state: &GatewayState, session: &SessionCookie) -> Option<SessionRecord> {
    let session_id = session.0.as_deref()?;
    state
        .sessions
        .get(session_id)
        .await
        .filter(|record| !record.is_empty())
}

/// Handler for `POST /analyze-document`.
///
/// Extracts the fields of one document and saves them under its type in
/// the caller's session. The session is only written after extraction
/// succeeds.
pub async fn analyze_document(
    State(state): State<GatewayState>,
    session: SessionCookie,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("document");
    let doc_type = form.text("docType").and_then(DocumentType::from_tag);
    let (Some(file), Some(doc_type)) = (file, doc_type) else {
        return Err(ApiError::bad_request(MISSING_UPLOAD));
    };

    let image = file.into_image();
    info!(doc_type = %doc_type, mime = %image.mime_type, bytes = image.data.len(), "Analyzing document");

    let fields = extract_document(state.provider.as_ref(), &doc_type, image)
        .await
        .map_err(|e| {
            if e.is_client_error() {
                ApiError::bad_request(MISSING_UPLOAD)
            } else {
                ApiError::failed(ANALYZE_FAILED, e)
            }
        })?;

    let session_id = session.0.unwrap_or_else(CookieSigner::new_session_id);
    let created = state
        .sessions
        .store_document(&session_id, doc_type.clone(), fields.clone())
        .await;
    if created {
        info!(session = %session_id, "Session created");
    }

    let body = Json(json!({
        "success": true,
        "message": format!("{} uploaded successfully.", doc_type.display_name()),
        "extractedData": fields,
    }));
    Ok(([(SET_COOKIE, state.cookies.set_cookie(&session_id))], body).into_response())
}

/// Handler for `GET /get-session-data`.
pub async fn get_session_data(
    State(state): State<GatewayState>,
    session: SessionCookie,
) -> Json<serde_json::Value> {
    match current_record(&state, &session).await {
        Some(record) => Json(json!({ "success": true, "data": record })),
        None => Json(json!({ "success": false, "message": NO_SESSION_DATA })),
    }
}

/// Consolidated fields prepared for the review form. `state` falls back to
/// `territory` when the residency certificate only printed the latter.
fn prefill_view(record: &SessionRecord) -> FieldSet {
    let mut merged = record.consolidate();
    let state_missing = merged.get("state").is_none_or(str::is_empty);
    if state_missing {
        if let Some(territory) = merged.get("territory").filter(|t| !t.is_empty()) {
            let territory = territory.to_string();
            merged.insert("state", territory);
        }
    }
    merged
}

/// Handler for `GET /get-consolidated-data`.
pub async fn get_consolidated_data(
    State(state): State<GatewayState>,
    session: SessionCookie,
) -> Json<serde_json::Value> {
    match current_record(&state, &session).await {
        Some(record) => {
            let documents: Vec<&str> = record.document_types().map(DocumentType::tag).collect();
            Json(json!({
                "success": true,
                "data": prefill_view(&record),
                "documents": documents,
            }))
        }
        None => Json(json!({ "success": false, "message": NO_SESSION_DATA })),
    }
}

/// Handler for `POST /submit-form`. Destroys the session.
pub async fn submit_form(State(state): State<GatewayState>, session: SessionCookie) -> Response {
    if let Some(session_id) = session.0.as_deref() {
        if state.sessions.destroy(session_id).await {
            info!(session = %session_id, "Form submitted; session destroyed");
        }
    }
    (
        [(SET_COOKIE, state.cookies.clear_cookie())],
        Json(json!({ "success": true, "message": "Form submitted and session destroyed." })),
    )
        .into_response()
}

/// Handler for `POST /validate-handwritten-form`.
///
/// Requires master data in the session before the upload is even read.
pub async fn validate_handwritten_form(
    State(state): State<GatewayState>,
    session: SessionCookie,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Some(record) = current_record(&state, &session).await else {
        return Err(ApiError::bad_request(NO_MASTER_DATA));
    };

    let mut form = UploadForm::read(multipart).await?;
    let Some(file) = form.take_file("handwrittenForm") else {
        return Err(ApiError::bad_request(NO_HANDWRITTEN_FORM));
    };

    let report = compare_handwritten(state.provider.as_ref(), &record, Some(file.into_image()))
        .await
        .map_err(|e| match e {
            VerifyError::NoMasterData => ApiError::bad_request(NO_MASTER_DATA),
            e if e.is_client_error() => ApiError::bad_request(NO_HANDWRITTEN_FORM),
            e => ApiError::failed(VALIDATE_FAILED, e),
        })?;

    Ok(Json(report).into_response())
}
