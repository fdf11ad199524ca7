use docverify_core::{
    DocumentType, FieldSet, InferenceProvider, InferenceRequest, InlineImage, VerifyError,
};
use tracing::{debug, info, warn};

use crate::normalize::parse_model_json;
use crate::prompts::{HANDWRITTEN_FORM_PROMPT, extraction_prompt};

/// Send one request and return the raw model text, mapping provider
/// failures into [`VerifyError::Inference`].
pub(crate) async fn run_inference(
    provider: &dyn InferenceProvider,
    request: &InferenceRequest,
    step: &str,
) -> Result<String, VerifyError> {
    match provider.generate(request).await {
        Ok(response) => {
            info!(
                step,
                provider = %response.provider,
                model = %response.model,
                latency_ms = response.latency_ms,
                "Inference call completed"
            );
            Ok(response.text)
        }
        Err(e) => {
            warn!(step, provider = provider.name(), error = %e, "Inference call failed");
            Err(VerifyError::Inference {
                provider: provider.name().to_string(),
                message: format!("{e:#}"),
            })
        }
    }
}

/// Extract the fields of one uploaded document.
///
/// Nothing is stored here; the caller saves the returned set into the
/// session only after this succeeds.
pub async fn extract_document(
    provider: &dyn InferenceProvider,
    doc_type: &DocumentType,
    image: InlineImage,
) -> Result<FieldSet, VerifyError> {
    if image.data.is_empty() {
        return Err(VerifyError::missing("document"));
    }
    let request = InferenceRequest::with_image(extraction_prompt(doc_type), image);
    let raw = run_inference(provider, &request, "extract_document").await?;
    let fields: FieldSet = parse_model_json(&raw)?;
    debug!(doc_type = %doc_type, field_count = fields.len(), "Document fields extracted");
    Ok(fields)
}

/// Read every label/value pair off a handwritten form.
pub async fn extract_handwritten(
    provider: &dyn InferenceProvider,
    image: InlineImage,
) -> Result<FieldSet, VerifyError> {
    if image.data.is_empty() {
        return Err(VerifyError::missing("handwrittenForm"));
    }
    let request = InferenceRequest::with_image(HANDWRITTEN_FORM_PROMPT, image);
    let raw = run_inference(provider, &request, "extract_handwritten").await?;
    let fields: FieldSet = parse_model_json(&raw)?;
    debug!(field_count = fields.len(), "Handwritten fields extracted");
    Ok(fields)
}
