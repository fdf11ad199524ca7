//! Handwritten form validation against the consolidated master data.

use docverify_core::types::is_scored_value;
use docverify_core::{
    ComparisonRecord, FieldSet, InferenceProvider, InferenceRequest, InlineImage, MatchDecision,
    SessionRecord, ValidationReport, VerifyError, overall_similarity,
};
use tracing::{info, warn};

use crate::extraction::{extract_handwritten, run_inference};
use crate::normalize::parse_model_json;
use crate::prompts::arbitrator_prompt;

/// Compare a handwritten form with everything extracted in the session.
///
/// Runs the handwritten OCR call and then the arbitrator call; a failure
/// at either step fails the whole comparison.
pub async fn compare_handwritten(
    provider: &dyn InferenceProvider,
    record: &SessionRecord,
    image: Option<InlineImage>,
) -> Result<ValidationReport, VerifyError> {
    if record.is_empty() {
        return Err(VerifyError::NoMasterData);
    }
    let image = image
        .filter(|i| !i.data.is_empty())
        .ok_or_else(|| VerifyError::missing("handwrittenForm"))?;

    let handwritten = extract_handwritten(provider, image).await?;
    let master = record.consolidate();

    let request = InferenceRequest::text(arbitrator_prompt(&master, &handwritten));
    let raw = run_inference(provider, &request, "arbitrate").await?;
    let records: Vec<ComparisonRecord> = parse_model_json(&raw)?;
    let comparison = reconcile_comparison(&master, records)?;

    let overall_similarity = overall_similarity(&comparison);
    let decision = MatchDecision::from_similarity(overall_similarity);

    for rec in comparison.iter().filter(|r| r.is_scored()) {
        if rec.decision() == MatchDecision::Flagged {
            warn!(field = %rec.field, similarity = rec.similarity, "Field below match threshold");
        }
    }
    info!(
        fields = comparison.len(),
        overall_similarity,
        decision = ?decision,
        "Handwritten form compared"
    );

    Ok(ValidationReport {
        comparison,
        overall_similarity,
        decision,
    })
}

/// Check the arbitrator's records against the master data.
///
/// Records must name master fields, in master order, without repeats, and
/// must cover every master field that is scored. `masterValue` is reset to
/// the real master value and a "Not Found" match scores 0.
pub fn reconcile_comparison(
    master: &FieldSet,
    records: Vec<ComparisonRecord>,
) -> Result<Vec<ComparisonRecord>, VerifyError> {
    let master_keys: Vec<&str> = master.keys().collect();
    let mut next_index = 0;
    let mut reconciled = Vec::with_capacity(records.len());

    for mut rec in records {
        let Some(pos) = master_keys.iter().position(|k| *k == rec.field) else {
            return Err(VerifyError::ComparisonMismatch(format!(
                "unknown field '{}'",
                rec.field
            )));
        };
        if pos < next_index {
            return Err(VerifyError::ComparisonMismatch(format!(
                "field '{}' repeated or out of order",
                rec.field
            )));
        }
        if !rec.similarity.is_finite() || !(0.0..=1.0).contains(&rec.similarity) {
            return Err(VerifyError::ComparisonMismatch(format!(
                "similarity {} for '{}' outside [0, 1]",
                rec.similarity, rec.field
            )));
        }
        next_index = pos + 1;

        rec.master_value = master.get(&rec.field).unwrap_or_default().to_string();
        if rec.is_not_found() {
            rec.similarity = 0.0;
        }
        rec.decision = Some(rec.decision());
        reconciled.push(rec);
    }

    let missing: Vec<&str> = master
        .iter()
        .filter(|(key, value)| is_scored_value(value) && !reconciled.iter().any(|r| r.field == *key))
        .map(|(key, _)| key)
        .collect();
    if !missing.is_empty() {
        return Err(VerifyError::ComparisonMismatch(format!(
            "missing fields: {}",
            missing.join(", ")
        )));
    }

    Ok(reconciled)
}
