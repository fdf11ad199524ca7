//! Prompt text sent to the vision model.

use docverify_core::{DocumentType, FieldSet};

const EXTRACTION_PREAMBLE: &str = "You are an expert data extraction AI. Analyze this image of a government document. \
Return the data ONLY as a valid JSON object. Do not include any other text or markdown formatting. \
If a field is not found, use an empty string '' as its value. \
Extract the following fields with these exact JSON keys: ";

/// Free-form OCR instruction for a filled-in handwritten form.
pub const HANDWRITTEN_FORM_PROMPT: &str = "This is an image of a filled-out form which may be in English or Marathi. \
Extract all handwritten text entries and their corresponding printed labels. \
Return the result ONLY as a single, flat JSON object where keys are the labels and values are the handwritten entries.";

/// Build the extraction instruction for one document type.
pub fn extraction_prompt(doc_type: &DocumentType) -> String {
    let fields = match doc_type {
        DocumentType::IdentityCard => {
            "full name as 'name', aadhar number as 'aadharNumber', gender as 'gender', address as 'address', and date of birth as 'dob'."
        }
        DocumentType::TaxIdCard => {
            "full name as 'name', father's name as 'fatherName', Permanent Account Number (PAN) as 'panNumber', and date of birth as 'dob'."
        }
        DocumentType::SecondarySchoolCertificate => {
            "student's name as 'name', seat number as 'seatNo', mother's name as 'motherName', divisional board name as 'boardName', and percentage as 'percentage'."
        }
        DocumentType::CasteCertificate => "caste name as 'casteName'.",
        DocumentType::ResidencyCertificate => {
            "district name as 'district', serial number as 'serialNo', issue date as 'issueDate', state as 'state', and territory as 'territory'."
        }
        DocumentType::Other(_) => "any visible name as 'name', numbers, and dates.",
    };
    format!("{EXTRACTION_PREAMBLE}{fields}")
}

/// Build the arbitrator instruction that reconciles master data with the
/// handwritten form and scores each master field.
pub fn arbitrator_prompt(master: &FieldSet, handwritten: &FieldSet) -> String {
    let master_json = serde_json::to_string(master).unwrap_or_else(|_| "{}".to_string());
    let handwritten_json =
        serde_json::to_string(handwritten).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"You are an expert data validation assistant. You are given two JSON objects.
1. masterData: data extracted from official documents. This is the source of truth.
2. handwrittenData: data extracted from a handwritten form. Its labels may be worded differently (e.g. 'Full Name' vs 'Name') or written in another language (e.g. 'Name' vs 'नाव').

For every field in masterData, find the corresponding entry in handwrittenData even if the label differs or is in another language. Score the similarity of the two values from 0.0 to 1.0, where 1.0 is an exact match, tolerating minor spelling differences.

masterData: {master_json}
handwrittenData: {handwritten_json}

Return ONLY a valid JSON array with exactly one object per masterData field, in masterData order. Each object must have the keys "field" (the masterData key), "masterValue", "handwrittenValue" and "similarity". If no corresponding entry exists in handwrittenData, set "handwrittenValue" to "Not Found" and "similarity" to 0.0."#
    )
}
