pub mod error;
pub mod scoring;
pub mod session;
pub mod traits;
pub mod types;

pub use error::VerifyError;
pub use scoring::{overall_similarity, MatchDecision, ACCEPT_THRESHOLD};
pub use session::SessionRecord;
pub use traits::{InferenceProvider, InferenceRequest, InferenceResponse, InlineImage};
pub use types::{
    ComparisonRecord, DocumentType, FieldSet, ValidationReport, NOT_FOUND, NOT_APPLICABLE,
};
