//! Document understanding: prompt construction, calls to the vision model,
//! and the extraction and handwritten-comparison pipelines built on them.

pub mod comparison;
pub mod extraction;
pub mod mime;
pub mod mock;
pub mod normalize;
pub mod prompts;
pub mod vision;

pub use comparison::{compare_handwritten, reconcile_comparison};
pub use extraction::{extract_document, extract_handwritten};
pub use mime::resolve_mime_type;
pub use mock::MockProvider;
pub use normalize::{parse_model_json, strip_code_fences};
pub use prompts::{arbitrator_prompt, extraction_prompt, HANDWRITTEN_FORM_PROMPT};
pub use vision::GeminiProvider;
