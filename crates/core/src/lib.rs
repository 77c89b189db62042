pub mod catalog;
pub mod error;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod validate;

pub use catalog::{ISSUE_FALLBACK, ISSUE_TAXONOMY, PRODUCT_CATALOG};
pub use error::{AnalysisError, ErrorKind, ValidationIssue};
pub use models::*;
pub use normalize::{assemble, normalize_issues, normalize_products, normalize_sentiment};
pub use prompts::Classification;
pub use validate::{validate_body, validate_value};
