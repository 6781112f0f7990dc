//! Classification — heuristic schema-family labeling and scoring.
//!
//! The rules overlap on purpose; evaluation order is the tie-breaker and
//! the result is a heuristic label, not a guarantee.

pub mod format;
pub mod product;
pub mod score;

pub use format::{classify, Classification, Format};
pub use product::{extract_certifications, extract_product_info, ProductInfo};
pub use score::{score, ScoreResult};
