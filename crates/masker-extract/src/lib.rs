//! Semantic entity extraction
//!
//! Names, addresses and organisations cannot be matched by regex. They come
//! from an information-extraction model behind the `SemanticExtractor` trait:
//! - `HttpExtractor` calls a UIE-compatible model server
//! - `RuleExtractor` is the model-free fallback (email only)
//! - `CachedExtractor` memoises any extractor per (labels, chunk)

pub mod cache;
pub mod extractor;
pub mod http;
pub mod rules;

pub use cache::CachedExtractor;
pub use extractor::{RawEntity, SemanticExtractor};
pub use http::HttpExtractor;
pub use rules::RuleExtractor;
