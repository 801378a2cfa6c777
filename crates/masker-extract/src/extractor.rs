//! Semantic extractor trait

use async_trait::async_trait;
use masker_core::{Label, Result};
use serde::{Deserialize, Serialize};

/// An entity reported by an extractor, with offsets relative to the input chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    pub label: Label,
    pub text: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

/// Trait for model-backed (or model-like) entity extraction
#[async_trait]
pub trait SemanticExtractor: Send + Sync {
    /// Extract entities for `labels` from one chunk of text.
    ///
    /// Offsets are char offsets into `text`.
    async fn extract(&self, text: &str, labels: &[Label]) -> Result<Vec<RawEntity>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}
