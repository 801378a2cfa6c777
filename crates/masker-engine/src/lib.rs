//! The masking pipeline behind `POST /mask/custom`
//!
//! 1. Regex rules for the requested numeric labels
//! 2. Chunked semantic extraction for every other requested label
//! 3. Global re-scan and merge (`merge::merge_entities`)
//! 4. Per-label masking

pub mod merge;

use std::sync::Arc;

use masker_core::{
    DEFAULT_MAX_CHUNK_LEN, EntitySpan, Error, Label, MANDATORY_NUMERIC_SCHEMA, Method, Result,
    apply_masking, split_into_chunks,
};
use masker_extract::SemanticExtractor;
use masker_rules::RuleScanner;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use merge::merge_entities;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskRequest {
    pub text: String,
    #[serde(default)]
    pub schemalist: Option<Vec<Label>>,
    #[serde(default)]
    pub max_chunk_len: Option<usize>,
}

impl MaskRequest {
    pub fn new(text: impl Into<String>, labels: Vec<Label>) -> Self {
        Self {
            text: text.into(),
            schemalist: Some(labels),
            max_chunk_len: None,
        }
    }

    pub fn with_max_chunk_len(mut self, max_chunk_len: usize) -> Self {
        self.max_chunk_len = Some(max_chunk_len);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskResponse {
    pub original: String,
    pub masked: String,
    pub entities_found: Vec<EntitySpan>,
    pub mandatory: Vec<String>,
    pub optional_selected: Vec<Label>,
}

pub struct MaskEngine {
    scanner: RuleScanner,
    extractor: Arc<dyn SemanticExtractor>,
    default_max_chunk_len: usize,
}

impl MaskEngine {
    pub fn new(extractor: Arc<dyn SemanticExtractor>) -> Self {
        Self {
            scanner: RuleScanner::new(),
            extractor,
            default_max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
        }
    }

    pub fn with_default_chunk_len(mut self, max_chunk_len: usize) -> Self {
        self.default_max_chunk_len = max_chunk_len;
        self
    }

    pub async fn mask(&self, req: &MaskRequest) -> Result<MaskResponse> {
        if req.text.trim().is_empty() {
            return Err(Error::InvalidInput("text is empty".to_string()));
        }

        let selected = req.schemalist.clone().unwrap_or_default();
        let (numeric, semantic) = Label::partition(&selected);
        let max_chunk_len = req
            .max_chunk_len
            .filter(|&n| n > 0)
            .unwrap_or(self.default_max_chunk_len);

        // 1. Regex (numeric labels)
        let regex_entities = if numeric.is_empty() {
            Vec::new()
        } else {
            self.scanner.scan(&req.text, &numeric)
        };

        // 2. Model (semantic labels)
        let model_entities = if semantic.is_empty() {
            Vec::new()
        } else {
            self.extract_semantic(&req.text, &semantic, max_chunk_len).await
        };

        // 3. Re-scan and merge
        let entities = merge_entities(&req.text, regex_entities, model_entities);
        let masked = apply_masking(&req.text, &entities);

        info!(
            "masked {} chars: {} entities ({} labels requested)",
            req.text.chars().count(),
            entities.len(),
            selected.len()
        );

        Ok(MaskResponse {
            original: req.text.clone(),
            masked,
            entities_found: entities,
            mandatory: MANDATORY_NUMERIC_SCHEMA.iter().map(|s| s.to_string()).collect(),
            optional_selected: semantic,
        })
    }

    /// Run the extractor chunk by chunk.
    ///
    /// Any extractor failure drops all model results for this request; the
    /// regex results still apply.
    async fn extract_semantic(&self, text: &str, labels: &[Label], max_chunk_len: usize) -> Vec<EntitySpan> {
        let mut entities = Vec::new();

        for chunk in split_into_chunks(text, max_chunk_len) {
            if chunk.is_blank() {
                continue;
            }

            let raw = match self.extractor.extract(&chunk.text, labels).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("{} extractor failed: {}", self.extractor.name(), e);
                    return Vec::new();
                }
            };

            let chunk_len = chunk.text.chars().count();
            for item in raw {
                if item.start >= item.end || item.end > chunk_len {
                    tracing::debug!("dropping out-of-range model span {:?}", item);
                    continue;
                }
                entities.push(EntitySpan::new(
                    item.text,
                    item.label,
                    item.start + chunk.offset,
                    item.end + chunk.offset,
                    Method::ModelChunk,
                ));
            }
        }

        entities
    }
}
