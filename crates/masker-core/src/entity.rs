//! Detected entity spans

use serde::{Deserialize, Serialize};

use crate::Label;

/// How an entity was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Regex rule engine
    Regex,
    /// Semantic extractor, within one chunk
    ModelChunk,
    /// Literal re-scan of a model hit across the full text
    ModelGlobalScan,
}

/// A labeled substring with char offsets into the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: Label,
    pub start: usize,
    pub end: usize,
    pub method: Method,
}

impl EntitySpan {
    pub fn new(text: impl Into<String>, label: Label, start: usize, end: usize, method: Method) -> Self {
        Self {
            text: text.into(),
            label,
            start,
            end,
            method,
        }
    }

    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
