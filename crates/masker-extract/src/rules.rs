use async_trait::async_trait;
use lazy_static::lazy_static;
use masker_core::{CharIndex, Label, Result};
use regex::Regex;

use crate::extractor::{RawEntity, SemanticExtractor};

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern is valid");
}

/// Model-free extractor.
///
/// Only `电子邮箱` has a reliable surface form; every other semantic label
/// needs a model and yields nothing here.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleExtractor;

impl RuleExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SemanticExtractor for RuleExtractor {
    async fn extract(&self, text: &str, labels: &[Label]) -> Result<Vec<RawEntity>> {
        if !labels.contains(&Label::Email) {
            return Ok(Vec::new());
        }

        let index = CharIndex::new(text);
        Ok(EMAIL
            .find_iter(text)
            .map(|m| RawEntity {
                label: Label::Email,
                text: m.as_str().to_string(),
                start: index.to_char(m.start()),
                end: index.to_char(m.end()),
                probability: None,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "rules"
    }
}
