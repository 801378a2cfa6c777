//! Caching wrapper for extractors

use async_trait::async_trait;
use dashmap::DashMap;
use masker_core::{Label, Result};

use crate::extractor::{RawEntity, SemanticExtractor};

/// Memoises extraction results per (labels, chunk).
///
/// The cache is cleared wholesale once it reaches `capacity` entries.
pub struct CachedExtractor<E> {
    inner: E,
    entries: DashMap<String, Vec<RawEntity>>,
    capacity: usize,
}

impl<E: SemanticExtractor> CachedExtractor<E> {
    pub fn new(inner: E, capacity: usize) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn key(text: &str, labels: &[Label]) -> String {
        let mut hasher = blake3::Hasher::new();
        for label in labels {
            hasher.update(label.as_str().as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(&[1]);
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[async_trait]
impl<E: SemanticExtractor> SemanticExtractor for CachedExtractor<E> {
    async fn extract(&self, text: &str, labels: &[Label]) -> Result<Vec<RawEntity>> {
        let key = Self::key(text, labels);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.value().clone());
        }

        // Errors are not cached
        let entities = self.inner.extract(text, labels).await?;

        if self.entries.len() >= self.capacity {
            tracing::debug!("extraction cache full ({} entries), clearing", self.capacity);
            self.entries.clear();
        }
        self.entries.insert(key, entities.clone());

        Ok(entities)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
