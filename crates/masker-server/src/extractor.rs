use masker_config::{ExtractorConfig, ExtractorKind};
use masker_extract::{CachedExtractor, HttpExtractor, RuleExtractor, SemanticExtractor};
use std::sync::Arc;
use std::time::Duration;

/// Build the semantic extractor described by `config`
pub fn build_extractor(config: &ExtractorConfig) -> anyhow::Result<Arc<dyn SemanticExtractor>> {
    match config.kind {
        ExtractorKind::Rules => {
            tracing::info!("semantic extraction: built-in rules");
            Ok(Arc::new(RuleExtractor::new()))
        }
        ExtractorKind::Http => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("extractor.kind = \"http\" needs extractor.url"))?;
            let http = HttpExtractor::new(url, Duration::from_secs(config.timeout_secs))?;
            tracing::info!("semantic extraction: model server at {}", url);

            if config.cache_capacity == 0 {
                Ok(Arc::new(http))
            } else {
                Ok(Arc::new(CachedExtractor::new(http, config.cache_capacity)))
            }
        }
    }
}
