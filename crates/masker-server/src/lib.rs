//! HTTP services for masker
//!
//! - the redaction API (`/mask/custom`)
//! - the document API and web UI, backed by a redaction API over HTTP

pub mod docs;
pub mod error;
pub mod extractor;
pub mod mask;

use anyhow::Result;
use masker_config::Config;
use masker_docs::{DebugSink, Desensitize, HttpDesensitizer, PdfParseClient, PdfProcessor, WordProcessor};
use masker_engine::MaskEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use docs::DocsState;
pub use extractor::build_extractor;

/// In-process redaction engine built from `config`
pub fn build_engine(config: &Config) -> Result<MaskEngine> {
    let extractor = build_extractor(&config.extractor)?;
    Ok(MaskEngine::new(extractor).with_default_chunk_len(config.mask.default_max_chunk_len))
}

/// Word and PDF pipelines around `desensitizer`
pub fn build_docs_state(config: &Config, desensitizer: Arc<dyn Desensitize>) -> Result<DocsState> {
    let docs = &config.documents;
    let debug = DebugSink::new(&docs.debug_dir, docs.debug);
    let parser = Arc::new(PdfParseClient::new(&docs.pdf_parse_api_url)?);

    let word = WordProcessor::new(desensitizer.clone())
        .with_debug(debug.clone())
        .with_output_dir(docs.output_dir.clone());
    let pdf = PdfProcessor::new(desensitizer.clone(), parser)
        .with_debug(debug)
        .with_output_dir(docs.output_dir.clone());

    Ok(DocsState {
        word: Arc::new(word),
        pdf: Arc::new(pdf),
        desensitizer,
        default_max_chunk_len: config.mask.default_max_chunk_len,
    })
}

/// Run the redaction API until the listener fails
pub async fn serve_mask(config: &Config) -> Result<()> {
    let engine = Arc::new(build_engine(config)?);
    let app = mask::router(engine);

    let addr = format!("{}:{}", config.mask.host, config.mask.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("mask service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Run the document API and web UI until the listener fails
pub async fn serve_docs(config: &Config) -> Result<()> {
    let docs = &config.documents;
    let client = HttpDesensitizer::new(
        &docs.desensitive_service_url,
        Duration::from_secs(docs.request_timeout_secs),
    )?;

    // The redaction API may come up later; requests fail with 502 until it does.
    match client.health().await {
        Ok(()) => info!("mask service reachable at {}", client.base_url()),
        Err(e) => warn!("mask service at {} is not reachable yet: {}", client.base_url(), e),
    }

    let state = build_docs_state(config, Arc::new(client))?;
    if docs.debug {
        info!("debug outputs enabled in {}", docs.debug_dir.display());
    }
    let app = docs::router(state, docs.max_upload_bytes);

    let addr = format!("{}:{}", docs.host, docs.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("document service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
