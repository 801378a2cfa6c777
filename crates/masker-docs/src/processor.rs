//! Word and PDF redaction pipelines

use async_trait::async_trait;
use masker_core::Label;
use masker_engine::{MaskRequest, MaskResponse};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::client::Desensitize;
use crate::debug::{DebugData, DebugSink};
use crate::docx;
use crate::error::{Error, Result};
use crate::pdf::PdfParseClient;
use crate::render::markdown_to_pdf;
use crate::replace::{apply_to_runs, generate_replacements};

pub const DOCX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown";

/// Labels and chunking forwarded to the redaction service
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub labels: Vec<Label>,
    pub max_chunk_len: usize,
}

impl ProcessOptions {
    pub fn new(labels: Vec<Label>) -> Self {
        Self {
            labels,
            max_chunk_len: masker_core::DEFAULT_MAX_CHUNK_LEN,
        }
    }

    fn request(&self, text: &str) -> MaskRequest {
        MaskRequest::new(text, self.labels.clone()).with_max_chunk_len(self.max_chunk_len)
    }
}

/// A redacted document ready to be returned
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub entity_count: usize,
}

/// Source of Markdown for an uploaded PDF
#[async_trait]
pub trait PdfParser: Send + Sync {
    async fn parse_to_markdown(&self, content: Vec<u8>, filename: &str) -> Result<String>;
}

#[async_trait]
impl PdfParser for PdfParseClient {
    async fn parse_to_markdown(&self, content: Vec<u8>, filename: &str) -> Result<String> {
        PdfParseClient::parse_to_markdown(self, content, filename).await
    }
}

/// Last path component only, so uploads cannot name files elsewhere
fn safe_name(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("document")
        .to_string()
}

fn base_name(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string()
}

fn entities_json(response: &MaskResponse) -> serde_json::Value {
    json!({
        "total_entities": response.entities_found.len(),
        "entities": response.entities_found,
    })
}

async fn write_output(output_dir: Option<&Path>, doc: &ProcessedDocument) {
    let Some(dir) = output_dir else {
        return;
    };
    let path = dir.join(&doc.filename);
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &doc.bytes).await
    }
    .await;

    match result {
        Ok(()) => tracing::info!("wrote {} ({} bytes)", path.display(), doc.bytes.len()),
        Err(e) => tracing::error!("failed to write {}: {}", path.display(), e),
    }
}

fn record_error(debug: &DebugSink, filename: &str, e: &Error) {
    tracing::error!("processing {} failed: {}", filename, e);
    debug.save(
        filename,
        "99_error",
        DebugData::Json(json!({ "error": e.to_string(), "error_type": error_type(e) })),
    );
}

fn error_type(e: &Error) -> &'static str {
    match e {
        Error::InvalidInput(_) => "InvalidInput",
        Error::Format(_) => "Format",
        Error::Unavailable(_) => "Unavailable",
        Error::Upstream(_) => "Upstream",
        Error::Mask(_) => "Mask",
        Error::Zip(_) => "Zip",
        Error::Pdf(_) => "Pdf",
        Error::Io(_) => "Io",
        Error::Serialization(_) => "Serialization",
    }
}

/// Redacts `.docx` uploads in place, keeping all formatting
pub struct WordProcessor {
    desensitizer: Arc<dyn Desensitize>,
    debug: DebugSink,
    output_dir: Option<PathBuf>,
}

impl WordProcessor {
    pub fn new(desensitizer: Arc<dyn Desensitize>) -> Self {
        Self {
            desensitizer,
            debug: DebugSink::disabled(),
            output_dir: None,
        }
    }

    pub fn with_debug(mut self, debug: DebugSink) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub async fn process(&self, content: &[u8], filename: &str, options: &ProcessOptions) -> Result<ProcessedDocument> {
        let filename = safe_name(filename);
        tracing::info!("processing Word document {} ({} bytes)", filename, content.len());

        match self.run(content, &filename, options).await {
            Ok(doc) => {
                write_output(self.output_dir.as_deref(), &doc).await;
                Ok(doc)
            }
            Err(e) => {
                record_error(&self.debug, &filename, &e);
                Err(e)
            }
        }
    }

    async fn run(&self, content: &[u8], filename: &str, options: &ProcessOptions) -> Result<ProcessedDocument> {
        let output_name = format!("desensitized_{}", filename);

        // 1. document.xml
        let xml = docx::read_document_xml(content)?;
        self.debug.save(filename, "01_original_xml", DebugData::Xml(&xml));

        // 2. Text runs
        let runs = docx::extract_runs(&xml);
        let text = docx::full_text(&runs);
        tracing::info!("extracted {} chars from {} text runs", text.chars().count(), runs.len());
        self.debug.save(filename, "02_extracted_text", DebugData::Text(&text));
        if self.debug.is_enabled() {
            let sample: Vec<_> = runs
                .iter()
                .take(10)
                .map(|r| json!({ "start": r.start, "end": r.end, "text": r.text }))
                .collect();
            self.debug.save(
                filename,
                "03_node_mapping",
                DebugData::Json(json!({ "total_nodes": runs.len(), "sample_nodes": sample })),
            );
        }

        if text.trim().is_empty() {
            tracing::warn!("{} has no text, returning it unchanged", filename);
            return Ok(ProcessedDocument {
                filename: output_name,
                content_type: DOCX_CONTENT_TYPE,
                bytes: content.to_vec(),
                entity_count: 0,
            });
        }

        // 3. Redaction
        let response = self.desensitizer.desensitize(&options.request(&text)).await?;
        self.debug.save(filename, "04_masked_text", DebugData::Text(&response.masked));
        self.debug.save(filename, "05_entities", DebugData::Json(entities_json(&response)));
        tracing::info!("redaction found {} entities", response.entities_found.len());

        // 4. Map back onto runs
        let replacements = generate_replacements(&text, &response.masked, &response.entities_found);
        self.debug.save(
            filename,
            "06_replacements",
            DebugData::Json(json!({ "total_replacements": replacements.len(), "replacements": replacements })),
        );
        let new_texts = apply_to_runs(&runs, &replacements);
        let changed = new_texts.iter().filter(|t| t.is_some()).count();
        tracing::info!("{} replacements touch {} of {} runs", replacements.len(), changed, runs.len());

        // 5. Rewrite and repack
        let modified = docx::splice_runs(&xml, &runs, &new_texts);
        self.debug.save(filename, "07_modified_xml", DebugData::Xml(&modified));
        let bytes = docx::repack(content, &modified)?;

        Ok(ProcessedDocument {
            filename: output_name,
            content_type: DOCX_CONTENT_TYPE,
            bytes,
            entity_count: response.entities_found.len(),
        })
    }
}

/// Redacts PDF uploads through Markdown
pub struct PdfProcessor {
    desensitizer: Arc<dyn Desensitize>,
    parser: Arc<dyn PdfParser>,
    debug: DebugSink,
    output_dir: Option<PathBuf>,
}

impl PdfProcessor {
    pub fn new(desensitizer: Arc<dyn Desensitize>, parser: Arc<dyn PdfParser>) -> Self {
        Self {
            desensitizer,
            parser,
            debug: DebugSink::disabled(),
            output_dir: None,
        }
    }

    pub fn with_debug(mut self, debug: DebugSink) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub async fn process(
        &self,
        content: Vec<u8>,
        filename: &str,
        options: &ProcessOptions,
        return_pdf: bool,
    ) -> Result<ProcessedDocument> {
        let filename = safe_name(filename);
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(Error::InvalidInput("only PDF files are supported".to_string()));
        }
        tracing::info!("processing PDF {} ({} bytes, return_pdf={})", filename, content.len(), return_pdf);

        match self.run(content, &filename, options, return_pdf).await {
            Ok(doc) => {
                write_output(self.output_dir.as_deref(), &doc).await;
                Ok(doc)
            }
            Err(e) => {
                record_error(&self.debug, &filename, &e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        content: Vec<u8>,
        filename: &str,
        options: &ProcessOptions,
        return_pdf: bool,
    ) -> Result<ProcessedDocument> {
        // 1. Parse
        let markdown = self.parser.parse_to_markdown(content, filename).await?;
        self.debug.save(filename, "01_parsed_markdown", DebugData::Text(&markdown));
        if markdown.trim().is_empty() {
            return Err(Error::Upstream("PDF parse result is empty".to_string()));
        }

        // 2. Redaction
        let response = self.desensitizer.desensitize(&options.request(&markdown)).await?;
        self.debug.save(filename, "02_masked_markdown", DebugData::Text(&response.masked));
        self.debug.save(filename, "03_entities", DebugData::Json(entities_json(&response)));
        tracing::info!("redaction found {} entities", response.entities_found.len());

        // 3. Output
        let base = base_name(filename);
        let doc = if return_pdf {
            ProcessedDocument {
                filename: format!("desensitized_{}.pdf", base),
                content_type: PDF_CONTENT_TYPE,
                bytes: markdown_to_pdf(&response.masked)?,
                entity_count: response.entities_found.len(),
            }
        } else {
            ProcessedDocument {
                filename: format!("desensitized_{}.md", base),
                content_type: MARKDOWN_CONTENT_TYPE,
                bytes: response.masked.into_bytes(),
                entity_count: response.entities_found.len(),
            }
        };

        Ok(doc)
    }
}

/// `true`, `1` or `yes`, case-insensitive
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
