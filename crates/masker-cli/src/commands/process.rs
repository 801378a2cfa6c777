use anyhow::{Context, Result, bail};
use masker_config::Config;
use masker_docs::{Desensitize, HttpDesensitizer, ProcessOptions, ProcessedDocument};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct ProcessArgs {
    pub file: PathBuf,
    pub labels: Vec<String>,
    pub custom: String,
    pub max_chunk_len: Option<usize>,
    pub return_pdf: bool,
    pub out: Option<PathBuf>,
    pub remote: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Word,
    Pdf,
}

fn document_kind(path: &Path) -> Result<DocumentKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "docx" => Ok(DocumentKind::Word),
        "pdf" => Ok(DocumentKind::Pdf),
        _ => bail!("unsupported file type: {} (expected .docx or .pdf)", path.display()),
    }
}

pub async fn handle(config: &Config, args: ProcessArgs) -> Result<()> {
    let kind = document_kind(&args.file)?;
    let content = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let desensitizer: Arc<dyn Desensitize> = if args.remote {
        Arc::new(HttpDesensitizer::new(
            &config.documents.desensitive_service_url,
            Duration::from_secs(config.documents.request_timeout_secs),
        )?)
    } else {
        Arc::new(masker_server::build_engine(config)?)
    };
    let state = masker_server::build_docs_state(config, desensitizer)?;

    let options = ProcessOptions {
        labels: super::resolve_labels(&args.labels, &args.custom),
        max_chunk_len: args.max_chunk_len.unwrap_or(config.mask.default_max_chunk_len),
    };

    let doc = match kind {
        DocumentKind::Word => state.word.process(&content, &filename, &options).await?,
        DocumentKind::Pdf => {
            state
                .pdf
                .process(content, &filename, &options, args.return_pdf)
                .await?
        }
    };

    let out = output_path(&args.file, args.out.as_deref(), &doc);
    tokio::fs::write(&out, &doc.bytes)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("✓ {} entities redacted → {}", doc.entity_count, out.display());

    Ok(())
}

fn output_path(input: &Path, out: Option<&Path>, doc: &ProcessedDocument) -> PathBuf {
    match out {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&doc.filename),
    }
}
