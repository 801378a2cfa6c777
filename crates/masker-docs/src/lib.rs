//! Document redaction for masker
//!
//! - `.docx`: text runs of `word/document.xml` are redacted in place and the
//!   package is rebuilt around them
//! - PDF: parsed to Markdown by an external service, redacted, returned as
//!   Markdown or re-rendered to PDF

pub mod client;
pub mod debug;
pub mod docx;
pub mod error;
pub mod pdf;
pub mod processor;
pub mod render;
pub mod replace;

pub use client::{Desensitize, HttpDesensitizer};
pub use debug::{DebugData, DebugSink, init_local_offset};
pub use error::{Error, Result};
pub use pdf::PdfParseClient;
pub use processor::{
    DOCX_CONTENT_TYPE, MARKDOWN_CONTENT_TYPE, PDF_CONTENT_TYPE, PdfParser, PdfProcessor, ProcessOptions,
    ProcessedDocument, WordProcessor, parse_flag,
};
pub use render::markdown_to_pdf;
