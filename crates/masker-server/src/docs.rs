//! Document API and web UI

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartError,
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use masker_core::Label;
use masker_docs::{Desensitize, PdfProcessor, ProcessOptions, ProcessedDocument, WordProcessor, parse_flag};
use masker_engine::{MaskRequest, MaskResponse};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{ApiError, ApiResult};

const WEB_UI: &str = include_str!("web_ui.html");

/// RFC 5987 attr-char complement
const FILENAME_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Clone)]
pub struct DocsState {
    pub word: Arc<WordProcessor>,
    pub pdf: Arc<PdfProcessor>,
    pub desensitizer: Arc<dyn Desensitize>,
    pub default_max_chunk_len: usize,
}

pub fn router(state: DocsState, max_upload_bytes: usize) -> Router {
    // Add CORS layer to allow connections from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(web_ui))
        .route("/health", get(health))
        .route("/api/v1/process/word", post(process_word))
        .route("/api/v1/process/pdf", post(process_pdf))
        .route("/api/v1/mask/text", post(mask_text))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

async fn web_ui() -> Html<&'static str> {
    Html(WEB_UI)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "document-processor" }))
}

/// Multipart upload shared by both document endpoints
struct Upload {
    content: Vec<u8>,
    filename: String,
    options: ProcessOptions,
    return_pdf: bool,
}

/// Keep the status axum assigns to a multipart failure (413 over the body limit)
fn multipart_error(context: &str, e: MultipartError) -> ApiError {
    let status = e.status();
    let detail = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "upload exceeds the size limit".to_string()
    } else {
        format!("{}: {}", context, e.body_text())
    };
    ApiError { status, detail }
}

async fn read_upload(mut multipart: Multipart, default_max_chunk_len: usize) -> ApiResult<Upload> {
    let mut file = None;
    let mut schemalist = String::new();
    let mut custom_labels = String::new();
    let mut max_chunk_len = None;
    let mut return_pdf = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("invalid multipart body", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("failed to read upload", e))?;
                file = Some((filename, bytes.to_vec()));
            }
            "schemalist" | "custom_labels" | "max_chunk_len" | "return_pdf" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(&format!("failed to read field {}", name), e))?;
                match name.as_str() {
                    "schemalist" => schemalist = value,
                    "custom_labels" => custom_labels = value,
                    "max_chunk_len" if !value.trim().is_empty() => {
                        let parsed = value
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| ApiError::bad_request(format!("invalid max_chunk_len: {}", value)))?;
                        max_chunk_len = Some(parsed);
                    }
                    "return_pdf" => return_pdf = parse_flag(&value),
                    _ => {}
                }
            }
            other => tracing::debug!("ignoring multipart field {}", other),
        }
    }

    let (filename, content) = file.ok_or_else(|| ApiError::bad_request("missing file"))?;
    let labels = Label::merge_custom(&parse_schemalist(&schemalist), &custom_labels);

    Ok(Upload {
        content,
        filename,
        options: ProcessOptions {
            labels,
            max_chunk_len: max_chunk_len.unwrap_or(default_max_chunk_len),
        },
        return_pdf,
    })
}

/// A JSON array of labels, or failing that a comma-separated list
pub fn parse_schemalist(raw: &str) -> Vec<Label> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<Label>>(raw) {
        Ok(labels) => labels,
        Err(_) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Label::from)
            .collect(),
    }
}

fn attachment(doc: ProcessedDocument) -> Response {
    let ascii: String = doc
        .filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        utf8_percent_encode(&doc.filename, FILENAME_ENCODE)
    );

    (
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        doc.bytes,
    )
        .into_response()
}

/// POST /api/v1/process/word - Redact a .docx upload
async fn process_word(State(state): State<DocsState>, multipart: Multipart) -> ApiResult<Response> {
    let upload = read_upload(multipart, state.default_max_chunk_len).await?;
    let doc = state.word.process(&upload.content, &upload.filename, &upload.options).await?;
    Ok(attachment(doc))
}

/// POST /api/v1/process/pdf - Redact a PDF upload into Markdown or PDF
async fn process_pdf(State(state): State<DocsState>, multipart: Multipart) -> ApiResult<Response> {
    let upload = read_upload(multipart, state.default_max_chunk_len).await?;
    let doc = state
        .pdf
        .process(upload.content, &upload.filename, &upload.options, upload.return_pdf)
        .await?;
    Ok(attachment(doc))
}

#[derive(Deserialize)]
struct MaskTextRequest {
    text: String,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    custom_labels: String,
    #[serde(default)]
    max_chunk_len: Option<usize>,
}

/// POST /api/v1/mask/text - Forward a text redaction request
async fn mask_text(State(state): State<DocsState>, Json(req): Json<MaskTextRequest>) -> ApiResult<Json<MaskResponse>> {
    let labels = Label::merge_custom(&req.labels, &req.custom_labels);
    let request = MaskRequest::new(req.text, labels)
        .with_max_chunk_len(req.max_chunk_len.unwrap_or(state.default_max_chunk_len));

    Ok(Json(state.desensitizer.desensitize(&request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use masker_docs::PdfParser;
    use masker_engine::MaskEngine;
    use masker_extract::RuleExtractor;
    use std::io::{Cursor, Write};
    use tower::ServiceExt;

    const BOUNDARY: &str = "masker-test-boundary";

    struct FixedMarkdown;

    #[async_trait]
    impl PdfParser for FixedMarkdown {
        async fn parse_to_markdown(&self, _content: Vec<u8>, _filename: &str) -> masker_docs::Result<String> {
            Ok("客户电话：13812345678\n".to_string())
        }
    }

    fn app() -> Router {
        app_with_limit(1024 * 1024)
    }

    fn app_with_limit(max_upload_bytes: usize) -> Router {
        let desensitizer: Arc<dyn Desensitize> = Arc::new(MaskEngine::new(Arc::new(RuleExtractor::new())));
        let state = DocsState {
            word: Arc::new(WordProcessor::new(desensitizer.clone())),
            pdf: Arc::new(PdfProcessor::new(desensitizer.clone(), Arc::new(FixedMarkdown))),
            desensitizer,
            default_max_chunk_len: 300,
        };
        router(state, max_upload_bytes)
    }

    fn docx(xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// (name, filename, content)
    fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, f
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_process_word() {
        let upload = docx("<w:document><w:body><w:p><w:r><w:t>电话13812345678。</w:t></w:r></w:p></w:body></w:document>");
        let request = multipart_request(
            "/api/v1/process/word",
            &[
                ("file", Some("a.docx"), upload.as_slice()),
                ("schemalist", None, "[\"手机号码\"]".as_bytes()),
            ],
        );

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            masker_docs::DOCX_CONTENT_TYPE
        );
        assert!(
            response.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .contains("desensitized_a.docx")
        );

        let bytes = body_bytes(response).await;
        let xml = masker_docs::docx::read_document_xml(&bytes).unwrap();
        assert!(xml.contains("<w:t>电话138****5678。</w:t>"));
    }

    #[tokio::test]
    async fn test_process_pdf_returns_markdown() {
        let request = multipart_request(
            "/api/v1/process/pdf",
            &[
                ("file", Some("report.pdf"), &b"%PDF-1.4"[..]),
                ("schemalist", None, "身份证号, 手机号码".as_bytes()),
                ("return_pdf", None, &b"false"[..]),
            ],
        );

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/markdown");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"desensitized_report.md\"; filename*=UTF-8''desensitized_report.md"
        );

        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(body, "客户电话：138****5678\n");
    }

    #[tokio::test]
    async fn test_process_pdf_rejects_non_pdf() {
        let request = multipart_request("/api/v1/process/pdf", &[("file", Some("a.txt"), &b"hello"[..])]);

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_over_limit() {
        let upload = vec![b'x'; 5000];
        let request = multipart_request("/api/v1/process/word", &[("file", Some("big.docx"), upload.as_slice())]);

        let response = app_with_limit(200).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["detail"], "upload exceeds the size limit");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let request = multipart_request("/api/v1/process/word", &[("schemalist", None, &b"[]"[..])]);

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["detail"], "missing file");
    }

    #[tokio::test]
    async fn test_mask_text_merges_custom_labels() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/mask/text")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "text": "电话13812345678，邮箱a@b.cn",
                    "labels": ["手机号码"],
                    "custom_labels": "电子邮箱，金额",
                })
                .to_string(),
            ))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["masked"], "电话138****5678，邮箱******");
        assert_eq!(body["optional_selected"], json!(["电子邮箱", "金额"]));
    }

    #[tokio::test]
    async fn test_web_ui_and_health() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("/api/v1/process/word"));

        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_attachment_non_ascii_filename() {
        let response = attachment(ProcessedDocument {
            filename: "desensitized_客户.pdf".to_string(),
            content_type: masker_docs::PDF_CONTENT_TYPE,
            bytes: Vec::new(),
            entity_count: 0,
        });

        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"desensitized___.pdf\"; filename*=UTF-8''desensitized_%E5%AE%A2%E6%88%B7.pdf"
        );
    }

    #[test]
    fn test_parse_schemalist() {
        assert_eq!(parse_schemalist("[\"姓名\",\"金额\"]"), vec![Label::Name, Label::Custom("金额".into())]);
        assert_eq!(parse_schemalist("身份证号, 地址,"), vec![Label::IdCard, Label::Address]);
        assert!(parse_schemalist("  ").is_empty());
    }
}
