//! Client for the external PDF → Markdown parse service

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PARSE_TIMEOUT: Duration = Duration::from_secs(600);

/// Fixed form fields sent with every parse request
const PARSE_FIELDS: [(&str, &str); 10] = [
    ("backend", "pipeline"),
    ("lang_list", "ch"),
    ("parse_method", "auto"),
    ("formula_enable", "true"),
    ("table_enable", "true"),
    ("return_md", "true"),
    ("return_middle_json", "false"),
    ("return_content_list", "false"),
    ("return_images", "false"),
    ("start_page_id", "0"),
];
const END_PAGE_ID: &str = "99999";

#[derive(Deserialize)]
struct ParseResponse {
    #[serde(default)]
    backend: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    results: Map<String, Value>,
}

pub struct PdfParseClient {
    client: reqwest::Client,
    base_url: String,
}

impl PdfParseClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(base_url, CONNECT_TIMEOUT, PARSE_TIMEOUT)
    }

    pub fn with_timeouts(base_url: impl Into<String>, connect: Duration, total: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("masker/1.0 (pdf parse)")
            .connect_timeout(connect)
            .timeout(total)
            .build()
            .map_err(|e| Error::Upstream(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Parse a PDF into Markdown via `POST {base}/file_parse`
    pub async fn parse_to_markdown(&self, content: Vec<u8>, filename: &str) -> Result<String> {
        let url = format!("{}/file_parse", self.base_url);
        tracing::info!("calling PDF parse service {} ({}, {} bytes)", url, filename, content.len());

        let part = Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| Error::Upstream(format!("Invalid multipart part: {}", e)))?;
        let form = PARSE_FIELDS
            .iter()
            .fold(Form::new().part("files", part), |form, (k, v)| form.text(*k, *v))
            .text("end_page_id", END_PAGE_ID);

        let started = Instant::now();
        let response = self.client.post(&url).multipart(form).send().await.map_err(|e| {
            let elapsed = started.elapsed().as_secs_f64();
            if e.is_timeout() {
                Error::Unavailable(format!("PDF parse service timed out after {:.2}s: {}", elapsed, url))
            } else if e.is_connect() {
                Error::Unavailable(format!("Cannot connect to PDF parse service {}: {}", self.base_url, e))
            } else {
                Error::Upstream(format!("PDF parse request failed after {:.2}s: {}", elapsed, e))
            }
        })?;
        tracing::info!("PDF parse service answered in {:.2}s", started.elapsed().as_secs_f64());

        let status = response.status();
        if status == reqwest::StatusCode::BAD_GATEWAY {
            return Err(Error::Unavailable(format!(
                "PDF parse service unavailable (502 Bad Gateway): {}",
                self.base_url
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(500).collect();
            tracing::error!("PDF parse service returned HTTP {}: {}", status.as_u16(), snippet);
            return Err(Error::Upstream(format!(
                "PDF parse service returned HTTP {}: {}",
                status.as_u16(),
                snippet
            )));
        }

        let body: ParseResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid PDF parse response: {}", e)))?;
        tracing::debug!("PDF parse backend={:?} version={:?}", body.backend, body.version);

        extract_markdown(body.results)
    }
}

fn extract_markdown(results: Map<String, Value>) -> Result<String> {
    let Some((name, first)) = results.into_iter().next() else {
        return Err(Error::Upstream("PDF parse result is empty".to_string()));
    };

    match first.get("md_content").and_then(Value::as_str) {
        Some(markdown) => {
            tracing::info!("parsed {} into {} chars of Markdown", name, markdown.chars().count());
            Ok(markdown.to_string())
        }
        None => {
            let fields: Vec<&String> = first.as_object().map(|o| o.keys().collect()).unwrap_or_default();
            Err(Error::Upstream(format!(
                "PDF parse result has no md_content (fields: {:?})",
                fields
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Multipart, http::StatusCode, routing::post};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_parse_sends_form_and_reads_markdown() {
        let app = Router::new().route(
            "/file_parse",
            post(|mut multipart: Multipart| async move {
                let mut names = Vec::new();
                let mut file_name = None;
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().unwrap_or_default().to_string();
                    if name == "files" {
                        file_name = field.file_name().map(str::to_string);
                    }
                    names.push(name);
                }
                assert!(names.contains(&"lang_list".to_string()));
                assert!(names.contains(&"end_page_id".to_string()));
                let mut results = Map::new();
                results.insert(
                    file_name.unwrap_or_default(),
                    serde_json::json!({ "md_content": "# 标题\n张三" }),
                );
                Json(serde_json::json!({ "backend": "pipeline", "results": results }))
            }),
        );
        let base = spawn(app).await;

        let client = PdfParseClient::new(base).unwrap();
        let markdown = client.parse_to_markdown(b"%PDF-1.4".to_vec(), "a.pdf").await.unwrap();
        assert_eq!(markdown, "# 标题\n张三");
    }

    #[tokio::test]
    async fn test_bad_gateway_is_unavailable() {
        let app = Router::new().route("/file_parse", post(|| async { StatusCode::BAD_GATEWAY }));
        let base = spawn(app).await;

        let client = PdfParseClient::new(base).unwrap();
        let err = client.parse_to_markdown(b"%PDF".to_vec(), "a.pdf").await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_error_body_is_truncated() {
        let app = Router::new().route(
            "/file_parse",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "x".repeat(2000)) }),
        );
        let base = spawn(app).await;

        let client = PdfParseClient::new(base).unwrap();
        let err = client.parse_to_markdown(b"%PDF".to_vec(), "a.pdf").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("HTTP 500"));
        assert!(message.len() < 700);
    }

    #[test]
    fn test_first_result_in_response_order() {
        let body: ParseResponse = serde_json::from_str(
            r#"{"results": {"b_scan": {"md_content": "第一份"}, "a_scan": {"md_content": "第二份"}}}"#,
        )
        .unwrap();
        assert_eq!(extract_markdown(body.results).unwrap(), "第一份");
    }

    #[test]
    fn test_missing_markdown() {
        let results: Map<String, Value> = serde_json::from_str(r#"{"a": {"middle_json": {}}}"#).unwrap();
        assert!(extract_markdown(results).unwrap_err().to_string().contains("md_content"));
        assert!(extract_markdown(Map::new()).is_err());
    }
}
