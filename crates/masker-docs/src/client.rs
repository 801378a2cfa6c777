//! Redaction clients used by the document pipelines

use async_trait::async_trait;
use masker_engine::{MaskEngine, MaskRequest, MaskResponse};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};

/// Anything that can answer a `/mask/custom` request
#[async_trait]
pub trait Desensitize: Send + Sync {
    async fn desensitize(&self, request: &MaskRequest) -> Result<MaskResponse>;
}

/// In-process redaction
#[async_trait]
impl Desensitize for MaskEngine {
    async fn desensitize(&self, request: &MaskRequest) -> Result<MaskResponse> {
        Ok(self.mask(request).await?)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Client for a remote redaction service
pub struct HttpDesensitizer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDesensitizer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("masker/1.0 (document processor)")
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Upstream(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health` on the redaction service
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| send_error(&url, e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Upstream(format!("{} returned HTTP {}", url, response.status().as_u16())))
        }
    }
}

#[async_trait]
impl Desensitize for HttpDesensitizer {
    async fn desensitize(&self, request: &MaskRequest) -> Result<MaskResponse> {
        let url = format!("{}/mask/custom", self.base_url);
        tracing::info!("calling redaction service {} ({} chars)", url, request.text.chars().count());

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| send_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.detail)
                .unwrap_or(body);
            return Err(Error::Upstream(format!(
                "redaction service returned HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let result: MaskResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Invalid redaction response: {}", e)))?;

        tracing::info!("redaction service found {} entities", result.entities_found.len());
        Ok(result)
    }
}

fn send_error(url: &str, e: reqwest::Error) -> Error {
    if e.is_connect() || e.is_timeout() {
        Error::Unavailable(format!("{}: {}", url, e))
    } else {
        Error::Upstream(format!("{}: {}", url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::{get, post}};
    use masker_core::Label;
    use std::sync::Arc;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_remote_round_trip() {
        let engine = Arc::new(MaskEngine::new(Arc::new(masker_extract::RuleExtractor::new())));
        let app = Router::new()
            .route(
                "/mask/custom",
                post(move |Json(req): Json<MaskRequest>| {
                    let engine = engine.clone();
                    async move { Json(engine.mask(&req).await.unwrap()) }
                }),
            )
            .route("/health", get(|| async { "ok" }));
        let base = spawn(app).await;

        let client = HttpDesensitizer::new(format!("{}/", base), Duration::from_secs(5)).unwrap();
        client.health().await.unwrap();

        let response = client
            .desensitize(&MaskRequest::new("电话13812345678", vec![Label::Mobile]))
            .await
            .unwrap();
        assert_eq!(response.masked, "电话138****5678");
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let app = Router::new().route(
            "/mask/custom",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"detail": "text is empty"})),
                )
            }),
        );
        let base = spawn(app).await;

        let client = HttpDesensitizer::new(base, Duration::from_secs(5)).unwrap();
        let err = client
            .desensitize(&MaskRequest::new("x", vec![]))
            .await
            .unwrap_err();

        assert!(err.is_upstream());
        assert!(err.to_string().contains("text is empty"));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = HttpDesensitizer::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }
}
