use async_trait::async_trait;
use masker_core::{Error, Label, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::extractor::{RawEntity, SemanticExtractor};

#[derive(Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
    schema: Vec<&'a str>,
}

#[derive(Deserialize)]
struct UieItem {
    text: String,
    start: usize,
    end: usize,
    #[serde(default)]
    probability: Option<f64>,
}

type UieResult = HashMap<String, Vec<UieItem>>;

/// Model servers answer either with one result map or with a batch of one
#[derive(Deserialize)]
#[serde(untagged)]
enum UieResponse {
    Single(UieResult),
    Batch(Vec<UieResult>),
}

/// Client for a UIE-compatible information-extraction server.
///
/// Request: `POST {url}` with `{"text": ..., "schema": [...]}`.
/// Response: `{"<label>": [{"text", "start", "end", "probability"}]}`.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
}

impl HttpExtractor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("masker/1.0 (entity extraction)")
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(anyhow::anyhow!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SemanticExtractor for HttpExtractor {
    async fn extract(&self, text: &str, labels: &[Label]) -> Result<Vec<RawEntity>> {
        let request = ExtractRequest {
            text,
            schema: labels.iter().map(Label::as_str).collect(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("Failed to reach model server: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Extraction(format!(
                "Model server returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: UieResponse = response
            .json()
            .await
            .map_err(|e| Error::Extraction(format!("Invalid model response: {}", e)))?;

        let mut result = match body {
            UieResponse::Single(map) => map,
            UieResponse::Batch(batch) => batch.into_iter().next().unwrap_or_default(),
        };

        // Walk labels in request order so output order is stable
        let mut entities = Vec::new();
        for label in labels {
            for item in result.remove(label.as_str()).unwrap_or_default() {
                entities.push(RawEntity {
                    label: label.clone(),
                    text: item.text,
                    start: item.start,
                    end: item.end,
                    probability: item.probability,
                });
            }
        }

        Ok(entities)
    }

    fn name(&self) -> &str {
        "http"
    }
}
