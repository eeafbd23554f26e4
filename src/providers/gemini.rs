//! Google Gemini client over the public REST API.
//!
//! - `models/{model}:generateContent` with a JSON response schema for classification
//! - `models/{model}:batchEmbedContents` for embeddings

use super::{Classifier, EmbeddingProvider};
use crate::config::{ClassifierConfig, EmbeddingConfig};
use crate::error::{PipelineError, Result};
use crate::models::EmbeddingBatch;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    model: String,
    api_key: SecretString,
    timeout: Duration,
}

impl Endpoint {
    fn url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            self.model,
            method
        )
    }
}

/// One HTTP client for both classification and embedding
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    classifier: Endpoint,
    temperature: f32,
    embedding: Endpoint,
    dimensions: usize,
}

impl GeminiClient {
    /// Build the client from configuration. Either section's API key is used
    /// for both endpoints when only one is set.
    pub fn from_config(classifier: &ClassifierConfig, embedding: &EmbeddingConfig) -> Result<Self> {
        let classifier_key = classifier
            .api_key
            .clone()
            .or_else(|| embedding.api_key.clone());
        let embedding_key = embedding
            .api_key
            .clone()
            .or_else(|| classifier.api_key.clone());

        let (Some(classifier_key), Some(embedding_key)) = (classifier_key, embedding_key) else {
            return Err(PipelineError::Configuration(
                "Gemini API key is not configured (classifier.api_key / embedding.api_key)"
                    .to_string(),
            ));
        };

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PipelineError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            classifier: Endpoint {
                base_url: classifier.base_url.clone(),
                model: classifier.model.clone(),
                api_key: classifier_key,
                timeout: Duration::from_secs(classifier.request_timeout_seconds),
            },
            temperature: classifier.temperature,
            embedding: Endpoint {
                base_url: embedding.base_url.clone(),
                model: embedding.model.clone(),
                api_key: embedding_key,
                timeout: Duration::from_secs(embedding.request_timeout_seconds),
            },
            dimensions: embedding.dimensions,
        })
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &Endpoint,
        method: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .http
            .post(endpoint.url(method))
            .header(API_KEY_HEADER, endpoint.api_key.expose_secret())
            .timeout(endpoint.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| PipelineError::provider(PROVIDER, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::provider(
                PROVIDER,
                format!("{method} returned {status}: {body}"),
            ));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| PipelineError::provider(PROVIDER, format!("{method} decode: {e}")))
    }
}

// ---- generateContent ----

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn generate_content_request<'a>(
    prompt: &'a str,
    schema: &'a Value,
    temperature: f32,
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature,
            response_mime_type: "application/json",
            response_schema: schema,
        },
    }
}

/// First candidate's text parts, parsed as JSON
fn parse_generate_content(response: GenerateContentResponse) -> Result<Value> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        PipelineError::InvalidClassifierOutput("response has no candidates".to_string())
    })?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(PipelineError::InvalidClassifierOutput(format!(
            "empty response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    serde_json::from_str(&text)
        .map_err(|e| PipelineError::InvalidClassifierOutput(format!("response is not JSON: {e}")))
}

// ---- batchEmbedContents ----

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

fn batch_embed_request<'a>(
    texts: &'a [String],
    model: &str,
    dimensions: usize,
) -> BatchEmbedRequest<'a> {
    BatchEmbedRequest {
        requests: texts
            .iter()
            .map(|text| EmbedContentRequest {
                model: format!("models/{model}"),
                content: EmbedContent {
                    parts: vec![Part { text }],
                },
                output_dimensionality: dimensions,
            })
            .collect(),
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn classify(&self, prompt: &str, response_schema: &Value) -> Result<Value> {
        let request = generate_content_request(prompt, response_schema, self.temperature);

        debug!(
            model = %self.classifier.model,
            prompt_chars = prompt.len(),
            "Calling Gemini generateContent"
        );

        let response: GenerateContentResponse = self
            .post(&self.classifier, "generateContent", &request)
            .await?;

        parse_generate_content(response)
    }

    fn model_name(&self) -> &str {
        &self.classifier.model
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch {
                embeddings: Vec::new(),
                model: self.embedding.model.clone(),
            });
        }

        let request = batch_embed_request(texts, &self.embedding.model, self.dimensions);

        debug!(
            model = %self.embedding.model,
            texts = texts.len(),
            "Calling Gemini batchEmbedContents"
        );

        let response: BatchEmbedResponse = self
            .post(&self.embedding, "batchEmbedContents", &request)
            .await?;

        Ok(EmbeddingBatch {
            embeddings: response.embeddings.into_iter().map(|e| e.values).collect(),
            model: self.embedding.model.clone(),
        })
    }

    fn model_name(&self) -> &str {
        &self.embedding.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
