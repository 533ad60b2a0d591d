use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::LlmError;
use crate::models::EMBEDDING_DIMENSIONS;

/// Upstream cap on texts per embeddings request.
pub const MAX_BATCH_SIZE: usize = 100;

const RETRYABLE_DELAY_MS: u64 = 500;

/// Embedding generation abstraction.
///
/// Output order always matches input order, including across internal
/// batches.
pub trait EmbeddingClient {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, LlmError>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let mut vectors = self.embed(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| LlmError::MalformedResponse("no embedding returned".into()))
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }
}

/// Allow `Box<dyn EmbeddingClient>` where `&impl EmbeddingClient` is expected.
impl EmbeddingClient for Box<dyn EmbeddingClient> {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
        (**self).embed(texts)
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        (**self).embed_one(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Blocking OpenAI embeddings client (text-embedding-3-small, 1536 dims).
///
/// Splits input into batches of at most [`MAX_BATCH_SIZE`] and retries
/// rate-limit/server errors a bounded number of times.
pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        max_retries: usize,
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidInput("missing OpenAI API key".into()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            max_retries,
        })
    }

    fn embed_batch(&self, batch: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: batch,
            };
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send();

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp
                            .json()
                            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != batch.len() {
                            return Err(LlmError::MalformedResponse(format!(
                                "{} embeddings returned for {} inputs",
                                parsed.data.len(),
                                batch.len()
                            )));
                        }
                        return Ok(parsed
                            .data
                            .into_iter()
                            .map(|entry| entry.embedding)
                            .collect());
                    }

                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    if retryable && attempt < self.max_retries {
                        attempt += 1;
                        tracing::warn!(%status, attempt, "retrying embeddings request");
                        thread::sleep(Duration::from_millis(
                            RETRYABLE_DELAY_MS * attempt as u64,
                        ));
                        continue;
                    }

                    let body = resp.text().unwrap_or_default();
                    return Err(LlmError::Api {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "retrying embeddings request");
                    thread::sleep(Duration::from_millis(RETRYABLE_DELAY_MS * attempt as u64));
                }
                Err(e) => return Err(LlmError::Http(e.to_string())),
            }
        }
    }
}

impl EmbeddingClient for OpenAiEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Err(LlmError::InvalidInput("texts list cannot be empty".into()));
        }

        tracing::debug!(count = texts.len(), "generating embeddings");

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            embeddings.extend(self.embed_batch(batch)?);
        }

        tracing::info!(count = embeddings.len(), "embeddings generated");
        Ok(embeddings)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}
