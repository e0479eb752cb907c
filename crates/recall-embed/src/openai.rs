use std::fmt;

use serde::{Deserialize, Serialize};

use crate::embedder::{EmbedFuture, Embedder};
use crate::error::EmbedError;

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: u64,
}

impl fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    #[must_use]
    pub fn new(api_key: String, base_url: String, model: String, dimensions: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
            dimensions,
        }
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let body = EmbeddingRequest {
            input: text,
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(EmbedError::Http)?;

        if !status.is_success() {
            tracing::error!("embedding API error {status}: {text}");
            return Err(EmbedError::Other(format!(
                "embedding request failed (status {status})"
            )));
        }

        let resp: EmbeddingResponse = serde_json::from_str(&text)?;

        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(EmbedError::EmptyResponse { provider: "openai" })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> EmbedFuture<'_> {
        let owned = text.to_owned();
        Box::pin(async move { self.embed_text(&owned).await })
    }

    fn dimensions(&self) -> u64 {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_embedder() -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            "key".into(),
            "http://127.0.0.1:1".into(),
            "text-embedding-3-small".into(),
            768,
        )
    }

    #[test]
    fn embedding_request_serialization() {
        let req = EmbeddingRequest {
            input: "hello",
            model: "m",
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""input":"hello""#));
        assert!(json.contains(r#""model":"m""#));
    }

    #[test]
    fn embedding_response_empty_data() {
        let resp: EmbeddingResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(resp.data.is_empty());
    }

    #[test]
    fn embedding_response_parses_vector() {
        let resp: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[0.1,0.2]}]}"#).unwrap();
        assert_eq!(resp.data[0].embedding, vec![0.1, 0.2]);
    }

    #[test]
    fn dimensions_and_name() {
        let e = test_embedder();
        assert_eq!(e.dimensions(), 768);
        assert_eq!(e.name(), "openai");
    }

    #[test]
    fn debug_hides_api_key() {
        let dbg = format!("{:?}", test_embedder());
        assert!(dbg.contains("OpenAiEmbedder"));
        assert!(!dbg.contains("key"));
    }

    #[tokio::test]
    async fn embed_unreachable_endpoint_errors() {
        let e = test_embedder();
        assert!(e.embed("test").await.is_err());
    }
}
