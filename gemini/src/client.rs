use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::{AuthMode, GeminiConfig, USER_AGENT, bare_model},
    error::GeminiError,
    types::{
        BatchEmbedContentsRequest, BatchEmbedContentsResponse, EmbedContentRequest,
        EmbedContentResponse, GenerateContentRequest, GenerateContentResponse,
    },
};

pub async fn call_generate(
    cfg: &GeminiConfig,
    model: &str,
    request: &GenerateContentRequest,
) -> Result<GenerateContentResponse, GeminiError> {
    post_json(cfg, model, "generateContent", request).await
}

pub async fn embed_content(
    cfg: &GeminiConfig,
    request: &EmbedContentRequest,
) -> Result<EmbedContentResponse, GeminiError> {
    post_json(cfg, &cfg.embedding_model, "embedContent", request).await
}

pub async fn batch_embed_contents(
    cfg: &GeminiConfig,
    request: &BatchEmbedContentsRequest,
) -> Result<BatchEmbedContentsResponse, GeminiError> {
    post_json(cfg, &cfg.embedding_model, "batchEmbedContents", request).await
}

async fn post_json<T: DeserializeOwned, S: Serialize + Sync>(
    cfg: &GeminiConfig,
    model: &str,
    action: &str,
    body: &S,
) -> Result<T, GeminiError> {
    let endpoint = cfg.model_endpoint(model, action);
    tracing::debug!(model = bare_model(model), action, "Gemini request");

    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut builder = cfg
            .http
            .post(&endpoint)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(body);
        if cfg.auth == AuthMode::Header {
            builder = builder.header("x-goog-api-key", &cfg.api_key);
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status();
                let text = response
                    .text()
                    .await
                    .map_err(|e| GeminiError::Http(e.without_url()))?;
                if !status.is_success() {
                    let error = GeminiError::from_status(status.as_u16(), &text);
                    tracing::debug!(status = status.as_u16(), error = %error, "Gemini error response");
                    return Err(error);
                }
                return Ok(serde_json::from_str(&text)?);
            }
            Err(error) => {
                let should_retry = error.is_connect() && attempt < cfg.max_attempts;
                if !should_retry {
                    return Err(GeminiError::Http(error.without_url()));
                }
                tracing::debug!(attempt, "Gemini connect error, retrying");
                tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
            }
        }
    }
}
