use docqa_core::{EmbeddingModel, Error as CoreError, Result as CoreResult};

use crate::{
    client::{batch_embed_contents, embed_content},
    config::{GeminiBackend, bare_model},
    error::GeminiError,
    types::{BatchEmbedContentsRequest, EmbedContentRequest},
};

/// Largest batch accepted by `batchEmbedContents`.
const MAX_BATCH: usize = 100;

impl EmbeddingModel for GeminiBackend {
    fn dim(&self) -> usize {
        self.config().embedding_dimensions
    }

    fn model_id(&self) -> &str {
        bare_model(self.embedding_model())
    }

    fn embed(
        &self,
        text: &str,
    ) -> impl core::future::Future<Output = CoreResult<Vec<f32>>> + Send {
        let cfg = self.config();
        let request =
            EmbedContentRequest::new(&cfg.embedding_model, text, cfg.embedding_dimensions);
        async move {
            let response = embed_content(&cfg, &request)
                .await
                .map_err(CoreError::from)?;
            Ok(response.embedding.values)
        }
    }

    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl core::future::Future<Output = CoreResult<Vec<Vec<f32>>>> + Send {
        let cfg = self.config();
        let batches: Vec<BatchEmbedContentsRequest> = texts
            .chunks(MAX_BATCH)
            .map(|chunk| BatchEmbedContentsRequest {
                requests: chunk
                    .iter()
                    .map(|text| {
                        EmbedContentRequest::new(
                            &cfg.embedding_model,
                            text.as_str(),
                            cfg.embedding_dimensions,
                        )
                    })
                    .collect(),
            })
            .collect();
        async move {
            let mut vectors = Vec::new();
            for batch in batches {
                let expected = batch.requests.len();
                let response = batch_embed_contents(&cfg, &batch)
                    .await
                    .map_err(CoreError::from)?;
                if response.embeddings.len() != expected {
                    return Err(CoreError::from(GeminiError::EmptyResponse(format!(
                        "expected {expected} embeddings, got {}",
                        response.embeddings.len()
                    ))));
                }
                vectors.extend(response.embeddings.into_iter().map(|e| e.values));
            }
            Ok(vectors)
        }
    }
}
