use alloc::{string::String, vec::Vec};
use core::future::Future;

/// Converts text into dense vector representations for semantic similarity.
///
/// Implementations must be deterministic for a fixed [`model_id`](EmbeddingModel::model_id):
/// the same text always maps to the same vector. Documents and questions must be embedded
/// by the same model, otherwise similarity scores are meaningless, which is why the model
/// identifier is part of the contract and gets recorded next to persisted indexes.
///
/// # Errors
///
/// Both methods report failures (network, model loading, inference) through
/// [`crate::Result`]. Callers decide whether to retry.
///
/// # Example
///
/// ```rust
/// use docqa_core::EmbeddingModel;
///
/// struct Constant;
///
/// impl EmbeddingModel for Constant {
///     fn dim(&self) -> usize {
///         3
///     }
///
///     fn model_id(&self) -> &str {
///         "constant"
///     }
///
///     async fn embed(&self, _text: &str) -> docqa_core::Result<Vec<f32>> {
///         Ok(vec![1.0; self.dim()])
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let vectors = Constant
///     .embed_batch(&["a".to_string(), "b".to_string()])
///     .await
///     .unwrap();
/// assert_eq!(vectors.len(), 2);
/// # });
/// ```
pub trait EmbeddingModel: Send + Sized + Sync {
    /// Returns the embedding vector dimension.
    ///
    /// This value determines the length of vectors returned by [`embed`](EmbeddingModel::embed).
    /// Common dimensions include:
    /// - 384 (`sentence-transformers/all-MiniLM-L6-v2`)
    /// - 768 (`BERT-base`)
    /// - 3072 (`gemini-embedding-001`)
    fn dim(&self) -> usize;

    /// Stable identifier of the underlying model.
    fn model_id(&self) -> &str;

    /// Converts text to an embedding vector of length [`dim`](EmbeddingModel::dim).
    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Vec<f32>>> + Send;

    /// Embeds several texts, returning one vector per input in input order.
    ///
    /// The default implementation calls [`embed`](EmbeddingModel::embed) sequentially.
    /// Providers with a native batch endpoint should override it.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = crate::Result<Vec<Vec<f32>>>> + Send {
        async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::ToString, vec};

    struct MockEmbeddingModel {
        dimension: usize,
    }

    impl EmbeddingModel for MockEmbeddingModel {
        fn dim(&self) -> usize {
            self.dimension
        }

        fn model_id(&self) -> &str {
            "mock"
        }

        #[allow(clippy::cast_precision_loss)]
        async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
            let mut embedding = vec![0.0; self.dimension];
            let text_len = text.len();

            for (i, value) in embedding.iter_mut().enumerate() {
                *value = (text_len + i) as f32 * 0.01;
            }

            Ok(embedding)
        }
    }

    #[tokio::test]
    async fn embedding_generation() {
        let model = MockEmbeddingModel { dimension: 4 };
        let embedding = model.embed("test").await.unwrap();

        assert_eq!(embedding.len(), 4);
        assert!((embedding[0] - 0.04).abs() < f32::EPSILON);
        assert!((embedding[3] - 0.07).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn embedding_is_deterministic() {
        let model = MockEmbeddingModel { dimension: 8 };
        let first = model.embed("same text").await.unwrap();
        let second = model.embed("same text").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn default_batch_preserves_order() {
        let model = MockEmbeddingModel { dimension: 2 };
        let texts = vec!["a".to_string(), "abc".to_string(), "ab".to_string()];
        let batch = model.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 3);
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(vector, &model.embed(text).await.unwrap());
        }
    }

    #[tokio::test]
    async fn default_batch_of_nothing() {
        let model = MockEmbeddingModel { dimension: 2 };
        assert!(model.embed_batch(&[]).await.unwrap().is_empty());
    }
}
