use serde::{Deserialize, Serialize};

use crate::config::sanitize_model;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system_instruction: Option<GeminiContent>,
    pub(crate) contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<String>,
    /// Parts of the content. Defaults to empty if not present in response.
    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

impl GeminiContent {
    pub(crate) fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            parts: vec![Part::text(text)],
        }
    }

    pub(crate) fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) thought: Option<bool>,
}

impl Part {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    pub(crate) fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Why no text came back, for error messages.
    pub(crate) fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return format!("prompt blocked ({reason})");
        }
        self.candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref())
            .map_or_else(
                || "no candidates returned".to_string(),
                |reason| format!("finish reason {reason}"),
            )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub(crate) content: Option<GeminiContent>,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub(crate) block_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentRequest {
    pub(crate) model: String,
    pub(crate) content: GeminiContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) task_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) output_dimensionality: Option<usize>,
}

impl EmbedContentRequest {
    pub(crate) fn new(model: &str, text: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model: sanitize_model(model),
            content: GeminiContent {
                role: None,
                parts: vec![Part::text(text)],
            },
            task_type: Some("SEMANTIC_SIMILARITY"),
            output_dimensionality: Some(dimensions),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EmbedContentResponse {
    pub(crate) embedding: EmbeddingValue,
}

#[derive(Debug, Serialize)]
pub struct BatchEmbedContentsRequest {
    pub(crate) requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
pub struct BatchEmbedContentsResponse {
    #[serde(default)]
    pub(crate) embeddings: Vec<EmbeddingValue>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingValue {
    pub(crate) values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generate_request_wire_shape() {
        let request = GenerateContentRequest {
            system_instruction: Some(GeminiContent::system("be terse")),
            contents: vec![GeminiContent::text("user", "hello")],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: None,
            }),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "systemInstruction": {"parts": [{"text": "be terse"}]},
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {"temperature": 0.0}
            })
        );
    }

    #[test]
    fn response_text_joins_parts_and_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "1.2 billion "},
                    {"text": "(Page 3)"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("1.2 billion (Page 3)"));
    }

    #[test]
    fn blocked_prompt_reason() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(response.text().is_none());
        assert_eq!(response.empty_reason(), "prompt blocked (SAFETY)");
    }

    #[test]
    fn embed_request_wire_shape() {
        let request = EmbedContentRequest::new("gemini-embedding-001", "orders", 768);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "models/gemini-embedding-001",
                "content": {"parts": [{"text": "orders"}]},
                "taskType": "SEMANTIC_SIMILARITY",
                "outputDimensionality": 768
            })
        );
    }

    #[test]
    fn batch_embed_response_parses() {
        let response: BatchEmbedContentsResponse = serde_json::from_value(json!({
            "embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]
        }))
        .unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1].values, vec![0.3, 0.4]);
    }
}
