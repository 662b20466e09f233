//! Grounded prompt assembly.
//!
//! The generator is instructed to answer only from the retrieved context and to reply
//! with a fixed refusal sentence when the requested fact is absent. Grounding is enforced
//! by instruction alone: nothing here verifies that an answer actually came from the
//! context, so a non-compliant generator can still produce unsupported text.

use docqa_core::llm::{Parameters, Request};

use crate::config::RagConfig;
use crate::types::RetrievedChunk;

/// Document name used when neither configuration nor loader provides one.
pub const DEFAULT_DOCUMENT_NAME: &str = "the document";

/// The rules handed to the generator, parameterised by document name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingPolicy {
    document: String,
}

impl GroundingPolicy {
    /// Creates a policy for a document referred to as `document`.
    #[must_use]
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }

    /// Picks the document name from configuration, then the document title, then
    /// [`DEFAULT_DOCUMENT_NAME`].
    #[must_use]
    pub fn from_config(config: &RagConfig, title: Option<&str>) -> Self {
        let document = config
            .document_name
            .as_deref()
            .or(title)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_NAME);
        Self::new(document)
    }

    /// Name the rules and refusal refer to.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The exact sentence the generator must return when the answer is not in context.
    #[must_use]
    pub fn refusal(&self) -> String {
        format!(
            "I could not find this information in {} based on the retrieved context.",
            self.document
        )
    }

    /// The rule block placed ahead of the context.
    #[must_use]
    pub fn instructions(&self) -> String {
        format!(
            "You are an AI assistant answering questions ONLY using the provided context from {document}.

Rules:
- Use ONLY the information present in the context.
- You may summarize information ONLY if the context explicitly refers to the same metric and scope.
- Do NOT substitute related but different metrics (e.g., Food Delivery orders vs total B2C orders).
- Do NOT use prior knowledge.
- Do NOT make assumptions.
- If the exact metric or phrasing asked in the question is not present in the context,
respond ONLY with:
\"{refusal}\"
- Do NOT provide partial or related values.
- Keep answers concise, factual, and grounded.",
            document = self.document,
            refusal = self.refusal(),
        )
    }
}

impl Default for GroundingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DOCUMENT_NAME)
    }
}

/// Builds generation requests from a question and its retrieved context.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    policy: GroundingPolicy,
}

impl PromptAssembler {
    /// Creates an assembler applying `policy`.
    #[must_use]
    pub const fn new(policy: GroundingPolicy) -> Self {
        Self { policy }
    }

    /// Returns the grounding policy.
    #[must_use]
    pub const fn policy(&self) -> &GroundingPolicy {
        &self.policy
    }

    /// Renders chunks as `(Page n) text` blocks separated by blank lines, in order.
    #[must_use]
    pub fn format_context(chunks: &[RetrievedChunk]) -> String {
        chunks
            .iter()
            .map(|retrieved| {
                format!(
                    "(Page {}) {}",
                    retrieved.chunk.source_page, retrieved.chunk.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Renders the full prompt text.
    #[must_use]
    pub fn render(&self, question: &str, chunks: &[RetrievedChunk]) -> String {
        format!(
            "{}\n\nContext:\n{}\n\nQuestion:\n{}\n\nAnswer:",
            self.policy.instructions(),
            Self::format_context(chunks),
            question.trim()
        )
    }

    /// Builds a zero-temperature generation request.
    #[must_use]
    pub fn assemble(&self, question: &str, chunks: &[RetrievedChunk]) -> Request {
        Request::new(self.render(question, chunks)).with_parameters(Parameters::deterministic())
    }
}
