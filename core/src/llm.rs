//! Single-shot text generation.
//!
//! A [`Request`] carries one fully assembled prompt plus sampling [`Parameters`]. There is no
//! conversation history: every question is answered from scratch.

use alloc::string::String;
use core::future::Future;

/// Sampling parameters forwarded to the provider.
///
/// Every field is optional so providers can fall back to their own defaults. Use
/// [`Parameters::deterministic`] when output must be reproducible.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Parameters {
    /// Sampling temperature. `Some(0.0)` asks for greedy decoding.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    pub max_output_tokens: Option<u32>,
}

impl Parameters {
    /// Zero-temperature parameters.
    #[must_use]
    pub const fn deterministic() -> Self {
        Self {
            temperature: Some(0.0),
            max_output_tokens: None,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the output token limit.
    #[must_use]
    pub const fn max_output_tokens(mut self, limit: u32) -> Self {
        self.max_output_tokens = Some(limit);
        self
    }
}

/// A generation request: one prompt, optional system instruction, sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Optional system instruction, sent separately by providers that support it.
    pub system: Option<String>,
    /// The prompt text.
    pub prompt: String,
    /// Sampling parameters.
    pub parameters: Parameters,
}

impl Request {
    /// Creates a request with default parameters and no system instruction.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            parameters: Parameters::default(),
        }
    }

    /// Attaches a system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Replaces the sampling parameters.
    #[must_use]
    pub const fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A text generation service.
///
/// The pipeline treats implementations as black boxes: it sends a complete prompt and
/// receives raw text back. Nothing beyond trimming is done to the output.
pub trait LanguageModel: Sized + Send + Sync {
    /// Stable identifier of the underlying model.
    fn model_id(&self) -> &str;

    /// Generates a completion for `request`.
    fn generate(&self, request: Request) -> impl Future<Output = crate::Result> + Send;
}
