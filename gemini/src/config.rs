use std::sync::Arc;

use crate::error::GeminiError;

/// Gemini REST base URL used by the Developer API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// `User-Agent` header sent with every request.
pub const USER_AGENT: &str = "docqa-gemini/0.1";
/// Default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";
/// Output dimensionality requested from the default embedding model.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 3072;

/// Environment variables checked, in order, for an API key.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Authentication strategy supported by the Gemini backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Send the API key via `x-goog-api-key` header (default).
    Header,
    /// Attach `?key=API_KEY` to every request.
    Query,
}

/// Gemini backend implementing the `docqa` capability traits.
///
/// Cloning is cheap: configuration and HTTP connection pool are shared.
#[derive(Clone, Debug)]
pub struct GeminiBackend {
    inner: Arc<GeminiConfig>,
}

impl GeminiBackend {
    /// Create a backend using the default generation and embedding models.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(GeminiConfig {
                api_key: api_key.into(),
                base_url: GEMINI_API_BASE_URL.to_string(),
                auth: AuthMode::Header,
                text_model: sanitize_model(DEFAULT_MODEL),
                embedding_model: sanitize_model(DEFAULT_EMBEDDING_MODEL),
                embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
                max_attempts: 3,
                http: reqwest::Client::new(),
            }),
        }
    }

    /// Create a backend from `GOOGLE_API_KEY` or `GEMINI_API_KEY`.
    ///
    /// # Errors
    /// Returns [`GeminiError::MissingApiKey`] if neither variable holds a non-empty value.
    pub fn from_env() -> Result<Self, GeminiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GeminiError> {
        API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .map(Self::new)
            .ok_or(GeminiError::MissingApiKey)
    }

    /// Override the REST base URL (useful for sandboxes or proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).base_url = base_url.into();
        self
    }

    /// Select the authentication mode.
    #[must_use]
    pub fn with_auth_mode(mut self, mode: AuthMode) -> Self {
        Arc::make_mut(&mut self.inner).auth = mode;
        self
    }

    /// Override the generation model.
    #[must_use]
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).text_model = sanitize_model(model);
        self
    }

    /// Override the embedding model and its output dimensionality.
    #[must_use]
    pub fn with_embedding_model(mut self, model: impl Into<String>, dim: usize) -> Self {
        let cfg = Arc::make_mut(&mut self.inner);
        cfg.embedding_model = sanitize_model(model);
        cfg.embedding_dimensions = dim;
        self
    }

    /// Number of attempts for requests that fail to connect.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        Arc::make_mut(&mut self.inner).max_attempts = attempts.max(1);
        self
    }

    pub(crate) fn config(&self) -> Arc<GeminiConfig> {
        self.inner.clone()
    }

    pub(crate) fn text_model(&self) -> &str {
        &self.inner.text_model
    }

    pub(crate) fn embedding_model(&self) -> &str {
        &self.inner.embedding_model
    }
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) auth: AuthMode,
    pub(crate) text_model: String,
    pub(crate) embedding_model: String,
    pub(crate) embedding_dimensions: usize,
    pub(crate) max_attempts: u32,
    pub(crate) http: reqwest::Client,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("text_model", &self.text_model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .finish_non_exhaustive()
    }
}

impl GeminiConfig {
    pub(crate) fn endpoint(&self, suffix: &str) -> String {
        let mut url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            suffix.trim_start_matches('/')
        );
        if self.auth == AuthMode::Query {
            let separator = if url.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str("key=");
            url.push_str(&self.api_key);
        }
        url
    }

    pub(crate) fn model_endpoint(&self, model: &str, action: &str) -> String {
        let model = sanitize_model(model);
        self.endpoint(&format!("{model}:{action}"))
    }
}

/// Prefix a bare model name with `models/`.
pub fn sanitize_model(model: impl Into<String>) -> String {
    let model = model.into();
    if model.starts_with("models/") {
        model
    } else {
        format!("models/{model}")
    }
}

/// Strip the `models/` prefix for display.
pub(crate) fn bare_model(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}
