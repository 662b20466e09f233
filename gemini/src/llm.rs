use docqa_core::{
    Error as CoreError, LanguageModel, Result as CoreResult,
    llm::{Parameters, Request},
};

use crate::{
    client::call_generate,
    config::{GeminiBackend, bare_model},
    error::GeminiError,
    types::{GeminiContent, GenerateContentRequest, GenerationConfig},
};

impl LanguageModel for GeminiBackend {
    fn model_id(&self) -> &str {
        bare_model(self.text_model())
    }

    fn generate(
        &self,
        request: Request,
    ) -> impl core::future::Future<Output = CoreResult> + Send {
        let cfg = self.config();
        let payload = to_gemini_request(&request);
        async move {
            let response = call_generate(&cfg, &cfg.text_model, &payload)
                .await
                .map_err(CoreError::from)?;
            response
                .text()
                .ok_or_else(|| GeminiError::EmptyResponse(response.empty_reason()))
                .map_err(CoreError::from)
        }
    }
}

pub(crate) fn to_gemini_request(request: &Request) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: request.system.as_deref().map(GeminiContent::system),
        contents: vec![GeminiContent::text("user", request.prompt.clone())],
        generation_config: generation_config(&request.parameters),
    }
}

fn generation_config(parameters: &Parameters) -> Option<GenerationConfig> {
    if parameters.temperature.is_none() && parameters.max_output_tokens.is_none() {
        return None;
    }
    Some(GenerationConfig {
        temperature: parameters.temperature,
        max_output_tokens: parameters.max_output_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deterministic_request_sets_zero_temperature() {
        let request = Request::new("Context:\n(Page 3) x\n\nQuestion:\nq\n\nAnswer:")
            .with_parameters(Parameters::deterministic());
        let value = serde_json::to_value(to_gemini_request(&request)).unwrap();
        assert_eq!(value["generationConfig"], json!({"temperature": 0.0}));
        assert_eq!(value["contents"][0]["role"], "user");
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn system_instruction_is_forwarded() {
        let request = Request::new("q").with_system("rules");
        let value = serde_json::to_value(to_gemini_request(&request)).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "rules");
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn model_id_is_bare() {
        let backend = GeminiBackend::new("key").with_text_model("gemini-2.5-pro");
        assert_eq!(backend.model_id(), "gemini-2.5-pro");
    }
}
