use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::DecodingParams;
use crate::error::{RagError, Result};
use crate::providers::traits::TextGenerator;

/// Local models served by Ollama. Prompts are sent raw so the model sees
/// the exact template.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: Client,
    api_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(client: Client, api_url: String, model: String) -> Self {
        Self {
            client,
            api_url,
            model,
        }
    }
}

pub(crate) fn request_body(model: &str, prompt: &str, params: &DecodingParams) -> Value {
    // greedy decoding when sampling is off
    let temperature = if params.do_sample { params.temperature } else { 0.0 };
    json!({
        "model": model,
        "prompt": prompt,
        "raw": true,
        "stream": false,
        "options": {
            "num_predict": params.max_new_tokens,
            "temperature": temperature,
            "top_k": params.top_k,
            "top_p": params.top_p
        }
    })
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str, params: &DecodingParams) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.api_url))
            .json(&request_body(&self.model, prompt, params))
            .send()
            .await
            .map_err(|e| RagError::Generation(format!("Request to Ollama failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Generation(format!(
                "Ollama request failed: Status {}, Body: {}",
                status, error_text
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| RagError::Generation(format!("Failed to parse Ollama response: {}", e)))?;

        let continuation = response_json
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| RagError::Generation("Ollama response has no text".to_string()))?;

        // Ollama never echoes the prompt
        if params.return_full_text {
            Ok(format!("{}{}", prompt, continuation))
        } else {
            Ok(continuation.to_string())
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let body = request_body("mistral", "Answer:", &DecodingParams::default());
        assert_eq!(body["model"], "mistral");
        assert_eq!(body["raw"], true);
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 200);
        assert_eq!(body["options"]["top_k"], 50);
    }

    #[test]
    fn test_greedy_when_not_sampling() {
        let params = DecodingParams {
            do_sample: false,
            ..DecodingParams::default()
        };
        let body = request_body("mistral", "Answer:", &params);
        assert_eq!(body["options"]["temperature"].as_f64(), Some(0.0));
    }
}
