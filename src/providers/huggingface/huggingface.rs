use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::DecodingParams;
use crate::error::{RagError, Result};
use crate::providers::traits::TextGenerator;

/// Text-generation task of the Hugging Face Inference API.
#[derive(Clone)]
pub struct HuggingFaceGenerator {
    client: Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl HuggingFaceGenerator {
    pub fn new(client: Client, api_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url,
            model,
            api_key,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}", self.api_url, self.model)
    }
}

// Padding is left to the server, which falls back to the EOS token.
pub(crate) fn request_body(prompt: &str, params: &DecodingParams) -> Value {
    json!({
        "inputs": prompt,
        "parameters": {
            "max_new_tokens": params.max_new_tokens,
            "do_sample": params.do_sample,
            "temperature": params.temperature,
            "top_k": params.top_k,
            "top_p": params.top_p,
            "return_full_text": params.return_full_text
        },
        "options": {
            "wait_for_model": true
        }
    })
}

pub(crate) fn parse_response(response_json: &Value) -> Result<String> {
    if let Some(error) = response_json.get("error") {
        return Err(RagError::Generation(format!("API returned error: {}", error)));
    }

    // a list of candidates, or a single object from some deployments
    let candidate = match response_json {
        Value::Array(items) => items.first(),
        other => Some(other),
    };

    candidate
        .and_then(|c| c.get("generated_text"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            let debug_json = serde_json::to_string_pretty(response_json).unwrap_or_default();
            RagError::Generation(format!("Invalid response format: {}", debug_json))
        })
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    async fn generate(&self, prompt: &str, params: &DecodingParams) -> Result<String> {
        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&request_body(prompt, params));
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key.trim()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RagError::Generation(format!("Request to {} failed: {}", self.model, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(RagError::Generation(format!(
                "API request failed: Status {}, Body: {}",
                status, error_text
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| RagError::Generation(format!("Failed to parse response: {}", e)))?;

        parse_response(&response_json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_carries_decoding_params() {
        let body = request_body("Question: x\n\nAnswer:", &DecodingParams::default());
        assert_eq!(body["inputs"], "Question: x\n\nAnswer:");
        assert_eq!(body["parameters"]["max_new_tokens"], 200);
        assert_eq!(body["parameters"]["do_sample"], true);
        assert_eq!(body["parameters"]["top_k"], 50);
        assert_eq!(body["parameters"]["return_full_text"], true);
        assert!((body["parameters"]["top_p"].as_f64().unwrap() - 0.95).abs() < 1e-6);
        assert!((body["parameters"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_parse_list_response() {
        let json = json!([{"generated_text": "prompt Answer: 1990"}]);
        assert_eq!(parse_response(&json).unwrap(), "prompt Answer: 1990");
    }

    #[test]
    fn test_parse_single_object_response() {
        let json = json!({"generated_text": "hello"});
        assert_eq!(parse_response(&json).unwrap(), "hello");
    }

    #[test]
    fn test_parse_api_error() {
        let json = json!({"error": "Model is currently loading"});
        assert!(matches!(parse_response(&json), Err(RagError::Generation(_))));
    }

    #[test]
    fn test_parse_unexpected_shape() {
        assert!(parse_response(&json!([])).is_err());
        assert!(parse_response(&json!({"text": "nope"})).is_err());
    }

    #[test]
    fn test_endpoint() {
        let generator = HuggingFaceGenerator::new(
            Client::new(),
            "https://api-inference.huggingface.co".to_string(),
            "mistralai/Mistral-7B-v0.1".to_string(),
            None,
        );
        assert_eq!(
            generator.endpoint(),
            "https://api-inference.huggingface.co/models/mistralai/Mistral-7B-v0.1"
        );
    }
}
