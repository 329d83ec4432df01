use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Backend, DecodingParams, GeneratorConfig};
use crate::error::{RagError, Result};
use crate::providers::huggingface::huggingface::HuggingFaceGenerator;
use crate::providers::ollama::ollama::OllamaGenerator;

/// A causal language model. `generate` returns the prompt followed by the
/// continuation when `params.return_full_text` is set.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &DecodingParams) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Acquires a language model handle. Called at most once per handle lifetime
/// by the answer generator.
#[async_trait]
pub trait GeneratorLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TextGenerator>>;
}

/// Builds the HTTP-backed generator selected in the config.
#[derive(Debug, Clone)]
pub struct BackendLoader {
    config: GeneratorConfig,
}

impl BackendLoader {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl GeneratorLoader for BackendLoader {
    async fn load(&self) -> Result<Arc<dyn TextGenerator>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| RagError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        let api_url = self.config.api_url();
        let model = self.config.model_name.clone();
        log::info!(
            "Acquiring language model {} via {} at {}",
            model,
            self.config.backend,
            api_url
        );

        let generator: Arc<dyn TextGenerator> = match self.config.backend {
            Backend::HuggingFace => Arc::new(HuggingFaceGenerator::new(
                client,
                api_url,
                model,
                self.config.api_key.clone(),
            )),
            Backend::Ollama => Arc::new(OllamaGenerator::new(client, api_url, model)),
        };
        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loader_picks_backend_model() {
        let mut config = GeneratorConfig::default();
        config.model_name = "microsoft/DialoGPT-medium".to_string();
        let generator = BackendLoader::new(config.clone()).load().await.unwrap();
        assert_eq!(generator.model_name(), "microsoft/DialoGPT-medium");

        config.backend = Backend::Ollama;
        config.model_name = "mistral".to_string();
        let generator = BackendLoader::new(config).load().await.unwrap();
        assert_eq!(generator.model_name(), "mistral");
    }
}
