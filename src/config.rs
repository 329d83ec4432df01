use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use validator::Validate;

use crate::error::{RagError, Result};
use crate::llm::prompt::PromptLanguage;

pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-v0.1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Which service hosts the causal language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    HuggingFace,
    Ollama,
}

impl Backend {
    pub fn default_api_url(&self) -> &'static str {
        match self {
            Backend::HuggingFace => "https://api-inference.huggingface.co",
            Backend::Ollama => "http://localhost:11434",
        }
    }
}

impl FromStr for Backend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" | "tgi" => Ok(Backend::HuggingFace),
            "ollama" => Ok(Backend::Ollama),
            other => Err(RagError::Config(format!("unknown backend: {}", other))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::HuggingFace => write!(f, "huggingface"),
            Backend::Ollama => write!(f, "ollama"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChunkingConfig {
    /// Window size in words.
    #[validate(range(min = 1))]
    pub chunk_size: usize,
    /// Words shared by consecutive windows. Must stay below `chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetrievalConfig {
    /// Neighbours fetched from the index per question.
    #[validate(range(min = 1))]
    pub top_k: usize,
    /// How many of the fetched neighbours go into the prompt.
    #[validate(range(min = 1))]
    pub context_chunks: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            context_chunks: 2,
        }
    }
}

/// Sampling parameters handed to the language model.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DecodingParams {
    #[validate(range(min = 1))]
    pub max_new_tokens: usize,
    pub do_sample: bool,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1))]
    pub top_k: usize,
    #[validate(range(min = 0.0, max = 1.0))]
    pub top_p: f32,
    /// Ask the backend to echo the prompt in front of the continuation.
    pub return_full_text: bool,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            do_sample: true,
            temperature: 0.7,
            top_k: 50,
            top_p: 0.95,
            return_full_text: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub backend: Backend,
    pub model_name: String,
    pub api_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl GeneratorConfig {
    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| self.backend.default_api_url().to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            model_name: DEFAULT_MODEL.to_string(),
            api_url: None,
            api_key: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_name: String,
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_EMBEDDING_MODEL.to_string(),
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RagConfig {
    pub generator: GeneratorConfig,
    pub embedding: EmbeddingConfig,
    #[validate]
    pub chunking: ChunkingConfig,
    #[validate]
    pub retrieval: RetrievalConfig,
    #[validate]
    pub decoding: DecodingParams,
    pub language: PromptLanguage,
}

impl RagConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(model) = lookup("PDFRAG_MODEL") {
            config.generator.model_name = model;
        }
        if let Some(backend) = lookup("PDFRAG_BACKEND") {
            match backend.parse() {
                Ok(backend) => config.generator.backend = backend,
                Err(e) => log::warn!("Ignoring PDFRAG_BACKEND: {}", e),
            }
        }
        config.generator.api_url = lookup("PDFRAG_API_URL");
        config.generator.api_key = lookup("PDFRAG_API_KEY").or_else(|| lookup("HF_API_TOKEN"));
        config.generator.timeout_secs =
            parse_or(&lookup, "PDFRAG_TIMEOUT_SECS", config.generator.timeout_secs);

        if let Some(model) = lookup("PDFRAG_EMBEDDING_MODEL") {
            config.embedding.model_name = model;
        }
        config.embedding.cache_dir = lookup("PDFRAG_EMBEDDING_CACHE").map(PathBuf::from);

        config.chunking.chunk_size = parse_or(&lookup, "PDFRAG_CHUNK_SIZE", config.chunking.chunk_size);
        config.chunking.overlap = parse_or(&lookup, "PDFRAG_CHUNK_OVERLAP", config.chunking.overlap);
        config.retrieval.top_k = parse_or(&lookup, "PDFRAG_TOP_K", config.retrieval.top_k);
        config.retrieval.context_chunks =
            parse_or(&lookup, "PDFRAG_CONTEXT_CHUNKS", config.retrieval.context_chunks);

        config.decoding.max_new_tokens =
            parse_or(&lookup, "PDFRAG_MAX_NEW_TOKENS", config.decoding.max_new_tokens);
        config.decoding.temperature =
            parse_or(&lookup, "PDFRAG_TEMPERATURE", config.decoding.temperature);
        config.decoding.top_p = parse_or(&lookup, "PDFRAG_TOP_P", config.decoding.top_p);
        config.decoding.top_k = parse_or(&lookup, "PDFRAG_TOP_K_SAMPLING", config.decoding.top_k);

        if let Some(language) = lookup("PDFRAG_LANGUAGE") {
            match language.parse() {
                Ok(language) => config.language = language,
                Err(e) => log::warn!("Ignoring PDFRAG_LANGUAGE: {}", e),
            }
        }

        config
    }

    pub fn validate_all(&self) -> Result<()> {
        self.validate()?;

        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(RagError::Config(format!(
                "overlap ({}) must be smaller than chunk size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }
        if self.decoding.temperature <= 0.0 {
            return Err(RagError::Config("temperature must be greater than 0".to_string()));
        }
        if self.decoding.top_p <= 0.0 {
            return Err(RagError::Config("top_p must be greater than 0".to_string()));
        }
        if self.generator.model_name.trim().is_empty() {
            return Err(RagError::Config("model name must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.overlap, 50);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.context_chunks, 2);
        assert_eq!(config.generator.model_name, DEFAULT_MODEL);
        assert_eq!(config.embedding.model_name, DEFAULT_EMBEDDING_MODEL);
        assert!(config.decoding.do_sample);
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = RagConfig::from_lookup(lookup_from(&[
            ("PDFRAG_MODEL", "microsoft/DialoGPT-medium"),
            ("PDFRAG_BACKEND", "ollama"),
            ("PDFRAG_CHUNK_SIZE", "200"),
            ("PDFRAG_CHUNK_OVERLAP", "20"),
            ("PDFRAG_TOP_K", "5"),
            ("PDFRAG_TEMPERATURE", "0.3"),
            ("PDFRAG_LANGUAGE", "ar"),
        ]));
        assert_eq!(config.generator.model_name, "microsoft/DialoGPT-medium");
        assert_eq!(config.generator.backend, Backend::Ollama);
        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.chunking.overlap, 20);
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.decoding.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.language, PromptLanguage::Arabic);
    }

    #[test]
    fn test_bad_values_fall_back_to_defaults() {
        let config = RagConfig::from_lookup(lookup_from(&[
            ("PDFRAG_CHUNK_SIZE", "lots"),
            ("PDFRAG_BACKEND", "carrier-pigeon"),
        ]));
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.generator.backend, Backend::HuggingFace);
    }

    #[test]
    fn test_hf_token_fallback() {
        let config = RagConfig::from_lookup(lookup_from(&[("HF_API_TOKEN", "hf_abc")]));
        assert_eq!(config.generator.api_key.as_deref(), Some("hf_abc"));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut config = RagConfig::default();
        config.chunking.overlap = 500;
        assert!(matches!(config.validate_all(), Err(RagError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_ranges() {
        let mut config = RagConfig::default();
        config.retrieval.top_k = 0;
        assert!(matches!(config.validate_all(), Err(RagError::Config(_))));

        let mut config = RagConfig::default();
        config.decoding.temperature = 0.0;
        assert!(matches!(config.validate_all(), Err(RagError::Config(_))));

        let mut config = RagConfig::default();
        config.decoding.top_p = 1.5;
        assert!(matches!(config.validate_all(), Err(RagError::Config(_))));
    }

    #[test]
    fn test_api_url_defaults_per_backend() {
        let mut generator = GeneratorConfig::default();
        assert_eq!(generator.api_url(), "https://api-inference.huggingface.co");
        generator.backend = Backend::Ollama;
        assert_eq!(generator.api_url(), "http://localhost:11434");
        generator.api_url = Some("http://gpu-box:8080/".to_string());
        assert_eq!(generator.api_url(), "http://gpu-box:8080");
    }
}
