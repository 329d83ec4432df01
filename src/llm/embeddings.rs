use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use ndarray::Array2;
use parking_lot::Mutex;

use crate::config::EmbeddingConfig;
use crate::error::{RagError, Result};

/// Rows are texts, columns are embedding dimensions.
pub type EmbeddingMatrix = Array2<f32>;

/// Maps text to fixed-width vectors. Corpus and query vectors of one
/// session must come from the same instance.
pub trait Embedder: Send + Sync {
    fn embed_documents(&self, texts: &[String]) -> Result<EmbeddingMatrix>;

    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Acquires the embedder named by the config. Loading happens here, once.
pub fn load_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    if config.model_name.eq_ignore_ascii_case(HashingEmbedder::MODEL_NAME) {
        log::info!("Using offline hashing embedder");
        return Ok(Box::new(HashingEmbedder::default()));
    }
    Ok(Box::new(FastEmbedder::new(config)?))
}

pub(crate) fn matrix_from_rows(rows: Vec<Vec<f32>>, dimension: usize) -> Result<EmbeddingMatrix> {
    let count = rows.len();
    let mut flat = Vec::with_capacity(count * dimension);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != dimension {
            return Err(RagError::Embedding(format!(
                "embedding {} has {} dimensions, expected {}",
                i,
                row.len(),
                dimension
            )));
        }
        flat.extend(row);
    }
    Array2::from_shape_vec((count, dimension), flat)
        .map_err(|e| RagError::Embedding(format!("Failed to shape embedding matrix: {}", e)))
}

/// Sentence-transformer models run locally through ONNX runtime.
pub struct FastEmbedder {
    // `TextEmbedding::embed` needs `&mut self`
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model, dimension) = resolve_model(&config.model_name)?;

        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = &config.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }

        log::info!("Loading embedding model {}", config.model_name);
        let embedding = TextEmbedding::try_new(options).map_err(|e| {
            RagError::Embedding(format!(
                "Failed to load embedding model {}: {}",
                config.model_name, e
            ))
        })?;
        log::info!("Embedding model {} loaded ({}d)", config.model_name, dimension);

        Ok(Self {
            model: Mutex::new(embedding),
            model_name: config.model_name.clone(),
            dimension,
        })
    }

    fn embed(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let mut model = self.model.lock();
        model
            .embed(texts, None)
            .map_err(|e| RagError::Embedding(format!("Embedding failed: {}", e)))
    }
}

impl Embedder for FastEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<EmbeddingMatrix> {
        if texts.is_empty() {
            return Ok(Array2::zeros((0, self.dimension)));
        }
        let rows = self.embed(texts.iter().map(String::as_str).collect())?;
        matrix_from_rows(rows, self.dimension)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(vec![text])?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("Embedding model returned no vector".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    let short = name.rsplit('/').next().unwrap_or(name).to_lowercase();
    let resolved = match short.as_str() {
        "all-minilm-l6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
        "all-minilm-l12-v2" => (EmbeddingModel::AllMiniLML12V2, 384),
        "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
        "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
        "paraphrase-multilingual-minilm-l12-v2" => (EmbeddingModel::ParaphraseMLMiniLML12V2, 384),
        "multilingual-e5-small" => (EmbeddingModel::MultilingualE5Small, 384),
        _ => {
            return Err(RagError::Embedding(format!(
                "Unsupported embedding model: {}",
                name
            )))
        }
    };
    Ok(resolved)
}

/// Feature-hashing bag of words. Needs no model files, so it works offline
/// and gives deterministic vectors.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub const MODEL_NAME: &'static str = "hashing";

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashingEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<EmbeddingMatrix> {
        let rows = texts.iter().map(|t| self.vectorize(t)).collect();
        matrix_from_rows(rows, self.dimension)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
