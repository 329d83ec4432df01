use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::database::vector_index::FlatL2Index;
use crate::document::chunker::{Chunk, TextChunker};
use crate::document::processor::{DocumentSource, PdfExtractor, TextExtractor};
use crate::error::{RagError, Result};
use crate::llm::answer::{self, Answer, AnswerGenerator, RetrievedChunk};
use crate::llm::embeddings::{load_embedder, Embedder};
use crate::llm::prompt::PromptTemplate;
use crate::providers::traits::{BackendLoader, GeneratorLoader};

/// Everything known about the processed document. Row `i` of `index` is the
/// embedding of `chunks[i]`.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub id: Uuid,
    pub source_name: String,
    pub chunks: Vec<Chunk>,
    pub index: FlatL2Index,
    pub word_count: usize,
    pub processed_at: DateTime<Utc>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub id: Uuid,
    pub source_name: String,
    pub chunk_count: usize,
    pub word_count: usize,
    pub embedding_model: String,
    pub dimension: usize,
    pub processed_at: DateTime<Utc>,
}

/// One document session: extraction, chunking, embedding and indexing of a
/// PDF, then question answering over it.
pub struct RAGSystem {
    config: RagConfig,
    chunker: TextChunker,
    embedder: Box<dyn Embedder>,
    extractor: Box<dyn TextExtractor>,
    answers: AnswerGenerator,
    corpus: Option<Corpus>,
}

impl RAGSystem {
    pub fn new(
        config: RagConfig,
        embedder: Box<dyn Embedder>,
        extractor: Box<dyn TextExtractor>,
        loader: Box<dyn GeneratorLoader>,
    ) -> Result<Self> {
        config.validate_all()?;
        let chunker = TextChunker::from_config(&config.chunking)?;
        let answers = AnswerGenerator::new(
            loader,
            PromptTemplate::for_language(config.language),
            config.retrieval.clone(),
            config.decoding.clone(),
        );

        Ok(Self {
            config,
            chunker,
            embedder,
            extractor,
            answers,
            corpus: None,
        })
    }

    /// Loads the configured embedding model and wires the PDF extractor and
    /// language model backend.
    pub fn from_config(config: RagConfig) -> Result<Self> {
        config.validate_all()?;
        let embedder = load_embedder(&config.embedding)?;
        let loader = BackendLoader::new(config.generator.clone());
        Self::new(config, embedder, Box::new(PdfExtractor::new()), Box::new(loader))
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn is_processed(&self) -> bool {
        self.corpus.is_some()
    }

    pub fn corpus(&self) -> Option<&Corpus> {
        self.corpus.as_ref()
    }

    pub fn chunks(&self) -> &[Chunk] {
        self.corpus.as_ref().map(|c| c.chunks.as_slice()).unwrap_or(&[])
    }

    pub fn language_model_loaded(&self) -> bool {
        self.answers.is_loaded()
    }

    pub fn process_path(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.process_document(&DocumentSource::from_path(path))
    }

    /// Replaces the session corpus with `source`. On error the previous
    /// corpus, if any, is left as it was.
    pub fn process_document(&mut self, source: &DocumentSource) -> Result<usize> {
        let corpus = self.build_corpus(source)?;
        let count = corpus.len();

        log::info!(
            "Processed {}: {} words, {} chunks, {}d embeddings",
            corpus.source_name,
            corpus.word_count,
            count,
            corpus.index.dimension()
        );
        self.corpus = Some(corpus);
        Ok(count)
    }

    fn build_corpus(&self, source: &DocumentSource) -> Result<Corpus> {
        let text = self.extractor.extract(source)?;
        if text.trim().is_empty() {
            return Err(RagError::Document(format!(
                "No extractable text found in {}",
                source.name()
            )));
        }

        let word_count = text.split_whitespace().count();
        let chunks = self.chunker.chunk(&text);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let embeddings = self.embedder.embed_documents(&texts)?;
        if embeddings.nrows() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "Got {} embeddings for {} chunks",
                embeddings.nrows(),
                chunks.len()
            )));
        }
        let index = FlatL2Index::build(embeddings)?;

        Ok(Corpus {
            id: Uuid::new_v4(),
            source_name: source.name(),
            chunks,
            index,
            word_count,
            processed_at: Utc::now(),
        })
    }

    /// Retrieval only, no generation.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let corpus = self.corpus.as_ref().ok_or_else(|| {
            RagError::Precondition("No document has been processed yet".to_string())
        })?;
        answer::retrieve(corpus, self.embedder.as_ref(), query, k)
    }

    pub async fn generate_answer(&mut self, question: &str) -> Result<Answer> {
        self.answers
            .answer(self.corpus.as_ref(), self.embedder.as_ref(), question)
            .await
    }

    pub fn document_info(&self) -> Option<DocumentInfo> {
        self.corpus.as_ref().map(|corpus| DocumentInfo {
            id: corpus.id,
            source_name: corpus.source_name.clone(),
            chunk_count: corpus.len(),
            word_count: corpus.word_count,
            embedding_model: self.embedder.model_name().to_string(),
            dimension: corpus.index.dimension(),
            processed_at: corpus.processed_at,
        })
    }

    pub fn reset(&mut self) {
        if let Some(corpus) = self.corpus.take() {
            log::info!("Discarded document {}", corpus.source_name);
        }
    }

    pub fn release_models(&mut self) {
        self.answers.release();
    }
}
