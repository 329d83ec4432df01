use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{DecodingParams, RetrievalConfig};
use crate::document::rag::Corpus;
use crate::error::{RagError, Result};
use crate::llm::embeddings::Embedder;
use crate::llm::prompt::{AnswerText, PromptTemplate};
use crate::providers::traits::{GeneratorLoader, TextGenerator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub index: usize,
    pub text: String,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: AnswerText,
    /// Chunk texts placed in the prompt, joined by a single space.
    pub context: String,
    pub prompt: String,
    /// Everything retrieved for the question, nearest first.
    pub sources: Vec<RetrievedChunk>,
    pub model: String,
}

impl Answer {
    pub fn into_pair(self) -> (String, String) {
        (self.text.into_string(), self.context)
    }
}

/// Retrieves context for a question and asks the language model about it.
///
/// The language model is acquired on the first answer and kept until
/// [`AnswerGenerator::release`] is called.
pub struct AnswerGenerator {
    loader: Box<dyn GeneratorLoader>,
    generator: Option<Arc<dyn TextGenerator>>,
    template: PromptTemplate,
    retrieval: RetrievalConfig,
    decoding: DecodingParams,
}

impl AnswerGenerator {
    pub fn new(
        loader: Box<dyn GeneratorLoader>,
        template: PromptTemplate,
        retrieval: RetrievalConfig,
        decoding: DecodingParams,
    ) -> Self {
        Self {
            loader,
            generator: None,
            template,
            retrieval,
            decoding,
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn is_loaded(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn acquire(&mut self) -> Result<Arc<dyn TextGenerator>> {
        if let Some(generator) = &self.generator {
            return Ok(Arc::clone(generator));
        }
        let generator = self.loader.load().await?;
        log::info!("Language model {} ready", generator.model_name());
        self.generator = Some(Arc::clone(&generator));
        Ok(generator)
    }

    pub fn release(&mut self) {
        if let Some(generator) = self.generator.take() {
            log::info!("Released language model {}", generator.model_name());
        }
    }

    pub async fn answer(
        &mut self,
        corpus: Option<&Corpus>,
        embedder: &dyn Embedder,
        question: &str,
    ) -> Result<Answer> {
        // checked before anything gets loaded
        let corpus = corpus.ok_or_else(|| {
            RagError::Precondition("No document has been processed yet".to_string())
        })?;
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::Precondition("The question is empty".to_string()));
        }

        let sources = retrieve(corpus, embedder, question, self.retrieval.top_k)?;
        let context = build_context(&sources, self.retrieval.context_chunks);
        let prompt = self.template.render(question, &context);

        let generator = self.acquire().await?;
        log::debug!(
            "Generating with {} ({} context chunks, {} prompt chars)",
            generator.model_name(),
            sources.len().min(self.retrieval.context_chunks),
            prompt.len()
        );
        let raw = generator.generate(&prompt, &self.decoding).await?;

        let text = self.template.extract_answer(&raw);
        if text.is_unparsed() {
            log::warn!("Model output has no '{}' label; returning it unparsed", self.template.answer_label);
        }

        Ok(Answer {
            text,
            context,
            prompt,
            sources,
            model: generator.model_name().to_string(),
        })
    }
}

/// Nearest chunks to the question, nearest first.
pub fn retrieve(
    corpus: &Corpus,
    embedder: &dyn Embedder,
    question: &str,
    k: usize,
) -> Result<Vec<RetrievedChunk>> {
    let query = embedder.embed_query(question)?;
    let hits = corpus.index.search(&query, k)?;

    hits.into_iter()
        .map(|hit| {
            let chunk = corpus.chunks.get(hit.index).ok_or_else(|| {
                RagError::Embedding(format!("Index returned unknown chunk {}", hit.index))
            })?;
            Ok(RetrievedChunk {
                index: hit.index,
                text: chunk.text.clone(),
                distance: hit.distance,
            })
        })
        .collect()
}

pub fn build_context(sources: &[RetrievedChunk], limit: usize) -> String {
    sources
        .iter()
        .take(limit)
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            index,
            text: text.to_string(),
            distance: index as f32,
        }
    }

    #[test]
    fn test_context_takes_prefix() {
        let sources = vec![chunk(0, "first"), chunk(1, "second"), chunk(2, "third")];
        assert_eq!(build_context(&sources, 2), "first second");
    }

    #[test]
    fn test_context_with_fewer_sources() {
        let sources = vec![chunk(0, "only")];
        assert_eq!(build_context(&sources, 2), "only");
        assert_eq!(build_context(&[], 2), "");
    }

    #[test]
    fn test_into_pair() {
        let answer = Answer {
            text: AnswerText::Extracted("In 1990.".to_string()),
            context: "Andrew Summer was born in 1990.".to_string(),
            prompt: String::new(),
            sources: Vec::new(),
            model: "m".to_string(),
        };
        let (text, context) = answer.into_pair();
        assert_eq!(text, "In 1990.");
        assert_eq!(context, "Andrew Summer was born in 1990.");
    }
}
