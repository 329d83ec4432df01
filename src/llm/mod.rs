pub mod answer;
pub mod embeddings;
pub mod prompt;

pub use answer::{Answer, AnswerGenerator, RetrievedChunk};
pub use embeddings::{Embedder, EmbeddingMatrix, FastEmbedder, HashingEmbedder};
pub use prompt::{AnswerText, PromptLanguage, PromptTemplate};
