pub mod commands;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod llm;
pub mod providers;

// Re-export commonly used items
pub use config::RagConfig;
pub use document::{DocumentSource, RAGSystem};
pub use error::{RagError, Result};
pub use llm::{Answer, AnswerText};
