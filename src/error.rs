use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    /// The document could not be read or holds no extractable text.
    #[error("Document error: {0}")]
    Document(String),
    /// Invalid chunking, retrieval or decoding parameters.
    #[error("Config error: {0}")]
    Config(String),
    /// An operation was attempted before the state it needs exists.
    #[error("Precondition failed: {0}")]
    Precondition(String),
    /// Loading or invoking the language model failed.
    #[error("Generation error: {0}")]
    Generation(String),
    /// Loading or invoking the embedding model failed.
    #[error("Embedding error: {0}")]
    Embedding(String),
}

impl RagError {
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::Document(_) => "document",
            RagError::Config(_) => "config",
            RagError::Precondition(_) => "precondition",
            RagError::Generation(_) => "generation",
            RagError::Embedding(_) => "embedding",
        }
    }
}

impl From<validator::ValidationErrors> for RagError {
    fn from(e: validator::ValidationErrors) -> Self {
        RagError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(RagError::Document("x".into()).kind(), "document");
        assert_eq!(RagError::Config("x".into()).kind(), "config");
        assert_eq!(RagError::Precondition("x".into()).kind(), "precondition");
        assert_eq!(RagError::Generation("x".into()).kind(), "generation");
        assert_eq!(RagError::Embedding("x".into()).kind(), "embedding");
    }

    #[test]
    fn test_display_carries_message() {
        let err = RagError::Document("no extractable text".to_string());
        assert_eq!(err.to_string(), "Document error: no extractable text");
    }
}
