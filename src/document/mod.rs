pub mod chunker;
pub mod processor;
pub mod rag;

pub use chunker::{Chunk, TextChunker};
pub use processor::{DocumentSource, PdfExtractor, TextExtractor};
pub use rag::{Corpus, DocumentInfo, RAGSystem};
