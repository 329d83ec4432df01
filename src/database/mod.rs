pub mod vector_index;

pub use vector_index::{FlatL2Index, SearchHit};
