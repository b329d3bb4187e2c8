pub mod capabilities;
pub mod chunking;
pub mod password;
pub mod prompts;
pub mod similarity;

pub use capabilities::*;
pub use chunking::{normalize_markdown, Chunker, Chunks};
pub use password::*;
pub use similarity::{cosine_similarity, rank};
