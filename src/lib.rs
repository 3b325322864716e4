pub mod block;
pub mod config;
pub mod dictionary;
pub mod document;
pub mod error;
pub mod expansion;
pub mod indexer;
pub mod norms;
pub mod postings;
pub mod preprocess;
pub mod rerank;
pub mod vsm;

pub use block::*;
pub use config::*;
pub use dictionary::*;
pub use document::*;
pub use error::*;
pub use expansion::*;
pub use indexer::*;
pub use norms::*;
pub use postings::*;
pub use preprocess::*;
pub use rerank::*;
pub use vsm::*;
