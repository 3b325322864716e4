use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure modes of indexing and search. Corpus problems are recoverable
/// (callers log and skip the document); everything else aborts the invocation
/// that hit it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("corpus document {path}: {message}")]
    Corpus { path: PathBuf, message: String },

    #[error("block file {path}: {source}")]
    TempIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("block {block_id} out of order: {term:?} after {previous:?}")]
    MergeDrift {
        block_id: usize,
        term: String,
        previous: String,
    },

    #[error("postings offset {offset} is past end of file ({len} bytes)")]
    SeekRange { offset: u64, len: u64 },

    #[error("config file {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("serialization: {0}")]
    Codec(#[from] bincode::Error),
}
