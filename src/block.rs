use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::postings::{read_stream_value, Posting};

/// A partial inverted index over one chunk of documents, built entirely in
/// memory. The BTreeMap keeps terms sorted, which is what the merger relies
/// on when it streams the serialized block back.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    postings: BTreeMap<String, Vec<Posting>>,
    norms: BTreeMap<u32, f64>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        BlockBuilder::default()
    }

    /// Adds one document's term frequency counts. Documents must be added in
    /// ascending `doc_id` order; each term gets at most one posting per
    /// document, so the per-term lists stay strictly increasing.
    pub fn add_document(&mut self, doc_id: u32, counts: &BTreeMap<String, u32>) {
        let mut sum_squares = 0.0;
        for (term, &freq) in counts {
            self.postings
                .entry(term.clone())
                .or_default()
                .push(Posting {
                    doc_id,
                    term_freq: freq,
                });
            let weight = 1.0 + (freq as f64).log10();
            sum_squares += weight * weight;
        }
        self.norms.insert(doc_id, sum_squares.sqrt());
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Serializes the block into `block_<i>.post` (sorted term records) and
    /// `block_<i>.norms` under the given model directory.
    pub fn write(self, model_dir: &Path, block_index: usize) -> Result<(), Error> {
        let post_path = block_file(model_dir, block_index, "post");
        let file = File::create(&post_path).map_err(|e| Error::TempIo {
            path: post_path.clone(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        for record in &self.postings {
            bincode::serialize_into(&mut writer, &record)?;
        }
        writer.flush().map_err(|e| Error::TempIo {
            path: post_path,
            source: e,
        })?;

        let norms_path = block_file(model_dir, block_index, "norms");
        let file = File::create(&norms_path).map_err(|e| Error::TempIo {
            path: norms_path.clone(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &self.norms)?;
        writer.flush().map_err(|e| Error::TempIo {
            path: norms_path,
            source: e,
        })?;
        Ok(())
    }
}

pub fn block_file(model_dir: &Path, block_index: usize, ext: &str) -> PathBuf {
    model_dir.join(format!("block_{:05}.{}", block_index, ext))
}

/// Lazy record iterator over one serialized block. Holds a single buffered
/// record's worth of state; the merger never needs a whole block in memory.
pub struct BlockReader {
    reader: BufReader<File>,
    block_id: usize,
    last_term: Option<String>,
}

impl BlockReader {
    pub fn open(path: &Path, block_id: usize) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::TempIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(BlockReader {
            reader: BufReader::new(file),
            block_id,
            last_term: None,
        })
    }

    /// Next `(term, postings)` record, or `None` at EOF. A term that does not
    /// strictly ascend past the previous one means the block file was built
    /// wrong, which would silently corrupt the merge.
    pub fn next_record(&mut self) -> Result<Option<(String, Vec<Posting>)>, Error> {
        let record: Option<(String, Vec<Posting>)> = read_stream_value(&mut self.reader)?;
        let Some((term, postings)) = record else {
            return Ok(None);
        };
        if let Some(previous) = &self.last_term {
            if term <= *previous {
                return Err(Error::MergeDrift {
                    block_id: self.block_id,
                    term,
                    previous: previous.clone(),
                });
            }
        }
        self.last_term = Some(term.clone());
        Ok(Some((term, postings)))
    }
}

/// Reads a block's per-document norms back.
pub fn read_block_norms(path: &Path) -> Result<BTreeMap<u32, f64>, Error> {
    let file = File::open(path).map_err(|e| Error::TempIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);
    Ok(bincode::deserialize_from(&mut reader)?)
}
