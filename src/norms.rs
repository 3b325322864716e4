use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Error;
use crate::preprocess::NgramModel;

/// Fixed name of the norms file, written into the indexer's working
/// directory.
pub const LENGTHS_FILE: &str = "lengths.txt";

/// Per-model document norms: the Euclidean length of each document's log-tf
/// vector, used to normalize cosine scores. A document appears in a model's
/// table exactly when it has at least one posting in that model.
#[derive(Debug, Default)]
pub struct DocNorms {
    models: [BTreeMap<u32, f64>; 2],
}

impl DocNorms {
    pub fn new(unigram: BTreeMap<u32, f64>, bigram: BTreeMap<u32, f64>) -> Self {
        DocNorms {
            models: [unigram, bigram],
        }
    }

    /// One serialized map per model, in the same fixed model order as the
    /// dictionary stream.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        for table in &self.models {
            bincode::serialize_into(&mut writer, table)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let mut reader = BufReader::new(File::open(path)?);
        let unigram = bincode::deserialize_from(&mut reader)?;
        let bigram = bincode::deserialize_from(&mut reader)?;
        Ok(DocNorms::new(unigram, bigram))
    }

    pub fn norm(&self, model: NgramModel, doc_id: u32) -> Option<f64> {
        self.models[model.index()].get(&doc_id).copied()
    }

    /// Number of documents the model covers; the `|D|` of idf.
    pub fn doc_count(&self, model: NgramModel) -> usize {
        self.models[model.index()].len()
    }
}
