use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Error;
use crate::postings::{read_record, DictRecord};
use crate::preprocess::NgramModel;

/// The term dictionary of a built index: one `term -> absolute byte offset`
/// map per n-gram model, reconstructed by replaying the on-disk record
/// stream. Offsets address the postings file directly.
#[derive(Debug, Default)]
pub struct Dictionary {
    models: [HashMap<String, u64>; 2],
}

impl Dictionary {
    /// Replays the dictionary stream. The running sum of entry lengths is the
    /// absolute offset of each entry's postings list; model boundaries do not
    /// reset it because models are laid out back to back in the postings
    /// file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut dictionary = Dictionary::default();
        let mut offset = 0u64;
        let mut model_index = 0usize;
        while let Some(record) = read_record(&mut reader)? {
            match record {
                DictRecord::Entry { term, len } => {
                    if model_index < dictionary.models.len() {
                        dictionary.models[model_index].insert(term, offset);
                    }
                    offset += len;
                }
                DictRecord::Boundary => model_index += 1,
            }
        }
        Ok(dictionary)
    }

    pub fn offset(&self, model: NgramModel, term: &str) -> Option<u64> {
        self.models[model.index()].get(term).copied()
    }

    pub fn term_count(&self, model: NgramModel) -> usize {
        self.models[model.index()].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::write_record;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_reconstructs_running_offsets() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dictionary.bin");

        let mut buf = Vec::new();
        let records = [
            DictRecord::Entry { term: "appeal".to_string(), len: 20 },
            DictRecord::Entry { term: "court".to_string(), len: 12 },
            DictRecord::Boundary,
            DictRecord::Entry { term: "appeal court".to_string(), len: 28 },
            DictRecord::Boundary,
        ];
        for record in &records {
            write_record(&mut buf, record).unwrap();
        }
        fs::write(&path, buf).unwrap();

        let dictionary = Dictionary::load(&path).unwrap();
        assert_eq!(dictionary.offset(NgramModel::Unigram, "appeal"), Some(0));
        assert_eq!(dictionary.offset(NgramModel::Unigram, "court"), Some(20));
        // bigram offsets continue past the unigram payload
        assert_eq!(
            dictionary.offset(NgramModel::Bigram, "appeal court"),
            Some(32)
        );
        assert_eq!(dictionary.offset(NgramModel::Bigram, "appeal"), None);
        assert_eq!(dictionary.term_count(NgramModel::Unigram), 2);
    }
}
