use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::SearchConfig;
use crate::dictionary::Dictionary;
use crate::document::extract_content;
use crate::error::Error;
use crate::norms::DocNorms;
use crate::postings::{read_postings_at, Posting};
use crate::preprocess::{NgramModel, Preprocessor};

/// A scored document. The ordering is the ranking order: higher score ranks
/// first, equal scores break toward the smaller document id, so rankings are
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDocPair {
    pub score: f64,
    pub doc_id: u32,
}

impl Eq for ScoreDocPair {}

impl Ord for ScoreDocPair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.doc_id.cmp(&self.doc_id))
    }
}

impl PartialOrd for ScoreDocPair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best `k` pairs in ranking order, via a bounded min-heap when `k` is given;
/// a full sort otherwise.
pub fn top_k(pairs: impl IntoIterator<Item = ScoreDocPair>, k: Option<usize>) -> Vec<ScoreDocPair> {
    match k {
        Some(k) => {
            let mut heap: BinaryHeap<std::cmp::Reverse<ScoreDocPair>> =
                BinaryHeap::with_capacity(k + 1);
            for pair in pairs {
                heap.push(std::cmp::Reverse(pair));
                if heap.len() > k {
                    heap.pop();
                }
            }
            let mut ranked: Vec<ScoreDocPair> = heap.into_iter().map(|r| r.0).collect();
            ranked.sort_by(|a, b| b.cmp(a));
            ranked
        }
        None => {
            let mut ranked: Vec<ScoreDocPair> = pairs.into_iter().collect();
            ranked.sort_by(|a, b| b.cmp(a));
            ranked
        }
    }
}

/// Everything one searcher invocation needs: the replayed dictionary, the
/// norm tables, the open postings file, and the corpus directory for pulling
/// raw document content back during expansion and re-ranking.
pub struct SearchContext {
    pub dictionary: Dictionary,
    pub norms: DocNorms,
    pub preprocessor: Preprocessor,
    postings_file: File,
    dir_doc: PathBuf,
    doc_query_cache: HashMap<u32, String>,
}

impl SearchContext {
    pub fn open(
        config: &SearchConfig,
        dict_path: &Path,
        postings_path: &Path,
    ) -> Result<Self, Error> {
        let dictionary = Dictionary::load(dict_path)?;
        let norms = DocNorms::load(&config.lengths_path)?;
        let postings_file = File::open(postings_path)?;
        Ok(SearchContext {
            dictionary,
            norms,
            preprocessor: Preprocessor::new(),
            postings_file,
            dir_doc: config.dir_doc.clone(),
            doc_query_cache: HashMap::new(),
        })
    }

    /// The postings list for a term, or `None` when the term is absent from
    /// the model's dictionary. A dictionary offset past the end of the
    /// postings file means the files do not match; the term is skipped with
    /// a warning rather than failing the query.
    pub fn postings(&mut self, model: NgramModel, term: &str) -> Result<Option<Vec<Posting>>, Error> {
        let Some(offset) = self.dictionary.offset(model, term) else {
            return Ok(None);
        };
        match read_postings_at(&mut self.postings_file, offset) {
            Ok(postings) => Ok(Some(postings)),
            Err(Error::SeekRange { offset, len }) => {
                eprintln!(
                    "Skipping term {:?}: offset {} past end of postings file ({} bytes)",
                    term, offset, len
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// ltc.lnc cosine scoring of a counted query against one n-gram model.
    /// Query side: (1 + log tf) * idf; document side: 1 + log tf, normalized
    /// by the document norm and the query L2 norm. Terms missing from the
    /// dictionary contribute nothing; a query with no known terms scores an
    /// empty ranking.
    pub fn vsm(
        &mut self,
        query: &BTreeMap<String, u32>,
        model: NgramModel,
        k: Option<usize>,
    ) -> Result<Vec<ScoreDocPair>, Error> {
        let doc_count = self.norms.doc_count(model);
        if doc_count == 0 {
            return Ok(Vec::new());
        }

        let mut scores: HashMap<u32, f64> = HashMap::new();
        let mut query_norm_sq = 0.0;
        for (term, &query_tf) in query {
            let Some(postings) = self.postings(model, term)? else {
                continue;
            };
            if postings.is_empty() {
                continue;
            }
            let idf = (doc_count as f64 / postings.len() as f64).log10();
            let query_weight = (1.0 + (query_tf as f64).log10()) * idf;
            for posting in &postings {
                let doc_weight = 1.0 + (posting.term_freq as f64).log10();
                *scores.entry(posting.doc_id).or_insert(0.0) += doc_weight * idf * query_weight;
            }
            query_norm_sq += query_weight * query_weight;
        }

        let query_norm = query_norm_sq.sqrt();
        let pairs = scores.into_iter().filter_map(|(doc_id, score)| {
            let norm = self.norms.norm(model, doc_id)?;
            // When every matched term occurs in every document the query norm
            // degenerates to zero; the documents still matched, so keep them
            // at score zero instead of dividing.
            let score = if query_norm > 0.0 {
                score / (norm * query_norm)
            } else {
                0.0
            };
            Some(ScoreDocPair { score, doc_id })
        });
        let pairs: Vec<ScoreDocPair> = pairs.collect();
        Ok(top_k(pairs, k))
    }

    /// Raw content of a corpus document, memoized for the lifetime of the
    /// searcher. A document that cannot be extracted reads as empty content.
    pub fn document_content(&mut self, doc_id: u32) -> String {
        if let Some(content) = self.doc_query_cache.get(&doc_id) {
            return content.clone();
        }
        let path = self.dir_doc.join(format!("{}.xml", doc_id));
        let content = match extract_content(&path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Cannot read document {}: {}", doc_id, e);
                String::new()
            }
        };
        self.doc_query_cache.insert(doc_id, content.clone());
        content
    }
}
