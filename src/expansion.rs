use std::collections::BTreeMap;

use crate::error::Error;
use crate::preprocess::{count_tokens, generate_ngrams, NgramModel};
use crate::rerank::boolean_rerank;
use crate::vsm::SearchContext;

/// How many top documents of a phrase query form its pseudo-relevant set.
pub const QUERY_EXPANSION_DOCUMENT_LIMIT: usize = 10;
/// How many mined bigrams a phrase contributes to the expanded query.
pub const QUERY_EXPANSION_KEYWORD_LIMIT: usize = 10;
/// How many copies of each original phrase bigram go into the expanded
/// query, biasing the final pass toward the user's wording.
pub const QUERY_ENHANCE: u32 = 10;

/// Splits a boolean query on the standalone literal `AND` and strips each
/// phrase of surrounding quotes and spaces.
pub fn split_phrases(query: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for token in query.split_whitespace() {
        if token == "AND" {
            if !current.is_empty() {
                phrases.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(token);
        }
    }
    if !current.is_empty() {
        phrases.push(current.join(" "));
    }
    phrases
        .iter()
        .map(|phrase| strip_phrase(phrase))
        .filter(|phrase| !phrase.is_empty())
        .collect()
}

fn strip_phrase(phrase: &str) -> String {
    phrase
        .trim_matches(|c: char| c == '"' || c == ' ')
        .to_string()
}

/// Answers one boolean query end to end: per-phrase VSM retrieval, expansion
/// term mining over each phrase's pseudo-relevant set, one fused bigram VSM
/// pass, then the boolean re-rank. Documents retrieved by the phrase passes
/// but absent from the expanded ranking are appended behind it, so a query
/// still returns its direct hits when the corpus yields no expansion bigrams.
pub fn handle_boolean_query(ctx: &mut SearchContext, query: &str) -> Result<Vec<u32>, Error> {
    let phrases = split_phrases(query);

    let mut fused: BTreeMap<String, u32> = BTreeMap::new();
    let mut phrase_hits: Vec<u32> = Vec::new();
    for phrase in &phrases {
        let tokens = ctx.preprocessor.preprocess(phrase);
        if tokens.is_empty() {
            continue;
        }
        let (model, counts) = if tokens.len() == 1 {
            (NgramModel::Unigram, count_tokens(&tokens))
        } else {
            (
                NgramModel::Bigram,
                count_tokens(&generate_ngrams(&tokens, 2)),
            )
        };
        let top = ctx.vsm(&counts, model, Some(QUERY_EXPANSION_DOCUMENT_LIMIT))?;
        let pseudo_relevant: Vec<u32> = top.iter().map(|pair| pair.doc_id).collect();
        for &doc_id in &pseudo_relevant {
            if !phrase_hits.contains(&doc_id) {
                phrase_hits.push(doc_id);
            }
        }

        for term in mine_expansion_terms(ctx, &pseudo_relevant)? {
            *fused.entry(term).or_insert(0) += 1;
        }
        for bigram in generate_ngrams(&tokens, 2) {
            *fused.entry(bigram).or_insert(0) += QUERY_ENHANCE;
        }
    }

    let expanded = ctx.vsm(&fused, NgramModel::Bigram, None)?;
    let mut ranking: Vec<u32> = expanded.iter().map(|pair| pair.doc_id).collect();
    for doc_id in phrase_hits {
        if !ranking.contains(&doc_id) {
            ranking.push(doc_id);
        }
    }

    Ok(boolean_rerank(&ranking, &phrases, |doc_id| {
        ctx.document_content(doc_id)
    }))
}

/// Mines expansion bigrams from a pseudo-relevant set: the documents'
/// contents are concatenated, preprocessed and bigram-counted, and each
/// candidate found in the bigram dictionary is scored by
/// `(1 + log tf) * idf * df_in_pr`, where `df_in_pr` is the fraction of the
/// pseudo-relevant document limit carrying the bigram. The top candidates
/// become the phrase's expansion set.
fn mine_expansion_terms(
    ctx: &mut SearchContext,
    pseudo_relevant: &[u32],
) -> Result<Vec<String>, Error> {
    if pseudo_relevant.is_empty() {
        return Ok(Vec::new());
    }
    let doc_count = ctx.norms.doc_count(NgramModel::Bigram);
    if doc_count == 0 {
        return Ok(Vec::new());
    }

    let mut tokens = Vec::new();
    for &doc_id in pseudo_relevant {
        let content = ctx.document_content(doc_id);
        tokens.extend(ctx.preprocessor.preprocess(&content));
    }
    let counts = count_tokens(&generate_ngrams(&tokens, 2));

    let mut scored: Vec<(f64, String)> = Vec::new();
    for (bigram, &tf) in &counts {
        let Some(postings) = ctx.postings(NgramModel::Bigram, bigram)? else {
            continue;
        };
        if postings.is_empty() {
            continue;
        }
        let in_pr = postings
            .iter()
            .filter(|posting| pseudo_relevant.contains(&posting.doc_id))
            .count();
        let df_in_pr = in_pr as f64 / QUERY_EXPANSION_DOCUMENT_LIMIT as f64;
        let idf = (doc_count as f64 / postings.len() as f64).log10();
        let score = (1.0 + (tf as f64).log10()) * idf * df_in_pr;
        scored.push((score, bigram.clone()));
    }

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(scored
        .into_iter()
        .take(QUERY_EXPANSION_KEYWORD_LIMIT)
        .map(|(_, bigram)| bigram)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::indexer::build_index;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_split_phrases_on_standalone_and() {
        assert_eq!(
            split_phrases("\"quick brown\" AND \"dog\""),
            vec!["quick brown".to_string(), "dog".to_string()]
        );
        assert_eq!(split_phrases("quick"), vec!["quick".to_string()]);
        // AND embedded in a word does not split.
        assert_eq!(split_phrases("BRAND name"), vec!["BRAND name".to_string()]);
        assert!(split_phrases("AND").is_empty());
    }

    fn build_fixture(work: &TempDir, docs: &[(u32, &str)]) -> SearchContext {
        let corpus = work.path().join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        for (doc_id, content) in docs {
            let xml = format!("<doc><str name=\"content\">{}</str></doc>", content);
            fs::write(corpus.join(format!("{}.xml", doc_id)), xml).unwrap();
        }
        let dict_path = work.path().join("dictionary.bin");
        let postings_path = work.path().join("postings.bin");
        build_index(&corpus, &dict_path, &postings_path, work.path()).unwrap();
        let config = SearchConfig::load(work.path()).unwrap();
        SearchContext::open(&config, &dict_path, &postings_path).unwrap()
    }

    fn quick_brown_corpus() -> [(u32, &'static str); 3] {
        [
            (1, "the quick brown fox"),
            (2, "quick brown dog"),
            (3, "lazy dog"),
        ]
    }

    #[test]
    fn test_phrase_query_ranks_and_excludes() {
        let work = TempDir::new().unwrap();
        let mut ctx = build_fixture(&work, &quick_brown_corpus());
        let ranking = handle_boolean_query(&mut ctx, "\"quick brown\"").unwrap();
        assert_eq!(ranking, vec![1, 2]);
    }

    #[test]
    fn test_conjunction_puts_full_match_first() {
        let work = TempDir::new().unwrap();
        let mut ctx = build_fixture(&work, &quick_brown_corpus());
        let ranking = handle_boolean_query(&mut ctx, "\"quick\" AND \"dog\"").unwrap();
        assert_eq!(ranking[0], 2);
        assert_eq!(ranking.len(), 3);
    }

    #[test]
    fn test_single_term_query_falls_back_to_phrase_hits() {
        let work = TempDir::new().unwrap();
        // Single-token documents produce no bigrams at all, so the expanded
        // pass scores nothing and the phrase hits carry the result.
        let docs: Vec<(u32, String)> = (0..20).map(|k| (k, format!("t{}", k))).collect();
        let docs_ref: Vec<(u32, &str)> =
            docs.iter().map(|(id, c)| (*id, c.as_str())).collect();
        let mut ctx = build_fixture(&work, &docs_ref);

        let ranking = handle_boolean_query(&mut ctx, "t7").unwrap();
        assert_eq!(ranking, vec![7]);
    }

    #[test]
    fn test_stopword_query_is_empty_not_error() {
        let work = TempDir::new().unwrap();
        let mut ctx = build_fixture(&work, &quick_brown_corpus());
        let ranking = handle_boolean_query(&mut ctx, "the of and").unwrap();
        assert!(ranking.is_empty());
    }

    #[test]
    fn test_every_corpus_term_is_findable() {
        let work = TempDir::new().unwrap();
        let docs = quick_brown_corpus();
        let mut ctx = build_fixture(&work, &docs);
        for term in ["quick", "brown", "fox", "dog", "lazy"] {
            let ranking = handle_boolean_query(&mut ctx, term).unwrap();
            assert!(!ranking.is_empty(), "term {:?}", term);
        }
    }

    #[test]
    fn test_norms_for_single_token_corpus_are_unit() {
        use crate::norms::{DocNorms, LENGTHS_FILE};
        use crate::preprocess::NgramModel;

        let work = TempDir::new().unwrap();
        let docs: Vec<(u32, String)> = (0..500).map(|k| (k, format!("t{}", k))).collect();
        let corpus = work.path().join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        for (doc_id, content) in &docs {
            let xml = format!("<doc><str name=\"content\">{}</str></doc>", content);
            fs::write(corpus.join(format!("{}.xml", doc_id)), xml).unwrap();
        }
        build_index(
            &corpus,
            &work.path().join("dictionary.bin"),
            &work.path().join("postings.bin"),
            work.path(),
        )
        .unwrap();

        let norms = DocNorms::load(&work.path().join(Path::new(LENGTHS_FILE))).unwrap();
        assert_eq!(norms.doc_count(NgramModel::Unigram), 500);
        for doc_id in 0..500 {
            assert!((norms.norm(NgramModel::Unigram, doc_id).unwrap() - 1.0).abs() < 1e-12);
        }
    }
}
