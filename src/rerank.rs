/// Stable boolean partition of a ranking: documents whose raw content
/// contains every query phrase (case-sensitive substring) come first, the
/// rest keep their relative order behind them. Matching runs over raw
/// content, not stemmed tokens, mirroring how queries are written.
pub fn boolean_rerank(
    ranking: &[u32],
    phrases: &[String],
    mut content_of: impl FnMut(u32) -> String,
) -> Vec<u32> {
    let mut matching = Vec::new();
    let mut rest = Vec::new();
    for &doc_id in ranking {
        let content = content_of(doc_id);
        if phrases.iter().all(|phrase| content.contains(phrase.as_str())) {
            matching.push(doc_id);
        } else {
            rest.push(doc_id);
        }
    }
    matching.extend(rest);
    matching
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn contents(pairs: &[(u32, &str)]) -> HashMap<u32, String> {
        pairs.iter().map(|&(id, c)| (id, c.to_string())).collect()
    }

    #[test]
    fn test_documents_with_all_phrases_come_first() {
        let docs = contents(&[
            (1, "quick brown fox"),
            (2, "quick dog"),
            (3, "lazy quick dog"),
        ]);
        let phrases = vec!["quick".to_string(), "dog".to_string()];
        let ranked = boolean_rerank(&[1, 2, 3], &phrases, |id| docs[&id].clone());
        assert_eq!(ranked, vec![2, 3, 1]);
    }

    #[test]
    fn test_relative_order_preserved_within_groups() {
        let docs = contents(&[
            (5, "alpha beta"),
            (9, "alpha"),
            (2, "alpha beta"),
            (7, "beta"),
        ]);
        let phrases = vec!["alpha beta".to_string()];
        let ranked = boolean_rerank(&[5, 9, 2, 7], &phrases, |id| docs[&id].clone());
        // 5 and 2 both match and stay in order; 9 and 7 stay in order behind.
        assert_eq!(ranked, vec![5, 2, 9, 7]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let docs = contents(&[(1, "Quick brown"), (2, "quick brown")]);
        let phrases = vec!["quick".to_string()];
        let ranked = boolean_rerank(&[1, 2], &phrases, |id| docs[&id].clone());
        assert_eq!(ranked, vec![2, 1]);
    }

    #[test]
    fn test_no_phrases_keeps_order() {
        let docs = contents(&[(3, "x"), (1, "y")]);
        let ranked = boolean_rerank(&[3, 1], &[], |id| docs[&id].clone());
        assert_eq!(ranked, vec![3, 1]);
    }
}
