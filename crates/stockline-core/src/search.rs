//! # Fuzzy Catalog Search
//!
//! Ranks catalog items against an operator query, tolerating typos, accents
//! and singular/plural variation.
//!
//! ## Ranking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  query "basee"  ──normalize──►  "basee"   threshold = max(1, 5·2/5) = 2 │
//! │                                                                         │
//! │  "Base Líquida" → "base liquida"   window "base"   distance 1  ✓ match │
//! │  "Crema"        → "crema"                          distance 5          │
//! │                                                                         │
//! │  matches exist → [Base Líquida]                                         │
//! │  none match    → the 3 nearest, weak or not                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Distance is 0 when the normalized name contains the normalized query.
//! Otherwise it is the Levenshtein distance to the whole name or to the best
//! run of name words with as many words as the query, whichever is smaller.
//! A one-word query therefore finds "Base Líquida" from "basee"; when the
//! name has exactly as many words as the query both measures coincide.
//!
//! Cost is O(C · Q · N) per call. Callers searching on every keystroke over
//! large catalogs should debounce.

use std::cmp::Ordering;

use serde::Serialize;

use crate::normalize::normalize;
use crate::types::CatalogItem;
use crate::FALLBACK_RESULTS;

/// A catalog item scored against one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub item: CatalogItem,
    pub normalized_name: String,
    pub distance: usize,
}

/// Searches the catalog and returns the ranked items.
///
/// An empty (after normalization) query returns the catalog unchanged.
/// A non-empty catalog never yields an empty result.
///
/// ```rust
/// use stockline_core::{search, CatalogItem, Money};
///
/// let catalog = vec![
///     CatalogItem::new(1, "Delineador Líquido Black", 3, Money::from_cents(9_900)),
///     CatalogItem::new(2, "Desmaquillante de Ojos", 1, Money::from_cents(12_000)),
/// ];
/// let hits = search("delinador", &catalog);
/// assert_eq!(hits[0].id, 1);
/// ```
pub fn search(query: &str, catalog: &[CatalogItem]) -> Vec<CatalogItem> {
    rank(query, catalog)
        .into_iter()
        .map(|candidate| candidate.item)
        .collect()
}

/// Same as [`search`] but keeps the scores.
///
/// For an empty query every item is returned in catalog order with
/// distance 0.
pub fn rank(query: &str, catalog: &[CatalogItem]) -> Vec<ScoredCandidate> {
    let query = normalize(query);

    if query.is_empty() {
        return catalog
            .iter()
            .map(|item| ScoredCandidate {
                normalized_name: normalize(&item.name),
                item: item.clone(),
                distance: 0,
            })
            .collect();
    }

    let threshold = threshold(&query);

    let mut scored: Vec<ScoredCandidate> = catalog
        .iter()
        .map(|item| {
            let normalized_name = normalize(&item.name);
            let distance = distance(&query, &normalized_name);
            ScoredCandidate {
                item: item.clone(),
                normalized_name,
                distance,
            }
        })
        .collect();

    let has_matches = scored.iter().any(|c| c.distance <= threshold);

    if has_matches {
        scored.retain(|c| c.distance <= threshold);
        scored.sort_by(compare_candidates);
    } else {
        // TODO: product owner to confirm whether "no results" should stay
        // empty instead of surfacing the nearest weak guesses.
        scored.sort_by(compare_candidates);
        scored.truncate(FALLBACK_RESULTS);
    }

    scored
}

/// Maximum distance accepted as a match: `max(1, floor(len × 0.4))`.
pub fn threshold(normalized_query: &str) -> usize {
    (normalized_query.chars().count() * 2 / 5).max(1)
}

/// Scores a normalized name against a normalized query.
///
/// A substring hit scores 0. Otherwise this is the smaller of the
/// whole-name Levenshtein distance and the best distance against any run
/// of consecutive name words as long as the query. Plain whole-name
/// Levenshtein alone would put "basee" 8 edits from "base liquida", past
/// its threshold of 2; the word window only ever lowers a score, so
/// every whole-name match still matches.
fn distance(query: &str, name: &str) -> usize {
    if name.contains(query) {
        return 0;
    }

    let whole = levenshtein_distance(query, name);

    let query_words = query.split(' ').count();
    let name_words: Vec<&str> = name.split(' ').collect();
    if name_words.len() <= query_words {
        return whole;
    }

    name_words
        .windows(query_words)
        .map(|window| levenshtein_distance(query, &window.join(" ")))
        .min()
        .map_or(whole, |best| best.min(whole))
}

/// Ascending distance, then case-insensitive display name.
fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    a.distance
        .cmp(&b.distance)
        .then_with(|| a.item.name.to_lowercase().cmp(&b.item.name.to_lowercase()))
}

/// Classic insert/delete/substitute edit distance.
///
/// Two-row dynamic program over `char`s.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (prev[j + 1] + 1)
                .min(current[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn item(id: i64, name: &str) -> CatalogItem {
        CatalogItem::new(id, name, 10, Money::from_cents(1_000))
    }

    fn sample_catalog() -> Vec<CatalogItem> {
        vec![
            item(1, "Base Líquida Mate TimeWise"),
            item(2, "Alma Equídada Razza"),
            item(3, "Immun 2 Powder Radines"),
            item(4, "Crema Renovadora de Noche"),
            item(5, "Labial Gel Semi-Mate - Red Roma"),
            item(6, "Delineador Líquido Black"),
        ]
    }

    fn ids(items: &[CatalogItem]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_threshold() {
        assert_eq!(threshold("a"), 1);
        assert_eq!(threshold("base"), 1);
        assert_eq!(threshold("basee"), 2);
        assert_eq!(threshold("delineador"), 4);
    }

    #[test]
    fn test_empty_query_is_identity() {
        let catalog = sample_catalog();
        assert_eq!(search("", &catalog), catalog);
        assert_eq!(search("  ¿? ", &catalog), catalog);
    }

    #[test]
    fn test_substring_matches_come_first() {
        let catalog = sample_catalog();
        let hits = search("mate", &catalog);
        // Both contain "mate"; ties broken by lowercase display name
        assert_eq!(ids(&hits), vec![1, 5]);
    }

    #[test]
    fn test_accent_and_plural_insensitive() {
        let catalog = sample_catalog();
        assert_eq!(ids(&search("LIQUIDAS", &catalog)), vec![1, 6]);
        assert_eq!(search("cremas", &catalog)[0].id, 4);
    }

    #[test]
    fn test_typo_within_threshold() {
        let catalog = sample_catalog();
        let hits = rank("delinador", &catalog);
        assert_eq!(hits[0].item.id, 6);
        assert_eq!(hits[0].distance, 1);
        assert!(hits.iter().all(|c| c.distance <= threshold("delinador")));
    }

    #[test]
    fn test_fallback_returns_three_nearest() {
        let catalog = sample_catalog();
        let hits = rank("zzzzzzzz", &catalog);
        assert_eq!(hits.len(), FALLBACK_RESULTS);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_fallback_on_small_catalog() {
        let catalog = vec![item(1, "Crema")];
        assert_eq!(ids(&search("qqqqqqqqqq", &catalog)), vec![1]);
        assert!(search("anything", &[]).is_empty());
    }

    #[test]
    fn test_results_are_catalog_members() {
        let catalog = sample_catalog();
        for query in ["base", "xyz", "crma", "2", "noche roma"] {
            let hits = search(query, &catalog);
            assert!(!hits.is_empty(), "empty result for {query:?}");
            assert!(hits.iter().all(|h| catalog.contains(h)));
        }
    }

    #[test]
    fn test_ties_ordered_by_name() {
        let catalog = vec![item(1, "crema b"), item(2, "Crema A"), item(3, "crema c")];
        assert_eq!(ids(&search("crema", &catalog)), vec![2, 1, 3]);
    }

    #[test]
    fn test_end_to_end_basee() {
        let catalog = vec![
            CatalogItem::new(1, "Base Líquida", 3, Money::from_cents(10_000)),
            CatalogItem::new(2, "Crema", 0, Money::from_cents(5_000)),
        ];
        let hits = rank("basee", &catalog);
        assert_eq!(hits[0].item.id, 1);
        assert!(hits[0].distance <= threshold("basee"));
    }
}
