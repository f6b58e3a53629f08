//! Fuzzy matching of package names against the index.
//!
//! Scores are 0–100. Two scorers are combined: a plain ratio over the whole
//! string and a token-sort ratio that ignores word order and punctuation, so
//! `py-yaml`, `yaml py` and `PyYAML` all land close to `pyyaml`.

use strsim::normalized_levenshtein;

use crate::index::PackageIndex;

/// A candidate with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub name: String,
    pub score: u8,
}

/// Similarity of two strings, case-insensitive.
pub fn ratio(a: &str, b: &str) -> u8 {
    to_score(normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase()))
}

/// Similarity after splitting both strings into alphanumeric tokens and
/// sorting them.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    to_score(normalized_levenshtein(&sorted_tokens(a), &sorted_tokens(b)))
}

/// Best of [`ratio`] and [`token_sort_ratio`].
pub fn score(query: &str, candidate: &str) -> u8 {
    ratio(query, candidate).max(token_sort_ratio(query, candidate))
}

fn to_score(similarity: f64) -> u8 {
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

fn sorted_tokens(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ranks `candidates` against `query`, best first, keeping at most `limit`.
/// Equal scores keep the candidates' input order.
pub fn extract<'a, I>(query: &str, candidates: I, limit: usize) -> Vec<Match>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matches: Vec<Match> = candidates
        .into_iter()
        .map(|name| Match {
            name: name.to_string(),
            score: score(query, name),
        })
        .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(limit);
    matches
}

/// The single best candidate, if any.
pub fn extract_one<'a, I>(query: &str, candidates: I) -> Option<Match>
where
    I: IntoIterator<Item = &'a str>,
{
    extract(query, candidates, 1).into_iter().next()
}

/// Matches externally supplied package names against the index. An exact
/// (case-insensitive) hit yields a single perfect match; otherwise the best
/// `limit` index keys are returned.
pub fn match_packages(names: &[&str], index: &PackageIndex, limit: usize) -> Vec<(String, Vec<Match>)> {
    names
        .iter()
        .map(|name| {
            let matches = match index.get(name) {
                Some(_) => vec![Match {
                    name: name.to_lowercase(),
                    score: 100,
                }],
                None => extract(name, index.names(), limit),
            };
            (name.to_string(), matches)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("numpy", "numpy"), 100);
        assert_eq!(ratio("NumPy", "numpy"), 100);
        assert_eq!(ratio("abc", "xyz"), 0);
        assert_eq!(ratio("", ""), 100);
    }

    #[test]
    fn test_token_sort_ratio_ignores_order_and_punctuation() {
        assert_eq!(token_sort_ratio("yaml-py", "py_yaml"), 100);
        assert!(token_sort_ratio("yaml py", "py yaml") > ratio("yaml py", "py yaml"));
    }

    #[test]
    fn test_extract_ranks_best_first() {
        let candidates = ["numpy", "scipy", "numpy-base", "pandas"];
        let matches = extract("numpi", candidates, 2);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "numpy");
        assert!(matches[0].score >= matches[1].score);
    }

    #[test]
    fn test_extract_ties_keep_input_order() {
        let matches = extract("zzz", ["abc", "def"], 5);
        assert_eq!(matches[0].name, "abc");
        assert_eq!(matches[1].name, "def");
    }

    #[test]
    fn test_extract_one_empty_candidates() {
        assert_eq!(extract_one("numpy", Vec::<&str>::new()), None);
    }

    #[test]
    fn test_match_packages() {
        let mut index = PackageIndex::new();
        index.insert("pyyaml", "conda-forge/pyyaml-feedstock");
        index.insert("numpy", "conda-forge/numpy-feedstock");
        index.insert("scipy", "conda-forge/scipy-feedstock");

        let results = match_packages(&["NumPy", "py-yaml"], &index, 1);

        assert_eq!(results[0].0, "NumPy");
        assert_eq!(
            results[0].1,
            vec![Match {
                name: "numpy".into(),
                score: 100
            }]
        );
        assert_eq!(results[1].1[0].name, "pyyaml");
    }
}
