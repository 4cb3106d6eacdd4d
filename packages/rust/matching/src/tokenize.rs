//! Word tokenization for keyword matching.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Distinct lower-cased tokens (maximal runs of word characters) in `text`.
pub fn token_set(text: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Number of keywords present in the token set. Each keyword counts once.
pub fn count_matches(tokens: &HashSet<String>, keywords: &[String]) -> usize {
    keywords.iter().filter(|k| tokens.contains(k.as_str())).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_lowercase_word_runs() {
        let tokens = token_set("AI-driven Health_care, e-Learning!");
        for t in ["ai", "driven", "health_care", "e", "learning"] {
            assert!(tokens.contains(t), "missing {t}");
        }
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let tokens = token_set("ai ai AI and more ai");
        assert_eq!(count_matches(&tokens, &["ai".into(), "ml".into()]), 1);
    }

    #[test]
    fn matching_is_whole_word() {
        let tokens = token_set("maintains the chain");
        assert_eq!(count_matches(&tokens, &["ai".into()]), 0);
    }
}
