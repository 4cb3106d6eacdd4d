//! Flat-list keyword matching.
//!
//! Retains a record when any of:
//! 1. two or more keywords across title, summary and title description;
//! 2. a keyword in the title and one in summary + title description;
//! 3. two or more keywords in summary + title description.

use speakerscout_shared::{ClassifiedKeywords, KeywordMatch, ProfileRecord};

use crate::policy::MatchingPolicy;
use crate::tokenize::{count_matches, token_set};

/// Always part of the flat keyword list.
pub const ALWAYS_INCLUDED: &str = "innovation";

#[derive(Debug, Clone)]
pub struct LegacyPolicy {
    keywords: Vec<String>,
}

impl LegacyPolicy {
    pub fn new<I>(keywords: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut flat: Vec<String> = Vec::new();
        for word in keywords {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && !flat.contains(&word) {
                flat.push(word);
            }
        }
        Self { keywords: flat }
    }

    /// Class A, then Class B, then the always-included word.
    pub fn from_classified(keywords: &ClassifiedKeywords) -> Self {
        Self::new(
            keywords
                .class_a()
                .iter()
                .chain(keywords.class_b())
                .map(String::as_str)
                .chain(std::iter::once(ALWAYS_INCLUDED)),
        )
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn matches(&self, record: &ProfileRecord) -> bool {
        let body = format!("{} {}", record.summary, record.title_description);
        let all = count_matches(&token_set(&format!("{} {body}", record.title)), &self.keywords);
        let in_title = count_matches(&token_set(&record.title), &self.keywords);
        let in_body = count_matches(&token_set(&body), &self.keywords);

        all >= 2 || (in_title >= 1 && in_body >= 1) || in_body >= 2
    }
}

impl MatchingPolicy for LegacyPolicy {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn evaluate(&self, record: &ProfileRecord) -> Option<KeywordMatch> {
        self.matches(record).then_some(KeywordMatch::Legacy)
    }
}
