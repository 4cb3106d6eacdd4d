//! Three-criteria matching over Class A and Class B keywords.
//!
//! - Criteria A: at least one Class A and one Class B word in title + title description.
//! - Criteria B: at least one Class A word and two or more matches overall in the same text.
//! - Criteria C: at least one Class A word and three or more matches overall in the summary.
//!
//! A word present in both classes is counted once per class.

use speakerscout_shared::{ClassifiedKeywords, CriteriaResult, KeywordMatch, ProfileRecord};

use crate::policy::MatchingPolicy;
use crate::tokenize::{count_matches, token_set};

#[derive(Debug, Clone)]
pub struct ClassifiedPolicy {
    keywords: ClassifiedKeywords,
}

impl ClassifiedPolicy {
    pub fn new(keywords: ClassifiedKeywords) -> Self {
        Self { keywords }
    }

    pub fn criteria(&self, record: &ProfileRecord) -> CriteriaResult {
        let (class_a, class_b) = (self.keywords.class_a(), self.keywords.class_b());

        let title_tokens = token_set(&format!("{} {}", record.title, record.title_description));
        let title_a = count_matches(&title_tokens, class_a);
        let title_b = count_matches(&title_tokens, class_b);

        let summary_tokens = token_set(&record.summary);
        let summary_a = count_matches(&summary_tokens, class_a);
        let summary_b = count_matches(&summary_tokens, class_b);

        CriteriaResult {
            criteria_a: title_a >= 1 && title_b >= 1,
            criteria_b: title_a >= 1 && title_a + title_b >= 2,
            criteria_c: summary_a >= 1 && summary_a + summary_b >= 3,
        }
    }
}

impl MatchingPolicy for ClassifiedPolicy {
    fn name(&self) -> &'static str {
        "classified"
    }

    fn evaluate(&self, record: &ProfileRecord) -> Option<KeywordMatch> {
        let criteria = self.criteria(record);
        criteria.passes().then_some(KeywordMatch::Classified(criteria))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ClassifiedPolicy {
        ClassifiedPolicy::new(ClassifiedKeywords::new(
            ["ai", "innovation"],
            ["healthcare", "learning"],
        ))
    }

    fn record(title: &str, description: &str, summary: &str) -> ProfileRecord {
        ProfileRecord::new(0, title, "Acme", summary, "Paris").with_title_description(description)
    }

    #[test]
    fn ai_director_in_healthcare_meets_a_and_b() {
        let c = policy().criteria(&record("AI Director", "machine learning in healthcare", ""));
        assert!(c.criteria_a);
        assert!(c.criteria_b);
        assert!(!c.criteria_c);
    }

    #[test]
    fn two_class_a_words_meet_b_only() {
        let c = policy().criteria(&record("Head of AI and Innovation", "", ""));
        assert_eq!(c, CriteriaResult::new(false, true, false));
    }

    #[test]
    fn class_b_alone_never_passes() {
        let r = record("Director of Learning", "healthcare", "learning healthcare learning");
        assert_eq!(policy().evaluate(&r), None);
    }

    #[test]
    fn summary_needs_three_with_one_class_a() {
        let two = record("Director", "", "AI for healthcare");
        assert!(!policy().criteria(&two).criteria_c);

        let three = record("Director", "", "AI for healthcare and learning");
        assert!(policy().criteria(&three).criteria_c);
    }

    #[test]
    fn repetition_does_not_inflate_counts() {
        let r = record("Director", "", "AI AI AI, ai-first");
        assert!(!policy().criteria(&r).criteria_c);
    }

    #[test]
    fn summary_words_do_not_count_for_title_criteria() {
        let r = record("Director", "", "AI innovation in healthcare");
        let c = policy().criteria(&r);
        assert!(!c.criteria_a && !c.criteria_b && c.criteria_c);
    }
}
