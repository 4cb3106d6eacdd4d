//! Keyword matching policy seam and the stage that applies it.

use speakerscout_shared::{
    ClassifiedKeywords, KeywordMatch, KeywordMode, ProfileRecord, RecordSet, Stage, StageKind,
};
use tracing::debug;

use crate::classified::ClassifiedPolicy;
use crate::legacy::LegacyPolicy;

/// Decides whether a record is retained and how it is annotated.
pub trait MatchingPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Some` annotation to retain the record, `None` to drop it.
    fn evaluate(&self, record: &ProfileRecord) -> Option<KeywordMatch>;
}

/// Build the policy for a keyword mode.
pub fn policy_for(mode: KeywordMode, keywords: &ClassifiedKeywords) -> Box<dyn MatchingPolicy> {
    match mode {
        KeywordMode::Classified => Box::new(ClassifiedPolicy::new(keywords.clone())),
        KeywordMode::Legacy => Box::new(LegacyPolicy::from_classified(keywords)),
    }
}

/// Narrows the set to matching records and annotates the survivors.
pub struct KeywordStage {
    policy: Box<dyn MatchingPolicy>,
}

impl KeywordStage {
    pub fn new(policy: Box<dyn MatchingPolicy>) -> Self {
        Self { policy }
    }

    pub fn for_mode(mode: KeywordMode, keywords: &ClassifiedKeywords) -> Self {
        Self::new(policy_for(mode, keywords))
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }
}

impl Stage for KeywordStage {
    fn kind(&self) -> StageKind {
        StageKind::KeywordMatching
    }

    fn apply(&self, records: RecordSet) -> RecordSet {
        records
            .into_iter()
            .filter_map(|mut record| {
                let Some(annotation) = self.policy.evaluate(&record) else {
                    debug!(index = record.index, policy = self.policy.name(), "no keyword match");
                    return None;
                };
                record.record_keyword_match(annotation);
                Some(record)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakerscout_shared::CriteriaResult;

    fn keywords() -> ClassifiedKeywords {
        ClassifiedKeywords::new(["ai", "innovation"], ["healthcare", "learning"])
    }

    fn record(index: usize, title: &str, description: &str, summary: &str) -> ProfileRecord {
        ProfileRecord::new(index, title, "Acme", summary, "Paris, France")
            .with_title_description(description)
    }

    #[test]
    fn classified_stage_keeps_and_annotates() {
        let stage = KeywordStage::for_mode(KeywordMode::Classified, &keywords());
        let input: RecordSet = vec![
            record(0, "AI Director", "machine learning in healthcare", ""),
            record(1, "Chief Operating Officer", "", "Runs operations"),
        ]
        .into_iter()
        .collect();

        let out = stage.apply(input);
        assert_eq!(out.len(), 1);
        let kept = &out.records()[0];
        assert_eq!(kept.index, 0);
        assert_eq!(
            kept.keyword_match(),
            Some(KeywordMatch::Classified(CriteriaResult::new(true, true, false)))
        );
    }

    #[test]
    fn legacy_stage_uses_legacy_label() {
        let stage = KeywordStage::for_mode(KeywordMode::Legacy, &keywords());
        assert_eq!(stage.policy_name(), "legacy");
        let input: RecordSet = vec![record(0, "Head of Innovation", "", "Healthcare products")]
            .into_iter()
            .collect();
        let out = stage.apply(input);
        assert_eq!(out.records()[0].keyword_match(), Some(KeywordMatch::Legacy));
    }

    #[test]
    fn empty_set_passes_through() {
        let stage = KeywordStage::for_mode(KeywordMode::Classified, &keywords());
        assert!(stage.apply(RecordSet::default()).is_empty());
    }
}
