//! Seniority filter keyed on company category.

use speakerscout_shared::{ProfileRecord, RecordSet, Stage, StageKind};

use crate::lexicon::seniority_terms;

/// Keeps a record iff its title holds a seniority term for its category.
/// Records without a category are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeniorityFilter;

pub fn is_senior_enough(record: &ProfileRecord) -> bool {
    let Some(category) = record.category() else {
        return false;
    };
    let title = record.title.to_lowercase();
    seniority_terms(category)
        .iter()
        .any(|term| title.contains(term))
}

impl Stage for SeniorityFilter {
    fn kind(&self) -> StageKind {
        StageKind::SeniorityFilter
    }

    fn apply(&self, records: RecordSet) -> RecordSet {
        records.retain(is_senior_enough)
    }
}
