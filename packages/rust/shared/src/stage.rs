//! The stage contract shared by every filter in the pipeline.

use serde::{Deserialize, Serialize};

use crate::types::RecordSet;

/// The nine pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    TitleElimination,
    SummaryElimination,
    CompanyExclusion,
    LanguageFilter,
    LocationFilter,
    CompanyCategory,
    SeniorityFilter,
    KeywordMatching,
    Explanation,
}

impl StageKind {
    pub const ALL: [StageKind; 9] = [
        Self::TitleElimination,
        Self::SummaryElimination,
        Self::CompanyExclusion,
        Self::LanguageFilter,
        Self::LocationFilter,
        Self::CompanyCategory,
        Self::SeniorityFilter,
        Self::KeywordMatching,
        Self::Explanation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TitleElimination => "title elimination",
            Self::SummaryElimination => "summary elimination",
            Self::CompanyExclusion => "company exclusion",
            Self::LanguageFilter => "language filter",
            Self::LocationFilter => "location filter",
            Self::CompanyCategory => "company category",
            Self::SeniorityFilter => "seniority filter",
            Self::KeywordMatching => "keyword matching",
            Self::Explanation => "explanation",
        }
    }

    /// 1-based position in the pipeline.
    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|k| *k == self)
            .map_or(0, |i| i + 1)
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One synchronous narrowing or annotating step over a [`RecordSet`].
///
/// Implementations must accept an empty set and return an empty set, and
/// must never grow the set.
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn apply(&self, records: RecordSet) -> RecordSet;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_follow_execution_order() {
        assert_eq!(StageKind::TitleElimination.position(), 1);
        assert_eq!(StageKind::KeywordMatching.position(), 8);
        assert_eq!(StageKind::Explanation.position(), 9);
    }

    #[test]
    fn display_uses_human_name() {
        assert_eq!(StageKind::LocationFilter.to_string(), "location filter");
    }
}
