//! Title and summary/description elimination.
//!
//! Both stages compile their word list into a single alternation and drop
//! any record whose lower-cased text contains a match anywhere (substring,
//! not whole-word).

use std::sync::LazyLock;

use regex::Regex;
use speakerscout_shared::{RecordSet, Stage, StageKind};
use tracing::debug;

use crate::lexicon::{ELIMINATION_PHRASES, TITLE_EXCLUSIONS};

fn alternation(words: &[&str]) -> Regex {
    let pattern = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).expect("valid regex")
}

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| alternation(TITLE_EXCLUSIONS));
static ELIMINATION_RE: LazyLock<Regex> = LazyLock::new(|| alternation(ELIMINATION_PHRASES));

/// Whether a title contains an excluded fragment.
pub fn title_is_excluded(title: &str) -> bool {
    TITLE_RE.is_match(&title.to_lowercase())
}

/// Whether free text contains an elimination phrase.
pub fn contains_elimination_phrase(text: &str) -> bool {
    ELIMINATION_RE.is_match(&text.to_lowercase())
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Drops records whose title contains an excluded fragment.
#[derive(Debug, Default, Clone, Copy)]
pub struct TitleElimination;

impl Stage for TitleElimination {
    fn kind(&self) -> StageKind {
        StageKind::TitleElimination
    }

    fn apply(&self, records: RecordSet) -> RecordSet {
        records.retain(|r| {
            let excluded = title_is_excluded(&r.title);
            if excluded {
                debug!(index = r.index, title = %r.title, "title excluded");
            }
            !excluded
        })
    }
}

/// Drops records whose summary or title description contains an elimination phrase.
///
/// Runs after [`TitleElimination`] by convention only; the two are independent.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryElimination;

impl Stage for SummaryElimination {
    fn kind(&self) -> StageKind {
        StageKind::SummaryElimination
    }

    fn apply(&self, records: RecordSet) -> RecordSet {
        records.retain(|r| {
            !contains_elimination_phrase(&r.summary)
                && !contains_elimination_phrase(&r.title_description)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakerscout_shared::ProfileRecord;

    fn titled(titles: &[&str]) -> RecordSet {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| ProfileRecord::new(i, *t, "Acme", "", "Paris, France"))
            .collect()
    }

    #[test]
    fn title_match_is_case_insensitive_substring() {
        assert!(title_is_excluded("Senior Software ENGINEER"));
        assert!(title_is_excluded("Head of HR"));
        // "hr" is a substring of "three" as well; matching is not whole-word.
        assert!(title_is_excluded("Chief of Three Things"));
        assert!(title_is_excluded("Director, Advisory Board"));
        assert!(!title_is_excluded("Chief Innovation Officer"));
        assert!(!title_is_excluded(""));
    }

    #[test]
    fn title_elimination_drops_excluded_titles() {
        let out = TitleElimination.apply(titled(&[
            "Chief Innovation Officer",
            "Sales Director",
            "VP Digital",
        ]));
        let kept: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(kept, vec!["Chief Innovation Officer", "VP Digital"]);
    }

    #[test]
    fn title_elimination_is_idempotent() {
        let input = titled(&["Chief Innovation Officer", "Marketing Lead", "Head of AI"]);
        let once = TitleElimination.apply(input);
        let twice = TitleElimination.apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn leading_space_phrase_needs_a_space() {
        assert!(contains_elimination_phrase("oversees group finances"));
        assert!(!contains_elimination_phrase("finances were fine"));
    }

    #[test]
    fn summary_elimination_checks_both_fields() {
        let records: RecordSet = vec![
            ProfileRecord::new(0, "CTO", "Acme", "Builds platforms", "Paris"),
            ProfileRecord::new(1, "CTO", "Acme", "Hit every quota", "Paris"),
            ProfileRecord::new(2, "CTO", "Acme", "Builds platforms", "Paris")
                .with_title_description("Owns the revenue plan"),
        ]
        .into_iter()
        .collect();
        let out = SummaryElimination.apply(records);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records()[0].index, 0);
    }

    #[test]
    fn empty_set_passes_through() {
        assert!(TitleElimination.apply(RecordSet::default()).is_empty());
        assert!(SummaryElimination.apply(RecordSet::default()).is_empty());
    }
}
