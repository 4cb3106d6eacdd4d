//! Heuristic ranking of the shortlisted profiles.
//!
//! Read-only: scoring never mutates or removes records from the result.

use serde::Serialize;
use speakerscout_shared::{CompanyCategory, ProfileRecord};

const TITLE_MIN_CHARS: usize = 10;
const TITLE_DIVISOR: usize = 5;
const TITLE_CAP: u32 = 8;
const SUMMARY_MIN_CHARS: usize = 50;
const SUMMARY_DIVISOR: usize = 25;
const SUMMARY_CAP: u32 = 12;
const PER_CRITERION_BONUS: u32 = 3;

/// Desirability score for one record.
///
/// Criteria flags are counted twice on purpose: once by fixed per-criterion
/// points and once more through the per-criterion bonus.
pub fn score(record: &ProfileRecord) -> u32 {
    let criteria = record.criteria();
    let mut score = 0;

    if criteria.criteria_a {
        score += 15;
    }
    if criteria.criteria_b {
        score += 12;
    }
    if criteria.criteria_c {
        score += 8;
    }

    score += match record.category() {
        Some(CompanyCategory::A) => 12,
        Some(CompanyCategory::B) => 8,
        Some(CompanyCategory::C) => 4,
        None => 0,
    };

    let title_len = record.title.chars().count();
    if title_len > TITLE_MIN_CHARS {
        score += TITLE_CAP.min((title_len / TITLE_DIVISOR) as u32);
    }
    let summary_len = record.summary.chars().count();
    if summary_len > SUMMARY_MIN_CHARS {
        score += SUMMARY_CAP.min((summary_len / SUMMARY_DIVISOR) as u32);
    }

    score + criteria.satisfied_count() * PER_CRITERION_BONUS
}

/// Options for the top-quartile view.
#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    /// Score Category C profiles too.
    pub include_category_c: bool,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            include_category_c: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RankedProfile<'a> {
    #[serde(skip)]
    pub record: &'a ProfileRecord,
    pub index: usize,
    pub score: u32,
}

/// Every considered record, highest score first. Ties keep input order.
pub fn rank<'a>(records: &'a [ProfileRecord], options: RankingOptions) -> Vec<RankedProfile<'a>> {
    let mut ranked: Vec<RankedProfile<'a>> = records
        .iter()
        .filter(|r| options.include_category_c || r.category() != Some(CompanyCategory::C))
        .map(|record| RankedProfile {
            record,
            index: record.index,
            score: score(record),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// The top quarter of the ranking, rounded down, at least one when any
/// record is considered.
pub fn top_quartile<'a>(
    records: &'a [ProfileRecord],
    options: RankingOptions,
) -> Vec<RankedProfile<'a>> {
    let mut ranked = rank(records, options);
    let take = (ranked.len() / 4).max(1).min(ranked.len());
    ranked.truncate(take);
    ranked
}
