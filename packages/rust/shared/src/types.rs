//! Core domain types: profile records, record sets, and their annotations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ScoutError};

/// Columns every profile batch must carry before any stage runs.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_TITLE, COL_COMPANY_NAME, COL_SUMMARY, COL_LOCATION];

/// Maximum number of Class A keywords kept from the topic.
pub const CLASS_A_LIMIT: usize = 5;

pub const COL_TITLE: &str = "title";
pub const COL_COMPANY_NAME: &str = "companyName";
pub const COL_SUMMARY: &str = "summary";
pub const COL_LOCATION: &str = "location";
pub const COL_COMPANY_LOCATION: &str = "companyLocation";
pub const COL_TITLE_DESCRIPTION: &str = "titleDescription";

pub const COL_CATEGORY: &str = "Companies Category";
pub const COL_KEYWORD_CRITERIA: &str = "keyword_criteria_passed";
pub const COL_CRITERIA_A: &str = "criteria_a_passed";
pub const COL_CRITERIA_B: &str = "criteria_b_passed";
pub const COL_CRITERIA_C: &str = "criteria_c_passed";
pub const COL_EXPLANATION: &str = "llm_reason";
pub const COL_EXPLANATION_ERROR: &str = "llm_error";

// ---------------------------------------------------------------------------
// CompanyCategory
// ---------------------------------------------------------------------------

/// Employer tier of a profile, assigned from the category reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyCategory {
    #[serde(rename = "Category A")]
    A,
    #[serde(rename = "Category B")]
    B,
    #[serde(rename = "Category C")]
    C,
}

impl CompanyCategory {
    /// Label used in exported tables and explanation prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "Category A",
            Self::B => "Category B",
            Self::C => "Category C",
        }
    }
}

impl std::fmt::Display for CompanyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Criteria / keyword annotations
// ---------------------------------------------------------------------------

/// Outcome of the three classified keyword criteria for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CriteriaResult {
    pub criteria_a: bool,
    pub criteria_b: bool,
    pub criteria_c: bool,
}

impl CriteriaResult {
    pub const LABEL_A: &'static str = "Criteria A";
    pub const LABEL_B: &'static str = "Criteria B";
    pub const LABEL_C: &'static str = "Criteria C";

    pub fn new(criteria_a: bool, criteria_b: bool, criteria_c: bool) -> Self {
        Self {
            criteria_a,
            criteria_b,
            criteria_c,
        }
    }

    /// A record is retained iff at least one criterion holds.
    pub fn passes(&self) -> bool {
        self.criteria_a || self.criteria_b || self.criteria_c
    }

    /// Number of criteria satisfied (0..=3).
    pub fn satisfied_count(&self) -> u32 {
        u32::from(self.criteria_a) + u32::from(self.criteria_b) + u32::from(self.criteria_c)
    }

    /// Labels of the satisfied criteria, ordered A, B, C.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.criteria_a, Self::LABEL_A),
            (self.criteria_b, Self::LABEL_B),
            (self.criteria_c, Self::LABEL_C),
        ]
        .into_iter()
        .filter_map(|(hit, label)| hit.then_some(label))
        .collect()
    }
}

/// Keyword annotation left on a record by the keyword-matching stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordMatch {
    /// Three-criteria classified matching.
    Classified(CriteriaResult),
    /// Flat-list legacy matching (no per-criterion detail).
    Legacy,
}

impl KeywordMatch {
    pub const LEGACY_LABEL: &'static str = "Legacy keyword matching";

    /// Per-criterion flags; all false for legacy matches.
    pub fn criteria(&self) -> CriteriaResult {
        match self {
            Self::Classified(criteria) => *criteria,
            Self::Legacy => CriteriaResult::default(),
        }
    }

    /// `"Criteria A, Criteria C"`, `"None"`, or the legacy label.
    pub fn summary(&self) -> String {
        match self {
            Self::Classified(criteria) => {
                let labels = criteria.labels();
                if labels.is_empty() {
                    "None".to_string()
                } else {
                    labels.join(", ")
                }
            }
            Self::Legacy => Self::LEGACY_LABEL.to_string(),
        }
    }
}

/// Result of the explanation collaborator for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Explanation {
    Generated(String),
    /// Explanation failed and the run isolated the failure to this row.
    Failed(String),
}

// ---------------------------------------------------------------------------
// ClassifiedKeywords
// ---------------------------------------------------------------------------

/// Class A (topic, capped) and Class B (sub-topic) keyword vocabularies.
///
/// Entries are trimmed, lower-cased, de-duplicated single words. Matching is
/// per word, so multi-word entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedKeywords {
    class_a: Vec<String>,
    class_b: Vec<String>,
}

impl ClassifiedKeywords {
    pub fn new<A, B>(class_a: A, class_b: B) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        let mut class_a = normalize_keywords(class_a);
        class_a.truncate(CLASS_A_LIMIT);
        Self {
            class_a,
            class_b: normalize_keywords(class_b),
        }
    }

    pub fn class_a(&self) -> &[String] {
        &self.class_a
    }

    pub fn class_b(&self) -> &[String] {
        &self.class_b
    }

    pub fn is_empty(&self) -> bool {
        self.class_a.is_empty() && self.class_b.is_empty()
    }
}

fn normalize_keywords<I>(words: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .filter(|w| {
            let single = !w.contains(char::is_whitespace);
            if !single {
                tracing::warn!(keyword = %w, "dropping multi-word keyword");
            }
            single
        })
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// ProfileRecord
// ---------------------------------------------------------------------------

/// One professional profile flowing through the pipeline.
///
/// Annotations (category, keyword match) are write-once: the setters refuse
/// to overwrite an existing value.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    /// Row index in the uploaded batch; stable across every stage.
    pub index: usize,
    pub title: String,
    pub company_name: String,
    pub summary: String,
    pub location: String,
    pub company_location: String,
    pub title_description: String,
    /// The input row as read, carried through for export.
    source: Map<String, Value>,
    category: Option<CompanyCategory>,
    keyword_match: Option<KeywordMatch>,
    explanation: Option<Explanation>,
}

impl ProfileRecord {
    /// Build a record from the four base attributes.
    ///
    /// `company_location` defaults to `location`; `title_description` to empty.
    pub fn new(
        index: usize,
        title: impl Into<String>,
        company_name: impl Into<String>,
        summary: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let location = location.into();
        Self {
            index,
            title: title.into(),
            company_name: company_name.into(),
            summary: summary.into(),
            company_location: location.clone(),
            location,
            title_description: String::new(),
            source: Map::new(),
            category: None,
            keyword_match: None,
            explanation: None,
        }
    }

    pub fn with_company_location(mut self, company_location: impl Into<String>) -> Self {
        self.company_location = company_location.into();
        self
    }

    pub fn with_title_description(mut self, title_description: impl Into<String>) -> Self {
        self.title_description = title_description.into();
        self
    }

    /// Read a record from one input row. Absent and `null` cells become empty.
    pub fn from_row(index: usize, row: &Map<String, Value>) -> Self {
        let text = |col: &str| cell_text(row.get(col)).unwrap_or_default();
        let location = text(COL_LOCATION);
        let company_location =
            cell_text(row.get(COL_COMPANY_LOCATION)).unwrap_or_else(|| location.clone());

        Self {
            index,
            title: text(COL_TITLE),
            company_name: text(COL_COMPANY_NAME),
            summary: text(COL_SUMMARY),
            location,
            company_location,
            title_description: text(COL_TITLE_DESCRIPTION),
            source: row.clone(),
            category: None,
            keyword_match: None,
            explanation: None,
        }
    }

    pub fn category(&self) -> Option<CompanyCategory> {
        self.category
    }

    /// Assign the company category. Returns `false` if one was already set.
    pub fn assign_category(&mut self, category: CompanyCategory) -> bool {
        if self.category.is_some() {
            return false;
        }
        self.category = Some(category);
        true
    }

    pub fn keyword_match(&self) -> Option<KeywordMatch> {
        self.keyword_match
    }

    /// Record the keyword annotation. Returns `false` if one was already set.
    pub fn record_keyword_match(&mut self, keyword_match: KeywordMatch) -> bool {
        if self.keyword_match.is_some() {
            return false;
        }
        self.keyword_match = Some(keyword_match);
        true
    }

    /// Classified criteria flags, all false when no classified match exists.
    pub fn criteria(&self) -> CriteriaResult {
        self.keyword_match
            .map(|m| m.criteria())
            .unwrap_or_default()
    }

    pub fn explanation(&self) -> Option<&Explanation> {
        self.explanation.as_ref()
    }

    pub fn set_explanation(&mut self, explanation: Explanation) {
        self.explanation = Some(explanation);
    }

    /// Human-readable list of what this record passed, handed to the explainer.
    pub fn criteria_passed_summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.title.is_empty() {
            parts.push("Valid title".into());
        }
        if !self.summary.is_empty() {
            parts.push("Has summary".into());
        }
        if let Some(category) = self.category {
            parts.push(category.label().into());
        }
        if let Some(m) = self.keyword_match {
            let summary = m.summary();
            if summary != "None" {
                parts.push(format!("Keyword: {summary}"));
            }
        }
        parts.join(", ")
    }

    /// Export row: every input column, the normalized base columns, then
    /// the annotation columns with the explanation last.
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = self.source.clone();
        for (col, value) in [
            (COL_TITLE, &self.title),
            (COL_COMPANY_NAME, &self.company_name),
            (COL_SUMMARY, &self.summary),
            (COL_LOCATION, &self.location),
            (COL_COMPANY_LOCATION, &self.company_location),
            (COL_TITLE_DESCRIPTION, &self.title_description),
        ] {
            row.insert(col.into(), Value::String(value.clone()));
        }

        if let Some(category) = self.category {
            row.insert(COL_CATEGORY.into(), Value::String(category.label().into()));
        }
        if let Some(m) = self.keyword_match {
            row.insert(COL_KEYWORD_CRITERIA.into(), Value::String(m.summary()));
            if let KeywordMatch::Classified(criteria) = m {
                row.insert(COL_CRITERIA_A.into(), Value::Bool(criteria.criteria_a));
                row.insert(COL_CRITERIA_B.into(), Value::Bool(criteria.criteria_b));
                row.insert(COL_CRITERIA_C.into(), Value::Bool(criteria.criteria_c));
            }
        }
        match &self.explanation {
            Some(Explanation::Generated(text)) => {
                row.insert(COL_EXPLANATION.into(), Value::String(text.clone()));
            }
            Some(Explanation::Failed(err)) => {
                row.insert(COL_EXPLANATION_ERROR.into(), Value::String(err.clone()));
                row.insert(COL_EXPLANATION.into(), Value::String(String::new()));
            }
            None => {}
        }
        row
    }
}

/// Stringify a cell the way a spreadsheet export would.
fn cell_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// RecordSet
// ---------------------------------------------------------------------------

/// The tabular collection of profiles owned by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<ProfileRecord>,
}

impl RecordSet {
    pub fn new(records: Vec<ProfileRecord>) -> Self {
        Self { records }
    }

    /// Build a record set from raw rows, rejecting batches that lack a
    /// required column. Columns are the union of keys across all rows.
    pub fn from_rows(rows: &[Map<String, Value>]) -> Result<Self> {
        let missing = missing_columns(rows);
        if !missing.is_empty() {
            return Err(ScoutError::MissingColumns { missing });
        }
        Ok(Self {
            records: rows
                .iter()
                .enumerate()
                .map(|(i, row)| ProfileRecord::from_row(i, row))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProfileRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ProfileRecord> {
        self.records
    }

    /// Keep only the records matching `keep`. Never grows the set.
    pub fn retain(mut self, keep: impl FnMut(&ProfileRecord) -> bool) -> Self {
        self.records.retain(keep);
        self
    }

    /// Apply an in-place annotation to every record. Row count is unchanged.
    pub fn annotate(mut self, mut f: impl FnMut(&mut ProfileRecord)) -> Self {
        self.records.iter_mut().for_each(&mut f);
        self
    }

    pub fn to_rows(&self) -> Vec<Map<String, Value>> {
        self.records.iter().map(ProfileRecord::to_row).collect()
    }
}

impl FromIterator<ProfileRecord> for RecordSet {
    fn from_iter<T: IntoIterator<Item = ProfileRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecordSet {
    type Item = ProfileRecord;
    type IntoIter = std::vec::IntoIter<ProfileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ProfileRecord;
    type IntoIter = std::slice::Iter<'a, ProfileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Required columns absent from every row, in canonical order.
///
/// An empty batch has no columns to check and is accepted.
pub fn missing_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }
    REQUIRED_COLUMNS
        .iter()
        .filter(|col| !rows.iter().any(|row| row.contains_key(**col)))
        .map(|col| (*col).to_string())
        .collect()
}
