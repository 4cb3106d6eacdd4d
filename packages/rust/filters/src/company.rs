//! Company reference tables, exclusion, and category assignment.

use std::collections::HashSet;
use std::sync::Arc;

use speakerscout_shared::{CompanyCategory, RecordSet, Stage, StageKind};
use tracing::debug;

/// The three externally supplied company lookup sets.
///
/// Exclusion names are matched exactly; category names are matched
/// case-insensitively. Empty entries are ignored.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    excluded: HashSet<String>,
    category_a: HashSet<String>,
    category_b: HashSet<String>,
}

impl ReferenceTables {
    pub fn new<E, A, B>(excluded: E, category_a: A, category_b: B) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            excluded: excluded
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
            category_a: lowered(category_a),
            category_b: lowered(category_b),
        }
    }

    /// Exact, case-sensitive membership in the excluded-company table.
    pub fn is_excluded(&self, company_name: &str) -> bool {
        self.excluded.contains(company_name)
    }

    /// Category A first, then B, otherwise C.
    pub fn categorize(&self, company_name: &str) -> CompanyCategory {
        let name = company_name.to_lowercase();
        if self.category_a.contains(&name) {
            CompanyCategory::A
        } else if self.category_b.contains(&name) {
            CompanyCategory::B
        } else {
            CompanyCategory::C
        }
    }

    pub fn excluded_len(&self) -> usize {
        self.excluded.len()
    }

    pub fn category_lens(&self) -> (usize, usize) {
        (self.category_a.len(), self.category_b.len())
    }
}

fn lowered<I>(names: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Drops records whose company name is in the excluded-company table.
#[derive(Debug, Clone)]
pub struct CompanyExclusion {
    tables: Arc<ReferenceTables>,
}

impl CompanyExclusion {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        Self { tables }
    }
}

impl Stage for CompanyExclusion {
    fn kind(&self) -> StageKind {
        StageKind::CompanyExclusion
    }

    fn apply(&self, records: RecordSet) -> RecordSet {
        records.retain(|r| {
            let excluded = self.tables.is_excluded(&r.company_name);
            if excluded {
                debug!(index = r.index, company = %r.company_name, "company excluded");
            }
            !excluded
        })
    }
}

/// Annotates every record with its company category. Never drops a record.
#[derive(Debug, Clone)]
pub struct CompanyCategoryAssignment {
    tables: Arc<ReferenceTables>,
}

impl CompanyCategoryAssignment {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        Self { tables }
    }
}

impl Stage for CompanyCategoryAssignment {
    fn kind(&self) -> StageKind {
        StageKind::CompanyCategory
    }

    fn apply(&self, records: RecordSet) -> RecordSet {
        records.annotate(|r| {
            let category = self.tables.categorize(&r.company_name);
            r.assign_category(category);
        })
    }
}
