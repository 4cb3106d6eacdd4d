//! Rule-based stage filters for SpeakerScout.
//!
//! Every filter implements [`speakerscout_shared::Stage`]: it takes the
//! current [`RecordSet`](speakerscout_shared::RecordSet) by value and returns
//! a narrowed or annotated one. Static word lists live in [`lexicon`].

pub mod company;
pub mod elimination;
pub mod language;
pub mod lexicon;
pub mod location;
pub mod seniority;

pub use company::{CompanyCategoryAssignment, CompanyExclusion, ReferenceTables};
pub use elimination::{SummaryElimination, TitleElimination};
pub use language::{ENGLISH, LanguageDetector, LanguageFilter, WhatlangDetector};
pub use location::LocationFilter;
pub use seniority::SeniorityFilter;
