//! Keyword matching for SpeakerScout.
//!
//! A [`MatchingPolicy`] decides, per record, whether the keyword vocabulary
//! is present strongly enough to retain it. [`KeywordStage`] applies the
//! policy chosen at construction time as a pipeline stage.

pub mod classified;
pub mod legacy;
pub mod policy;
pub mod tokenize;

pub use classified::ClassifiedPolicy;
pub use legacy::LegacyPolicy;
pub use policy::{KeywordStage, MatchingPolicy, policy_for};
pub use tokenize::{count_matches, token_set};
