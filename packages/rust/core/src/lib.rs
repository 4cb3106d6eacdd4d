//! Pipeline orchestration and the model-backed collaborators for SpeakerScout.
//!
//! Ties the filter and matching stages together into one run, with keyword
//! extraction and per-profile explanations behind traits so offline and
//! OpenRouter-backed implementations are interchangeable.

pub mod explain;
pub mod keywords;
pub mod openrouter;
pub mod pipeline;
pub mod ranking;

pub use explain::{
    CachedExplainer, Explainer, ExplanationRequest, OpenRouterExplainer, TemplateExplainer,
};
pub use keywords::{
    HeuristicKeywordExtractor, KeywordExtractor, KeywordSource, OpenRouterKeywordExtractor,
    StaticKeywords,
};
pub use openrouter::OpenRouterClient;
pub use pipeline::{
    Pipeline, ProgressReporter, RunOutcome, RunReport, SilentProgress, StageReport,
};
pub use ranking::{RankedProfile, RankingOptions, rank, score, top_quartile};
