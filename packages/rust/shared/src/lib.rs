//! Shared types, error model, and configuration for SpeakerScout.
//!
//! This crate is the foundation depended on by all other SpeakerScout crates.
//! It provides:
//! - [`ScoutError`], the unified error type
//! - Domain types ([`ProfileRecord`], [`RecordSet`], [`CompanyCategory`],
//!   [`CriteriaResult`], [`ClassifiedKeywords`])
//! - The [`Stage`] contract every filter implements
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod stage;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ExplanationFailurePolicy, KeywordMode, LocationConfig,
    OpenRouterConfig, PipelineConfig, ReferenceColumns, ReferenceConfig, config_dir,
    config_file_path, expand_home, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{Result, ScoutError};
pub use stage::{Stage, StageKind};
pub use types::{
    CLASS_A_LIMIT, ClassifiedKeywords, CompanyCategory, CriteriaResult, Explanation, KeywordMatch,
    ProfileRecord, REQUIRED_COLUMNS, RecordSet, missing_columns,
};
