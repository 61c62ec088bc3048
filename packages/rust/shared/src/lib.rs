//! Shared types, error model, and configuration for ArticleSmith.
//!
//! This crate is the foundation depended on by all other ArticleSmith crates.
//! It provides:
//! - [`ArticleSmithError`] — the unified error type
//! - Domain types ([`PersonaRecord`], [`KeywordRecord`], [`ArticleRecord`], [`CategoryId`])
//! - Configuration ([`AppConfig`], runtime configs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BatchConfig, BatchSettings, CONFIG_FILE_NAME, ModelConfig, ModelSettings,
    PathsConfig, PublisherConfig, PublisherSettings, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_config,
};
pub use error::{ArticleSmithError, Result};
pub use types::{
    ArticleRecord, ArticleStatus, ArticleUpdate, CatalogEntry, CategoryId, KeywordRecord,
    MatchedTask, PersonaRecord,
};
