//! Shared types, error model, and configuration for nbshelf.
//!
//! This crate is the foundation depended on by all other nbshelf crates.
//! It provides:
//! - [`NbshelfError`]: the unified error type
//! - Domain types ([`NotebookRecord`], [`Library`], [`DiscoveredNotebook`])
//! - Slug derivation ([`slugify_title`])
//! - Configuration ([`AppConfig`], [`DiscoveryConfig`], config loading)

pub mod config;
pub mod error;
pub mod slug;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrowserConfig, DiscoveryConfig, ENRICH_QUESTION, EnrichConfig, TitleConfig,
    config_dir, config_file_path, init_config, library_path, load_config, load_config_from,
};
pub use error::{NbshelfError, Result};
pub use slug::slugify_title;
pub use types::{DiscoveredNotebook, Library, NotebookRecord, Timestamp};
