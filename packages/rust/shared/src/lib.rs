//! Shared types, error model, and configuration for LeadScout.
//!
//! This crate is the foundation depended on by all other LeadScout crates.
//! It provides:
//! - [`LeadScoutError`] — the unified error type
//! - Domain types ([`Company`], [`Contact`], [`CompanyStatus`], [`Department`],
//!   [`SearchResult`], [`QuerySpec`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ModelConfig, SearchBackendConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_api_keys,
};
pub use error::{LeadScoutError, Result};
pub use types::{
    CandidateContact, Company, CompanyId, CompanyProfile, CompanyStatus, Contact, ContactId,
    Department, QuerySpec, SearchResult,
};
