//! Search side of the LeadScout pipeline.
//!
//! This crate covers everything between "we have a company name" and "we have
//! a clean, ordered list of search results":
//! - [`locale`] — country → search locale parameter lookup
//! - [`strategy`] — query generation for company, contact, and domain-scoped
//!   email discovery
//! - [`providers`] — the [`SearchProvider`] trait with Serper and Google
//!   Custom Search backends
//! - [`gateway`] — primary/secondary fallback over a query batch
//! - [`aggregator`] — merge, deduplicate, and rank raw results

pub mod aggregator;
pub mod gateway;
pub mod locale;
pub mod providers;
pub mod strategy;

pub use aggregator::{InsertionOrder, RankStrategy, ResultAggregator};
pub use gateway::SearchGateway;
pub use locale::LocaleParams;
pub use providers::{GoogleSearchProvider, ResultsByQuery, SearchProvider, SerperProvider};
pub use strategy::QueryStrategy;
