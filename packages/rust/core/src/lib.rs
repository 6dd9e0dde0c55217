//! LeadScout core: the discovery orchestrator.
//!
//! Wires the search gateway, result aggregator, extraction engine, and store
//! into the idempotent company → contacts discovery pipeline.

pub mod discovery;

pub use discovery::{DiscoverRequest, DiscoveryOutcome, DiscoveryService};
