//! Structured extraction: turn aggregated search results into typed company
//! profiles and contact candidates via a language model.
//!
//! The engine prefers a schema-constrained model call that returns an
//! already-typed value; on any failure it degrades to a free-text call
//! followed by the JSON recovery parser in [`recovery`]. Outcomes are tagged
//! ([`Extraction`]) so callers can tell "typed path worked" from "salvaged
//! from text" from "nothing found".

pub mod client;
pub mod engine;
pub mod prompts;
pub mod recovery;

pub use client::{ModelClient, OpenRouterClient};
pub use engine::{Extraction, ExtractionEngine, is_generic_mailbox};
pub use recovery::recover_json;
