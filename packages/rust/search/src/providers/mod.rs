//! Search backend trait and built-in providers.
//!
//! Backends are interchangeable variants behind [`SearchProvider`]; the rest
//! of the pipeline depends only on this trait. Providers absorb their own
//! transport failures: a failed request surfaces as empty result lists, never
//! as an error the pipeline has to branch on.

mod google;
mod serper;

use async_trait::async_trait;

use leadscout_shared::{QuerySpec, Result, SearchResult};

pub use google::GoogleSearchProvider;
pub use serper::SerperProvider;

/// Results for a query batch, in submitted-query order.
///
/// Keys are the query texts (the generators guarantee uniqueness within a
/// batch), kept as an ordered list so downstream aggregation is deterministic.
pub type ResultsByQuery = Vec<(String, Vec<SearchResult>)>;

/// A search backend able to execute a batch of queries.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Execute a query batch, returning one entry per submitted query, in
    /// submitted order. Per-query failures yield empty lists.
    async fn search_batch(&self, specs: &[QuerySpec]) -> Result<ResultsByQuery>;

    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;
}

/// Total number of results in a batch, across all queries.
pub(crate) fn total_results(batch: &ResultsByQuery) -> usize {
    batch.iter().map(|(_, results)| results.len()).sum()
}
