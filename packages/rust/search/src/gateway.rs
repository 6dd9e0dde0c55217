//! Primary/secondary fallback over a query batch.
//!
//! Policy: run the primary backend and accept its output if at least one
//! query in the batch returned a result; otherwise run the secondary backend
//! and return its output unconditionally, even if it is also empty. Provider
//! errors are absorbed as "no results" — callers never see them.

use tracing::{info, instrument, warn};

use leadscout_shared::QuerySpec;

use crate::providers::{ResultsByQuery, SearchProvider, total_results};

/// Two-backend search gateway with empty-primary fallback.
pub struct SearchGateway {
    primary: Box<dyn SearchProvider>,
    secondary: Box<dyn SearchProvider>,
}

impl SearchGateway {
    pub fn new(primary: Box<dyn SearchProvider>, secondary: Box<dyn SearchProvider>) -> Self {
        Self { primary, secondary }
    }

    /// Execute a query batch with fallback.
    #[instrument(skip_all, fields(queries = specs.len()))]
    pub async fn search_batch(&self, specs: &[QuerySpec]) -> ResultsByQuery {
        if specs.is_empty() {
            return Vec::new();
        }

        let primary_batch = self.run_provider(self.primary.as_ref(), specs).await;
        if total_results(&primary_batch) > 0 {
            info!(
                provider = self.primary.name(),
                results = total_results(&primary_batch),
                "primary backend returned results"
            );
            return primary_batch;
        }

        info!(
            primary = self.primary.name(),
            secondary = self.secondary.name(),
            "primary backend empty, falling back"
        );
        self.run_provider(self.secondary.as_ref(), specs).await
    }

    /// Run one provider, treating an error as an all-empty batch.
    async fn run_provider(
        &self,
        provider: &dyn SearchProvider,
        specs: &[QuerySpec],
    ) -> ResultsByQuery {
        match provider.search_batch(specs).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "provider failed, treating as empty");
                specs.iter().map(|s| (s.query.clone(), Vec::new())).collect()
            }
        }
    }
}
