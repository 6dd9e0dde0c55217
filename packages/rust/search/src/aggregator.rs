//! Result aggregation: merge, deduplicate, rank.
//!
//! Deduplication has two passes over a single forward scan:
//! 1. exact match on the normalized link (lowercased, trailing slash
//!    stripped) drops the later occurrence;
//! 2. near-duplicate titles (lowercased containment in either direction
//!    against any previously kept title) keep whichever instance has the
//!    longer snippet.
//!
//! Seen titles are tracked in first-seen order, so collisions resolve
//! deterministically. Ranking sits behind [`RankStrategy`] and never touches
//! the deduplication pass.

use tracing::{debug, warn};

use leadscout_shared::SearchResult;

use crate::providers::ResultsByQuery;

// ---------------------------------------------------------------------------
// Ranking strategy
// ---------------------------------------------------------------------------

/// Pluggable ordering applied after deduplication.
pub trait RankStrategy: Send + Sync {
    fn rank(&self, results: Vec<SearchResult>) -> Vec<SearchResult>;
}

/// Keep first-provider-first insertion order (stable default).
pub struct InsertionOrder;

impl RankStrategy for InsertionOrder {
    fn rank(&self, results: Vec<SearchResult>) -> Vec<SearchResult> {
        results
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Merges raw per-query results into one deduplicated, ordered list.
pub struct ResultAggregator {
    ranker: Box<dyn RankStrategy>,
}

impl ResultAggregator {
    /// Aggregator with the default insertion-order ranking.
    pub fn new() -> Self {
        Self {
            ranker: Box::new(InsertionOrder),
        }
    }

    /// Aggregator with a custom ranking strategy.
    pub fn with_ranker(ranker: Box<dyn RankStrategy>) -> Self {
        Self { ranker }
    }

    /// Flatten a batch in iteration order, deduplicate, and rank.
    pub fn aggregate(&self, batch: &ResultsByQuery) -> Vec<SearchResult> {
        let flattened: Vec<SearchResult> = batch
            .iter()
            .flat_map(|(_, results)| results.iter().cloned())
            .collect();

        let before = flattened.len();
        let deduplicated = deduplicate(flattened);
        debug!(
            before,
            after = deduplicated.len(),
            "aggregated search results"
        );

        self.ranker.rank(deduplicated)
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

/// Normalize a link for exact-match dedup.
fn normalize_link(link: &str) -> String {
    link.to_lowercase().trim_end_matches('/').to_string()
}

fn deduplicate(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen_links: Vec<String> = Vec::new();
    // First-seen order; resolves replace-vs-skip deterministically.
    let mut seen_titles: Vec<String> = Vec::new();
    let mut kept: Vec<SearchResult> = Vec::new();

    'outer: for result in results {
        let link = normalize_link(&result.link);
        if seen_links.contains(&link) {
            continue;
        }

        let title_lower = result.title.to_lowercase();
        for seen_idx in 0..seen_titles.len() {
            let seen_title = &seen_titles[seen_idx];
            if !title_lower.contains(seen_title.as_str())
                && !seen_title.contains(title_lower.as_str())
            {
                continue;
            }

            // Titles collide: keep whichever record has the longer snippet.
            match kept
                .iter()
                .position(|r| r.title.to_lowercase() == *seen_title)
            {
                Some(existing_idx) => {
                    if result.snippet.len() > kept[existing_idx].snippet.len() {
                        kept.remove(existing_idx);
                        seen_titles.remove(seen_idx);
                        seen_titles.push(title_lower);
                        seen_links.push(link);
                        kept.push(result);
                    }
                    continue 'outer;
                }
                None => {
                    // Bookkeeping says the title was seen but no kept record
                    // matches; log and treat as not-a-duplicate.
                    warn!(
                        seen_title = %seen_title,
                        current_title = %title_lower,
                        "title marked seen without a kept record, keeping current result"
                    );
                    break;
                }
            }
        }

        seen_links.push(link);
        seen_titles.push(title_lower);
        kept.push(result);
    }

    kept
}
