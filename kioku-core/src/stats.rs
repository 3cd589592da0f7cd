use crate::fetcher::{fetch_all, FetchOptions};
use crate::store::DocumentStore;
use crate::{RemoteDocument, ResolvedDeck, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressStats {
    pub known: u32,
    pub unknown: u32,
}

impl ProgressStats {
    pub fn record(&mut self, known: bool) {
        if known {
            self.known += 1;
        } else {
            self.unknown += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.known + self.unknown
    }

    pub fn known_ratio(&self) -> f32 {
        if self.total() == 0 {
            0.0
        } else {
            self.known as f32 / self.total() as f32
        }
    }
}

/// Counts each document once, even if overlapping pages returned it twice.
pub fn tally(documents: &[RemoteDocument], completion_property: &str) -> ProgressStats {
    let mut stats = ProgressStats::default();
    let mut seen = HashSet::with_capacity(documents.len());
    for d in documents {
        if !seen.insert(&d.id) {
            warn!(document = %d.id, "document returned twice, counting once");
            continue;
        }
        stats.record(d.flag(completion_property));
    }
    stats
}

/// Reads the whole collection, unfiltered and unsorted. No caching.
pub async fn count_progress<S: DocumentStore + ?Sized>(
    store: &S,
    deck: &ResolvedDeck,
    page_size: u32,
) -> Result<ProgressStats, StoreError> {
    let fetched = fetch_all(store, &deck.collection, &FetchOptions::unfiltered(page_size)).await?;
    let stats = tally(&fetched.documents, &deck.completion_property);
    info!(kind = %deck.kind, level = %deck.level, known = stats.known, unknown = stats.unknown, "counted progress");
    Ok(stats)
}
