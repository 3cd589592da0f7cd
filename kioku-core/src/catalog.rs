//! The adapter surface used by the route layer.

use crate::fetcher::{fetch_all, FetchOptions};
use crate::identity::{assign, IdentityStrategy, IdentityTable};
use crate::normalizer::normalize;
use crate::progress::{record_progress, ProgressReceipt, ProgressRequest};
use crate::stats::{count_progress, ProgressStats};
use crate::store::{CheckboxFilter, DocumentStore, SortDirective, MAX_PAGE_SIZE};
use crate::{
    CardKind, CollectionRegistry, CoreError, IdentifiedCard, LocalId, ResolvedDeck, SortDirection,
    StoreError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// How one card kind is listed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckPolicy {
    /// Only list cards whose completion flag is unset.
    pub only_unknown: bool,
    /// Sort by the deck's sort property.
    pub sorted: bool,
    pub identity: IdentityStrategy,
}

impl DeckPolicy {
    pub fn fetch_options(&self, deck: &ResolvedDeck, direction: SortDirection, page_size: u32) -> FetchOptions {
        FetchOptions {
            filter: self.only_unknown.then(|| CheckboxFilter {
                property: deck.completion_property.clone(),
                equals: false,
            }),
            sort: self.sorted.then(|| SortDirective {
                property: deck.sort_property.clone(),
                direction,
            }),
            page_size,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogOptions {
    pub page_size: u32,
    pub vocabulary: DeckPolicy,
    pub grammar: DeckPolicy,
    pub expression: DeckPolicy,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        let positional = DeckPolicy {
            only_unknown: true,
            sorted: true,
            identity: IdentityStrategy::Positional,
        };
        Self {
            page_size: MAX_PAGE_SIZE,
            vocabulary: DeckPolicy {
                identity: IdentityStrategy::Hash,
                ..positional
            },
            grammar: positional,
            expression: positional,
        }
    }
}

impl CatalogOptions {
    pub fn policy(&self, kind: CardKind) -> DeckPolicy {
        match kind {
            CardKind::Vocabulary => self.vocabulary,
            CardKind::Grammar => self.grammar,
            CardKind::Expression => self.expression,
        }
    }
}

/// Cards of one deck plus the id table that belongs to them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeckListing {
    pub kind: CardKind,
    pub level: String,
    pub cards: Vec<IdentifiedCard>,
    pub identities: IdentityTable,
    pub filter_applied: bool,
    pub sort_applied: bool,
}

/// Fetch, normalize and identify one deck.
pub async fn list_deck<S: DocumentStore + ?Sized>(
    store: &S,
    deck: &ResolvedDeck,
    policy: DeckPolicy,
    direction: SortDirection,
    page_size: u32,
) -> Result<DeckListing, StoreError> {
    let options = policy.fetch_options(deck, direction, page_size);
    let fetched = fetch_all(store, &deck.collection, &options).await?;

    // Pages can overlap when the remote order shifts mid-read.
    let mut seen = HashSet::with_capacity(fetched.documents.len());
    let mut cards = Vec::with_capacity(fetched.documents.len());
    for doc in &fetched.documents {
        if !seen.insert(doc.id.clone()) {
            warn!(collection = %deck.collection, document = %doc.id, "document returned twice, keeping first");
            continue;
        }
        cards.push(normalize(doc, deck.kind, deck.variant));
    }

    let (cards, identities) = assign(cards, policy.identity);
    Ok(DeckListing {
        kind: deck.kind,
        level: deck.level.clone(),
        cards,
        identities,
        filter_applied: fetched.filter_applied,
        sort_applied: fetched.sort_applied,
    })
}

/// Remote-backed card catalog. Holds no per-request state.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    registry: CollectionRegistry,
    options: CatalogOptions,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>, registry: CollectionRegistry, options: CatalogOptions) -> Self {
        Self {
            store,
            registry,
            options,
        }
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    pub fn resolve(&self, kind: CardKind, level: Option<&str>) -> ResolvedDeck {
        self.registry.resolve(kind, level)
    }

    pub async fn list_cards(
        &self,
        kind: CardKind,
        level: Option<&str>,
        direction: SortDirection,
    ) -> Result<DeckListing, CoreError> {
        let deck = self.resolve(kind, level);
        list_deck(
            &*self.store,
            &deck,
            self.options.policy(kind),
            direction,
            self.options.page_size,
        )
        .await
        .map_err(CoreError::Fetch)
    }

    /// Looks up one card of a fresh listing. Positional ids are only as stable
    /// as the listing order.
    pub async fn get_card(
        &self,
        kind: CardKind,
        level: Option<&str>,
        local_id: LocalId,
        direction: SortDirection,
    ) -> Result<IdentifiedCard, CoreError> {
        let listing = self.list_cards(kind, level, direction).await?;
        let total = listing.cards.len();
        listing
            .cards
            .into_iter()
            .find(|c| c.id == local_id)
            .ok_or_else(|| CoreError::UnresolvableTarget {
                kind,
                level: listing.level,
                local_id,
                reason: format!("id not present among {total} listed cards"),
            })
    }

    pub async fn record_progress(
        &self,
        kind: CardKind,
        request: ProgressRequest,
    ) -> Result<ProgressReceipt, CoreError> {
        let deck = self.resolve(kind, request.level.as_deref());
        record_progress(
            &*self.store,
            &deck,
            self.options.policy(kind),
            self.options.page_size,
            request,
        )
        .await
    }

    pub async fn progress_stats(&self, kind: CardKind, level: Option<&str>) -> Result<ProgressStats, CoreError> {
        let deck = self.resolve(kind, level);
        count_progress(&*self.store, &deck, self.options.page_size)
            .await
            .map_err(CoreError::Fetch)
    }
}
