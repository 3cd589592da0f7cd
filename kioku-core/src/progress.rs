//! Writing the known/unknown flag back to the remote document.
//!
//! With a remote reference the flag is written straight to that document.
//! Without one the deck is listed again and the local id is looked up in the
//! new identity table. That lookup is only as good as the identity strategy:
//! positional ids shift whenever the remote order changes, so the rediscovered
//! document may not be the one the user saw. The resolver never guesses beyond
//! that lookup and never writes when nothing resolves.

use crate::catalog::{list_deck, DeckPolicy};
use crate::store::{DocumentStore, PropertyPatch};
use crate::{CoreError, LocalId, RemoteRef, ResolvedDeck, SortDirection, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub local_id: LocalId,
    pub known: bool,
    /// Reference from the listing that produced `local_id`.
    #[serde(default)]
    pub remote_ref: Option<RemoteRef>,
    #[serde(default)]
    pub level: Option<String>,
    /// Direction of the listing, repeated when the id has to be rediscovered.
    #[serde(default)]
    pub sort: Option<SortDirection>,
}

impl ProgressRequest {
    pub fn new(local_id: LocalId, known: bool) -> Self {
        Self {
            local_id,
            known,
            remote_ref: None,
            level: None,
            sort: None,
        }
    }

    pub fn with_remote_ref(mut self, remote: RemoteRef) -> Self {
        self.remote_ref = Some(remote);
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// The caller supplied the remote reference.
    Direct,
    /// Found by listing the deck again.
    Rediscovered,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReceipt {
    pub local_id: LocalId,
    pub remote_ref: RemoteRef,
    pub known: bool,
    pub level: String,
    pub resolution: Resolution,
    pub recorded_at: DateTime<Utc>,
}

pub async fn record_progress<S: DocumentStore + ?Sized>(
    store: &S,
    deck: &ResolvedDeck,
    policy: DeckPolicy,
    page_size: u32,
    request: ProgressRequest,
) -> Result<ProgressReceipt, CoreError> {
    let unresolvable = |reason: String| CoreError::UnresolvableTarget {
        kind: deck.kind,
        level: deck.level.clone(),
        local_id: request.local_id,
        reason,
    };

    let (target, resolution) = match &request.remote_ref {
        Some(remote) => (remote.clone(), Resolution::Direct),
        None => {
            warn!(
                kind = %deck.kind,
                level = %deck.level,
                local_id = request.local_id,
                strategy = ?policy.identity,
                "no remote reference supplied, rediscovering by local id"
            );
            let direction = request.sort.unwrap_or_default();
            let listing = list_deck(store, deck, policy, direction, page_size)
                .await
                .map_err(CoreError::Fetch)?;
            if listing.cards.is_empty() {
                return Err(unresolvable("deck is empty".into()));
            }
            let Some(remote) = listing.identities.resolve(request.local_id) else {
                return Err(unresolvable(format!(
                    "id not present among {} freshly listed cards",
                    listing.cards.len()
                )));
            };
            (remote.clone(), Resolution::Rediscovered)
        }
    };

    let patch = PropertyPatch::checkbox(&deck.completion_property, request.known);
    match store.update(&target, &patch).await {
        Ok(()) => {}
        Err(StoreError::DocumentNotFound(r)) => {
            return Err(unresolvable(format!("remote document {r} not found")));
        }
        Err(e) => return Err(CoreError::Write(e)),
    }

    info!(
        kind = %deck.kind,
        level = %deck.level,
        local_id = request.local_id,
        document = %target,
        known = request.known,
        resolution = ?resolution,
        "recorded progress"
    );
    Ok(ProgressReceipt {
        local_id: request.local_id,
        remote_ref: target,
        known: request.known,
        level: deck.level.clone(),
        resolution,
        recorded_at: Utc::now(),
    })
}
