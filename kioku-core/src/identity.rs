//! Local ids for fetched cards.
//!
//! Hash ids come from the opaque remote id and survive reordering. Positional
//! ids are 1-based positions in one listing: the same id can name a different
//! document in the next listing, so writes keyed by a positional id alone are
//! best-effort. Pair them with the remote reference from the same listing.

use crate::{IdentifiedCard, LocalId, RemoteRef, UnifiedCard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    #[default]
    Hash,
    Positional,
}

/// Local id to remote reference, valid for the listing that produced it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityTable {
    strategy: IdentityStrategy,
    entries: BTreeMap<LocalId, RemoteRef>,
}

impl IdentityTable {
    pub fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    pub fn resolve(&self, id: LocalId) -> Option<&RemoteRef> {
        self.entries.get(&id)
    }

    pub fn local_id_of(&self, remote: &RemoteRef) -> Option<LocalId> {
        self.entries.iter().find(|(_, r)| *r == remote).map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocalId, &RemoteRef)> {
        self.entries.iter().map(|(id, r)| (*id, r))
    }
}

/// Id derived from the last eight hex digits of a dashed or plain hex id.
/// Other ids hash with 32-bit FNV-1a.
pub fn hash_remote_id(remote: &RemoteRef) -> LocalId {
    let compact: String = remote.as_str().chars().filter(|c| *c != '-').collect();
    let tail = compact
        .char_indices()
        .rev()
        .nth(7)
        .map(|(i, _)| &compact[i..])
        .filter(|t| t.chars().all(|c| c.is_ascii_hexdigit()));
    match tail.and_then(|t| u32::from_str_radix(t, 16).ok()) {
        Some(v) => v,
        None => fnv1a(remote.as_str().as_bytes()),
    }
}

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for b in bytes {
        h ^= u32::from(*b);
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}

pub fn assign(cards: Vec<UnifiedCard>, strategy: IdentityStrategy) -> (Vec<IdentifiedCard>, IdentityTable) {
    let ids: Vec<LocalId> = match strategy {
        IdentityStrategy::Positional => (1..=cards.len() as LocalId).collect(),
        IdentityStrategy::Hash => hashed_ids(&cards),
    };
    let mut entries = BTreeMap::new();
    let identified = cards
        .into_iter()
        .zip(ids)
        .map(|(card, id)| {
            entries.insert(id, card.remote_ref().clone());
            IdentifiedCard { id, card }
        })
        .collect();
    (identified, IdentityTable { strategy, entries })
}

/// Collisions probe upward. Cards are visited in remote-reference order so
/// the outcome does not depend on listing order.
fn hashed_ids(cards: &[UnifiedCard]) -> Vec<LocalId> {
    let mut order: Vec<usize> = (0..cards.len()).collect();
    order.sort_by(|a, b| cards[*a].remote_ref().cmp(cards[*b].remote_ref()));

    let mut used = HashSet::with_capacity(cards.len());
    let mut ids = vec![0; cards.len()];
    for i in order {
        let mut id = hash_remote_id(cards[i].remote_ref());
        while id == 0 || !used.insert(id) {
            id = id.wrapping_add(1);
        }
        ids[i] = id;
    }
    ids
}
