use kioku_core::{CardKind, DeckListing, IdentifiedCard, ProgressStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Default)]
pub struct CardsQuery {
    pub level: Option<String>,
    pub sort: Option<String>,
}

/// Single-card lookup repeats the listing's level and direction.
#[derive(Debug, Deserialize, Default)]
pub struct CardQuery {
    pub level: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StatsQuery {
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardsOut {
    pub kind: CardKind,
    pub level: String,
    pub cards: Vec<IdentifiedCard>,
    pub filter_applied: bool,
    pub sort_applied: bool,
}

impl From<DeckListing> for CardsOut {
    fn from(l: DeckListing) -> Self {
        Self {
            kind: l.kind,
            level: l.level,
            cards: l.cards,
            filter_applied: l.filter_applied,
            sort_applied: l.sort_applied,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOut {
    pub kind: CardKind,
    pub level: String,
    pub known: u32,
    pub unknown: u32,
    pub total: u32,
    pub known_ratio: f32,
}

impl StatsOut {
    pub fn new(kind: CardKind, level: String, s: ProgressStats) -> Self {
        Self {
            kind,
            level,
            known: s.known,
            unknown: s.unknown,
            total: s.total(),
            known_ratio: s.known_ratio(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckOut {
    pub kind: CardKind,
    pub default_level: String,
    pub levels: Vec<String>,
}
