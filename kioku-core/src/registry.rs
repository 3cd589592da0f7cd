//! Static mapping from (card kind, level) to a remote collection.

use crate::{CardKind, CollectionRef, CoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_COMPLETION_PROPERTY: &str = "암기";
pub const DEFAULT_SORT_PROPERTY: &str = "Random";

/// Field layout family of a collection. Selects the normalizer rule table.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    #[default]
    Standard,
    /// Character-practice decks (kana): headword stored per character.
    Script,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionEntry {
    pub collection: CollectionRef,
    #[serde(default)]
    pub variant: SchemaVariant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_property: Option<String>,
}

impl CollectionEntry {
    pub fn new(collection: impl Into<String>, variant: SchemaVariant) -> Self {
        Self {
            collection: CollectionRef::new(collection),
            variant,
            completion_property: None,
            sort_property: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindConfig {
    pub default_level: String,
    pub levels: BTreeMap<String, CollectionEntry>,
}

fn default_completion_property() -> String {
    DEFAULT_COMPLETION_PROPERTY.to_string()
}

fn default_sort_property() -> String {
    DEFAULT_SORT_PROPERTY.to_string()
}

/// On-disk form of the registry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    #[serde(default = "default_completion_property")]
    pub completion_property: String,
    #[serde(default = "default_sort_property")]
    pub sort_property: String,
    pub vocabulary: KindConfig,
    pub grammar: KindConfig,
    pub expression: KindConfig,
}

impl RegistryConfig {
    /// Deck table of the hosted workspace.
    pub fn builtin() -> Self {
        let standard = SchemaVariant::Standard;
        let vocabulary = KindConfig {
            default_level: "N2".into(),
            levels: BTreeMap::from([
                ("N1".into(), CollectionEntry::new("216fe404b3dc80e49e28d68b149ce1bd", standard)),
                ("N2".into(), CollectionEntry::new("213fe404b3dc802e8b1bd26d77f8cc84", standard)),
                ("N3".into(), CollectionEntry::new("216fe404b3dc804a9130f21b2b3a0e54", standard)),
                ("N4".into(), CollectionEntry::new("215fe404b3dc8099b972e96296fc14af", standard)),
                (
                    "Hiragana/Katakana".into(),
                    CollectionEntry::new("215fe404b3dc8040bac6f54c99a949a8", SchemaVariant::Script),
                ),
            ]),
        };
        let grammar = KindConfig {
            default_level: "N2".into(),
            levels: BTreeMap::from([
                ("N1".into(), CollectionEntry::new("228fe404b3dc80dc9694fbf032d6491f", standard)),
                ("N2".into(), CollectionEntry::new("227fe404b3dc8040946ce0921f4d9550", standard)),
            ]),
        };
        let expression = KindConfig {
            default_level: "all".into(),
            levels: BTreeMap::from([(
                "all".into(),
                CollectionEntry::new("228fe404b3dc803786b5fea02dcf9913", standard),
            )]),
        };
        Self {
            completion_property: default_completion_property(),
            sort_property: default_sort_property(),
            vocabulary,
            grammar,
            expression,
        }
    }

    pub fn from_json(s: &str) -> Result<Self, CoreError> {
        serde_json::from_str(s).map_err(|e| CoreError::Config(format!("registry: {e}")))
    }

    pub fn kind(&self, kind: CardKind) -> &KindConfig {
        match kind {
            CardKind::Vocabulary => &self.vocabulary,
            CardKind::Grammar => &self.grammar,
            CardKind::Expression => &self.expression,
        }
    }
}

/// Everything needed to read and write one deck.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDeck {
    pub kind: CardKind,
    /// Level actually used, spelled as configured.
    pub level: String,
    pub collection: CollectionRef,
    pub variant: SchemaVariant,
    pub completion_property: String,
    pub sort_property: String,
    /// True when the requested level was unknown and the default was used.
    pub fell_back: bool,
}

#[derive(Clone, Debug)]
struct KindDecks {
    default_level: String,
    levels: Vec<(String, CollectionEntry)>,
}

impl KindDecks {
    fn find(&self, level: &str) -> Option<&(String, CollectionEntry)> {
        let level = level.trim();
        self.levels.iter().find(|(name, _)| name.eq_ignore_ascii_case(level))
    }
}

/// Immutable registry built once at startup.
#[derive(Clone, Debug)]
pub struct CollectionRegistry {
    completion_property: String,
    sort_property: String,
    kinds: [KindDecks; 3],
}

impl CollectionRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, CoreError> {
        let build = |kind: CardKind| -> Result<KindDecks, CoreError> {
            let kc = config.kind(kind);
            if kc.levels.is_empty() {
                return Err(CoreError::Config(format!("no {kind} levels configured")));
            }
            if let Some((level, _)) = kc.levels.iter().find(|(_, e)| e.collection.as_str().trim().is_empty()) {
                return Err(CoreError::Config(format!("{kind} level {level} has an empty collection id")));
            }
            let decks = KindDecks {
                default_level: kc.default_level.clone(),
                levels: kc.levels.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            };
            if decks.find(&kc.default_level).is_none() {
                return Err(CoreError::Config(format!(
                    "default {kind} level {} is not configured",
                    kc.default_level
                )));
            }
            Ok(decks)
        };
        Ok(Self {
            kinds: [
                build(CardKind::Vocabulary)?,
                build(CardKind::Grammar)?,
                build(CardKind::Expression)?,
            ],
            completion_property: config.completion_property,
            sort_property: config.sort_property,
        })
    }

    pub fn builtin() -> Self {
        Self::new(RegistryConfig::builtin()).expect("builtin registry is valid")
    }

    fn decks(&self, kind: CardKind) -> &KindDecks {
        match kind {
            CardKind::Vocabulary => &self.kinds[0],
            CardKind::Grammar => &self.kinds[1],
            CardKind::Expression => &self.kinds[2],
        }
    }

    pub fn default_level(&self, kind: CardKind) -> &str {
        &self.decks(kind).default_level
    }

    pub fn levels(&self, kind: CardKind) -> Vec<&str> {
        self.decks(kind).levels.iter().map(|(l, _)| l.as_str()).collect()
    }

    /// Never fails: an unknown or absent level resolves to the kind's default deck.
    pub fn resolve(&self, kind: CardKind, level: Option<&str>) -> ResolvedDeck {
        let decks = self.decks(kind);
        let requested = level.map(str::trim).filter(|l| !l.is_empty());
        let (hit, fell_back) = match requested.and_then(|l| decks.find(l)) {
            Some(hit) => (hit, false),
            None => {
                if let Some(l) = requested {
                    debug!(%kind, level = l, default = %decks.default_level, "unknown level, using default deck");
                }
                let hit = decks
                    .find(&decks.default_level)
                    .unwrap_or(&decks.levels[0]);
                (hit, requested.is_some())
            }
        };
        let (level, entry) = hit;
        ResolvedDeck {
            kind,
            level: level.clone(),
            collection: entry.collection.clone(),
            variant: entry.variant,
            completion_property: entry
                .completion_property
                .clone()
                .unwrap_or_else(|| self.completion_property.clone()),
            sort_property: entry
                .sort_property
                .clone()
                .unwrap_or_else(|| self.sort_property.clone()),
            fell_back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_levels_case_insensitively() {
        let reg = CollectionRegistry::builtin();
        let deck = reg.resolve(CardKind::Vocabulary, Some("n3"));
        assert_eq!(deck.level, "N3");
        assert_eq!(deck.collection.as_str(), "216fe404b3dc804a9130f21b2b3a0e54");
        assert!(!deck.fell_back);

        let kana = reg.resolve(CardKind::Vocabulary, Some("hiragana/katakana"));
        assert_eq!(kana.variant, SchemaVariant::Script);
        assert_eq!(kana.completion_property, DEFAULT_COMPLETION_PROPERTY);
    }

    #[test]
    fn unknown_level_falls_back_to_default() {
        let reg = CollectionRegistry::builtin();
        let deck = reg.resolve(CardKind::Grammar, Some("N5"));
        assert_eq!(deck.level, "N2");
        assert!(deck.fell_back);

        let deck = reg.resolve(CardKind::Grammar, None);
        assert_eq!(deck.level, "N2");
        assert!(!deck.fell_back);
    }

    #[test]
    fn entry_overrides_property_names() {
        let mut cfg = RegistryConfig::builtin();
        let entry = cfg.expression.levels.get_mut("all").unwrap();
        entry.sort_property = Some("Order".into());
        let reg = CollectionRegistry::new(cfg).unwrap();
        let deck = reg.resolve(CardKind::Expression, Some("all"));
        assert_eq!(deck.sort_property, "Order");
        assert_eq!(deck.completion_property, "암기");
    }

    #[test]
    fn rejects_missing_default_level() {
        let mut cfg = RegistryConfig::builtin();
        cfg.grammar.default_level = "N9".into();
        assert!(matches!(CollectionRegistry::new(cfg), Err(CoreError::Config(_))));
    }

    #[test]
    fn parses_json_with_defaults() {
        let cfg = RegistryConfig::from_json(
            r#"{
              "vocabulary": { "default_level": "N5", "levels": { "N5": { "collection": "v5" } } },
              "grammar": { "default_level": "N5", "levels": { "N5": { "collection": "g5" } } },
              "expression": { "default_level": "all", "levels": { "all": { "collection": "e" } } }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.completion_property, "암기");
        assert_eq!(cfg.vocabulary.levels["N5"].variant, SchemaVariant::Standard);
        let reg = CollectionRegistry::new(cfg).unwrap();
        assert_eq!(reg.levels(CardKind::Expression), vec!["all"]);
    }
}
