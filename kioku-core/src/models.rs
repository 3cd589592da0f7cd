use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process-assigned identifier of a card within one listing.
pub type LocalId = u32;

pub const APPLICATION_COUNT: usize = 5;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Vocabulary,
    Grammar,
    Expression,
}

impl CardKind {
    pub const ALL: [CardKind; 3] = [CardKind::Vocabulary, CardKind::Grammar, CardKind::Expression];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Vocabulary => "vocabulary",
            CardKind::Grammar => "grammar",
            CardKind::Expression => "expression",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vocabulary" | "vocab" | "word" | "words" | "flashcards" => Ok(CardKind::Vocabulary),
            "grammar" => Ok(CardKind::Grammar),
            "expression" | "expressions" => Ok(CardKind::Expression),
            other => Err(format!("unknown card kind: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Opaque identifier of a document in the remote store.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RemoteRef(String);

impl RemoteRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RemoteRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a remote collection (one database per deck).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CollectionRef(String);

impl CollectionRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where an image or audio attachment lives.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "hosting", rename_all = "snake_case")]
pub enum MediaLink {
    /// A link to a file hosted somewhere else.
    External { url: String },
    /// A file uploaded to the remote store. Its URL is signed and expires.
    Hosted {
        url: String,
        #[serde(default, rename = "expiresAt")]
        expires_at: Option<DateTime<Utc>>,
    },
}

impl MediaLink {
    pub fn url(&self) -> &str {
        match self {
            MediaLink::External { url } | MediaLink::Hosted { url, .. } => url,
        }
    }

    pub fn is_hosted(&self) -> bool {
        matches!(self, MediaLink::Hosted { .. })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyCard {
    pub headword: String,
    pub pronunciation: String,
    pub translation: String,
    pub example_sentence: String,
    pub example_translation: String,
    pub image: Option<MediaLink>,
    pub word_audio: Option<MediaLink>,
    pub pronunciation_audio: Option<MediaLink>,
    pub remote_ref: RemoteRef,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrammarCard {
    /// Sentence with the pattern blanked out.
    pub problem_sentence: String,
    pub example_sentence: String,
    pub example_translation: String,
    pub pattern: String,
    pub meaning: String,
    pub audio: Option<MediaLink>,
    pub remote_ref: RemoteRef,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationPair {
    pub phrase: String,
    pub gloss: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionCard {
    pub expression: String,
    pub meaning: String,
    pub applications: [ApplicationPair; APPLICATION_COUNT],
    pub remote_ref: RemoteRef,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UnifiedCard {
    Vocabulary(VocabularyCard),
    Grammar(GrammarCard),
    Expression(ExpressionCard),
}

impl UnifiedCard {
    pub fn kind(&self) -> CardKind {
        match self {
            UnifiedCard::Vocabulary(_) => CardKind::Vocabulary,
            UnifiedCard::Grammar(_) => CardKind::Grammar,
            UnifiedCard::Expression(_) => CardKind::Expression,
        }
    }

    pub fn remote_ref(&self) -> &RemoteRef {
        match self {
            UnifiedCard::Vocabulary(c) => &c.remote_ref,
            UnifiedCard::Grammar(c) => &c.remote_ref,
            UnifiedCard::Expression(c) => &c.remote_ref,
        }
    }

    /// Front-of-card text, used for logs and listings.
    pub fn prompt(&self) -> &str {
        match self {
            UnifiedCard::Vocabulary(c) => &c.headword,
            UnifiedCard::Grammar(c) => &c.pattern,
            UnifiedCard::Expression(c) => &c.expression,
        }
    }

    /// Back-of-card gloss.
    pub fn answer(&self) -> &str {
        match self {
            UnifiedCard::Vocabulary(c) => &c.translation,
            UnifiedCard::Grammar(c) => &c.meaning,
            UnifiedCard::Expression(c) => &c.meaning,
        }
    }
}

/// A unified card with the local id assigned for one listing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifiedCard {
    pub id: LocalId,
    #[serde(flatten)]
    pub card: UnifiedCard,
}

impl IdentifiedCard {
    pub fn remote_ref(&self) -> &RemoteRef {
        self.card.remote_ref()
    }
}
