//! Maps raw property bags onto unified cards.
//!
//! Every card field has an ordered list of [`Probe`]s. The first probe whose
//! property exists, has an accepted shape and yields a non-blank value wins.
//! A field nobody answers for is left empty (text) or `None` (media).
//! Supporting a new collection layout means adding a rule table.

use crate::{
    ApplicationPair, CardKind, ExpressionCard, GrammarCard, MediaLink, PropertyValue,
    RemoteDocument, SchemaVariant, UnifiedCard, VocabularyCard, APPLICATION_COUNT,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Title,
    RichText,
    Select,
    Url,
    Files,
    Any,
}

impl Shape {
    fn accepts(&self, value: &PropertyValue) -> bool {
        match self {
            Shape::Title => matches!(value, PropertyValue::Title { .. }),
            Shape::RichText => matches!(value, PropertyValue::RichText { .. }),
            Shape::Select => matches!(value, PropertyValue::Select { .. }),
            Shape::Url => matches!(value, PropertyValue::Url { .. }),
            Shape::Files => matches!(value, PropertyValue::Files { .. }),
            Shape::Any => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe {
    pub property: &'static str,
    pub shape: Shape,
}

const fn p(property: &'static str, shape: Shape) -> Probe {
    Probe { property, shape }
}

pub type Probes = &'static [Probe];

#[derive(Debug)]
pub struct VocabularyRules {
    pub headword: Probes,
    pub pronunciation: Probes,
    pub translation: Probes,
    pub example_sentence: Probes,
    pub example_translation: Probes,
    pub image: Probes,
    pub word_audio: Probes,
    pub pronunciation_audio: Probes,
}

#[derive(Debug)]
pub struct GrammarRules {
    pub problem_sentence: Probes,
    pub example_sentence: Probes,
    pub example_translation: Probes,
    pub pattern: Probes,
    pub meaning: Probes,
    pub audio: Probes,
}

#[derive(Debug)]
pub struct ExpressionRules {
    pub expression: Probes,
    pub meaning: Probes,
    /// (phrase, gloss) probes per application slot.
    pub applications: [(Probes, Probes); APPLICATION_COUNT],
}

use Shape::{Any, Files, RichText, Select, Title, Url};

const IMAGE: Probes = &[p("Image", Any), p("이미지", Any)];
const WORD_AUDIO: Probes = &[p("WordAudio", Any), p("단어음성", Any)];
const PRONUNCIATION_AUDIO: Probes = &[
    p("PronunciationAudio", Any),
    p("발음음성", Any),
    p("스피커", Any),
];

pub static VOCABULARY_STANDARD: VocabularyRules = VocabularyRules {
    headword: &[p("Japanese", Title), p("단어", Title), p("단어(일본어)", Title)],
    pronunciation: &[p("Furigana", RichText), p("독음", RichText), p("후리가나", RichText)],
    translation: &[p("Korean", RichText), p("뜻", RichText), p("뜻(한국어)", RichText)],
    example_sentence: &[p("ExampleJapanese", RichText), p("예문", RichText)],
    example_translation: &[p("ExampleKorean", RichText), p("예문해석", RichText)],
    image: IMAGE,
    word_audio: WORD_AUDIO,
    pronunciation_audio: PRONUNCIATION_AUDIO,
};

pub static VOCABULARY_SCRIPT: VocabularyRules = VocabularyRules {
    headword: &[
        p("문자", Title),
        p("문자", RichText),
        p("문자", Select),
        p("단어", Title),
        p("단어", RichText),
    ],
    pronunciation: &[p("발음", RichText), p("독음", RichText)],
    translation: &[p("단어뜻", RichText), p("뜻", RichText)],
    example_sentence: &[p("단어", RichText), p("예문", RichText)],
    example_translation: &[p("예문해석", RichText), p("단어뜻", RichText)],
    image: IMAGE,
    word_audio: WORD_AUDIO,
    pronunciation_audio: PRONUNCIATION_AUDIO,
};

pub static GRAMMAR_STANDARD: GrammarRules = GrammarRules {
    problem_sentence: &[p("문제풀이", RichText)],
    example_sentence: &[p("예문", RichText)],
    example_translation: &[p("예문해석", RichText)],
    pattern: &[p("문법", Title)],
    meaning: &[p("뜻", RichText)],
    audio: &[p("스피커", Url), p("스피커", Files)],
};

pub static EXPRESSION_STANDARD: ExpressionRules = ExpressionRules {
    expression: &[p("표현(일본어)", Title)],
    meaning: &[p("뜻(한국어)", RichText)],
    applications: [
        (&[p("응용1J", RichText)], &[p("응용1K", RichText)]),
        (&[p("응용2J", RichText)], &[p("응용2K", RichText)]),
        (&[p("응용3J", RichText)], &[p("응용3K", RichText)]),
        (&[p("응용4J", RichText)], &[p("응용4K", RichText)]),
        (&[p("응용5J", RichText)], &[p("응용5K", RichText)]),
    ],
};

#[derive(Clone, Copy, Debug)]
pub enum RuleSet {
    Vocabulary(&'static VocabularyRules),
    Grammar(&'static GrammarRules),
    Expression(&'static ExpressionRules),
}

/// Grammar and expression decks only have the standard layout.
pub fn rules_for(kind: CardKind, variant: SchemaVariant) -> RuleSet {
    match (kind, variant) {
        (CardKind::Vocabulary, SchemaVariant::Standard) => RuleSet::Vocabulary(&VOCABULARY_STANDARD),
        (CardKind::Vocabulary, SchemaVariant::Script) => RuleSet::Vocabulary(&VOCABULARY_SCRIPT),
        (CardKind::Grammar, _) => RuleSet::Grammar(&GRAMMAR_STANDARD),
        (CardKind::Expression, _) => RuleSet::Expression(&EXPRESSION_STANDARD),
    }
}

pub fn text(doc: &RemoteDocument, probes: Probes) -> String {
    probes
        .iter()
        .filter_map(|pr| doc.property(pr.property).filter(|v| pr.shape.accepts(v)))
        .filter_map(PropertyValue::plain_text)
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

pub fn media(doc: &RemoteDocument, probes: Probes) -> Option<MediaLink> {
    probes
        .iter()
        .filter_map(|pr| doc.property(pr.property).filter(|v| pr.shape.accepts(v)))
        .find_map(PropertyValue::first_media)
}

pub fn normalize(doc: &RemoteDocument, kind: CardKind, variant: SchemaVariant) -> UnifiedCard {
    apply(doc, rules_for(kind, variant))
}

pub fn apply(doc: &RemoteDocument, rules: RuleSet) -> UnifiedCard {
    let remote_ref = doc.id.clone();
    match rules {
        RuleSet::Vocabulary(r) => UnifiedCard::Vocabulary(VocabularyCard {
            headword: text(doc, r.headword),
            pronunciation: text(doc, r.pronunciation),
            translation: text(doc, r.translation),
            example_sentence: text(doc, r.example_sentence),
            example_translation: text(doc, r.example_translation),
            image: media(doc, r.image),
            word_audio: media(doc, r.word_audio),
            pronunciation_audio: media(doc, r.pronunciation_audio),
            remote_ref,
        }),
        RuleSet::Grammar(r) => UnifiedCard::Grammar(GrammarCard {
            problem_sentence: text(doc, r.problem_sentence),
            example_sentence: text(doc, r.example_sentence),
            example_translation: text(doc, r.example_translation),
            pattern: text(doc, r.pattern),
            meaning: text(doc, r.meaning),
            audio: media(doc, r.audio),
            remote_ref,
        }),
        RuleSet::Expression(r) => UnifiedCard::Expression(ExpressionCard {
            expression: text(doc, r.expression),
            meaning: text(doc, r.meaning),
            applications: r.applications.map(|(phrase, gloss)| ApplicationPair {
                phrase: text(doc, phrase),
                gloss: text(doc, gloss),
            }),
            remote_ref,
        }),
    }
}
