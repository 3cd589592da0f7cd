//! Seed data for `--store memory`.

use kioku_core::memory::MemoryStore;
use kioku_core::{CardKind, CollectionRegistry, PropertyValue, ResolvedDeck, SchemaVariant};
use std::collections::HashSet;

const VOCABULARY: &[(&str, &str, &str, &str, &str)] = &[
    ("傘", "かさ", "우산", "傘を忘れた。", "우산을 잊어버렸다."),
    ("約束", "やくそく", "약속", "約束を守る。", "약속을 지키다."),
    ("景色", "けしき", "경치", "景色がきれいだ。", "경치가 아름답다."),
];

const KANA: &[(&str, &str, &str, &str)] = &[
    ("あ", "a", "아", "あめ"),
    ("か", "ka", "카", "かさ"),
    ("さ", "sa", "사", "さくら"),
];

const GRAMMAR: &[(&str, &str, &str, &str)] = &[
    ("〜わけにはいかない", "~할 수는 없다", "今日は休むわけにはいかない。", "오늘은 쉴 수는 없다."),
    ("〜ばかりか", "~뿐만 아니라", "彼は英語ばかりか中国語も話せる。", "그는 영어뿐만 아니라 중국어도 할 수 있다."),
];

const EXPRESSIONS: &[(&str, &str, [(&str, &str); 2])] = &[
    (
        "お疲れ様です",
        "수고하셨습니다",
        [("今日もお疲れ様です。", "오늘도 수고하셨습니다."), ("お先に失礼します。", "먼저 실례하겠습니다.")],
    ),
    (
        "よろしくお願いします",
        "잘 부탁드립니다",
        [("これからよろしくお願いします。", "앞으로 잘 부탁드립니다."), ("", "")],
    ),
];

pub fn seeded_store(registry: &CollectionRegistry) -> MemoryStore {
    let store = MemoryStore::new();
    let mut seeded = HashSet::new();
    for kind in CardKind::ALL {
        for level in registry.levels(kind) {
            let deck = registry.resolve(kind, Some(level));
            // Levels may share a collection.
            if seeded.insert(deck.collection.clone()) {
                seed_deck(&store, &deck);
            }
        }
    }
    store
}

fn seed_deck(store: &MemoryStore, deck: &ResolvedDeck) {
    let flag = deck.completion_property.as_str();
    let sort = deck.sort_property.as_str();
    store.create_collection(&deck.collection, [flag, sort]);
    let mut rank = 0.0;
    let mut next_rank = || {
        rank += 0.37;
        PropertyValue::formula_number(rank % 1.0)
    };

    match (deck.kind, deck.variant) {
        (CardKind::Vocabulary, SchemaVariant::Script) => {
            for (glyph, sound, gloss, word) in KANA {
                store.insert_new(
                    &deck.collection,
                    [
                        ("문자", PropertyValue::title(*glyph)),
                        ("발음", PropertyValue::rich_text(*sound)),
                        ("단어뜻", PropertyValue::rich_text(*gloss)),
                        ("단어", PropertyValue::rich_text(*word)),
                        (flag, PropertyValue::checkbox(false)),
                        (sort, next_rank()),
                    ],
                );
            }
        }
        (CardKind::Vocabulary, _) => {
            for (word, reading, gloss, example, example_gloss) in VOCABULARY {
                store.insert_new(
                    &deck.collection,
                    [
                        ("단어", PropertyValue::title(*word)),
                        ("독음", PropertyValue::rich_text(*reading)),
                        ("뜻", PropertyValue::rich_text(*gloss)),
                        ("예문", PropertyValue::rich_text(*example)),
                        ("예문해석", PropertyValue::rich_text(*example_gloss)),
                        (flag, PropertyValue::checkbox(false)),
                        (sort, next_rank()),
                    ],
                );
            }
        }
        (CardKind::Grammar, _) => {
            for (pattern, meaning, example, example_gloss) in GRAMMAR {
                store.insert_new(
                    &deck.collection,
                    [
                        ("문법", PropertyValue::title(*pattern)),
                        ("뜻", PropertyValue::rich_text(*meaning)),
                        ("예문", PropertyValue::rich_text(*example)),
                        ("예문해석", PropertyValue::rich_text(*example_gloss)),
                        (flag, PropertyValue::checkbox(false)),
                        (sort, next_rank()),
                    ],
                );
            }
        }
        (CardKind::Expression, _) => {
            for (expression, meaning, applications) in EXPRESSIONS {
                let mut props = vec![
                    ("표현(일본어)".to_string(), PropertyValue::title(*expression)),
                    ("뜻(한국어)".to_string(), PropertyValue::rich_text(*meaning)),
                    (flag.to_string(), PropertyValue::checkbox(false)),
                    (sort.to_string(), next_rank()),
                ];
                for (n, (phrase, gloss)) in applications.iter().enumerate() {
                    props.push((format!("응용{}J", n + 1), PropertyValue::rich_text(*phrase)));
                    props.push((format!("응용{}K", n + 1), PropertyValue::rich_text(*gloss)));
                }
                store.insert_new(&deck.collection, props);
            }
        }
    }
}
