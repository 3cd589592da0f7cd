use kioku_core::memory::MemoryStore;
use kioku_core::{
    CardKind, Catalog, CatalogOptions, CollectionEntry, CollectionRef, CollectionRegistry, CoreError,
    IdentityStrategy, KindConfig, ProgressRequest, ProgressStats, PropertyValue, RegistryConfig, RemoteRef,
    Resolution, SchemaVariant, SortDirection, StoreError, UnifiedCard,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

const FLAG: &str = "암기";

fn kind_config(level: &str, collection: &str, variant: SchemaVariant) -> KindConfig {
    KindConfig {
        default_level: level.into(),
        levels: BTreeMap::from([(level.to_string(), CollectionEntry::new(collection, variant))]),
    }
}

fn registry() -> CollectionRegistry {
    let mut vocabulary = kind_config("N2", "vocab-n2", SchemaVariant::Standard);
    vocabulary.levels.insert(
        "Hiragana/Katakana".into(),
        CollectionEntry::new("kana", SchemaVariant::Script),
    );
    CollectionRegistry::new(RegistryConfig {
        completion_property: FLAG.into(),
        sort_property: "Random".into(),
        vocabulary,
        grammar: kind_config("N2", "grammar-n2", SchemaVariant::Standard),
        expression: kind_config("all", "expr", SchemaVariant::Standard),
    })
    .unwrap()
}

fn catalog(store: Arc<MemoryStore>) -> Catalog {
    Catalog::new(store, registry(), CatalogOptions::default())
}

fn grammar_doc(store: &MemoryStore, pattern: &str, random: f64) -> RemoteRef {
    store.insert_new(
        &CollectionRef::new("grammar-n2"),
        [
            ("문법", PropertyValue::title(pattern)),
            ("뜻", PropertyValue::rich_text(format!("meaning of {pattern}"))),
            ("Random", PropertyValue::formula_number(random)),
            (FLAG, PropertyValue::checkbox(false)),
        ],
    )
}

fn patterns(cards: &[kioku_core::IdentifiedCard]) -> Vec<String> {
    cards.iter().map(|c| c.card.prompt().to_string()).collect()
}

#[tokio::test]
async fn marking_known_removes_card_from_next_listing() {
    let store = Arc::new(MemoryStore::new());
    grammar_doc(&store, "ので", 0.1);
    grammar_doc(&store, "ながら", 0.2);
    grammar_doc(&store, "ばかり", 0.3);
    let catalog = catalog(store.clone());

    let first = catalog
        .list_cards(CardKind::Grammar, Some("N2"), SortDirection::Ascending)
        .await
        .unwrap();
    assert_eq!(first.cards.len(), 3);
    assert!(first.filter_applied);

    let second_card = &first.cards[1];
    let receipt = catalog
        .record_progress(
            CardKind::Grammar,
            ProgressRequest::new(second_card.id, true).with_remote_ref(second_card.remote_ref().clone()),
        )
        .await
        .unwrap();
    assert_eq!(receipt.resolution, Resolution::Direct);
    assert_eq!(&receipt.remote_ref, second_card.remote_ref());

    let next = catalog
        .list_cards(CardKind::Grammar, Some("N2"), SortDirection::Ascending)
        .await
        .unwrap();
    assert_eq!(patterns(&next.cards), vec!["ので", "ばかり"]);
}

#[tokio::test]
async fn explicit_reference_touches_only_that_document() {
    let store = Arc::new(MemoryStore::new());
    let refs: Vec<RemoteRef> = (0..4).map(|i| grammar_doc(&store, &format!("p{i}"), i as f64)).collect();
    let catalog = catalog(store.clone());

    catalog
        .record_progress(
            CardKind::Grammar,
            ProgressRequest::new(99, true).with_remote_ref(refs[2].clone()),
        )
        .await
        .unwrap();

    for (i, r) in refs.iter().enumerate() {
        let doc = store.document(r).unwrap();
        assert_eq!(doc.flag(FLAG), i == 2, "document {i}");
    }
    assert_eq!(store.updates().len(), 1);
}

#[tokio::test]
async fn expression_deck_without_sort_key_lists_in_store_order() {
    let store = Arc::new(MemoryStore::new());
    let col = CollectionRef::new("expr");
    for e in ["お疲れ様", "よろしく", "いただきます"] {
        store.insert_new(
            &col,
            [
                ("표현(일본어)", PropertyValue::title(e)),
                (FLAG, PropertyValue::checkbox(false)),
            ],
        );
    }
    let catalog = catalog(store.clone());

    let listing = catalog
        .list_cards(CardKind::Expression, None, SortDirection::Descending)
        .await
        .unwrap();
    assert!(!listing.sort_applied);
    assert!(listing.filter_applied);
    assert_eq!(patterns(&listing.cards), vec!["お疲れ様", "よろしく", "いただきます"]);
    assert!(listing.cards.iter().all(|c| matches!(c.card, UnifiedCard::Expression(_))));
}

#[tokio::test]
async fn missing_filter_property_returns_unfiltered_documents() {
    let store = Arc::new(MemoryStore::new());
    let col = CollectionRef::new("vocab-n2");
    for w in ["猫", "犬"] {
        store.insert_new(&col, [("Japanese", PropertyValue::title(w))]);
    }
    let catalog = catalog(store.clone());

    let listing = catalog
        .list_cards(CardKind::Vocabulary, Some("N2"), SortDirection::Ascending)
        .await
        .unwrap();
    assert!(!listing.filter_applied);
    assert!(!listing.sort_applied);

    let unfiltered: Vec<RemoteRef> = store.documents(&col).into_iter().map(|d| d.id).collect();
    let listed: Vec<RemoteRef> = listing.cards.iter().map(|c| c.remote_ref().clone()).collect();
    assert_eq!(listed, unfiltered);
}

#[tokio::test]
async fn local_ids_are_unique_within_a_listing() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..250 {
        grammar_doc(&store, &format!("g{i}"), (i % 7) as f64);
        store.insert_new(
            &CollectionRef::new("vocab-n2"),
            [
                ("Japanese", PropertyValue::title(format!("w{i}"))),
                (FLAG, PropertyValue::checkbox(false)),
                ("Random", PropertyValue::formula_number(i as f64)),
            ],
        );
    }
    let catalog = catalog(store.clone());
    for kind in [CardKind::Grammar, CardKind::Vocabulary] {
        let listing = catalog.list_cards(kind, None, SortDirection::Ascending).await.unwrap();
        assert_eq!(listing.cards.len(), 250);
        let ids: HashSet<u32> = listing.cards.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 250, "{kind}");
        assert_eq!(listing.identities.len(), 250);
    }
}

#[tokio::test]
async fn hash_ids_survive_reordering() {
    let store = Arc::new(MemoryStore::new());
    let col = CollectionRef::new("vocab-n2");
    for (w, r) in [("一", 0.9), ("二", 0.5), ("三", 0.1)] {
        store.insert_new(
            &col,
            [
                ("Japanese", PropertyValue::title(w)),
                (FLAG, PropertyValue::checkbox(false)),
                ("Random", PropertyValue::formula_number(r)),
            ],
        );
    }
    let catalog = catalog(store.clone());
    assert_eq!(catalog.options().vocabulary.identity, IdentityStrategy::Hash);

    let asc = catalog
        .list_cards(CardKind::Vocabulary, None, SortDirection::Ascending)
        .await
        .unwrap();
    let desc = catalog
        .list_cards(CardKind::Vocabulary, None, SortDirection::Descending)
        .await
        .unwrap();
    assert_ne!(patterns(&asc.cards), patterns(&desc.cards));
    for card in &asc.cards {
        assert_eq!(desc.identities.local_id_of(card.remote_ref()), Some(card.id));
    }
}

#[tokio::test]
async fn positional_ids_do_not_survive_reordering() {
    let store = Arc::new(MemoryStore::new());
    let a = grammar_doc(&store, "A", 0.1);
    let b = grammar_doc(&store, "B", 0.2);
    let catalog = catalog(store.clone());

    let before = catalog
        .list_cards(CardKind::Grammar, None, SortDirection::Ascending)
        .await
        .unwrap();
    assert_eq!(before.identities.resolve(1), Some(&a));

    // Upstream recomputes the random sort key between requests.
    store.rearrange(&CollectionRef::new("grammar-n2"), |docs| {
        for d in docs.iter_mut() {
            let r = if d.id == a { 0.9 } else { 0.05 };
            d.properties.insert("Random".into(), PropertyValue::formula_number(r));
        }
    });

    let after = catalog
        .list_cards(CardKind::Grammar, None, SortDirection::Ascending)
        .await
        .unwrap();
    assert_eq!(after.identities.resolve(1), Some(&b));
    assert_ne!(before.identities.resolve(1), after.identities.resolve(1));
}

#[tokio::test]
async fn get_card_follows_the_current_listing() {
    let store = Arc::new(MemoryStore::new());
    let a = grammar_doc(&store, "A", 0.1);
    let b = grammar_doc(&store, "B", 0.2);
    let catalog = catalog(store.clone());

    let card = catalog
        .get_card(CardKind::Grammar, None, 1, SortDirection::Ascending)
        .await
        .unwrap();
    assert_eq!(card.remote_ref(), &a);
    assert_eq!(card.card.prompt(), "A");

    // Same id, different card once the sort key is recomputed.
    store.rearrange(&CollectionRef::new("grammar-n2"), |docs| {
        for d in docs.iter_mut() {
            let r = if d.id == a { 0.9 } else { 0.05 };
            d.properties.insert("Random".into(), PropertyValue::formula_number(r));
        }
    });
    let card = catalog
        .get_card(CardKind::Grammar, None, 1, SortDirection::Ascending)
        .await
        .unwrap();
    assert_eq!(card.remote_ref(), &b);

    let err = catalog
        .get_card(CardKind::Grammar, Some("n2"), 3, SortDirection::Ascending)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::UnresolvableTarget { local_id: 3, ref level, .. } if level == "N2"
    ));
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn fallback_rediscovers_by_local_id_and_can_drift() {
    let store = Arc::new(MemoryStore::new());
    let a = grammar_doc(&store, "A", 0.1);
    let b = grammar_doc(&store, "B", 0.2);
    let catalog = catalog(store.clone());

    let receipt = catalog
        .record_progress(CardKind::Grammar, ProgressRequest::new(2, true))
        .await
        .unwrap();
    assert_eq!(receipt.resolution, Resolution::Rediscovered);
    assert_eq!(receipt.remote_ref, b);

    // B is gone from the unknown-only listing, so id 1 is now A.
    let receipt = catalog
        .record_progress(CardKind::Grammar, ProgressRequest::new(1, true))
        .await
        .unwrap();
    assert_eq!(receipt.remote_ref, a);
    assert!(store.document(&a).unwrap().flag(FLAG));
}

#[tokio::test]
async fn unresolvable_targets_fail_without_writing() {
    let store = Arc::new(MemoryStore::new());
    grammar_doc(&store, "A", 0.1);
    let catalog = catalog(store.clone());

    let err = catalog
        .record_progress(CardKind::Grammar, ProgressRequest::new(5, true))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::UnresolvableTarget { local_id: 5, .. }));

    let err = catalog
        .record_progress(
            CardKind::Grammar,
            ProgressRequest::new(1, true).with_remote_ref(RemoteRef::new("gone")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::UnresolvableTarget { .. }));
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn empty_deck_is_unresolvable() {
    let store = Arc::new(MemoryStore::new());
    store.create_collection(&CollectionRef::new("grammar-n2"), [FLAG, "Random"]);
    let catalog = catalog(store.clone());
    let err = catalog
        .record_progress(CardKind::Grammar, ProgressRequest::new(1, false))
        .await
        .unwrap_err();
    let CoreError::UnresolvableTarget { reason, .. } = err else {
        panic!("expected unresolvable target");
    };
    assert_eq!(reason, "deck is empty");
}

#[tokio::test]
async fn stats_count_the_whole_collection() {
    let store = Arc::new(MemoryStore::new());
    let refs: Vec<RemoteRef> = (0..5).map(|i| grammar_doc(&store, &format!("p{i}"), i as f64)).collect();
    let catalog = catalog(store.clone());
    for r in &refs[..2] {
        catalog
            .record_progress(CardKind::Grammar, ProgressRequest::new(0, true).with_remote_ref(r.clone()))
            .await
            .unwrap();
    }
    let stats = catalog.progress_stats(CardKind::Grammar, Some("N2")).await.unwrap();
    assert_eq!(stats, ProgressStats { known: 2, unknown: 3 });
}

#[tokio::test]
async fn transport_failures_surface_as_fetch_errors() {
    let store = Arc::new(MemoryStore::new());
    grammar_doc(&store, "A", 0.1);
    store.fail_next(StoreError::Timeout);
    let catalog = catalog(store.clone());
    let err = catalog
        .list_cards(CardKind::Grammar, None, SortDirection::Ascending)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Fetch(StoreError::Timeout)));
}

#[tokio::test]
async fn unknown_level_uses_default_deck() {
    let store = Arc::new(MemoryStore::new());
    grammar_doc(&store, "A", 0.1);
    let catalog = catalog(store.clone());
    let listing = catalog
        .list_cards(CardKind::Grammar, Some("N9"), SortDirection::Ascending)
        .await
        .unwrap();
    assert_eq!(listing.level, "N2");
    assert_eq!(listing.cards.len(), 1);
}
