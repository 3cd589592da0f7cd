use anyhow::Result;
use kioku_core::{CardKind, DeckListing, IdentifiedCard, UnifiedCard};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ExportBundle<'a> {
    version: u32,
    exported_at: chrono::DateTime<chrono::Utc>,
    listing: &'a DeckListing,
}

pub fn write_json(listing: &DeckListing, path: &Path) -> Result<()> {
    let bundle = ExportBundle {
        version: 1,
        exported_at: chrono::Utc::now(),
        listing,
    };
    std::fs::write(path, serde_json::to_string_pretty(&bundle)?)?;
    Ok(())
}

pub fn write_csv(listing: &DeckListing, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_rows(listing, &mut wtr)?;
    wtr.flush()?;
    Ok(())
}

fn write_rows<W: std::io::Write>(listing: &DeckListing, wtr: &mut csv::Writer<W>) -> Result<()> {
    wtr.write_record(header(listing.kind))?;
    for card in &listing.cards {
        wtr.write_record(row(card))?;
    }
    Ok(())
}

fn header(kind: CardKind) -> Vec<&'static str> {
    let mut h = vec!["id", "remote_ref"];
    match kind {
        CardKind::Vocabulary => h.extend([
            "headword",
            "pronunciation",
            "translation",
            "example_sentence",
            "example_translation",
        ]),
        CardKind::Grammar => h.extend([
            "pattern",
            "meaning",
            "problem_sentence",
            "example_sentence",
            "example_translation",
        ]),
        CardKind::Expression => h.extend([
            "expression",
            "meaning",
            "application1",
            "application2",
            "application3",
            "application4",
            "application5",
        ]),
    }
    h
}

fn row(card: &IdentifiedCard) -> Vec<String> {
    let mut r = vec![card.id.to_string(), card.remote_ref().to_string()];
    match &card.card {
        UnifiedCard::Vocabulary(c) => r.extend([
            c.headword.clone(),
            c.pronunciation.clone(),
            c.translation.clone(),
            c.example_sentence.clone(),
            c.example_translation.clone(),
        ]),
        UnifiedCard::Grammar(c) => r.extend([
            c.pattern.clone(),
            c.meaning.clone(),
            c.problem_sentence.clone(),
            c.example_sentence.clone(),
            c.example_translation.clone(),
        ]),
        UnifiedCard::Expression(c) => {
            r.extend([c.expression.clone(), c.meaning.clone()]);
            // "phrase / gloss", blank when the slot is unused
            r.extend(c.applications.iter().map(|a| match (a.phrase.is_empty(), a.gloss.is_empty()) {
                (true, true) => String::new(),
                _ => format!("{} / {}", a.phrase, a.gloss),
            }));
        }
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use kioku_core::{assign, ApplicationPair, ExpressionCard, GrammarCard, IdentityStrategy, RemoteRef};

    fn listing(kind: CardKind, cards: Vec<UnifiedCard>) -> DeckListing {
        let (cards, identities) = assign(cards, IdentityStrategy::Positional);
        DeckListing {
            kind,
            level: "N2".into(),
            cards,
            identities,
            filter_applied: true,
            sort_applied: true,
        }
    }

    fn render(listing: &DeckListing) -> String {
        let mut wtr = csv::Writer::from_writer(vec![]);
        write_rows(listing, &mut wtr).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn grammar_rows_carry_ids_and_text() {
        let l = listing(
            CardKind::Grammar,
            vec![UnifiedCard::Grammar(GrammarCard {
                pattern: "〜ばかりか".into(),
                meaning: "~뿐만 아니라".into(),
                remote_ref: RemoteRef::new("g-1"),
                ..Default::default()
            })],
        );
        let out = render(&l);
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("id,remote_ref,pattern,meaning,problem_sentence,example_sentence,example_translation")
        );
        assert_eq!(lines.next(), Some("1,g-1,〜ばかりか,~뿐만 아니라,,,"));
    }

    #[test]
    fn expression_rows_have_five_application_columns() {
        let mut applications: [ApplicationPair; 5] = Default::default();
        applications[0] = ApplicationPair {
            phrase: "お先に".into(),
            gloss: "먼저".into(),
        };
        let l = listing(
            CardKind::Expression,
            vec![UnifiedCard::Expression(ExpressionCard {
                expression: "お疲れ様".into(),
                meaning: "수고".into(),
                applications,
                remote_ref: RemoteRef::new("e-1"),
            })],
        );
        let out = render(&l);
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row, "1,e-1,お疲れ様,수고,お先に / 먼저,,,,");
    }

    #[test]
    fn json_bundle_includes_identity_table() {
        let l = listing(
            CardKind::Grammar,
            vec![UnifiedCard::Grammar(GrammarCard {
                remote_ref: RemoteRef::new("g-1"),
                ..Default::default()
            })],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grammar.json");
        write_json(&l, &path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["version"], 1);
        assert_eq!(v["listing"]["cards"][0]["id"], 1);
        assert_eq!(v["listing"]["cards"][0]["remoteRef"], "g-1");
    }
}
