use crate::api::server as api_server;
use crate::cli::opts::*;
use crate::config::AppConfig;
use crate::{demo, export};

use anyhow::Result;
use kioku_core::{
    CardKind, Catalog, CatalogOptions, CollectionRegistry, DocumentStore, ProgressRequest, RemoteRef,
};
use kioku_notion::NotionStore;
use std::sync::Arc;

pub async fn run_cli(args: Cli) -> Result<()> {
    let config = AppConfig::from_env();
    if let Command::Levels = args.cmd {
        levels_cmd(&config.load_registry(args.registry.as_deref())?);
        return Ok(());
    }
    let catalog = open_catalog(&args, &config)?;
    match args.cmd {
        Command::List(sel) => list_cmd(&catalog, sel).await,
        Command::Show(cmd) => show_cmd(&catalog, cmd).await,
        Command::Mark(cmd) => mark_cmd(&catalog, cmd).await,
        Command::Stats(sel) => stats_cmd(&catalog, sel).await,
        Command::Levels => Ok(()),
        Command::Export(cmd) => export_cmd(&catalog, cmd).await,
        Command::Serve(cmd) => {
            let addr: std::net::SocketAddr = cmd.addr.parse()?;
            api_server::run(catalog, addr).await
        }
    }
}

pub fn open_catalog(args: &Cli, config: &AppConfig) -> Result<Catalog> {
    let registry = config.load_registry(args.registry.as_deref())?;
    let store: Arc<dyn DocumentStore> = match args.store {
        StoreKind::Notion => Arc::new(NotionStore::connect(config.notion()?)?),
        StoreKind::Memory => Arc::new(demo::seeded_store(&registry)),
    };
    let options = CatalogOptions {
        page_size: config.page_size,
        ..CatalogOptions::default()
    };
    Ok(Catalog::new(store, registry, options))
}

async fn list_cmd(catalog: &Catalog, sel: DeckSel) -> Result<()> {
    let listing = catalog
        .list_cards(sel.deck.kind, sel.deck.level.as_deref(), sel.sort)
        .await?;
    if listing.cards.is_empty() {
        println!("no cards left in {} {}", listing.kind, listing.level);
        return Ok(());
    }
    for c in &listing.cards {
        println!("{}\t{}\t{}\t{}", c.id, c.card.prompt(), c.card.answer(), c.remote_ref());
    }
    if !listing.filter_applied {
        eprintln!("note: completion flag missing, listing includes known cards");
    }
    if !listing.sort_applied {
        eprintln!("note: sort key missing, listing is in store order");
    }
    Ok(())
}

async fn show_cmd(catalog: &Catalog, cmd: ShowCmd) -> Result<()> {
    let card = catalog
        .get_card(cmd.deck.deck.kind, cmd.deck.deck.level.as_deref(), cmd.local_id, cmd.deck.sort)
        .await?;
    println!("{}", serde_json::to_string_pretty(&card)?);
    Ok(())
}

async fn mark_cmd(catalog: &Catalog, cmd: MarkCmd) -> Result<()> {
    let mut req = ProgressRequest::new(cmd.local_id, !cmd.unknown);
    if let Some(r) = cmd.remote_ref {
        req = req.with_remote_ref(RemoteRef::new(r));
    }
    if let Some(l) = cmd.deck.level {
        req = req.with_level(l);
    }
    req.sort = cmd.sort;
    let receipt = catalog.record_progress(cmd.deck.kind, req).await?;
    println!(
        "{} {} -> {} ({:?})",
        receipt.local_id,
        receipt.remote_ref,
        if receipt.known { "known" } else { "unknown" },
        receipt.resolution
    );
    Ok(())
}

async fn stats_cmd(catalog: &Catalog, sel: LevelSel) -> Result<()> {
    let deck = catalog.resolve(sel.kind, sel.level.as_deref());
    let s = catalog.progress_stats(sel.kind, sel.level.as_deref()).await?;
    println!(
        "{} {}: known={} unknown={} total={} ({:.0}%)",
        deck.kind,
        deck.level,
        s.known,
        s.unknown,
        s.total(),
        s.known_ratio() * 100.0
    );
    Ok(())
}

fn levels_cmd(registry: &CollectionRegistry) {
    for kind in CardKind::ALL {
        let default = registry.default_level(kind);
        let levels: Vec<String> = registry
            .levels(kind)
            .into_iter()
            .map(|l| if l == default { format!("{l}*") } else { l.to_string() })
            .collect();
        println!("{kind}\t{}", levels.join(", "));
    }
}

async fn export_cmd(catalog: &Catalog, cmd: ExportCmd) -> Result<()> {
    let (path, sel, csv) = match cmd {
        ExportCmd::Json { path, deck } => (path, deck, false),
        ExportCmd::Csv { path, deck } => (path, deck, true),
    };
    let listing = catalog
        .list_cards(sel.deck.kind, sel.deck.level.as_deref(), sel.sort)
        .await?;
    if csv {
        export::write_csv(&listing, &path)?;
    } else {
        export::write_json(&listing, &path)?;
    }
    println!("wrote {} ({} cards)", path.display(), listing.cards.len());
    Ok(())
}
