use clap::{Args, Parser, Subcommand, ValueEnum};
use kioku_core::{CardKind, LocalId, SortDirection};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StoreKind {
    Notion,
    /// In-process demo store seeded with a few cards per deck
    Memory,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "kioku", version, about = "Notion-backed flashcard catalog (CLI/API)")]
pub struct Cli {
    /// Document store backend
    #[arg(long, value_enum, default_value_t = StoreKind::Notion)]
    pub store: StoreKind,

    /// Registry JSON (overrides KIOKU_REGISTRY and the config-dir file)
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List cards not yet marked known
    List(DeckSel),
    /// Show one card of the current listing
    Show(ShowCmd),
    /// Record progress for one card
    Mark(MarkCmd),
    /// Known/unknown counts over a whole deck
    Stats(LevelSel),
    /// Show configured levels per kind
    Levels,
    /// Export a deck listing
    #[command(subcommand)]
    Export(ExportCmd),
    /// Launch Axum HTTP API
    Serve(ServeCmd),
}

#[derive(Debug, Args, Clone)]
pub struct LevelSel {
    /// vocabulary | grammar | expression
    pub kind: CardKind,
    #[arg(long)]
    pub level: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct DeckSel {
    #[command(flatten)]
    pub deck: LevelSel,
    /// ascending | descending
    #[arg(long, default_value = "ascending")]
    pub sort: SortDirection,
}

#[derive(Debug, Args, Clone)]
pub struct ShowCmd {
    #[command(flatten)]
    pub deck: DeckSel,
    pub local_id: LocalId,
}

#[derive(Debug, Args, Clone)]
pub struct MarkCmd {
    #[command(flatten)]
    pub deck: LevelSel,
    pub local_id: LocalId,
    /// Record the card as not known (clears the flag)
    #[arg(long)]
    pub unknown: bool,
    /// Remote page id; skips the re-listing lookup
    #[arg(long)]
    pub remote_ref: Option<String>,
    /// Direction of the listing the id came from
    #[arg(long)]
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json {
        path: PathBuf,
        #[command(flatten)]
        deck: DeckSel,
    },
    Csv {
        path: PathBuf,
        #[command(flatten)]
        deck: DeckSel,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ServeCmd {
    /// Bind address (host:port)
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,
}
