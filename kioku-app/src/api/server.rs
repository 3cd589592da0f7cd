use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes::{get_card, list_cards, list_decks, post_progress, progress_stats, AppState};
use kioku_core::Catalog;

pub fn router(catalog: Catalog) -> Router {
    let state = Arc::new(AppState { catalog });

    Router::new()
        .route("/api/decks", get(list_decks))
        .route("/api/:kind/cards", get(list_cards))
        .route("/api/:kind/cards/:id", get(get_card))
        .route("/api/:kind/progress", post(post_progress))
        .route("/api/:kind/progress/stats", get(progress_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(catalog: Catalog, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(catalog);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "api listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
