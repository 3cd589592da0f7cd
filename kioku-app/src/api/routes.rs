use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use kioku_core::{
    CardKind, Catalog, CoreError, IdentifiedCard, LocalId, ProgressReceipt, ProgressRequest, SortDirection,
};

use crate::api::dto::{CardQuery, CardsOut, CardsQuery, DeckOut, StatsOut, StatsQuery};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let status = match &e {
            CoreError::UnresolvableTarget { .. } => StatusCode::NOT_FOUND,
            CoreError::Fetch(_) | CoreError::Write(_) => StatusCode::BAD_GATEWAY,
            CoreError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status != StatusCode::NOT_FOUND {
            error!(error = %e, "request failed");
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self::bad_request(r.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        Self::bad_request(r.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

fn parse_kind(raw: &str) -> Result<CardKind, ApiError> {
    raw.parse().map_err(ApiError::bad_request)
}

fn parse_sort(raw: Option<&str>) -> Result<SortDirection, ApiError> {
    match raw {
        Some(s) => s.parse().map_err(ApiError::bad_request),
        None => Ok(SortDirection::default()),
    }
}

pub async fn list_decks(State(st): State<Arc<AppState>>) -> Json<Vec<DeckOut>> {
    let registry = st.catalog.registry();
    Json(
        CardKind::ALL
            .into_iter()
            .map(|kind| DeckOut {
                kind,
                default_level: registry.default_level(kind).to_string(),
                levels: registry.levels(kind).into_iter().map(str::to_string).collect(),
            })
            .collect(),
    )
}

pub async fn list_cards(
    State(st): State<Arc<AppState>>,
    Path(kind): Path<String>,
    q: Result<Query<CardsQuery>, QueryRejection>,
) -> Result<Json<CardsOut>, ApiError> {
    let kind = parse_kind(&kind)?;
    let Query(q) = q?;
    let direction = parse_sort(q.sort.as_deref())?;
    let listing = st.catalog.list_cards(kind, q.level.as_deref(), direction).await?;
    Ok(Json(listing.into()))
}

pub async fn get_card(
    State(st): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    q: Result<Query<CardQuery>, QueryRejection>,
) -> Result<Json<IdentifiedCard>, ApiError> {
    let kind = parse_kind(&kind)?;
    let local_id: LocalId = id
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid card id: {id}")))?;
    let Query(q) = q?;
    let direction = parse_sort(q.sort.as_deref())?;
    let card = st
        .catalog
        .get_card(kind, q.level.as_deref(), local_id, direction)
        .await?;
    Ok(Json(card))
}

pub async fn post_progress(
    State(st): State<Arc<AppState>>,
    Path(kind): Path<String>,
    body: Result<Json<ProgressRequest>, JsonRejection>,
) -> Result<Json<ProgressReceipt>, ApiError> {
    let kind = parse_kind(&kind)?;
    let Json(body) = body?;
    let receipt = st.catalog.record_progress(kind, body).await?;
    Ok(Json(receipt))
}

pub async fn progress_stats(
    State(st): State<Arc<AppState>>,
    Path(kind): Path<String>,
    q: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<StatsOut>, ApiError> {
    let kind = parse_kind(&kind)?;
    let Query(q) = q?;
    let deck = st.catalog.resolve(kind, q.level.as_deref());
    let stats = st.catalog.progress_stats(kind, Some(&deck.level)).await?;
    Ok(Json(StatsOut::new(kind, deck.level, stats)))
}
