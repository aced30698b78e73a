use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    error::ApiError,
    startups::{
        dto::{CreateStartupRequest, SearchParams, StartupView, ViewsResponse},
        repo,
        repo_types::StartupWithAuthor,
        services,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/startups", get(list_startups))
        .route("/startups/:id", get(get_startup))
        .route("/startups/:id/views", get(get_views))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/startups", post(create_startup))
        .route("/startups/:id/views", axum::routing::patch(increment_views))
}

#[instrument(skip(state))]
pub async fn list_startups(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<StartupView>>, ApiError> {
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let rows = StartupWithAuthor::list(&state.db, search).await?;
    Ok(Json(rows.into_iter().map(StartupView::list_item).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_startup(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateStartupRequest>,
) -> Result<(StatusCode, Json<StartupView>), ApiError> {
    let input = payload.validate()?;
    let startup = services::create_startup(&state.db, auth.id, &auth.email, input).await?;
    Ok((StatusCode::CREATED, Json(StartupView::detail(startup))))
}

#[instrument(skip(state))]
pub async fn get_startup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StartupView>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::InvalidArgument("Invalid startup id".into()))?;
    let startup = StartupWithAuthor::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Startup"))?;
    Ok(Json(StartupView::detail(startup)))
}

#[instrument(skip(state))]
pub async fn get_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewsResponse>, ApiError> {
    // Views endpoints answer 404 for anything that cannot name a startup,
    // a malformed id included.
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound("Startup"))?;
    let views = repo::views(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Startup"))?;
    Ok(Json(ViewsResponse { id, views }))
}

#[instrument(skip(state))]
pub async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewsResponse>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound("Startup"))?;
    let views = repo::increment_views(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Startup"))?;
    Ok(Json(ViewsResponse { id, views }))
}
