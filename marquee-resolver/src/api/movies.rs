//! Movie resolution API handlers
//!
//! The command transport (a chat bot, a CLI) sits behind this boundary and
//! is responsible for user-facing message formatting; handlers here expose
//! the resolver surface one route per command.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::services::resolver::CorrectionResult;
use crate::AppState;

/// POST /guilds/:guild/movies request
#[derive(Debug, Deserialize)]
pub struct AddMovieRequest {
    /// Contributor recorded on the catalog entry
    pub user: String,
    /// Free text, an IMDb link, or omitted to re-add the last mentioned
    pub query: Option<String>,
}

/// POST /guilds/:guild/movies response
#[derive(Debug, Serialize)]
pub struct AddMovieResponse {
    pub movie_name: String,
    pub imdb_url: String,
}

/// POST /guilds/:guild/corrections request
#[derive(Debug, Deserialize)]
pub struct CorrectionRequest {
    pub user: String,
    /// None to list candidates, a number to pick one, or replacement text
    pub option: Option<String>,
}

/// GET list/pick query parameters
#[derive(Debug, Deserialize)]
pub struct RuntimeFilterParams {
    pub max_runtime: Option<u32>,
}

/// GET /guilds/:guild/movies/search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// Query parameter naming a stored movie; omitted means "last mentioned"
#[derive(Debug, Deserialize)]
pub struct MovieParams {
    pub movie: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PickResponse {
    pub movie_name: String,
    pub imdb_url: String,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub removed: String,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub imdb_url: String,
}

#[derive(Debug, Serialize)]
pub struct RuntimeResponse {
    pub runtime_minutes: u32,
}

/// POST /guilds/:guild/movies
///
/// Resolve a query and add the result to the guild's catalog.
pub async fn add_movie(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Json(request): Json<AddMovieRequest>,
) -> ApiResult<Json<AddMovieResponse>> {
    tracing::info!(guild = %guild, user = %request.user, query = ?request.query, "Add movie");

    let result = state
        .resolver
        .resolve_add(&guild, &request.user, request.query.as_deref())
        .await;

    if let Err(e) = &result {
        *state.last_error.write().await = Some(e.to_string());
    }
    let movie_name = result?;

    let imdb_url = state.resolver.get_link(&guild, Some(&movie_name)).await?;

    Ok(Json(AddMovieResponse { movie_name, imdb_url }))
}

/// POST /guilds/:guild/corrections
///
/// Numbered-choice correction protocol for the guild's last added movie.
pub async fn correct_movie(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Json(request): Json<CorrectionRequest>,
) -> ApiResult<Json<CorrectionResult>> {
    tracing::info!(guild = %guild, user = %request.user, option = ?request.option, "Correct movie");

    let result = state
        .resolver
        .resolve_correct(&guild, &request.user, request.option.as_deref())
        .await;

    if let Err(e) = &result {
        *state.last_error.write().await = Some(e.to_string());
    }

    Ok(Json(result?))
}

/// GET /guilds/:guild/movies[?max_runtime=N]
pub async fn list_movies(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Query(params): Query<RuntimeFilterParams>,
) -> ApiResult<Json<MovieListResponse>> {
    let movies = match params.max_runtime {
        Some(max) => state.resolver.list_below_runtime(&guild, max).await?,
        None => state.resolver.list(&guild).await?,
    };

    Ok(Json(MovieListResponse { movies }))
}

/// GET /guilds/:guild/movies/search?q=
pub async fn search_movies(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<MovieListResponse>> {
    let movies = state.resolver.search(&guild, &params.q).await?;

    Ok(Json(MovieListResponse { movies }))
}

/// GET /guilds/:guild/pick[?max_runtime=N]
pub async fn pick_movie(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Query(params): Query<RuntimeFilterParams>,
) -> ApiResult<Json<PickResponse>> {
    let movie_name = match params.max_runtime {
        Some(max) => state.resolver.pick_below_runtime(&guild, max).await?,
        None => state.resolver.pick(&guild).await?,
    };

    let imdb_url = state.resolver.get_link(&guild, Some(&movie_name)).await?;

    Ok(Json(PickResponse { movie_name, imdb_url }))
}

/// DELETE /guilds/:guild/movies/:name
pub async fn remove_movie(
    State(state): State<AppState>,
    Path((guild, name)): Path<(String, String)>,
) -> ApiResult<Json<RemoveResponse>> {
    let removed = state.resolver.remove(&guild, Some(&name)).await?;

    Ok(Json(RemoveResponse { removed }))
}

/// GET /guilds/:guild/link?movie=
pub async fn get_link(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Query(params): Query<MovieParams>,
) -> ApiResult<Json<LinkResponse>> {
    let imdb_url = state
        .resolver
        .get_link(&guild, params.movie.as_deref())
        .await?;

    Ok(Json(LinkResponse { imdb_url }))
}

/// GET /guilds/:guild/runtime?movie=
pub async fn get_runtime(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    Query(params): Query<MovieParams>,
) -> ApiResult<Json<RuntimeResponse>> {
    let runtime_minutes = state
        .resolver
        .runtime_of(&guild, params.movie.as_deref())
        .await?;

    Ok(Json(RuntimeResponse { runtime_minutes }))
}

/// Build movie resolution routes
pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/guilds/:guild/movies", post(add_movie).get(list_movies))
        .route("/guilds/:guild/movies/search", get(search_movies))
        .route("/guilds/:guild/movies/:name", delete(remove_movie))
        .route("/guilds/:guild/corrections", post(correct_movie))
        .route("/guilds/:guild/pick", get(pick_movie))
        .route("/guilds/:guild/link", get(get_link))
        .route("/guilds/:guild/runtime", get(get_runtime))
}
