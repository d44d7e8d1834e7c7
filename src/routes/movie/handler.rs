use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    utils::{clamp_limit, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreateMovieRequest, Movie, MovieListQuery, PatchMovieRequest};

const DEFAULT_MOVIE_PAGE_SIZE: i64 = 50;

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[axum::debug_handler]
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<MovieListQuery>,
) -> impl IntoResponse {
    let limit = clamp_limit(query.limit, DEFAULT_MOVIE_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    match Movie::list(&state.pool, query.genre.as_deref(), query.year, limit, offset).await {
        Ok(movies) => (StatusCode::OK, success_to_api_response(movies)),
        Err(e) => {
            tracing::error!("Failed to list movies: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to list movies".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
) -> impl IntoResponse {
    match Movie::find_by_id(&state.pool, movie_id).await {
        Ok(Some(movie)) => (StatusCode::OK, success_to_api_response(movie)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch movie {}: {:?}", movie_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch movie".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn create_movie(
    State(state): State<AppState>,
    Json(req): Json<CreateMovieRequest>,
) -> impl IntoResponse {
    if req.title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "Title must not be empty".into()),
        );
    }
    if req.genre.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "Genre must not be empty".into()),
        );
    }

    match Movie::create(&state.pool, &req).await {
        Ok(movie) => (StatusCode::CREATED, success_to_api_response(movie)),
        Err(e) if is_unique_violation(&e) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "A movie with this catalogue id already exists".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to create movie: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to create movie".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn replace_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
    Json(req): Json<CreateMovieRequest>,
) -> impl IntoResponse {
    if req.title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "Title must not be empty".into()),
        );
    }

    match Movie::replace(&state.pool, movie_id, &req).await {
        Ok(Some(movie)) => (StatusCode::OK, success_to_api_response(movie)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
        ),
        Err(e) if is_unique_violation(&e) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "A movie with this catalogue id already exists".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to replace movie {}: {:?}", movie_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to update movie".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn patch_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
    Json(req): Json<PatchMovieRequest>,
) -> impl IntoResponse {
    if req.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Nothing to update".into()),
        );
    }

    match Movie::merge(&state.pool, movie_id, &req).await {
        Ok(Some(movie)) => (StatusCode::OK, success_to_api_response(movie)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
        ),
        Err(e) if is_unique_violation(&e) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "A movie with this catalogue id already exists".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to patch movie {}: {:?}", movie_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to update movie".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
) -> impl IntoResponse {
    match Movie::delete(&state.pool, movie_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to delete movie {}: {:?}", movie_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to delete movie".into()),
            )
        }
    }
}
