use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    routes::movie::model::Movie,
    utils::{Claims, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{AddFavouriteRequest, Favourite};

#[axum::debug_handler]
pub async fn add_favourite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddFavouriteRequest>,
) -> impl IntoResponse {
    let movie_exists = match Movie::exists(&state.pool, req.movie_id).await {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to check movie {}: {:?}", req.movie_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to add favourite".into()),
            );
        }
    };
    if !movie_exists {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
        );
    }

    match Favourite::add(&state.pool, claims.sub, req.movie_id).await {
        Ok(Some(favourite)) => (StatusCode::CREATED, success_to_api_response(favourite)),
        Ok(None) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "Movie is already in favourites".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to add favourite: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to add favourite".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn remove_favourite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(movie_id): Path<Uuid>,
) -> impl IntoResponse {
    match Favourite::remove(&state.pool, claims.sub, movie_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Favourite not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to remove favourite: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to remove favourite".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn my_favourites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match Favourite::list_for_user(&state.pool, claims.sub).await {
        Ok(favourites) => (StatusCode::OK, success_to_api_response(favourites)),
        Err(e) => {
            tracing::error!("Failed to list favourites for {}: {:?}", claims.sub, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch favourites".into(),
                ),
            )
        }
    }
}
