use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AppState,
    routes::movie::model::Movie,
    utils::{
        Claims, clamp_limit, error_codes, error_to_api_response, page_offset,
        success_to_api_response, total_pages,
    },
};

use super::model::{CreateRatingRequest, Rating, RatingWithAuthor};

const DEFAULT_REVIEW_PAGE_SIZE: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedRatings {
    pub movie_id: Uuid,
    pub page: i64,
    pub limit: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub ratings: Vec<RatingWithAuthor>,
}

#[axum::debug_handler]
pub async fn create_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateRatingRequest>,
) -> impl IntoResponse {
    let movie_exists = match Movie::exists(&state.pool, req.movie_id).await {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to check movie {}: {:?}", req.movie_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to store rating".into()),
            );
        }
    };
    if !movie_exists {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
        );
    }

    // the range check must precede any persistence call
    if !(0..=100).contains(&req.value) {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Rating value must be between 0 and 100".into(),
            ),
        );
    }

    match Rating::upsert(
        &state.pool,
        claims.sub,
        req.movie_id,
        req.value,
        req.review.as_deref(),
    )
    .await
    {
        Ok(rating) => (StatusCode::CREATED, success_to_api_response(rating)),
        Err(e) => {
            tracing::error!("Failed to upsert rating: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to store rating".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(movie_id): Path<Uuid>,
) -> impl IntoResponse {
    match Rating::delete(&state.pool, claims.sub, movie_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Rating not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to delete rating: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to delete rating".into()),
            )
        }
    }
}

/// Paginated reviews for a movie, newest first. Pages are 1-based; a page
/// past the end returns an empty array with the true total count.
#[axum::debug_handler]
pub async fn get_movie_ratings(
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let movie_exists = match Movie::exists(&state.pool, movie_id).await {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to check movie {}: {:?}", movie_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch ratings".into()),
            );
        }
    };
    if !movie_exists {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
        );
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = clamp_limit(query.limit, DEFAULT_REVIEW_PAGE_SIZE);
    let offset = page_offset(page, limit);

    let total_count = match Rating::count_for_movie(&state.pool, movie_id).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!("Failed to count ratings for {}: {:?}", movie_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch ratings".into()),
            );
        }
    };

    match Rating::list_for_movie(&state.pool, movie_id, limit, offset).await {
        Ok(ratings) => (
            StatusCode::OK,
            success_to_api_response(PaginatedRatings {
                movie_id,
                page,
                limit,
                total_count,
                total_pages: total_pages(total_count, limit),
                ratings,
            }),
        ),
        Err(e) => {
            tracing::error!("Failed to list ratings for {}: {:?}", movie_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch ratings".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn my_ratings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match Rating::list_for_user(&state.pool, claims.sub).await {
        Ok(ratings) => (StatusCode::OK, success_to_api_response(ratings)),
        Err(e) => {
            tracing::error!("Failed to list ratings for user {}: {:?}", claims.sub, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch ratings".into()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_envelope_shape() {
        let page = PaginatedRatings {
            movie_id: Uuid::new_v4(),
            page: 3,
            limit: 5,
            total_count: 11,
            total_pages: total_pages(11, 5),
            ratings: Vec::new(),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total_pages"], 3);
        assert_eq!(json["total_count"], 11);
        assert!(json["ratings"].as_array().unwrap().is_empty());
    }
}
