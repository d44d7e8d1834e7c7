use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    routes::group::model::GroupMember,
    routes::movie::model::Movie,
    utils::{
        Claims, error_codes, error_to_api_response, new_share_id, success_to_api_response,
    },
};

use super::model::{
    AddListMovieRequest, CreateListRequest, List, ListWithMovies, PatchListRequest,
};

#[axum::debug_handler]
pub async fn create_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateListRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "List name must not be empty".into(),
            ),
        );
    }

    // a list belongs to exactly one of a user or a group
    if req.owner_user_id.is_some() && req.owner_group_id.is_some() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "A list cannot belong to both a user and a group".into(),
            ),
        );
    }

    let (owner_user_id, owner_group_id) = match (req.owner_user_id, req.owner_group_id) {
        (Some(user_id), None) => {
            if user_id != claims.sub {
                return (
                    StatusCode::FORBIDDEN,
                    error_to_api_response(
                        error_codes::PERMISSION_DENIED,
                        "A personal list can only be created for yourself".into(),
                    ),
                );
            }
            (Some(user_id), None)
        }
        (None, Some(group_id)) => {
            match GroupMember::is_member(&state.pool, group_id, claims.sub).await {
                Ok(true) => (None, Some(group_id)),
                Ok(false) => {
                    return (
                        StatusCode::FORBIDDEN,
                        error_to_api_response(
                            error_codes::PERMISSION_DENIED,
                            "You are not a member of this group".into(),
                        ),
                    );
                }
                Err(e) => {
                    tracing::error!("Failed to check membership: {:?}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        error_to_api_response(
                            error_codes::INTERNAL_ERROR,
                            "Failed to create list".into(),
                        ),
                    );
                }
            }
        }
        // neither given: a personal list for the requester
        (None, None) => (Some(claims.sub), None),
        (Some(_), Some(_)) => unreachable!("rejected above"),
    };

    match List::create(
        &state.pool,
        req.name.trim(),
        req.description.as_deref(),
        owner_user_id,
        owner_group_id,
        req.is_public.unwrap_or(false),
        &new_share_id(),
    )
    .await
    {
        Ok(list) => (StatusCode::CREATED, success_to_api_response(list)),
        Err(e) => {
            tracing::error!("Failed to create list: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to create list".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn my_lists(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match List::list_for_user(&state.pool, claims.sub).await {
        Ok(lists) => (StatusCode::OK, success_to_api_response(lists)),
        Err(e) => {
            tracing::error!("Failed to list lists for {}: {:?}", claims.sub, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch lists".into()),
            )
        }
    }
}

/// Loads the list or produces the 404/500 response.
async fn load_list<T>(
    state: &AppState,
    list_id: Uuid,
) -> Result<List, (StatusCode, axum::Json<crate::utils::ApiResponse<T>>)> {
    match List::find_by_id(&state.pool, list_id).await {
        Ok(Some(list)) => Ok(list),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "List not found".into()),
        )),
        Err(e) => {
            tracing::error!("Failed to fetch list {}: {:?}", list_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch list".into()),
            ))
        }
    }
}

/// Mutation gate shared by the list handlers: owner of a personal list, or
/// member of the owning group.
async fn ensure_can_modify<T>(
    state: &AppState,
    list: &List,
    user_id: Uuid,
) -> Result<(), (StatusCode, axum::Json<crate::utils::ApiResponse<T>>)> {
    match list.can_modify(&state.pool, user_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err((
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "You do not have permission to modify this list".into(),
            ),
        )),
        Err(e) => {
            tracing::error!("Failed to check list permissions: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch list".into()),
            ))
        }
    }
}

#[axum::debug_handler]
pub async fn get_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(list_id): Path<Uuid>,
) -> impl IntoResponse {
    let list = match load_list(&state, list_id).await {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    if !list.is_public {
        match list.can_modify(&state.pool, claims.sub).await {
            Ok(true) => {}
            Ok(false) => {
                return (
                    StatusCode::FORBIDDEN,
                    error_to_api_response(
                        error_codes::PERMISSION_DENIED,
                        "This list is not public".into(),
                    ),
                );
            }
            Err(e) => {
                tracing::error!("Failed to check list permissions: {:?}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(
                        error_codes::INTERNAL_ERROR,
                        "Failed to fetch list".into(),
                    ),
                );
            }
        }
    }

    match List::movies(&state.pool, list_id).await {
        Ok(movies) => (
            StatusCode::OK,
            success_to_api_response(ListWithMovies { list, movies }),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch list movies {}: {:?}", list_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch list".into()),
            )
        }
    }
}

/// Read-only access through the opaque share token; only public lists are
/// served.
#[axum::debug_handler]
pub async fn get_shared_list(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> impl IntoResponse {
    let list = match List::find_by_share_id(&state.pool, &share_id).await {
        Ok(Some(list)) => list,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "List not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch shared list: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch list".into()),
            );
        }
    };

    if !list.is_public {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "This list is not public".into(),
            ),
        );
    }

    match List::movies(&state.pool, list.list_id).await {
        Ok(movies) => (
            StatusCode::OK,
            success_to_api_response(ListWithMovies { list, movies }),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch shared list movies: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch list".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn patch_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(list_id): Path<Uuid>,
    Json(req): Json<PatchListRequest>,
) -> impl IntoResponse {
    let list = match load_list(&state, list_id).await {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    if let Err(resp) = ensure_can_modify(&state, &list, claims.sub).await {
        return resp;
    }

    if req.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Nothing to update".into()),
        );
    }

    match List::merge(&state.pool, list_id, &req).await {
        Ok(Some(list)) => (StatusCode::OK, success_to_api_response(list)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "List not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to update list {}: {:?}", list_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to update list".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(list_id): Path<Uuid>,
) -> impl IntoResponse {
    let list = match load_list(&state, list_id).await {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    if let Err(resp) = ensure_can_modify(&state, &list, claims.sub).await {
        return resp;
    }

    match List::delete(&state.pool, list_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "List not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to delete list {}: {:?}", list_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to delete list".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn add_list_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(list_id): Path<Uuid>,
    Json(req): Json<AddListMovieRequest>,
) -> impl IntoResponse {
    let list = match load_list(&state, list_id).await {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    if let Err(resp) = ensure_can_modify(&state, &list, claims.sub).await {
        return resp;
    }

    let movie_exists = match Movie::exists(&state.pool, req.movie_id).await {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to check movie {}: {:?}", req.movie_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to add movie to list".into(),
                ),
            );
        }
    };
    if !movie_exists {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
        );
    }

    match List::add_movie(&state.pool, list_id, req.movie_id, claims.sub).await {
        Ok(Some(entry)) => (StatusCode::CREATED, success_to_api_response(entry)),
        Ok(None) => (
            StatusCode::CONFLICT,
            error_to_api_response(error_codes::CONFLICT, "Movie is already on the list".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to add movie to list {}: {:?}", list_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to add movie to list".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn remove_list_movie(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((list_id, movie_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let list = match load_list(&state, list_id).await {
        Ok(list) => list,
        Err(resp) => return resp,
    };

    if let Err(resp) = ensure_can_modify(&state, &list, claims.sub).await {
        return resp;
    }

    match List::remove_movie(&state.pool, list_id, movie_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Movie is not on the list".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to remove movie from list {}: {:?}", list_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to remove movie from list".into(),
                ),
            )
        }
    }
}
