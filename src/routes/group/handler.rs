use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    routes::movie::model::Movie,
    utils::{Claims, clamp_limit, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{
    AddGroupFavouriteRequest, CreateGroupRequest, Group, GroupFavourite, GroupMember,
    PatchGroupRequest, TransferOwnershipRequest,
};

const DEFAULT_GROUP_PAGE_SIZE: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct GroupListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[axum::debug_handler]
pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Group name must not be empty".into(),
            ),
        );
    }

    match Group::create(&state.pool, &req, claims.sub).await {
        Ok(group) => (StatusCode::CREATED, success_to_api_response(group)),
        Err(e) => {
            tracing::error!("Failed to create group: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to create group".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupListQuery>,
) -> impl IntoResponse {
    let limit = clamp_limit(query.limit, DEFAULT_GROUP_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    match Group::list(&state.pool, limit, offset).await {
        Ok(groups) => (StatusCode::OK, success_to_api_response(groups)),
        Err(e) => {
            tracing::error!("Failed to list groups: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to list groups".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    match Group::info(&state.pool, group_id).await {
        Ok(Some(info)) => (StatusCode::OK, success_to_api_response(info)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Group not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch group {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch group".into()),
            )
        }
    }
}

/// Loads the group or produces the 404/500 response, keeping the
/// existence-before-authorization order in one place.
async fn load_group<T>(
    state: &AppState,
    group_id: Uuid,
) -> Result<Group, (StatusCode, axum::Json<crate::utils::ApiResponse<T>>)> {
    match Group::find_by_id(&state.pool, group_id).await {
        Ok(Some(group)) => Ok(group),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Group not found".into()),
        )),
        Err(e) => {
            tracing::error!("Failed to fetch group {}: {:?}", group_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch group".into()),
            ))
        }
    }
}

#[axum::debug_handler]
pub async fn patch_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<PatchGroupRequest>,
) -> impl IntoResponse {
    let group = match load_group(&state, group_id).await {
        Ok(group) => group,
        Err(resp) => return resp,
    };

    if group.owner_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the group owner can modify the group".into(),
            ),
        );
    }

    if req.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Nothing to update".into()),
        );
    }

    match Group::merge(&state.pool, group_id, &req).await {
        Ok(Some(group)) => (StatusCode::OK, success_to_api_response(group)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Group not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to update group {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to update group".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    let group = match load_group(&state, group_id).await {
        Ok(group) => group,
        Err(resp) => return resp,
    };

    if group.owner_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the group owner can delete the group".into(),
            ),
        );
    }

    match Group::delete(&state.pool, group_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Group not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to delete group {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to delete group".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn get_members(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(resp) = load_group(&state, group_id).await {
        return resp;
    }

    match GroupMember::is_member(&state.pool, group_id, claims.sub).await {
        Ok(true) => {}
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
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch members".into()),
            );
        }
    }

    match GroupMember::list(&state.pool, group_id).await {
        Ok(members) => (StatusCode::OK, success_to_api_response(members)),
        Err(e) => {
            tracing::error!("Failed to list members of {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch members".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn leave_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    let group = match load_group(&state, group_id).await {
        Ok(group) => group,
        Err(resp) => return resp,
    };

    if group.owner_id == claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Owner cannot leave the group. Transfer ownership or delete the group instead."
                    .into(),
            ),
        );
    }

    match GroupMember::remove(&state.pool, group_id, claims.sub).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "left": true })),
        ),
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "You are not a member of this group".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to leave group {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to leave group".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn kick_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let group = match load_group(&state, group_id).await {
        Ok(group) => group,
        Err(resp) => return resp,
    };

    if group.owner_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the group owner can remove members".into(),
            ),
        );
    }

    if user_id == group.owner_id {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "The owner cannot be removed from the group".into(),
            ),
        );
    }

    match GroupMember::remove(&state.pool, group_id, user_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "removed": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Member not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to remove member from {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to remove member".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<TransferOwnershipRequest>,
) -> impl IntoResponse {
    let group = match load_group(&state, group_id).await {
        Ok(group) => group,
        Err(resp) => return resp,
    };

    if group.owner_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the group owner can transfer ownership".into(),
            ),
        );
    }

    if req.new_owner_id == group.owner_id {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "User is already the owner of this group".into(),
            ),
        );
    }

    match GroupMember::is_member(&state.pool, group_id, req.new_owner_id).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::VALIDATION_ERROR,
                    "New owner must be a group member".into(),
                ),
            );
        }
        Err(e) => {
            tracing::error!("Failed to check membership: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to transfer ownership".into(),
                ),
            );
        }
    }

    match Group::transfer_ownership(&state.pool, group_id, claims.sub, req.new_owner_id).await {
        Ok(()) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "owner_id": req.new_owner_id })),
        ),
        Err(e) => {
            tracing::error!("Failed to transfer ownership of {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to transfer ownership".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn add_group_favourite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<AddGroupFavouriteRequest>,
) -> impl IntoResponse {
    if let Err(resp) = load_group(&state, group_id).await {
        return resp;
    }

    match GroupMember::is_member(&state.pool, group_id, claims.sub).await {
        Ok(true) => {}
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
                    "Failed to add group favourite".into(),
                ),
            );
        }
    }

    let movie_exists = match Movie::exists(&state.pool, req.movie_id).await {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to check movie {}: {:?}", req.movie_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to add group favourite".into(),
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

    match GroupFavourite::add(&state.pool, group_id, req.movie_id, claims.sub).await {
        Ok(Some(favourite)) => (StatusCode::CREATED, success_to_api_response(favourite)),
        Ok(None) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "Movie is already in group favourites".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to add group favourite: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to add group favourite".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn list_group_favourites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(resp) = load_group(&state, group_id).await {
        return resp;
    }

    match GroupMember::is_member(&state.pool, group_id, claims.sub).await {
        Ok(true) => {}
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
                    "Failed to fetch group favourites".into(),
                ),
            );
        }
    }

    match GroupFavourite::list(&state.pool, group_id).await {
        Ok(favourites) => (StatusCode::OK, success_to_api_response(favourites)),
        Err(e) => {
            tracing::error!("Failed to list group favourites for {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch group favourites".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn remove_group_favourite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, movie_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let group = match load_group(&state, group_id).await {
        Ok(group) => group,
        Err(resp) => return resp,
    };

    let favourite = match GroupFavourite::find(&state.pool, group_id, movie_id).await {
        Ok(Some(favourite)) => favourite,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Group favourite not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch group favourite: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to remove group favourite".into(),
                ),
            );
        }
    };

    if favourite.added_by != claims.sub && group.owner_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the member who added the favourite or the owner can remove it".into(),
            ),
        );
    }

    match GroupFavourite::remove(&state.pool, group_id, movie_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Group favourite not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to remove group favourite: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to remove group favourite".into(),
                ),
            )
        }
    }
}
