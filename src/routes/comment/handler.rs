use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    routes::group::model::{Group, GroupMember},
    routes::list::model::List,
    routes::movie::model::Movie,
    utils::{Claims, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{
    Comment, CreateCommentRequest, CreateGroupCommentRequest, GroupComment, PatchCommentRequest,
};

const MAX_COMMENT_LENGTH: usize = 2000;

fn validate_content<T>(
    content: &str,
) -> Result<(), (StatusCode, axum::Json<crate::utils::ApiResponse<T>>)> {
    if content.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Comment content must not be empty".into(),
            ),
        ));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Comment content is too long".into(),
            ),
        ));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> impl IntoResponse {
    // a comment targets exactly one of a movie or a list
    let (movie_id, list_id) = match (req.movie_id, req.list_id) {
        (Some(movie_id), None) => (Some(movie_id), None),
        (None, Some(list_id)) => (None, Some(list_id)),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::VALIDATION_ERROR,
                    "A comment must target either a movie or a list".into(),
                ),
            );
        }
    };

    if let Some(movie_id) = movie_id {
        match Movie::exists(&state.pool, movie_id).await {
            Ok(true) => {}
            Ok(false) => {
                return (
                    StatusCode::NOT_FOUND,
                    error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
                );
            }
            Err(e) => {
                tracing::error!("Failed to check movie {}: {:?}", movie_id, e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(
                        error_codes::INTERNAL_ERROR,
                        "Failed to create comment".into(),
                    ),
                );
            }
        }
    }

    if let Some(list_id) = list_id {
        let list = match List::find_by_id(&state.pool, list_id).await {
            Ok(Some(list)) => list,
            Ok(None) => {
                return (
                    StatusCode::NOT_FOUND,
                    error_to_api_response(error_codes::NOT_FOUND, "List not found".into()),
                );
            }
            Err(e) => {
                tracing::error!("Failed to fetch list {}: {:?}", list_id, e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(
                        error_codes::INTERNAL_ERROR,
                        "Failed to create comment".into(),
                    ),
                );
            }
        };

        // commenting on a private list requires access to it
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
                            "Failed to create comment".into(),
                        ),
                    );
                }
            }
        }
    }

    if let Err(resp) = validate_content(&req.content) {
        return resp;
    }

    match Comment::create(&state.pool, claims.sub, movie_id, list_id, req.content.trim()).await {
        Ok(comment) => (StatusCode::CREATED, success_to_api_response(comment)),
        Err(e) => {
            tracing::error!("Failed to create comment: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to create comment".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn movie_comments(
    State(state): State<AppState>,
    Path(movie_id): Path<Uuid>,
) -> impl IntoResponse {
    match Movie::exists(&state.pool, movie_id).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Movie not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to check movie {}: {:?}", movie_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch comments".into(),
                ),
            );
        }
    }

    match Comment::list_for_movie(&state.pool, movie_id).await {
        Ok(comments) => (StatusCode::OK, success_to_api_response(comments)),
        Err(e) => {
            tracing::error!("Failed to list comments for movie {}: {:?}", movie_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch comments".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(list_id): Path<Uuid>,
) -> impl IntoResponse {
    let list = match List::find_by_id(&state.pool, list_id).await {
        Ok(Some(list)) => list,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "List not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch list {}: {:?}", list_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch comments".into(),
                ),
            );
        }
    };

    // this route carries no token, so private list comments stay private
    if !list.is_public {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "This list is not public".into(),
            ),
        );
    }

    match Comment::list_for_list(&state.pool, list_id).await {
        Ok(comments) => (StatusCode::OK, success_to_api_response(comments)),
        Err(e) => {
            tracing::error!("Failed to list comments for list {}: {:?}", list_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch comments".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn patch_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<Uuid>,
    Json(req): Json<PatchCommentRequest>,
) -> impl IntoResponse {
    let comment = match Comment::find_by_id(&state.pool, comment_id).await {
        Ok(Some(comment)) => comment,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Comment not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch comment {}: {:?}", comment_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update comment".into(),
                ),
            );
        }
    };

    if comment.user_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the author can edit this comment".into(),
            ),
        );
    }

    let content = match &req.content {
        Some(content) => content,
        None => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Nothing to update".into()),
            );
        }
    };

    if let Err(resp) = validate_content(content) {
        return resp;
    }

    match Comment::update_content(&state.pool, comment_id, content.trim()).await {
        Ok(Some(comment)) => (StatusCode::OK, success_to_api_response(comment)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Comment not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to update comment {}: {:?}", comment_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update comment".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<Uuid>,
) -> impl IntoResponse {
    let comment = match Comment::find_by_id(&state.pool, comment_id).await {
        Ok(Some(comment)) => comment,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Comment not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch comment {}: {:?}", comment_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to delete comment".into(),
                ),
            );
        }
    };

    if comment.user_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the author can delete this comment".into(),
            ),
        );
    }

    match Comment::delete(&state.pool, comment_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Comment not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to delete comment {}: {:?}", comment_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to delete comment".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn create_group_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<CreateGroupCommentRequest>,
) -> impl IntoResponse {
    match Group::find_by_id(&state.pool, group_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Group not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch group {}: {:?}", group_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to create comment".into(),
                ),
            );
        }
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
                    "Failed to create comment".into(),
                ),
            );
        }
    }

    if let Err(resp) = validate_content(&req.content) {
        return resp;
    }

    match GroupComment::create(&state.pool, group_id, claims.sub, req.content.trim()).await {
        Ok(comment) => (StatusCode::CREATED, success_to_api_response(comment)),
        Err(e) => {
            tracing::error!("Failed to create group comment: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to create comment".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn group_comments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    match Group::find_by_id(&state.pool, group_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Group not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch group {}: {:?}", group_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch comments".into(),
                ),
            );
        }
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
                    "Failed to fetch comments".into(),
                ),
            );
        }
    }

    match GroupComment::list_for_group(&state.pool, group_id).await {
        Ok(comments) => (StatusCode::OK, success_to_api_response(comments)),
        Err(e) => {
            tracing::error!("Failed to list group comments for {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch comments".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn patch_group_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<Uuid>,
    Json(req): Json<PatchCommentRequest>,
) -> impl IntoResponse {
    let comment = match GroupComment::find_by_id(&state.pool, comment_id).await {
        Ok(Some(comment)) => comment,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Comment not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch group comment {}: {:?}", comment_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update comment".into(),
                ),
            );
        }
    };

    if comment.user_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the author can edit this comment".into(),
            ),
        );
    }

    let content = match &req.content {
        Some(content) => content,
        None => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Nothing to update".into()),
            );
        }
    };

    if let Err(resp) = validate_content(content) {
        return resp;
    }

    match GroupComment::update_content(&state.pool, comment_id, content.trim()).await {
        Ok(Some(comment)) => (StatusCode::OK, success_to_api_response(comment)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Comment not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to update group comment {}: {:?}", comment_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update comment".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_group_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<Uuid>,
) -> impl IntoResponse {
    let comment = match GroupComment::find_by_id(&state.pool, comment_id).await {
        Ok(Some(comment)) => comment,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Comment not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch group comment {}: {:?}", comment_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to delete comment".into(),
                ),
            );
        }
    };

    // the author or the group owner may delete
    if comment.user_id != claims.sub {
        let group = match Group::find_by_id(&state.pool, comment.group_id).await {
            Ok(Some(group)) => group,
            Ok(None) => {
                return (
                    StatusCode::NOT_FOUND,
                    error_to_api_response(error_codes::NOT_FOUND, "Group not found".into()),
                );
            }
            Err(e) => {
                tracing::error!("Failed to fetch group {}: {:?}", comment.group_id, e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(
                        error_codes::INTERNAL_ERROR,
                        "Failed to delete comment".into(),
                    ),
                );
            }
        };
        if group.owner_id != claims.sub {
            return (
                StatusCode::FORBIDDEN,
                error_to_api_response(
                    error_codes::PERMISSION_DENIED,
                    "Only the author or the group owner can delete this comment".into(),
                ),
            );
        }
    }

    match GroupComment::delete(&state.pool, comment_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Comment not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to delete group comment {}: {:?}", comment_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to delete comment".into(),
                ),
            )
        }
    }
}
