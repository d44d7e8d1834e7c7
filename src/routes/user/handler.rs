use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    utils::{
        Claims, error_codes, error_to_api_response, generate_token, hash_password,
        strong_password, success_to_api_response, valid_email, valid_username,
    },
};

use super::model::{
    LoginRequest, LoginResponse, RegisterRequest, UpdatePasswordRequest, UpdateProfileRequest,
    User,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    if !valid_username(&req.username) {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Username must be 3-32 characters of letters, numbers and underscores".into(),
            ),
        );
    }
    if !valid_email(&req.email) {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "Invalid email address".into()),
        );
    }
    if !strong_password(&req.password) {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Password must be at least 8 characters and contain a letter and a number".into(),
            ),
        );
    }

    match User::username_taken(&state.pool, &req.username).await {
        Ok(true) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::USER_EXISTS,
                    "Username is already in use".into(),
                ),
            );
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check username: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to create user".into()),
            );
        }
    }

    match User::email_taken(&state.pool, &req.email).await {
        Ok(true) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(error_codes::USER_EXISTS, "Email is already in use".into()),
            );
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check email: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to create user".into()),
            );
        }
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to create user".into()),
            );
        }
    };

    match User::create(&state.pool, &req.username, &req.email, &password_hash).await {
        Ok(user) => (StatusCode::CREATED, success_to_api_response(user)),
        Err(e) => {
            // unique constraint backstop for the check-then-insert race
            let duplicate = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if duplicate {
                (
                    StatusCode::BAD_REQUEST,
                    error_to_api_response(
                        error_codes::USER_EXISTS,
                        "Username is already in use".into(),
                    ),
                )
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(
                        error_codes::INTERNAL_ERROR,
                        "Failed to create user".into(),
                    ),
                )
            }
        }
    }
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = match User::find_by_username(&state.pool, &req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                error_to_api_response(error_codes::AUTH_FAILED, "Invalid credentials".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to look up user: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to log in".into()),
            );
        }
    };

    match user.verify_login(&req.password) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::UNAUTHORIZED,
                error_to_api_response(error_codes::AUTH_FAILED, "Invalid credentials".into()),
            );
        }
        Err(e) => {
            tracing::error!("Password verification failed: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to log in".into()),
            );
        }
    }

    match generate_token(user.user_id, &state.config) {
        Ok((token, expires_at)) => (
            StatusCode::OK,
            success_to_api_response(LoginResponse {
                token,
                expires_at,
                user,
            }),
        ),
        Err(e) => {
            tracing::error!("Failed to generate token: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to log in".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match User::find_by_id(&state.pool, claims.sub).await {
        Ok(Some(user)) => (StatusCode::OK, success_to_api_response(user)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch user {}: {:?}", claims.sub, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch user".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    match User::profile(&state.pool, user_id).await {
        Ok(Some(profile)) => (StatusCode::OK, success_to_api_response(profile)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to fetch profile {}: {:?}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch user".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    if req.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Nothing to update".into()),
        );
    }

    if let Some(email) = &req.email {
        if !valid_email(email) {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::VALIDATION_ERROR,
                    "Invalid email address".into(),
                ),
            );
        }
    }

    match User::merge_profile(&state.pool, claims.sub, &req).await {
        Ok(Some(user)) => (StatusCode::OK, success_to_api_response(user)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User not found".into()),
        ),
        Err(e) => {
            let duplicate = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if duplicate {
                (
                    StatusCode::BAD_REQUEST,
                    error_to_api_response(
                        error_codes::USER_EXISTS,
                        "Email is already in use".into(),
                    ),
                )
            } else {
                tracing::error!("Failed to update profile {}: {:?}", claims.sub, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(
                        error_codes::INTERNAL_ERROR,
                        "Failed to update profile".into(),
                    ),
                )
            }
        }
    }
}

#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePasswordRequest>,
) -> impl IntoResponse {
    let user = match User::find_by_id(&state.pool, claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "User not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch user {}: {:?}", claims.sub, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update password".into(),
                ),
            );
        }
    };

    match user.verify_login(&req.current_password) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::VALIDATION_ERROR,
                    "Current password is incorrect".into(),
                ),
            );
        }
        Err(e) => {
            tracing::error!("Password verification failed: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update password".into(),
                ),
            );
        }
    }

    if !strong_password(&req.new_password) {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "Password must be at least 8 characters and contain a letter and a number".into(),
            ),
        );
    }

    let password_hash = match hash_password(&req.new_password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update password".into(),
                ),
            );
        }
    };

    match User::update_password(&state.pool, claims.sub, &password_hash).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "updated": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to update password {}: {:?}", claims.sub, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to update password".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match User::delete(&state.pool, claims.sub).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "deleted": true })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "User not found".into()),
        ),
        Err(e) => {
            tracing::error!("Failed to delete user {}: {:?}", claims.sub, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to delete user".into()),
            )
        }
    }
}
