// HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, UserResponse},
};
use crate::AppState;

/// Register a new user
/// POST /api/auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;

    let user = state
        .auth_service
        .register(&request.username, &request.password)
        .await?;

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            username: user.username,
        }),
    ))
}

/// Log a user in
/// POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state
        .auth_service
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
/// POST /api/auth/refresh
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state.auth_service.refresh(&request.refresh_token).await?;

    Ok(Json(response))
}

/// Get the authenticated user's profile
/// GET /api/auth/me
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    let profile = state.auth_service.current_user(user.user_id).await?;

    Ok(Json(profile))
}
