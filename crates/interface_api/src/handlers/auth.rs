//! Login and token refresh

use axum::{extract::State, Json};
use tracing::info;

use crate::dto::auth::{LoginRequest, LoginResponse, RefreshRequest};
use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::AppState;

/// Verifies credentials and issues a token pair
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .accounts
        .authenticate(&request.username, &request.password)
        .await?;
    let tokens = state.tokens.issue_pair(&user)?;
    info!(user_id = %user.id, role = %user.role, "login");

    Ok(Json(LoginResponse {
        tokens,
        user: user.into(),
    }))
}

/// Exchanges a refresh token for a new pair
///
/// The account is re-read so a disabled login cannot keep refreshing.
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RefreshRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let claims = state.tokens.verify_refresh(&request.refresh_token)?;
    let user = state.accounts.get_user(claims.sub).await?;
    if !user.is_active {
        return Err(ApiError::Unauthorized("account is disabled".to_string()));
    }
    let tokens = state.tokens.issue_pair(&user)?;

    Ok(Json(LoginResponse {
        tokens,
        user: user.into(),
    }))
}
