//! Account administration handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use core_kernel::UserId;

use crate::auth::{require_admin, Claims};
use crate::dto::auth::UserResponse;
use crate::dto::users::{ChangePasswordRequest, CreateUserRequest};
use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::AppState;

fn require_self_or_admin(claims: &Claims, id: UserId) -> Result<(), ApiError> {
    if claims.is_admin() || claims.sub == id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("not your account".to_string()))
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<UserResponse>, ApiError> {
    require_self_or_admin(&claims, id)?;
    Ok(Json(state.accounts.get_user(id).await?.into()))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<UserResponse>, ApiError> {
    require_admin(&claims)?;
    Ok(Json(state.accounts.get_user_by_username(&username).await?.into()))
}

/// Creates a login
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(request): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_admin(&claims)?;
    let user = state.accounts.create_user(request.into()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Replaces a password; the current one must be supplied even by admins
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<UserId>,
    ValidJson(request): ValidJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    require_self_or_admin(&claims, id)?;
    state
        .accounts
        .change_password(id, &request.current_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
